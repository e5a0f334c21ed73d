//! `cicd status`: everything recorded in local state.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use cicd_core::state::StateFile;

use super::CliContext;

/// Arguments for `cicd status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, ctx: &CliContext) -> Result<()> {
        let state = ctx.load_state()?;
        let report = build_report(&state);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_tables(report);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReport {
    charts: Vec<ChartRow>,
    pipelines: Vec<PipelineRow>,
}

#[derive(Serialize, Tabled)]
struct ChartRow {
    #[tabled(rename = "label")]
    label: String,
    #[tabled(rename = "chart")]
    name: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "archive")]
    archive: String,
    #[tabled(rename = "updated")]
    updated_at: String,
}

#[derive(Serialize, Tabled)]
struct PipelineRow {
    #[tabled(rename = "label")]
    label: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "registered")]
    registered: bool,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "updated")]
    updated_at: String,
}

fn build_report(state: &StateFile) -> StatusReport {
    let charts = state
        .charts
        .iter()
        .map(|(label, record)| ChartRow {
            label: label.clone(),
            name: record.name.to_string(),
            id: record.id.to_string(),
            archive: if record.needs_rebuild() {
                "(needs rebuild)".to_string()
            } else {
                record.archive.clone()
            },
            updated_at: record.updated_at.to_rfc3339(),
        })
        .collect();

    let pipelines = state
        .pipelines
        .iter()
        .map(|(label, record)| PipelineRow {
            label: label.clone(),
            kind: record.kind.to_string(),
            registered: record.handle.is_some(),
            id: record
                .handle
                .as_ref()
                .map(|h| h.id.to_string())
                .unwrap_or_default(),
            updated_at: record.updated_at.to_rfc3339(),
        })
        .collect();

    StatusReport { charts, pipelines }
}

fn print_tables(report: StatusReport) {
    println!(
        "cicd v{} | {} charts | {} pipelines",
        env!("CARGO_PKG_VERSION"),
        report.charts.len(),
        report.pipelines.len(),
    );

    if report.charts.is_empty() && report.pipelines.is_empty() {
        println!("Nothing recorded yet.");
        return;
    }

    if !report.charts.is_empty() {
        println!("{}", "CHARTS".bold());
        let mut table = Table::new(report.charts);
        table.with(Style::rounded());
        println!("{table}");
    }
    if !report.pipelines.is_empty() {
        println!("{}", "PIPELINES".bold());
        let mut table = Table::new(report.pipelines);
        table.with(Style::rounded());
        println!("{table}");
    }
}
