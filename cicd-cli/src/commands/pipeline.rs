//! `cicd pipeline activate|show|deactivate`

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;

use cicd_core::{
    state::{ChartRecord, PipelineRecord},
    types::PipelineKind,
};
use cicd_pipeline::{Deactivation, PipelineSpec, PipelineSync, PipelineTarget};

use super::CliContext;

#[derive(Subcommand, Debug)]
pub enum PipelineCommand {
    /// Register a pipeline, or refresh one already registered.
    Activate(ActivateArgs),

    /// Print the locally recorded handle for a pipeline.
    Show(LabelArgs),

    /// Unregister a pipeline and forget it locally.
    Deactivate(LabelArgs),
}

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Label the pipeline is recorded under.
    pub label: String,
}

#[derive(Args, Debug)]
pub struct ActivateArgs {
    /// Label to record the pipeline under.
    pub label: String,

    /// Pipeline kind: helm | terraform | script.
    #[arg(long)]
    pub kind: PipelineKind,

    /// Storage key of the archive to deploy (helm, terraform).
    #[arg(long, conflicts_with = "chart")]
    pub archive: Option<String>,

    /// Take the archive from a chart recorded by `cicd chart build`.
    #[arg(long, value_name = "LABEL")]
    pub chart: Option<String>,

    /// Helm release name.
    #[arg(long)]
    pub release: Option<String>,

    /// Helm namespace.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Terraform variable (repeatable).
    #[arg(long = "value", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub values: Vec<(String, String)>,

    /// Command to run (script).
    #[arg(long)]
    pub exec: Option<String>,

    /// Dry-run command (script).
    #[arg(long)]
    pub plan: Option<String>,

    /// Environment variable for the script (repeatable).
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub env: Vec<(String, String)>,

    /// Git origin the source must come from.
    #[arg(long)]
    pub origin: Option<String>,

    /// Branch allowed to trigger the pipeline (repeatable, order kept).
    #[arg(long = "branch", value_name = "BRANCH")]
    pub branches: Vec<String>,

    #[arg(long)]
    pub registry_url: Option<String>,

    #[arg(long)]
    pub registry_provider: Option<String>,

    /// Approvals needed before a run proceeds.
    #[arg(long, default_value_t = 0)]
    pub approvals_required: u32,

    /// Identity allowed to approve (repeatable).
    #[arg(long = "approver", value_name = "NAME")]
    pub approvers: Vec<String>,
}

pub fn run(ctx: &CliContext, cmd: PipelineCommand) -> Result<()> {
    match cmd {
        PipelineCommand::Activate(args) => activate(ctx, args),
        PipelineCommand::Show(args) => show(ctx, &args.label),
        PipelineCommand::Deactivate(args) => deactivate(ctx, &args.label),
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

impl ActivateArgs {
    /// Resolve the archive (directly or via a recorded chart) and assemble
    /// the typed spec.
    fn into_spec(self, charts: &BTreeMap<String, ChartRecord>) -> Result<PipelineSpec> {
        let archive = match &self.chart {
            Some(label) => {
                let record = charts
                    .get(label)
                    .with_context(|| format!("no chart recorded under '{label}'"))?;
                if record.needs_rebuild() {
                    bail!("chart '{label}' has no stored archive; rebuild it first");
                }
                record.archive.clone()
            }
            None => self.archive.unwrap_or_default(),
        };

        let target = match self.kind {
            PipelineKind::Helm => PipelineTarget::Helm {
                archive,
                release: self.release,
                namespace: self.namespace,
            },
            PipelineKind::Terraform => PipelineTarget::Terraform {
                archive,
                values: self.values.into_iter().collect(),
            },
            PipelineKind::Script => PipelineTarget::Script {
                exec: self.exec.unwrap_or_default(),
                plan: self.plan,
                env: self.env.into_iter().collect(),
            },
        };

        let mut spec = PipelineSpec::new(target);
        spec.origin = self.origin;
        spec.branches = self.branches;
        spec.registry_url = self.registry_url;
        spec.registry_provider = self.registry_provider;
        spec.approvals_required = self.approvals_required;
        spec.approvers = self.approvers;
        Ok(spec)
    }
}

fn activate(ctx: &CliContext, args: ActivateArgs) -> Result<()> {
    let mut state = ctx.load_state()?;
    let label = args.label.clone();
    let spec = args.into_spec(&state.charts)?;
    spec.validate()?;

    let config = ctx.validated_config()?;
    let sync = PipelineSync::new(config);
    let previous = state
        .pipelines
        .get(&label)
        .and_then(|record| record.handle.clone());

    let handle = sync
        .activate(&spec, previous.as_ref())
        .with_context(|| format!("failed to activate pipeline '{label}'"))?;

    let verb = if previous.is_some() { "refreshed" } else { "activated" };
    println!("{} {label} ({})", verb.green().bold(), spec.kind());
    println!("  id: {}", handle.id);

    state.pipelines.insert(
        label,
        PipelineRecord {
            kind: spec.kind(),
            handle: Some(handle),
            updated_at: Utc::now(),
        },
    );
    ctx.save_state(&state)
}

fn show(ctx: &CliContext, label: &str) -> Result<()> {
    let state = ctx.load_state()?;
    let Some(record) = state.pipelines.get(label) else {
        bail!("no pipeline recorded under '{label}'");
    };

    let sync = PipelineSync::new(&ctx.config);
    match sync.read(record.handle.clone()) {
        Some(handle) => {
            println!("{label} ({})", record.kind);
            println!("  id:      {}", handle.id);
            println!("  updated: {}", record.updated_at.to_rfc3339());
        }
        None => println!("{label} ({}): {}", record.kind, "not registered".yellow()),
    }
    Ok(())
}

fn deactivate(ctx: &CliContext, label: &str) -> Result<()> {
    let mut state = ctx.load_state()?;
    let Some(record) = state.pipelines.remove(label) else {
        println!("{label}: nothing recorded");
        return Ok(());
    };

    let outcome = match (record.handle.as_ref(), ctx.validated_config()) {
        (None, _) => Deactivation::Skipped,
        (Some(handle), Ok(config)) => PipelineSync::new(config).deactivate(Some(handle)),
        (Some(_), Err(err)) => {
            let reason = format!("{err:#}");
            tracing::warn!(error = %reason, "skipping remote deactivation");
            Deactivation::FailedButIgnored(reason)
        }
    };

    match outcome {
        Deactivation::Deleted => println!("{} {label}", "deactivated".green().bold()),
        Deactivation::Skipped => println!("{label}: was never registered"),
        Deactivation::FailedButIgnored(reason) => println!(
            "{} {label}: remote call failed (ignored): {reason}",
            "forgot".yellow().bold()
        ),
    }
    ctx.save_state(&state)
}
