//! `cicd chart build|status|remove`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use cicd_chart::{
    build,
    store::{self, Removal},
    BuildRequest, DirStore,
};

use super::CliContext;

#[derive(Subcommand, Debug)]
pub enum ChartCommand {
    /// Package a chart directory and publish it to the store.
    Build(BuildArgs),

    /// Check that a recorded chart is still present in the store.
    Status(LabelArgs),

    /// Delete a recorded chart from the store and forget it.
    Remove(LabelArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Chart directory containing Chart.yaml, values.yaml and templates/.
    pub source: PathBuf,

    /// Override a value at deploy time (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    /// Restrict overrides to these keys (repeatable). Without it every
    /// override is kept.
    #[arg(long = "allow", value_name = "KEY")]
    pub allowed: Vec<String>,

    /// Storage category prefix. Defaults to the configured category.
    #[arg(long)]
    pub category: Option<String>,

    /// Name to record the chart under. Defaults to the chart name.
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Label the chart was recorded under.
    pub label: String,
}

pub fn run(ctx: &CliContext, cmd: ChartCommand) -> Result<()> {
    match cmd {
        ChartCommand::Build(args) => build_chart(ctx, args),
        ChartCommand::Status(args) => status(ctx, &args.label),
        ChartCommand::Remove(args) => remove(ctx, &args.label),
    }
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn build_chart(ctx: &CliContext, args: BuildArgs) -> Result<()> {
    let category = args
        .category
        .unwrap_or_else(|| ctx.config.category.clone());
    if category.is_empty() || category.contains('/') {
        bail!("invalid category '{category}'");
    }
    let allowed = (!args.allowed.is_empty()).then_some(args.allowed);

    let request = BuildRequest::new(&args.source)
        .with_overrides(args.overrides)
        .with_allowed_keys(allowed)
        .with_category(category);
    let bundle = build(&request)
        .with_context(|| format!("failed to build chart from {}", args.source.display()))?;

    let store = DirStore::new(&ctx.config.store_dir);
    let record = store::publish(&store, &bundle, &args.source)
        .with_context(|| format!("failed to publish chart '{}'", bundle.name))?;

    let label = args.label.unwrap_or_else(|| bundle.name.to_string());
    let mut state = ctx.load_state()?;
    state.charts.insert(label.clone(), record.clone());
    ctx.save_state(&state)?;

    println!("{} {label}", "built".green().bold());
    println!("  id:      {}", record.id);
    println!("  archive: {}", record.archive);
    println!("  hash:    {}", record.hash);
    Ok(())
}

fn status(ctx: &CliContext, label: &str) -> Result<()> {
    let mut state = ctx.load_state()?;
    let Some(record) = state.charts.get(label) else {
        bail!("no chart recorded under '{label}'");
    };

    let store = DirStore::new(&ctx.config.store_dir);
    let refreshed = store::refresh(&store, record);
    let missing = refreshed.needs_rebuild();
    state.charts.insert(label.to_string(), refreshed.clone());
    ctx.save_state(&state)?;

    if missing {
        println!(
            "{} {label}: stored archive is gone; run `cicd chart build {}` again",
            "missing".yellow().bold(),
            refreshed.source.display()
        );
    } else {
        println!("{} {label}", "present".green().bold());
        println!("  id:      {}", refreshed.id);
        println!("  archive: {}", refreshed.archive);
        println!("  hash:    {}", refreshed.hash);
    }
    Ok(())
}

fn remove(ctx: &CliContext, label: &str) -> Result<()> {
    let mut state = ctx.load_state()?;
    let Some(record) = state.charts.remove(label) else {
        bail!("no chart recorded under '{label}'");
    };

    let store = DirStore::new(&ctx.config.store_dir);
    match store::remove(&store, &record) {
        Removal::Deleted => println!("{} {label}", "removed".green().bold()),
        Removal::Skipped => println!("{label}: nothing stored"),
        Removal::FailedButIgnored(reason) => {
            println!("{} {label}: {reason}", "removal failed (ignored)".yellow())
        }
    }
    ctx.save_state(&state)
}
