//! Command line front end: loads a reaction configuration and runs it.

mod chain;
mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tidewatch_engine::{
    ensure_output_dir, Content, CycleOutcome, CycleReport, Engine, JsonFileStore, ReactionRunner,
    StateStore,
};
use tidewatch_logging::{watch_error, watch_info, watch_warn};
use tokio_util::sync::CancellationToken;

use crate::chain::{build_action, build_reaction};
use crate::config::Config;
use crate::logging::LogDestination;

#[derive(Parser)]
#[command(name = "tidewatch", version, about = "Poll sources and react to changes")]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "tidewatch.ron")]
    config: PathBuf,
    /// Log debug records.
    #[arg(short, long)]
    verbose: bool,
    /// Also append log records to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Log only to the file given by `--log-file`.
    #[arg(short, long, requires = "log_file")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every reaction on its interval until interrupted.
    Run,
    /// Run one cycle of the named reactions (all when none are given).
    Once { names: Vec<String> },
    /// Print the stored states of a reaction.
    Show { name: String },
    /// Check the configuration and build every reaction.
    Validate,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        watch_error!("{err:#}");
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let destination = match (cli.log_file, cli.quiet) {
        (Some(path), true) => LogDestination::File(path),
        (Some(path), false) => LogDestination::Both(path),
        (None, _) => LogDestination::Terminal,
    };
    logging::initialize(destination, cli.verbose);

    let config = Config::load(&cli.config)?;
    match cli.command {
        Command::Run => cmd_run(&config).await,
        Command::Once { names } => cmd_once(&config, names).await,
        Command::Show { name } => cmd_show(&config, &name),
        Command::Validate => cmd_validate(&config),
    }
}

fn build_engine(config: &Config) -> Result<Engine<Content>> {
    ensure_output_dir(&config.state_dir).context("prepare state directory")?;
    let fetch = config.http.fetch_settings();
    let reactions = config
        .reactions
        .iter()
        .map(|spec| {
            build_reaction(spec, &fetch).with_context(|| format!("reaction '{}'", spec.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let store = Arc::new(JsonFileStore::new(config.state_dir.clone()));
    let mut runner = ReactionRunner::<Content>::new(store);
    if let Some(spec) = &config.error_action {
        runner = runner.with_error_action(build_action(spec, "errors"));
    }
    Ok(Engine::new(reactions, runner))
}

async fn cmd_run(config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => watch_info!("interrupt received, finishing running cycles"),
                Err(err) => watch_warn!("cannot listen for interrupt: {err}"),
            }
            shutdown.cancel();
        }
    });
    engine.run(shutdown).await;
    Ok(())
}

async fn cmd_once(config: &Config, names: Vec<String>) -> Result<()> {
    let unknown: Vec<&str> = names
        .iter()
        .filter(|name| config.reaction(name).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        bail!("unknown reaction(s): {}", unknown.join(", "));
    }

    let engine = build_engine(config)?;
    let mut failed = 0;
    for result in engine.run_once(&names).await {
        match result {
            Ok(report) => println!("{}", describe(&report)),
            Err(err) => {
                failed += 1;
                eprintln!("{err}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} reaction(s) could not complete their cycle");
    }
    Ok(())
}

fn cmd_show(config: &Config, name: &str) -> Result<()> {
    if config.reaction(name).is_none() {
        bail!("unknown reaction: {name}");
    }
    let store = JsonFileStore::new(config.state_dir.clone());
    let last = StateStore::<Content>::load_last(&store, name)?;
    let success = StateStore::<Content>::load_last_success(&store, name)?;
    let shown = serde_json::json!({
        "reaction": name,
        "last": last,
        "last_success": success,
    });
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn cmd_validate(config: &Config) -> Result<()> {
    let fetch = config.http.fetch_settings();
    for spec in &config.reactions {
        build_reaction(spec, &fetch).with_context(|| format!("reaction '{}'", spec.name))?;
    }
    println!("{} reaction(s) ok", config.reactions.len());
    Ok(())
}

fn describe(report: &CycleReport) -> String {
    let outcome = match &report.outcome {
        CycleOutcome::Notified => "notified".to_string(),
        CycleOutcome::ActionFailed { message } => format!("action failed: {message}"),
        CycleOutcome::Unchanged => "unchanged".to_string(),
        CycleOutcome::Failed { cause } => format!(
            "failed ({} in a row): {}",
            report.fail_count,
            cause.as_deref().unwrap_or("unknown cause")
        ),
    };
    format!("{}: {outcome}", report.reaction)
}
