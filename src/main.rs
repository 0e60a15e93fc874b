use anyhow::Result;
use bigdecimal::BigDecimal;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Instant};
#[allow(unused_imports)]
use tracing::*;
use tracing_subscriber::prelude::*;

use crate::{matching::Tolerances, parsing::Sources};

mod json;
mod matching;
mod model;
mod parsing;
mod reconcile;
mod summary;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// APP payments export, or a directory holding one.
    #[arg(short, long, value_name = "FILE")]
    app: PathBuf,
    /// Trier sales export, or a directory holding one.
    #[arg(short, long, value_name = "FILE")]
    trier: PathBuf,
    #[arg(long, default_value = "0.15")]
    value_tolerance: BigDecimal,
    #[arg(long, default_value_t = 5)]
    time_tolerance: i64,
    /// Match on value alone, ignoring the time window.
    #[arg(long)]
    value_only: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Reconcile(reconcile::Command),
    Json(json::Command),
    Summary(summary::Command),
}

fn main() -> Result<()> {
    fn get_rust_log() -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(get_rust_log()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let tolerances = Tolerances {
        value: cli.value_tolerance.clone(),
        time_minutes: (!cli.value_only).then_some(cli.time_tolerance),
    };

    let load = || -> Result<Sources> {
        let _span = span!(Level::INFO, "loading").entered();
        let started = Instant::now();
        let sources = Sources::load(&cli.app, &cli.trier)?;
        let elapsed = Instant::now() - started;
        info!("loaded sources in {:?}", elapsed);
        Ok(sources)
    };

    match &cli.command {
        Some(Commands::Reconcile(cmd)) => reconcile::execute_command(&load()?, &tolerances, cmd),
        Some(Commands::Json(cmd)) => json::execute_command(&load()?, &tolerances, cmd),
        Some(Commands::Summary(cmd)) => summary::execute_command(&load()?, &tolerances, cmd),
        None => reconcile::execute_command(&load()?, &tolerances, &reconcile::Command::default()),
    }
}
