// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use islands::{
    build::{build, watch, BuildContext, SpinnerReporter},
    path::DEFAULT_CONFIG_FILE,
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit, time::Duration};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "islands [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        match self.command {
            Command::Build(opts) => run_build(opts).await,
            Command::Watch(opts) => run_watch(opts).await,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Build common bundle and every island.
    #[command(override_usage = "islands build [options]")]
    Build(BuildOptions),

    /// Rebuild islands whenever their sources change.
    #[command(override_usage = "islands watch [options]")]
    Watch(WatchOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BuildOptions {
    /// Path to islands configuration file.
    #[arg(short, long, value_name = "path", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct WatchOptions {
    /// Path to islands configuration file.
    #[arg(short, long, value_name = "path", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Milliseconds between source tree scans.
    #[arg(short, long, value_name = "millis", default_value_t = 500)]
    pub interval: u64,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

async fn run_build(opts: BuildOptions) -> Result<()> {
    let ctx = BuildContext::from_config_file(&opts.config)?;
    let bundler = ctx.rollup();
    let reporter = SpinnerReporter::new();

    let summary = build(&ctx, &bundler, &reporter).await;
    if !summary.is_success() {
        let failed = summary
            .failed()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        bail!("failed to build {failed}");
    }

    Ok(())
}

async fn run_watch(opts: WatchOptions) -> Result<()> {
    let ctx = BuildContext::from_config_file(&opts.config)?;
    let bundler = ctx.rollup();
    let reporter = SpinnerReporter::new();

    watch(&ctx, &bundler, &reporter, Duration::from_millis(opts.interval.max(1))).await?;

    Ok(())
}
