// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Build driver.
//!
//! Turns a normalized configuration into bundles. A build first compiles the
//! common dependencies bundle, then every island in name order. Targets are
//! processed one at a time. A failing target is recorded in the
//! [`BuildSummary`], and the driver moves on to the next one.
//!
//! Server bundles carry a run-script-after-build step. Once compiled, each
//! of their emitted entry chunks is executed through node so it can write its
//! pre-rendered markup, and is deleted afterwards.

pub mod context;
pub mod report;
pub mod watch;

pub use context::BuildContext;
pub use report::{Reporter, SpinnerReporter};
pub use watch::watch;

use crate::{
    bundle::{
        options::{common_options, island_options},
        BundleError, BundleOptions, Bundler, EmittedFile, Plugin,
    },
    config::ConfigError,
    prerender::{run_script, PrerenderError},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    time::Instant,
};
use tracing::{debug, info, instrument, warn};

/// Unit of work of a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// Common dependencies bundle.
    Common,

    /// Every bundle of one island.
    Island(String),
}

impl Display for Target {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Common => fmt.write_str("common"),
            Self::Island(name) => fmt.write_str(name),
        }
    }
}

/// Result of building one target.
#[derive(Debug)]
pub enum TargetOutcome {
    Succeeded { emitted: Vec<EmittedFile> },
    Failed(BuildError),
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

impl From<Result<Vec<EmittedFile>>> for TargetOutcome {
    fn from(result: Result<Vec<EmittedFile>>) -> Self {
        match result {
            Ok(emitted) => Self::Succeeded { emitted },
            Err(error) => Self::Failed(error),
        }
    }
}

/// Outcome of every target of a build, in build order.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub outcomes: Vec<(Target, TargetOutcome)>,
}

impl BuildSummary {
    /// Check that no target failed.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }

    /// Targets that failed, in build order.
    pub fn failed(&self) -> impl Iterator<Item = &Target> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(target, _)| target)
    }

    /// Files left behind by successful targets.
    pub fn emitted(&self) -> impl Iterator<Item = &EmittedFile> + '_ {
        self.outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                TargetOutcome::Succeeded { emitted } => Some(emitted),
                TargetOutcome::Failed(_) => None,
            })
            .flatten()
    }
}

/// Build common bundle and every island of context configuration.
///
/// The common bundle is skipped when there are no common packages.
#[instrument(skip(ctx, bundler, reporter), level = "debug")]
pub async fn build(
    ctx: &BuildContext,
    bundler: &dyn Bundler,
    reporter: &dyn Reporter,
) -> BuildSummary {
    let config = ctx.config();
    let mut summary = BuildSummary::default();

    if config.common.is_empty() {
        debug!("no common packages, skip common bundle");
    } else {
        let outcome = build_target(ctx, bundler, reporter, &Target::Common, &[common_options(config)]).await;
        summary.outcomes.push((Target::Common, outcome));
    }

    for island in config.targets() {
        let target = Target::Island(island.name.to_string());
        let outcome = build_target(ctx, bundler, reporter, &target, &island_options(&island)).await;
        summary.outcomes.push((target, outcome));
    }

    info!(
        "built {} targets, {} failed",
        summary.outcomes.len(),
        summary.failed().count()
    );
    summary
}

/// Build one target from its option sets, reporting progress.
pub async fn build_target(
    ctx: &BuildContext,
    bundler: &dyn Bundler,
    reporter: &dyn Reporter,
    target: &Target,
    options: &[BundleOptions],
) -> TargetOutcome {
    reporter.started(target);
    let started = Instant::now();

    let outcome = TargetOutcome::from(compile_all(ctx, bundler, options).await);
    if let TargetOutcome::Failed(error) = &outcome {
        warn!("target {target} failed: {error}");
    }

    reporter.finished(target, &outcome, started.elapsed());
    outcome
}

/// Compile option sets in order, stopping at the first failure.
///
/// Returns the emitted files that still exist once run-script-after-build
/// steps are done.
pub async fn compile_all(
    ctx: &BuildContext,
    bundler: &dyn Bundler,
    options: &[BundleOptions],
) -> Result<Vec<EmittedFile>> {
    let mut emitted = Vec::new();
    for option in options {
        let files = bundler.compile(option).await?;
        let removed = match run_script_step(option) {
            Some(delete_after_running) => {
                run_emitted_scripts(ctx, &files, delete_after_running).await?
            }
            None => Vec::new(),
        };

        emitted.extend(files.into_iter().filter(|file| !removed.contains(&file.path)));
    }

    Ok(emitted)
}

fn run_script_step(options: &BundleOptions) -> Option<bool> {
    options.plugins.iter().find_map(|plugin| match plugin {
        Plugin::RunScriptAfterBuild {
            delete_after_running,
        } => Some(*delete_after_running),
        _ => None,
    })
}

/// Execute emitted entry chunks through node.
///
/// Only existing entry chunks ending in `.js` or `.cjs` are executed. Returns
/// the files that were deleted afterwards.
///
/// # Errors
///
/// - Return [`BuildError::Prerender`] if a script cannot run or fails.
/// - Return [`BuildError::Remove`] if a script cannot be deleted.
pub async fn run_emitted_scripts(
    ctx: &BuildContext,
    files: &[EmittedFile],
    delete_after_running: bool,
) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for file in files.iter().filter(|file| file.is_entry && is_script(&file.path)) {
        if !file.path.exists() {
            warn!("emitted script {:?} does not exist", file.path.display());
            continue;
        }

        run_script(ctx.node(), &file.path).await?;

        if delete_after_running {
            tokio::fs::remove_file(&file.path)
                .await
                .map_err(|source| BuildError::Remove {
                    source,
                    path: file.path.clone(),
                })?;
            debug!("deleted {:?}", file.path.display());
            removed.push(file.path.clone());
        }
    }

    Ok(removed)
}

fn is_script(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("js" | "cjs")
    )
}

/// Build error types.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Prerender(#[from] PrerenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scratch directory cannot be created.
    #[error("failed to create scratch directory")]
    Scratch(#[source] std::io::Error),

    /// Emitted script cannot be deleted after running.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Interrupt signal cannot be listened for.
    #[error("failed to listen for interrupt signal")]
    Signal(#[source] std::io::Error),

    /// Source tree walk panicked or was cancelled.
    #[error("failed to snapshot source trees")]
    Snapshot(#[source] tokio::task::JoinError),
}

/// Friendly result alias :3
pub type Result<T, E = BuildError> = std::result::Result<T, E>;
