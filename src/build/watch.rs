// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Watch mode.
//!
//! Source trees are polled rather than subscribed to. Each island watches the
//! directory holding its input, walked with the same ignore rules git would
//! apply, and is rebuilt whenever the modification stamps of that tree
//! change. Only client bundles are rebuilt.

use crate::{
    build::{
        build_target, compile_all, BuildContext, BuildError, Reporter, Result, Target,
        TargetOutcome,
    },
    bundle::{
        options::{common_options, island_client_options},
        Bundler,
    },
    config::NormalizedConfig,
    path::source_root,
};

use ignore::WalkBuilder;
use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
    time::{Duration, Instant, SystemTime},
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

/// Modification stamps of every file in a source tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    stamps: BTreeMap<PathBuf, (Option<SystemTime>, u64)>,
}

impl Snapshot {
    /// Walk source tree at `root`, skipping anything under `exclude`.
    ///
    /// Both paths are resolved against the current directory and the file
    /// system first, so relative and absolute spellings of the same directory
    /// exclude the same tree.
    pub fn take(root: impl AsRef<Path>, exclude: impl AsRef<Path>) -> Self {
        let root = resolved(root.as_ref());
        let exclude = resolved(exclude.as_ref());
        let stamps = WalkBuilder::new(&root)
            .filter_entry(move |entry| !entry.path().starts_with(&exclude))
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|kind| kind.is_file()))
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                Some((
                    entry.into_path(),
                    (metadata.modified().ok(), metadata.len()),
                ))
            })
            .collect();

        Self { stamps }
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

/// Latest snapshot of each island's source tree.
#[derive(Debug, Default, Clone)]
pub struct WatchState {
    snapshots: BTreeMap<String, Snapshot>,
}

impl WatchState {
    /// Snapshot source tree of every island.
    pub fn new(config: &NormalizedConfig) -> Self {
        let snapshots = config
            .targets()
            .map(|target| {
                let snapshot = Snapshot::take(source_root(target.input), &config.output);
                (target.name.to_string(), snapshot)
            })
            .collect();

        Self { snapshots }
    }

    /// Re-snapshot every island, returning the names of islands whose source
    /// tree changed since the last call.
    pub fn changed(&mut self, config: &NormalizedConfig) -> Vec<String> {
        let mut changed = Vec::new();
        for target in config.targets() {
            let snapshot = Snapshot::take(source_root(target.input), &config.output);
            let previous = self.snapshots.insert(target.name.to_string(), snapshot.clone());
            if previous.as_ref() != Some(&snapshot) {
                changed.push(target.name.to_string());
            }
        }

        changed
    }

    /// Re-snapshot every island on the blocking pool.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Snapshot`] if the walk panicked.
    pub async fn poll(mut self, config: NormalizedConfig) -> Result<(Self, Vec<String>)> {
        tokio::task::spawn_blocking(move || {
            let changed = self.changed(&config);
            (self, changed)
        })
        .await
        .map_err(BuildError::Snapshot)
    }
}

/// Build common bundle once, then rebuild client bundles of islands whose
/// sources change, until interrupted.
///
/// # Errors
///
/// - Return [`BuildError::Signal`] if interrupt signal cannot be listened
///   for.
#[instrument(skip(ctx, bundler, reporter), level = "debug")]
pub async fn watch(
    ctx: &BuildContext,
    bundler: &dyn Bundler,
    reporter: &dyn Reporter,
    interval: Duration,
) -> Result<()> {
    let config = ctx.config();
    if !config.common.is_empty() {
        build_target(ctx, bundler, reporter, &Target::Common, &[common_options(config)]).await;
    }

    let snapshot_config = config.clone();
    let mut state = tokio::task::spawn_blocking(move || WatchState::new(&snapshot_config))
        .await
        .map_err(BuildError::Snapshot)?;
    info!("watching {} islands", config.islands.len());

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            result = &mut interrupt => {
                result.map_err(BuildError::Signal)?;
                info!("stop watching");
                return Ok(());
            }
            _ = ticker.tick() => {
                let (next, changed) = state.poll(config.clone()).await?;
                state = next;
                for name in changed {
                    rebuild(ctx, bundler, reporter, &name).await;
                }
            }
        }
    }
}

/// Rebuild client bundle of one island.
pub async fn rebuild(
    ctx: &BuildContext,
    bundler: &dyn Bundler,
    reporter: &dyn Reporter,
    name: &str,
) -> Option<TargetOutcome> {
    let target = ctx.config().target(name)?;
    debug!("rebuild {name}");

    let started = Instant::now();
    let outcome = TargetOutcome::from(compile_all(ctx, bundler, &[island_client_options(&target)]).await);
    reporter.rebuilt(&Target::Island(name.to_string()), &outcome, started.elapsed());

    Some(outcome)
}

/// Make `path` absolute and lexically clean, then canonicalize its longest
/// existing ancestor so symlinked prefixes agree with walked entries.
fn resolved(path: &Path) -> PathBuf {
    let mut lexical = PathBuf::new();
    if path.is_relative() {
        if let Ok(current) = std::env::current_dir() {
            lexical.push(current);
        }
    }
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    for ancestor in lexical.ancestors() {
        if let Ok(canonical) = std::fs::canonicalize(ancestor) {
            return match lexical.strip_prefix(ancestor) {
                Ok(rest) if !rest.as_os_str().is_empty() => canonical.join(rest),
                _ => canonical,
            };
        }
    }

    lexical
}
