// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{
    build::{BuildError, Result},
    bundle::RollupBundler,
    config::{read_config, NormalizedConfig},
};

use std::{
    ffi::{OsStr, OsString},
    path::Path,
};
use tempfile::TempDir;
use tracing::debug;

/// State of one build invocation.
///
/// Owns the scratch directory that bundler configuration is generated into.
/// The scratch directory lives inside the project directory, so generated
/// modules resolve packages from the project's `node_modules`. It is removed
/// when the context is dropped.
#[derive(Debug)]
pub struct BuildContext {
    config: NormalizedConfig,
    scratch: TempDir,
    node: OsString,
}

impl BuildContext {
    /// Construct new build context for project in current directory.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Scratch`] if current directory is unknown, or
    ///   scratch directory cannot be created.
    pub fn new(config: NormalizedConfig) -> Result<Self> {
        let project_dir = std::env::current_dir().map_err(BuildError::Scratch)?;
        Self::in_dir(config, project_dir)
    }

    /// Construct new build context for project in `project_dir`.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Scratch`] if scratch directory cannot be created.
    pub fn in_dir(config: NormalizedConfig, project_dir: impl AsRef<Path>) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix(".islands-")
            .tempdir_in(project_dir)
            .map_err(BuildError::Scratch)?;
        debug!("scratch directory at {:?}", scratch.path().display());

        Ok(Self {
            config,
            scratch,
            node: OsString::from("node"),
        })
    }

    /// Read and normalize configuration file, and construct build context
    /// from it.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Config`] if configuration is unusable.
    /// - Return [`BuildError::Scratch`] if scratch directory cannot be created.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = read_config(path)?.normalize()?;
        Self::new(config)
    }

    /// Use different program to run emitted scripts with.
    pub fn with_node(mut self, node: impl Into<OsString>) -> Self {
        self.node = node.into();
        self
    }

    pub fn config(&self) -> &NormalizedConfig {
        &self.config
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn node(&self) -> &OsStr {
        &self.node
    }

    /// Construct rollup bundler writing configuration into scratch directory.
    pub fn rollup(&self) -> RollupBundler {
        RollupBundler::new(self.scratch_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IslandsConfig;
    use std::collections::BTreeMap;

    #[test]
    fn scratch_dir_lives_in_project_and_is_removed_on_drop() -> anyhow::Result<()> {
        let project = tempfile::tempdir()?;
        let config = IslandsConfig {
            islands: BTreeMap::from([("Counter".to_string(), "src/Counter.tsx".into())]),
            ..Default::default()
        }
        .normalize()?;

        let ctx = BuildContext::in_dir(config, project.path())?.with_node("nodejs");
        let scratch = ctx.scratch_dir().to_path_buf();
        assert!(scratch.is_dir());
        assert_eq!(scratch.parent(), Some(project.path()));
        assert!(scratch
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(".islands-")));
        assert_eq!(ctx.node(), "nodejs");

        drop(ctx);
        assert!(!scratch.exists());

        Ok(())
    }
}
