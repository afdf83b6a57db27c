// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bundler integration.
//!
//! The bundler itself is an external collaborator. Islands only decides what
//! to bundle through [`BundleOptions`], and hands those options to a
//! [`Bundler`] that compiles them into emitted files. [`RollupBundler`] is the
//! stock implementation, driving the rollup command line.

pub mod codegen;
pub mod options;
pub mod rollup;

pub use options::{BundleOptions, ModuleFormat, OutputOptions, OutputTarget, Plugin};
pub use rollup::RollupBundler;

use crate::path::chunk_name;

use futures::future::BoxFuture;
use std::{path::PathBuf, process::ExitStatus};

/// File written by a bundler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub path: PathBuf,

    /// Whether file is the chunk of an entry module.
    pub is_entry: bool,
}

/// Compile bundler options into emitted files.
pub trait Bundler: Send + Sync {
    /// Compile one option set.
    fn compile<'a>(&'a self, options: &'a BundleOptions) -> BoxFuture<'a, Result<Vec<EmittedFile>>>;
}

/// Determine entry chunk an option set emits.
pub fn entry_file(options: &BundleOptions) -> EmittedFile {
    let path = match &options.output.target {
        OutputTarget::File(file) => file.clone(),
        OutputTarget::Dir {
            dir,
            entry_file_names,
        } => dir.join(entry_file_names.replace("[name]", &chunk_name(&options.input))),
    };

    EmittedFile {
        path,
        is_entry: true,
    }
}

/// Bundler error types.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Generated bundler configuration cannot be written.
    #[error("failed to write bundler configuration at {:?}", path.display())]
    WriteConfig {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Bundler process cannot be started.
    #[error("failed to spawn bundler {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Bundler process reported failure.
    #[error("bundler exited with {status}:\n{stderr}")]
    Failed { status: ExitStatus, stderr: String },

    /// Bundler options cannot be serialized.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Friendly result alias :3
pub type Result<T, E = BundleError> = std::result::Result<T, E>;
