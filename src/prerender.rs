// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Static pre-rendering of islands.
//!
//! Islands can be pre-rendered two ways. In process, through
//! [`prerender_islands`], which renders every component with empty props
//! into `<name>.html`. Or out of process, by running the server bundle of an
//! island through node with [`run_script`], which makes the bundle write its
//! own `ssg.html`.

use crate::{
    island::Island,
    runtime::{markup::render_to_string, props::Props},
};

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::Command,
};
use tracing::{debug, info, instrument, warn};

/// Pre-render islands into static markup files.
///
/// Creates `out_dir` if it does not exist, or removes the files already in
/// it. Each island then gets a `<name>.html` file holding the markup of its
/// component rendered with empty props. Returns the written files in the
/// order islands were given.
///
/// # Errors
///
/// - Return [`PrerenderError::Io`] if output directory cannot be prepared,
///   or a file cannot be written.
#[instrument(skip(islands, out_dir), level = "debug")]
pub async fn prerender_islands<'a>(
    islands: impl IntoIterator<Item = &'a Island>,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    prepare_out_dir(out_dir).await?;

    let mut written = Vec::new();
    for island in islands {
        let html = render_to_string(&(island.component())(&Props::default()));
        let path = out_dir.join(format!("{}.html", island.name()));
        write_file(&path, &html).await?;
        debug!("pre-rendered {:?} to {:?}", island.name(), path.display());
        written.push(path);
    }

    Ok(written)
}

async fn prepare_out_dir(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        return mkdirp::mkdirp(out_dir)
            .map(|_| ())
            .map_err(|source| PrerenderError::Io {
                source,
                path: out_dir.to_path_buf(),
            });
    }

    let mut entries = fs::read_dir(out_dir)
        .await
        .map_err(|source| PrerenderError::Io {
            source,
            path: out_dir.to_path_buf(),
        })?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| PrerenderError::Io {
            source,
            path: out_dir.to_path_buf(),
        })?
    {
        let path = entry.path();
        if path.is_file() {
            fs::remove_file(&path)
                .await
                .map_err(|source| PrerenderError::Io {
                    source,
                    path: path.clone(),
                })?;
        }
    }

    Ok(())
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    let io_error = |source: std::io::Error| PrerenderError::Io {
        source,
        path: path.to_path_buf(),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(io_error)?;
    file.write_all(contents.as_bytes()).await.map_err(io_error)?;
    file.flush().await.map_err(io_error)?;

    Ok(())
}

/// Run script through program in a child process.
///
/// Standard output of the script is logged at info level, and standard error
/// at warn level, line by line.
///
/// # Errors
///
/// - Return [`PrerenderError::Spawn`] if program cannot be started.
/// - Return [`PrerenderError::Script`] if script exits unsuccessfully.
#[instrument(skip(program, script), level = "debug")]
pub async fn run_script(program: impl AsRef<OsStr>, script: impl AsRef<Path>) -> Result<()> {
    let program = program.as_ref();
    let script = script.as_ref();
    debug!("run {:?} through {program:?}", script.display());

    let mut child = Command::new(program)
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| PrerenderError::Spawn {
            source,
            program: program.to_string_lossy().into_owned(),
        })?;

    let stdout = child.stdout.take().map(|out| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(out).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!("{line}");
            }
        })
    });
    let stderr = child.stderr.take().map(|err| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("{line}");
            }
        })
    });

    let status = child.wait().await.map_err(|source| PrerenderError::Spawn {
        source,
        program: program.to_string_lossy().into_owned(),
    })?;
    for task in [stdout, stderr].into_iter().flatten() {
        let _ = task.await;
    }

    if !status.success() {
        return Err(PrerenderError::Script {
            status,
            script: script.to_path_buf(),
        });
    }

    Ok(())
}

/// Pre-render error types.
#[derive(Debug, thiserror::Error)]
pub enum PrerenderError {
    /// Output cannot be read or written.
    #[error("failed to access {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Script runner cannot be started.
    #[error("failed to spawn {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Script exited unsuccessfully.
    #[error("script {:?} exited with {status}", script.display())]
    Script { status: ExitStatus, script: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = PrerenderError> = std::result::Result<T, E>;
