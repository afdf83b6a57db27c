// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for files named by the islands
//! configuration, or produced by the build.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// Default name of the islands configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "islands.config.json";

/// Default output directory of a build.
pub const DEFAULT_OUTPUT_DIR: &str = "./dist/";

/// Perform shell expansion on path.
///
/// Expands a leading tilde and any environment variables. Does not check if
/// the path returned actually exists.
///
/// # Errors
///
/// - Return [`ExpandError`] if a referenced environment variable is unset or
///   not valid unicode.
pub fn expand(path: impl AsRef<Path>) -> Result<PathBuf> {
    let raw = path.as_ref().to_string_lossy();
    let expanded = shellexpand::full(raw.as_ref()).map_err(|source| ExpandError {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    Ok(PathBuf::from(expanded.into_owned()))
}

/// Determine bundle chunk name of an entry file.
///
/// Bundlers name entry chunks after the entry's file stem, e.g.,
/// "src/Counter.tsx" becomes "Counter".
pub fn chunk_name(input: impl AsRef<Path>) -> String {
    input
        .as_ref()
        .file_stem()
        .unwrap_or_else(|| OsStr::new("index"))
        .to_string_lossy()
        .into_owned()
}

/// Determine directory whose contents feed an entry file.
///
/// Falls back to the current directory for bare file names.
pub fn source_root(input: impl AsRef<Path>) -> PathBuf {
    match input.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Path cannot be shell expanded.
#[derive(Debug, thiserror::Error)]
#[error("cannot expand path {:?}", path.display())]
pub struct ExpandError {
    path: PathBuf,
    #[source]
    source: shellexpand::LookupError<std::env::VarError>,
}

/// Friendly result alias :3
pub type Result<T, E = ExpandError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[sealed_test(env = [("SITE", "/srv/site")])]
    fn expand_environment_variables() -> anyhow::Result<()> {
        assert_eq!(expand("$SITE/dist")?, PathBuf::from("/srv/site/dist"));
        Ok(())
    }

    #[sealed_test(env = [("ISLANDS_UNSET", "")])]
    fn expand_unset_variable_fails() {
        std::env::remove_var("ISLANDS_UNSET");
        assert!(expand("$ISLANDS_UNSET/dist").is_err());
    }

    #[test_case("src/Counter.tsx", "Counter"; "nested")]
    #[test_case("Menu.jsx", "Menu"; "bare")]
    #[test_case("lib/widget.server.ts", "widget.server"; "dotted")]
    #[test]
    fn chunk_name_is_file_stem(input: &str, expect: &str) {
        assert_eq!(chunk_name(input), expect);
    }

    #[test_case("src/Counter.tsx", "src"; "nested")]
    #[test_case("Menu.jsx", "."; "bare")]
    #[test]
    fn source_root_is_parent(input: &str, expect: &str) {
        assert_eq!(source_root(input), PathBuf::from(expect));
    }
}
