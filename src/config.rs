// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the islands configuration file to simplify the
//! process of serialization and deserialization. The configuration names every
//! island to build along with its entry file, and holds the settings shared by
//! all islands.
//!
//! # Formats
//!
//! The configuration is plain JSON by default, i.e., `islands.config.json`.
//! Files with a ".toml" extension are read as TOML instead:
//!
//! ```toml
//! output = "./dist/"
//! minify = true
//! common = ["react", "react-dom/client"]
//!
//! [islands]
//! Counter = "src/Counter.tsx"
//! ```

use crate::path::{self, ExpandError, DEFAULT_OUTPUT_DIR};

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Packages shared through the common dependencies bundle by default.
pub const DEFAULT_COMMON: &[&str] = &[
    "react",
    "react/jsx-runtime",
    "react-dom/client",
    "@wrdagency/react-islands",
];

/// Islands configuration layout.
///
/// Every field except the island listing is optional. Missing fields take
/// their default during [normalization](IslandsConfig::normalize).
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct IslandsConfig {
    /// Directory to write bundles to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Minify emitted bundles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    /// Statically pre-render each island through a server bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssg: Option<bool>,

    /// JSX transform preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsx: Option<JsxPreset>,

    /// Compile TypeScript entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typescript: Option<bool>,

    /// Packages to share through the common dependencies bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<Vec<String>>,

    /// Replacement values for identifiers in island sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub define: Option<BTreeMap<String, String>>,

    /// Island names mapped to their entry files.
    pub islands: BTreeMap<String, PathBuf>,
}

impl IslandsConfig {
    /// Parse JSON configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Json`] if JSON is malformed.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Parse TOML configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Deserialize`] if TOML is malformed.
    pub fn from_toml(data: &str) -> Result<Self> {
        Ok(toml::de::from_str(data)?)
    }

    /// Fill in defaults, and expand paths.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if the output path or any
    ///   island entry path cannot be expanded.
    pub fn normalize(self) -> Result<NormalizedConfig> {
        let output = path::expand(
            self.output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        )?;

        let islands = self
            .islands
            .into_iter()
            .map(|(name, input)| -> Result<(String, PathBuf)> {
                Ok((name, path::expand(input)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(NormalizedConfig {
            islands,
            output,
            minify: self.minify.unwrap_or(true),
            ssg: self.ssg.unwrap_or(true),
            jsx: self.jsx.unwrap_or_default(),
            typescript: self.typescript.unwrap_or(false),
            common: self
                .common
                .unwrap_or_else(|| DEFAULT_COMMON.iter().map(ToString::to_string).collect()),
            define: self.define.unwrap_or_default(),
        })
    }
}

impl FromStr for IslandsConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Self::from_toml(data)
    }
}

impl Display for IslandsConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Read configuration file.
///
/// Files ending in ".toml" are parsed as TOML, anything else as JSON.
///
/// # Errors
///
/// - Return [`ConfigError::Read`] if file cannot be read.
/// - Return [`ConfigError::Json`] or [`ConfigError::Deserialize`] if file
///   content is malformed.
#[instrument(skip(path), level = "debug")]
pub fn read_config(path: impl AsRef<Path>) -> Result<IslandsConfig> {
    let path = path.as_ref();
    debug!("read configuration from {:?}", path.display());
    let data = read_to_string(path).map_err(|source| ConfigError::Read {
        source,
        path: path.to_path_buf(),
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => IslandsConfig::from_toml(&data),
        _ => IslandsConfig::from_json(&data),
    }
}

/// JSX transform presets.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JsxPreset {
    /// Classic `React.createElement` calls.
    React,

    /// Automatic `react/jsx-runtime` imports.
    #[default]
    ReactJsx,

    /// Leave JSX untouched.
    Preserve,

    /// Leave JSX untouched, but keep React in scope.
    PreserveReact,
}

/// Configuration with every default filled in.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NormalizedConfig {
    pub islands: BTreeMap<String, PathBuf>,
    pub output: PathBuf,
    pub minify: bool,
    pub ssg: bool,
    pub jsx: JsxPreset,
    pub typescript: bool,
    pub common: Vec<String>,
    pub define: BTreeMap<String, String>,
}

impl NormalizedConfig {
    /// List build targets of every island in name order.
    pub fn targets(&self) -> impl Iterator<Item = IslandTarget<'_>> {
        self.islands.iter().map(move |(name, input)| IslandTarget {
            name,
            input,
            config: self,
        })
    }

    /// Lookup build target of island.
    pub fn target(&self, name: &str) -> Option<IslandTarget<'_>> {
        self.islands
            .get_key_value(name)
            .map(|(name, input)| IslandTarget {
                name,
                input,
                config: self,
            })
    }
}

/// Build target of a single island.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IslandTarget<'a> {
    pub name: &'a str,
    pub input: &'a Path,
    pub config: &'a NormalizedConfig,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize JSON configuration.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Failed to deserialize TOML configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] ExpandError),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn deserialize_json_config() -> anyhow::Result<()> {
        let result = IslandsConfig::from_json(
            r#"{
                "islands": {"Counter": "src/Counter.tsx", "Menu": "src/Menu.tsx"},
                "output": "./public/islands/",
                "minify": false,
                "ssg": null,
                "jsx": "preserve-react",
                "common": ["react"],
                "define": {"__VERSION__": "\"1.0.0\""}
            }"#,
        )?;

        let expect = IslandsConfig {
            output: Some("./public/islands/".into()),
            minify: Some(false),
            ssg: None,
            jsx: Some(JsxPreset::PreserveReact),
            typescript: None,
            common: Some(vec!["react".into()]),
            define: Some(BTreeMap::from([(
                "__VERSION__".to_string(),
                "\"1.0.0\"".to_string(),
            )])),
            islands: BTreeMap::from([
                ("Counter".to_string(), PathBuf::from("src/Counter.tsx")),
                ("Menu".to_string(), PathBuf::from("src/Menu.tsx")),
            ]),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_toml_config() -> anyhow::Result<()> {
        let result: IslandsConfig = indoc! {r#"
            typescript = true
            jsx = "react"

            [islands]
            Counter = "src/Counter.tsx"
        "#}
        .parse()?;

        assert_eq!(result.typescript, Some(true));
        assert_eq!(result.jsx, Some(JsxPreset::React));
        assert_eq!(
            result.islands,
            BTreeMap::from([("Counter".to_string(), PathBuf::from("src/Counter.tsx"))])
        );

        Ok(())
    }

    #[test]
    fn missing_islands_is_an_error() {
        assert!(matches!(
            IslandsConfig::from_json(r#"{"output": "dist"}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn serialize_config() {
        let result = IslandsConfig {
            output: Some("./dist/".into()),
            minify: Some(false),
            islands: BTreeMap::from([("Counter".to_string(), PathBuf::from("src/Counter.tsx"))]),
            ..Default::default()
        }
        .to_string();

        let expect = indoc! {r#"
            output = "./dist/"
            minify = false

            [islands]
            Counter = "src/Counter.tsx"
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn normalize_fills_defaults() -> anyhow::Result<()> {
        let result = IslandsConfig {
            islands: BTreeMap::from([("Counter".to_string(), PathBuf::from("src/Counter.tsx"))]),
            ..Default::default()
        }
        .normalize()?;

        let expect = NormalizedConfig {
            islands: BTreeMap::from([("Counter".to_string(), PathBuf::from("src/Counter.tsx"))]),
            output: PathBuf::from("./dist/"),
            minify: true,
            ssg: true,
            jsx: JsxPreset::ReactJsx,
            typescript: false,
            common: DEFAULT_COMMON.iter().map(ToString::to_string).collect(),
            define: BTreeMap::new(),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn normalize_keeps_typescript_apart_from_ssg() -> anyhow::Result<()> {
        let result = IslandsConfig {
            ssg: Some(true),
            typescript: Some(false),
            ..Default::default()
        }
        .normalize()?;

        assert!(result.ssg);
        assert!(!result.typescript);

        Ok(())
    }

    #[sealed_test(env = [("SITE", "/srv/site")])]
    fn normalize_expands_paths() -> anyhow::Result<()> {
        let result = IslandsConfig {
            output: Some("$SITE/dist".into()),
            islands: BTreeMap::from([("Counter".to_string(), PathBuf::from("$SITE/src/Counter.tsx"))]),
            ..Default::default()
        }
        .normalize()?;

        assert_eq!(result.output, PathBuf::from("/srv/site/dist"));
        assert_eq!(
            result.target("Counter").map(|target| target.input),
            Some(Path::new("/srv/site/src/Counter.tsx"))
        );

        Ok(())
    }

    #[test]
    fn targets_follow_name_order() -> anyhow::Result<()> {
        let config = IslandsConfig {
            islands: BTreeMap::from([
                ("Menu".to_string(), PathBuf::from("src/Menu.tsx")),
                ("Counter".to_string(), PathBuf::from("src/Counter.tsx")),
            ]),
            ..Default::default()
        }
        .normalize()?;

        let names = config.targets().map(|target| target.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["Counter", "Menu"]);

        Ok(())
    }
}
