// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bundler option sets.
//!
//! Translate the islands configuration into the option sets handed to a
//! [`Bundler`](crate::bundle::Bundler). A build produces one option set for
//! the common dependencies bundle, and for each island a client option set,
//! plus a server option set when static pre-rendering is enabled.
//!
//! # Bundle Layout
//!
//! - `<output>/common.js`: shared packages exposed under `Islands._Common`.
//! - `<output>/<chunk>/client.js`: browser bundle of an island. Shared
//!   packages are external, and resolved from `Islands._Common`.
//! - `<output>/<chunk>/server.cjs`: server bundle of an island. Running it
//!   writes `<output>/<chunk>/ssg.html`, and it is deleted afterwards.

use crate::{
    bundle::codegen::{client_footer, package_name_to_property, render_component_to_file},
    config::{IslandTarget, JsxPreset, NormalizedConfig},
};

use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf};

/// Namespace of the common dependencies bundle.
pub const COMMON_NAMESPACE: &str = "Islands._Common";

/// Entry id of the generated common dependencies module.
pub const VIRTUAL_ENTRY: &str = "virtual-entry";

/// File name of a pre-rendered island next to its bundles.
pub const SSG_FILE: &str = "ssg.html";

/// Extensions resolved when bundling island sources.
pub const RESOLVE_EXTENSIONS: &[&str] =
    &[".cjs", ".mjs", ".js", ".json", ".node", ".jsx", ".ts", ".tsx"];

/// Options for one bundler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleOptions {
    pub input: String,
    pub external: Vec<String>,
    pub jsx: JsxPreset,
    pub output: OutputOptions,
    pub plugins: Vec<Plugin>,
}

impl BundleOptions {
    /// Check if options include plugin matching predicate.
    pub fn has_plugin(&self, predicate: impl Fn(&Plugin) -> bool) -> bool {
        self.plugins.iter().any(predicate)
    }
}

/// Output half of [`BundleOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputOptions {
    /// Global variable the bundle is assigned to.
    pub name: String,
    pub format: ModuleFormat,

    /// External packages mapped to the global expressions replacing them.
    pub globals: BTreeMap<String, String>,
    pub target: OutputTarget,
    pub banner: Option<String>,
    pub footer: Option<String>,
}

/// Module format of emitted bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// Self-executing function for browsers.
    Iife,

    /// CommonJS module for node.
    Cjs,
}

/// Where emitted bundles go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputTarget {
    /// Single file.
    File(PathBuf),

    /// Directory, with entry file names following a pattern with a `[name]`
    /// placeholder for the chunk name.
    Dir {
        dir: PathBuf,
        entry_file_names: String,
    },
}

/// Bundler plugins and their settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "plugin")]
pub enum Plugin {
    /// Node module resolution.
    Resolve { extensions: Vec<String> },

    /// CommonJS to ES module conversion.
    CommonJs,

    /// TypeScript compilation.
    TypeScript { jsx: JsxPreset, out_dir: PathBuf },

    /// TypeScript path alias resolution.
    TypeScriptPaths,

    /// Identifier replacement.
    Replace { values: BTreeMap<String, String> },

    /// Minification.
    Terser,

    /// Generated entry module exposing dependencies under a namespace.
    VirtualizeDependencies {
        dependencies: BTreeMap<String, String>,
        namespace: String,
    },

    /// Execute emitted entry chunks once written.
    RunScriptAfterBuild { delete_after_running: bool },
}

/// Map common packages to their global under [`COMMON_NAMESPACE`].
pub fn common_dependencies(common: &[String]) -> BTreeMap<String, String> {
    common
        .iter()
        .map(|package| {
            (
                package.clone(),
                format!("{COMMON_NAMESPACE}.{}", package_name_to_property(package)),
            )
        })
        .collect()
}

/// Options of the common dependencies bundle.
pub fn common_options(config: &NormalizedConfig) -> BundleOptions {
    let mut plugins = vec![
        production_replace(BTreeMap::new()),
        Plugin::VirtualizeDependencies {
            dependencies: common_dependencies(&config.common),
            namespace: COMMON_NAMESPACE.into(),
        },
        Plugin::Resolve {
            extensions: Vec::new(),
        },
        Plugin::CommonJs,
    ];
    if config.minify {
        plugins.push(Plugin::Terser);
    }

    BundleOptions {
        input: VIRTUAL_ENTRY.into(),
        external: Vec::new(),
        jsx: config.jsx,
        output: OutputOptions {
            name: COMMON_NAMESPACE.into(),
            format: ModuleFormat::Iife,
            globals: BTreeMap::new(),
            target: OutputTarget::File(config.output.join("common.js")),
            banner: None,
            footer: None,
        },
        plugins,
    }
}

/// Options of an island's client bundle.
pub fn island_client_options(target: &IslandTarget<'_>) -> BundleOptions {
    let globals = target
        .config
        .common
        .iter()
        .map(|package| {
            (
                package.clone(),
                format!(
                    "{COMMON_NAMESPACE}[\"{}\"]",
                    package_name_to_property(package)
                ),
            )
        })
        .collect();

    island_options_with(
        target,
        IslandBundle {
            file_name: "client.js",
            format: ModuleFormat::Iife,
            globals,
            footer: client_footer(target.name),
            plugins: Vec::new(),
        },
    )
}

/// Options of an island's server bundle.
pub fn island_server_options(target: &IslandTarget<'_>) -> BundleOptions {
    island_options_with(
        target,
        IslandBundle {
            file_name: "server.cjs",
            format: ModuleFormat::Cjs,
            globals: BTreeMap::new(),
            footer: render_component_to_file(SSG_FILE),
            plugins: vec![Plugin::RunScriptAfterBuild {
                delete_after_running: true,
            }],
        },
    )
}

/// Options of every bundle of an island.
pub fn island_options(target: &IslandTarget<'_>) -> Vec<BundleOptions> {
    let mut options = vec![island_client_options(target)];
    if target.config.ssg {
        options.push(island_server_options(target));
    }

    options
}

struct IslandBundle {
    file_name: &'static str,
    format: ModuleFormat,
    globals: BTreeMap<String, String>,
    footer: String,
    plugins: Vec<Plugin>,
}

fn island_options_with(target: &IslandTarget<'_>, bundle: IslandBundle) -> BundleOptions {
    let config = target.config;

    let mut plugins = vec![
        Plugin::Resolve {
            extensions: RESOLVE_EXTENSIONS.iter().map(ToString::to_string).collect(),
        },
        Plugin::CommonJs,
    ];
    if config.typescript {
        plugins.push(Plugin::TypeScript {
            jsx: config.jsx,
            out_dir: config.output.clone(),
        });
        plugins.push(Plugin::TypeScriptPaths);
    }
    plugins.push(production_replace(config.define.clone()));
    if config.minify {
        plugins.push(Plugin::Terser);
    }
    plugins.extend(bundle.plugins);

    BundleOptions {
        input: target.input.to_string_lossy().into_owned(),
        external: bundle.globals.keys().cloned().collect(),
        jsx: config.jsx,
        output: OutputOptions {
            name: format!("Islands.{}", target.name),
            format: bundle.format,
            globals: bundle.globals,
            target: OutputTarget::Dir {
                dir: config.output.clone(),
                entry_file_names: format!("[name]/{}", bundle.file_name),
            },
            banner: None,
            footer: Some(bundle.footer),
        },
        plugins,
    }
}

// INVARIANT: NODE_ENV is always production in emitted bundles, and cannot be
// overridden through defines.
fn production_replace(mut values: BTreeMap<String, String>) -> Plugin {
    values.insert("process.env.NODE_ENV".into(), "\"production\"".into());
    Plugin::Replace { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IslandsConfig;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn config(ssg: bool, minify: bool, typescript: bool) -> NormalizedConfig {
        IslandsConfig {
            output: Some("dist".into()),
            ssg: Some(ssg),
            minify: Some(minify),
            typescript: Some(typescript),
            common: Some(vec!["react".into(), "react-dom/client".into()]),
            define: Some(BTreeMap::from([(
                "__API__".to_string(),
                "\"/api\"".to_string(),
            )])),
            islands: BTreeMap::from([("Counter".to_string(), PathBuf::from("src/Counter.tsx"))]),
            ..Default::default()
        }
        .normalize()
        .unwrap()
    }

    #[test]
    fn common_dependencies_use_namespace() {
        let result = common_dependencies(&["react".into(), "@scope/ui-kit".into()]);
        let expect = BTreeMap::from([
            ("@scope/ui-kit".to_string(), "Islands._Common.ScopeUiKit".to_string()),
            ("react".to_string(), "Islands._Common.React".to_string()),
        ]);

        assert_eq!(result, expect);
    }

    #[test]
    fn common_bundle_is_single_iife_file() {
        let options = common_options(&config(true, true, false));

        assert_eq!(options.input, VIRTUAL_ENTRY);
        assert_eq!(options.output.name, COMMON_NAMESPACE);
        assert_eq!(options.output.format, ModuleFormat::Iife);
        assert_eq!(
            options.output.target,
            OutputTarget::File(Path::new("dist").join("common.js"))
        );
        assert!(options.has_plugin(|plugin| matches!(plugin, Plugin::Terser)));
        assert!(options.has_plugin(|plugin| matches!(
            plugin,
            Plugin::VirtualizeDependencies { dependencies, .. } if dependencies.len() == 2
        )));
    }

    #[test]
    fn client_bundle_externalizes_common_packages() {
        let config = config(true, false, false);
        let target = config.target("Counter").unwrap();
        let options = island_client_options(&target);

        assert_eq!(options.input, "src/Counter.tsx");
        assert_eq!(options.external, vec!["react", "react-dom/client"]);
        assert_eq!(
            options.output.globals,
            BTreeMap::from([
                ("react".to_string(), "Islands._Common[\"React\"]".to_string()),
                (
                    "react-dom/client".to_string(),
                    "Islands._Common[\"ReactDomClient\"]".to_string()
                ),
            ])
        );
        assert_eq!(options.output.name, "Islands.Counter");
        assert_eq!(
            options.output.target,
            OutputTarget::Dir {
                dir: PathBuf::from("dist"),
                entry_file_names: "[name]/client.js".into(),
            }
        );
        assert_eq!(
            options.output.footer.as_deref(),
            Some("\nwindow.Islands['Counter']?.render('Counter')")
        );
        assert!(!options.has_plugin(|plugin| matches!(plugin, Plugin::Terser)));
    }

    #[test]
    fn replace_merges_defines_with_node_env() {
        let config = config(false, false, false);
        let options = island_client_options(&config.target("Counter").unwrap());

        let values = options.plugins.iter().find_map(|plugin| match plugin {
            Plugin::Replace { values } => Some(values.clone()),
            _ => None,
        });
        assert_eq!(
            values,
            Some(BTreeMap::from([
                ("__API__".to_string(), "\"/api\"".to_string()),
                ("process.env.NODE_ENV".to_string(), "\"production\"".to_string()),
            ]))
        );
    }

    #[test]
    fn typescript_adds_compiler_plugins() {
        let config = config(false, false, true);
        let options = island_client_options(&config.target("Counter").unwrap());

        assert!(options.has_plugin(|plugin| matches!(plugin, Plugin::TypeScript { .. })));
        assert!(options.has_plugin(|plugin| matches!(plugin, Plugin::TypeScriptPaths)));
    }

    #[test]
    fn server_bundle_only_with_ssg() {
        let with_ssg = config(true, false, false);
        let options = island_options(&with_ssg.target("Counter").unwrap());
        assert_eq!(options.len(), 2);

        let server = &options[1];
        assert_eq!(server.output.format, ModuleFormat::Cjs);
        assert!(server.external.is_empty());
        assert!(server.has_plugin(|plugin| matches!(
            plugin,
            Plugin::RunScriptAfterBuild {
                delete_after_running: true
            }
        )));
        assert!(server
            .output
            .footer
            .as_deref()
            .is_some_and(|footer| footer.contains("'ssg.html'")));

        let without_ssg = config(false, false, false);
        assert_eq!(island_options(&without_ssg.target("Counter").unwrap()).len(), 1);
    }
}
