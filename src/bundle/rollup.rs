// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Rollup bundler driver.
//!
//! Each option set is written out as a rollup configuration module, which the
//! rollup command line then executes in a child process. Plugins map onto the
//! usual `@rollup/plugin-*` packages, except for the dependency virtualizer
//! which is generated inline, and the run-script-after-build step which the
//! build driver performs itself.

use crate::bundle::{
    codegen::virtual_entry,
    entry_file,
    options::{BundleOptions, OutputTarget, Plugin, VIRTUAL_ENTRY},
    BundleError, Bundler, EmittedFile, Result,
};

use futures::future::BoxFuture;
use serde_json::{json, Map, Value};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Bundler driving the rollup command line.
#[derive(Debug)]
pub struct RollupBundler {
    program: OsString,
    args: Vec<OsString>,
    config_dir: PathBuf,
    configs_written: AtomicUsize,
}

impl RollupBundler {
    /// Construct new rollup driver invoking rollup through npx.
    ///
    /// Generated configuration modules are written into `config_dir`.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self::with_command(config_dir, "npx", ["rollup"])
    }

    /// Construct new rollup driver with custom command.
    pub fn with_command(
        config_dir: impl Into<PathBuf>,
        program: impl Into<OsString>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            config_dir: config_dir.into(),
            configs_written: AtomicUsize::new(0),
        }
    }

    fn next_config_path(&self) -> PathBuf {
        let index = self.configs_written.fetch_add(1, Ordering::Relaxed);
        self.config_dir.join(format!("rollup.{index}.config.mjs"))
    }

    #[instrument(skip(self, options), fields(input = %options.input), level = "debug")]
    async fn run(&self, options: &BundleOptions) -> Result<Vec<EmittedFile>> {
        let path = self.next_config_path();
        let module = config_module(options)?;
        tokio::fs::write(&path, module)
            .await
            .map_err(|source| BundleError::WriteConfig {
                source,
                path: path.clone(),
            })?;

        debug!("run rollup with {:?}", path.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--config")
            .arg(&path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BundleError::Spawn {
                source,
                program: self.program.to_string_lossy().into_owned(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(BundleError::Failed {
                status: output.status,
                stderr,
            });
        }

        if !stdout.trim().is_empty() {
            info!("{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            debug!("{}", stderr.trim_end());
        }

        let entry = entry_file(options);
        if !entry.path.exists() {
            warn!("rollup did not emit {:?}", entry.path.display());
        }

        Ok(vec![entry])
    }
}

impl Bundler for RollupBundler {
    fn compile<'a>(&'a self, options: &'a BundleOptions) -> BoxFuture<'a, Result<Vec<EmittedFile>>> {
        Box::pin(self.run(options))
    }
}

/// Render option set as rollup configuration module.
///
/// # Errors
///
/// - Return [`BundleError::Serialize`] if options cannot be encoded as JSON.
pub fn config_module(options: &BundleOptions) -> Result<String> {
    let mut imports = Vec::new();
    let mut plugins = Vec::new();
    for plugin in &options.plugins {
        if let Some((import, call)) = plugin_expression(plugin)? {
            if let Some(import) = import {
                if !imports.contains(&import) {
                    imports.push(import);
                }
            }
            plugins.push(call);
        }
    }

    let mut module = String::new();
    for import in imports {
        module.push_str(import);
        module.push('\n');
    }

    let settings = json!({
        "input": options.input,
        "external": options.external,
        "jsx": options.jsx,
        "output": output_object(options),
    });
    module.push_str(&format!(
        "\nexport default {{\n  ...{},\n  plugins: [\n    {}\n  ],\n}};\n",
        serde_json::to_string_pretty(&settings)?,
        plugins.join(",\n    "),
    ));

    Ok(module)
}

fn output_object(options: &BundleOptions) -> Value {
    let output = &options.output;
    let mut object = Map::new();
    object.insert("name".into(), json!(output.name));
    object.insert("format".into(), json!(output.format));
    object.insert("globals".into(), json!(output.globals));
    match &output.target {
        OutputTarget::File(file) => {
            object.insert("file".into(), json!(path_string(file)));
        }
        OutputTarget::Dir {
            dir,
            entry_file_names,
        } => {
            object.insert("dir".into(), json!(path_string(dir)));
            object.insert("entryFileNames".into(), json!(entry_file_names));
        }
    }
    if let Some(banner) = &output.banner {
        object.insert("banner".into(), json!(banner));
    }
    if let Some(footer) = &output.footer {
        object.insert("footer".into(), json!(footer));
    }

    Value::Object(object)
}

type PluginExpression = (Option<&'static str>, String);

fn plugin_expression(plugin: &Plugin) -> Result<Option<PluginExpression>> {
    let expression = match plugin {
        Plugin::Resolve { extensions } if extensions.is_empty() => (
            Some(r#"import resolve from "@rollup/plugin-node-resolve";"#),
            "resolve()".to_string(),
        ),
        Plugin::Resolve { extensions } => (
            Some(r#"import resolve from "@rollup/plugin-node-resolve";"#),
            format!("resolve({})", json!({ "extensions": extensions })),
        ),
        Plugin::CommonJs => (
            Some(r#"import commonjs from "@rollup/plugin-commonjs";"#),
            "commonjs()".to_string(),
        ),
        Plugin::TypeScript { jsx, out_dir } => (
            Some(r#"import typescript from "@rollup/plugin-typescript";"#),
            format!(
                "typescript({})",
                json!({
                    "outputToFilesystem": false,
                    "noForceEmit": true,
                    "compilerOptions": { "outDir": path_string(out_dir), "jsx": jsx },
                })
            ),
        ),
        Plugin::TypeScriptPaths => (
            Some(r#"import { typescriptPaths } from "rollup-plugin-typescript-paths";"#),
            "typescriptPaths()".to_string(),
        ),
        Plugin::Replace { values } => (
            Some(r#"import replace from "@rollup/plugin-replace";"#),
            format!(
                "replace({})",
                json!({ "preventAssignment": true, "values": values })
            ),
        ),
        Plugin::Terser => (
            Some(r#"import terser from "@rollup/plugin-terser";"#),
            "terser()".to_string(),
        ),
        Plugin::VirtualizeDependencies {
            dependencies,
            namespace,
        } => (
            None,
            virtualize_plugin(&virtual_entry(namespace, dependencies))?,
        ),
        Plugin::RunScriptAfterBuild { .. } => return Ok(None),
    };

    Ok(Some(expression))
}

fn virtualize_plugin(source: &str) -> Result<String> {
    let id = serde_json::to_string(VIRTUAL_ENTRY)?;
    let resolved = serde_json::to_string(&format!("\0{VIRTUAL_ENTRY}"))?;
    let source = serde_json::to_string(source)?;

    Ok(format!(
        "{{ name: \"virtualize-dependency\", \
         resolveId: (source) => (source === {id} ? {resolved} : null), \
         load: (id) => (id === {resolved} ? {source} : null) }}"
    ))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bundle::options::{common_options, island_server_options},
        config::IslandsConfig,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn config() -> crate::config::NormalizedConfig {
        IslandsConfig {
            output: Some("dist".into()),
            minify: Some(true),
            common: Some(vec!["react".into()]),
            islands: BTreeMap::from([("Counter".to_string(), PathBuf::from("src/Counter.tsx"))]),
            ..Default::default()
        }
        .normalize()
        .unwrap()
    }

    #[test]
    fn common_module_inlines_virtual_entry() -> anyhow::Result<()> {
        let module = config_module(&common_options(&config()))?;

        assert!(module.starts_with("import replace from \"@rollup/plugin-replace\";\n"));
        assert!(module.contains("import terser from \"@rollup/plugin-terser\";"));
        assert!(module.contains("name: \"virtualize-dependency\""));
        assert!(module.contains("Islands._Common.React = React"));
        assert!(module.contains("\"file\": \"dist/common.js\""));
        assert!(module.contains("resolve()"));

        Ok(())
    }

    #[test]
    fn server_module_skips_run_script_step() -> anyhow::Result<()> {
        let config = config();
        let module = config_module(&island_server_options(&config.target("Counter").unwrap()))?;

        assert!(!module.contains("RunScriptAfterBuild"));
        assert!(module.contains("\"entryFileNames\": \"[name]/server.cjs\""));
        assert!(module.contains("\"format\": \"cjs\""));
        assert!(module.contains("\"extensions\":[\".cjs\""));

        Ok(())
    }

    #[test]
    fn imports_are_not_duplicated() -> anyhow::Result<()> {
        let mut options = common_options(&config());
        options.plugins.push(Plugin::CommonJs);

        let module = config_module(&options)?;
        assert_eq!(module.matches("@rollup/plugin-commonjs").count(), 1);
        assert_eq!(module.matches("commonjs()").count(), 2);

        Ok(())
    }

    #[test]
    fn config_paths_are_unique() {
        let bundler = RollupBundler::new("/tmp/scratch");
        let first = bundler.next_config_path();
        let second = bundler.next_config_path();

        assert_ne!(first, second);
        assert!(first.starts_with("/tmp/scratch"));
    }
}
