// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! JavaScript snippets injected into bundles.

use std::collections::BTreeMap;

/// Line-oriented JavaScript builder.
///
/// Lines are joined with ";\n" on output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodeGen {
    lines: Vec<String>,
}

impl CodeGen {
    /// Construct new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Import every export of package under an identifier.
    ///
    /// The identifier defaults to [`package_name_to_property`] of the package.
    pub fn import(self, package: &str, alias: Option<&str>) -> Self {
        let alias = alias
            .map(ToString::to_string)
            .unwrap_or_else(|| package_name_to_property(package));

        self.add(format!("import * as {alias} from \"{package}\""))
    }

    /// Import package, and expose it under a global name.
    pub fn globalise(self, package: &str, global: &str) -> Self {
        let property = package_name_to_property(package);
        self.import(package, Some(&property))
            .add(format!("{global} = {property}"))
    }

    /// Make sure every level of a dotted scope exists on `window`.
    pub fn create_global_object(self, scope: &str) -> Self {
        let levels = scope
            .split('.')
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .collect::<Vec<_>>();

        let lines = (1..=levels.len()).map(|depth| {
            let path = format!("window.{}", levels[..depth].join("."));
            format!("{path} = {path} || {{}}")
        });

        self.extend(lines)
    }

    /// Assign property of a global scope.
    pub fn set_global_object_property(self, scope: &str, key: &str, value: &str) -> Self {
        self.add(format!("window.{scope}['{key}'] = {value}"))
    }

    pub fn add(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn extend(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn out(&self) -> String {
        self.lines.join(";\n")
    }
}

/// Convert package name into a JavaScript identifier.
///
/// Drops a leading "@", turns "/" into "_", camel cases across "-" and "_",
/// and capitalizes the first letter, e.g., "react-dom/client" becomes
/// "ReactDomClient".
pub fn package_name_to_property(package: &str) -> String {
    let package = package.strip_prefix('@').unwrap_or(package);
    let mut out = String::with_capacity(package.len());
    let mut chars = package.chars().map(|ch| if ch == '/' { '_' } else { ch });

    while let Some(ch) = chars.next() {
        if ch == '-' || ch == '_' {
            match chars.next() {
                Some(next) => out.extend(next.to_uppercase()),
                None => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }

    let mut rest = out.chars();
    match rest.next() {
        Some(first) if first.is_ascii_lowercase() => {
            format!("{}{}", first.to_ascii_uppercase(), rest.as_str())
        }
        _ => out,
    }
}

/// Source of the virtual entry module of the common dependencies bundle.
///
/// Creates the namespace, then imports each dependency and exposes it under
/// its global name.
pub fn virtual_entry(namespace: &str, dependencies: &BTreeMap<String, String>) -> String {
    let code = dependencies
        .iter()
        .fold(CodeGen::new().create_global_object(namespace), |code, (package, global)| {
            code.globalise(package, global)
        });

    format!("{};\n", code.out())
}

/// Footer of a client bundle that renders its island on load.
pub fn client_footer(name: &str) -> String {
    format!("\nwindow.Islands['{name}']?.render('{name}')")
}

/// Footer of a server bundle that renders its component to a file.
///
/// The file is written next to the bundle itself.
pub fn render_component_to_file(filename: &str) -> String {
    format!(
        "var server = require('react-dom/server');\n\
         var fs = require('node:fs/promises');\n\
         var path = require('node:path');\n\
         const html = server.renderToString( module.exports.component( {{}} ) );\n\
         const file = path.resolve(__dirname, '{filename}');\n\
         fs.writeFile(file, html, {{ flag: \"w+\" }});"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use simple_test_case::test_case;

    #[test_case("react", "React"; "plain")]
    #[test_case("react-dom/client", "ReactDomClient"; "scoped path")]
    #[test_case("react/jsx-runtime", "ReactJsxRuntime"; "nested dash")]
    #[test_case("@wrdagency/react-islands", "WrdagencyReactIslands"; "at scope")]
    #[test_case("lodash_es", "LodashEs"; "underscore")]
    #[test]
    fn package_names_become_properties(package: &str, expect: &str) {
        assert_eq!(package_name_to_property(package), expect);
    }

    #[test]
    fn create_global_object_per_level() {
        let result = CodeGen::new().create_global_object("Islands._Common").out();
        let expect = indoc! {"
            window.Islands = window.Islands || {};
            window.Islands._Common = window.Islands._Common || {}"};

        assert_eq!(result, expect);
    }

    #[test]
    fn create_global_object_ignores_empty_levels() {
        let result = CodeGen::new().create_global_object(" Islands. .Foo ").out();
        let expect = indoc! {"
            window.Islands = window.Islands || {};
            window.Islands.Foo = window.Islands.Foo || {}"};

        assert_eq!(result, expect);
    }

    #[test]
    fn virtual_entry_globalises_dependencies() {
        let dependencies = BTreeMap::from([
            ("react".to_string(), "Islands._Common.React".to_string()),
            (
                "react-dom/client".to_string(),
                "Islands._Common.ReactDomClient".to_string(),
            ),
        ]);

        let result = virtual_entry("Islands._Common", &dependencies);
        let expect = indoc! {r#"
            window.Islands = window.Islands || {};
            window.Islands._Common = window.Islands._Common || {};
            import * as React from "react";
            Islands._Common.React = React;
            import * as ReactDomClient from "react-dom/client";
            Islands._Common.ReactDomClient = ReactDomClient;
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn set_global_property() {
        let result = CodeGen::new()
            .set_global_object_property("Islands", "Counter", "Counter")
            .out();
        assert_eq!(result, "window.Islands['Counter'] = Counter");
    }

    #[test]
    fn client_footer_renders_island() {
        assert_eq!(
            client_footer("Counter"),
            "\nwindow.Islands['Counter']?.render('Counter')"
        );
    }
}
