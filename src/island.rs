// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Island descriptors.
//!
//! An __island__ is a self-contained interactive component instance mounted
//! into an otherwise static page. The [`Island`] descriptor pairs a component
//! with fully resolved render options, and is created once when the component
//! is declared. Rendering is delegated to a [`Runtime`].
//!
//! # Anchors
//!
//! An island named `Counter` is mounted into every element carrying
//! `data-island="Counter"`, with initial props read from that element's
//! `data-props` attribute as JSON text:
//!
//! ```html
//! <div data-island="Counter" data-props='{"start": 5}'></div>
//! ```

use crate::{
    dom::Host,
    runtime::{anchor::Selector, bind::Component, RenderReport, RenderRequest, Runtime},
};

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Fully resolved render options of an island.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Hydrate pre-rendered markup unless a render request says otherwise.
    pub should_hydrate: bool,

    /// Bind every matching anchor instead of only the first.
    pub multiple: bool,

    /// Preserve each anchor's original markup as the component's children.
    pub keep_children: bool,

    /// Selector locating the island's anchors.
    pub selector: Selector,
}

/// Unresolved island options.
///
/// Unset fields take their default when the island is created: hydrate by
/// default, bind a single anchor, and drop original anchor markup.
///
/// Serialized keys are camel cased like the options of the browser package,
/// with snake cased aliases. Unknown keys are rejected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IslandOptions {
    #[serde(default, alias = "should_hydrate", skip_serializing_if = "Option::is_none")]
    pub should_hydrate: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,

    #[serde(default, alias = "keep_children", skip_serializing_if = "Option::is_none")]
    pub keep_children: Option<bool>,
}

/// Island descriptor.
#[derive(Clone)]
pub struct Island {
    name: String,
    component: Component,
    options: RenderOptions,
}

impl Island {
    /// Start building island with default options.
    pub fn builder(name: impl Into<String>, component: Component) -> IslandBuilder {
        IslandBuilder {
            name: name.into(),
            component,
            options: IslandOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn selector(&self) -> &Selector {
        &self.options.selector
    }

    /// Render island through runtime.
    pub fn render<H>(&self, runtime: &mut Runtime<H>, request: RenderRequest) -> RenderReport
    where
        H: Host,
    {
        runtime.render(self, request)
    }
}

impl Debug for Island {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Island")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Island`].
pub struct IslandBuilder {
    name: String,
    component: Component,
    options: IslandOptions,
}

impl IslandBuilder {
    pub fn should_hydrate(mut self, should_hydrate: bool) -> Self {
        self.options.should_hydrate = Some(should_hydrate);
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.options.multiple = Some(multiple);
        self
    }

    pub fn keep_children(mut self, keep_children: bool) -> Self {
        self.options.keep_children = Some(keep_children);
        self
    }

    /// Resolve options and create island.
    ///
    /// # Errors
    ///
    /// - Return [`IslandError::MissingName`] if name is blank.
    /// - Return [`IslandError::InvalidName`] if name cannot be used in a
    ///   selector.
    pub fn build(self) -> Result<Island> {
        create_island(self.name, self.component, self.options)
    }
}

/// Create island from component and options.
///
/// # Errors
///
/// - Return [`IslandError::MissingName`] if name is blank.
/// - Return [`IslandError::InvalidName`] if name contains a quote or a
///   backslash.
pub fn create_island(
    name: impl Into<String>,
    component: Component,
    options: IslandOptions,
) -> Result<Island> {
    let name = name.into();
    if name.trim().is_empty() {
        return Err(IslandError::MissingName);
    }

    if name.contains(&['"', '\\'][..]) {
        return Err(IslandError::InvalidName { name });
    }

    let options = RenderOptions {
        should_hydrate: options.should_hydrate.unwrap_or(true),
        multiple: options.multiple.unwrap_or(false),
        keep_children: options.keep_children.unwrap_or(false),
        selector: Selector::island(name.as_str()),
    };

    Ok(Island {
        name,
        component,
        options,
    })
}

/// Island creation error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IslandError {
    /// Island has no identifying name.
    #[error("island requires a non-empty name")]
    MissingName,

    /// Island name cannot be embedded into its selector.
    #[error("island name {name:?} cannot contain quotes or backslashes")]
    InvalidName { name: String },
}

/// Friendly result alias :3
pub type Result<T, E = IslandError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{bind::component, markup::Node};
    use simple_test_case::test_case;

    fn blank_component() -> Component {
        component(|_| Node::empty())
    }

    #[test]
    fn create_applies_defaults() -> anyhow::Result<()> {
        let island = create_island("Counter", blank_component(), IslandOptions::default())?;

        assert_eq!(
            island.options(),
            &RenderOptions {
                should_hydrate: true,
                multiple: false,
                keep_children: false,
                selector: Selector::island("Counter"),
            }
        );
        assert_eq!(island.selector().to_string(), r#"[data-island="Counter"]"#);

        Ok(())
    }

    #[test]
    fn builder_overrides_defaults() -> anyhow::Result<()> {
        let island = Island::builder("Menu", blank_component())
            .should_hydrate(false)
            .multiple(true)
            .keep_children(true)
            .build()?;

        let options = island.options();
        assert!(!options.should_hydrate);
        assert!(options.multiple);
        assert!(options.keep_children);

        Ok(())
    }

    #[test]
    fn options_deserialize_partially() -> anyhow::Result<()> {
        let options: IslandOptions = serde_json::from_str(r#"{"multiple": true}"#)?;
        let island = create_island("Menu", blank_component(), options)?;

        assert!(island.options().multiple);
        assert!(island.options().should_hydrate);

        Ok(())
    }

    #[test_case(r#"{"keepChildren": true, "shouldHydrate": false}"#; "camel case")]
    #[test_case(r#"{"keep_children": true, "should_hydrate": false}"#; "snake case")]
    #[test]
    fn options_accept_both_key_styles(json: &str) {
        let options: IslandOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.keep_children, Some(true));
        assert_eq!(options.should_hydrate, Some(false));
        assert_eq!(options.multiple, None);
    }

    #[test]
    fn options_reject_unknown_keys() {
        let result = serde_json::from_str::<IslandOptions>(r#"{"keepChildrens": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn options_serialize_camel_case() -> anyhow::Result<()> {
        let options = IslandOptions {
            keep_children: Some(true),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&options)?, r#"{"keepChildren":true}"#);

        Ok(())
    }

    #[test_case(""; "empty")]
    #[test_case("  \t"; "blank")]
    #[test]
    fn create_rejects_missing_name(name: &str) {
        let result = create_island(name, blank_component(), IslandOptions::default());
        assert_eq!(result.unwrap_err(), IslandError::MissingName);
    }

    #[test_case(r#"say"hi"#; "quote")]
    #[test_case(r"back\slash"; "backslash")]
    #[test]
    fn create_rejects_unselectable_name(name: &str) {
        let result = create_island(name, blank_component(), IslandOptions::default());
        assert!(matches!(result, Err(IslandError::InvalidName { .. })));
    }
}
