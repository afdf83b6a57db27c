// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Anchor resolution.
//!
//! An __anchor__ is an element of the host document marked to host an island
//! instance. Anchors are located through an attribute [`Selector`], and the
//! matches are narrowed according to the island's single-vs-multiple policy.

use crate::dom::Document;

use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::warn;

/// Attribute naming the island an anchor hosts.
pub const ISLAND_ATTRIBUTE: &str = "data-island";

/// Attribute equality selector, i.e., `[attribute="value"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    attribute: String,
    value: String,
}

impl Selector {
    /// Construct selector matching `attribute` exactly equal to `value`.
    pub fn attribute_equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Construct selector matching anchors of island `name`.
    pub fn island(name: impl Into<String>) -> Self {
        Self::attribute_equals(ISLAND_ATTRIBUTE, name)
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Check if an element's value for [`Self::attribute`] matches.
    pub fn matches(&self, value: Option<&str>) -> bool {
        value == Some(self.value.as_str())
    }
}

impl Display for Selector {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "[{}=\"{}\"]", self.attribute, self.value)
    }
}

/// Anchors resolved for a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<E> {
    /// Anchors to bind, in document order.
    pub anchors: Vec<E>,

    /// Diagnostic raised while resolving, if any.
    pub warning: Option<AnchorWarning>,
}

/// Resolve anchors for selector.
///
/// Queries all matching elements in document order. No match yields nothing
/// but a warning. Several matches without `multiple` yield only the first
/// match plus a warning.
pub fn resolve<D>(document: &D, selector: &Selector, multiple: bool) -> Resolution<D::Element>
where
    D: Document + ?Sized,
{
    let mut anchors = document.query_selector_all(selector);

    let warning = match anchors.len() {
        0 => Some(AnchorWarning::NotFound {
            selector: selector.clone(),
        }),
        count if count > 1 && !multiple => {
            anchors.truncate(1);
            Some(AnchorWarning::Multiple {
                selector: selector.clone(),
                count,
            })
        }
        _ => None,
    };

    if let Some(warning) = &warning {
        warn!("{warning}");
    }

    Resolution { anchors, warning }
}

/// Non-fatal anchor resolution diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnchorWarning {
    /// Nothing matched the selector.
    #[error("could not render island because DOM node ({selector}) could not be found")]
    NotFound { selector: Selector },

    /// Several elements matched, but the island only binds one.
    #[error(
        "{count} elements matched island selector ({selector}) but multiple was not enabled, \
         choosing first element as root"
    )]
    Multiple { selector: Selector, count: usize },
}
