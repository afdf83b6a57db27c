// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host document access.
//!
//! Islands are mounted into a host document through two layers of
//! indirection. A [`Document`] answers queries: which elements match a
//! selector, what their attributes are, and what markup they currently hold.
//! A [`Host`] additionally owns render roots: it creates or hydrates a root on
//! an anchor, renders markup trees into it, and unmounts it again.
//!
//! [`MemoryDocument`] implements both layers over a flat in-memory list of
//! elements. It backs server-side execution and tests.

use crate::runtime::{
    anchor::Selector,
    markup::{render_with, Node},
};

use std::{fmt::Debug, hash::Hash};
use tracing::{debug, warn};

/// Read access to a host document.
pub trait Document {
    /// Handle to an element of the document.
    type Element: Clone + Eq + Hash + Debug;

    /// List all elements matching selector in document order.
    fn query_selector_all(&self, selector: &Selector) -> Vec<Self::Element>;

    /// Read attribute of element.
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Read current inner markup of element.
    fn inner_html(&self, element: &Self::Element) -> String;
}

/// Render root management on top of a host document.
pub trait Host: Document {
    /// Handle to a mounted render root.
    type Root: Clone + Debug;

    /// Create fresh root on anchor. Nothing is rendered until [`Host::render`].
    fn create_root(&mut self, anchor: &Self::Element) -> Result<Self::Root>;

    /// Render tree into root.
    fn render(&mut self, root: &Self::Root, tree: Node) -> Result<()>;

    /// Hydrate existing markup of anchor with tree.
    fn hydrate_root(&mut self, anchor: &Self::Element, tree: Node) -> Result<Self::Root>;

    /// Unmount root, clearing its anchor.
    fn unmount(&mut self, root: Self::Root) -> Result<()>;
}

/// Element handle of [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Root handle of [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootId(usize);

/// How a root came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    /// Fresh root, anchor markup replaced on render.
    Created,

    /// Root adopting markup already present in the anchor.
    Hydrated,
}

/// Element of [`MemoryDocument`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryElement {
    tag: String,
    attributes: Vec<(String, String)>,
    inner_html: String,
}

impl MemoryElement {
    /// Construct new element with no attributes and no content.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set attribute, replacing any previous value of the same name.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }

        self
    }

    /// Set inner markup.
    pub fn inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = html.into();
        self
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
struct MemoryRoot {
    anchor: ElementId,
    kind: MountKind,
    mounted: bool,

    // Markup injected for each raw node on first render, in document order.
    injected: Vec<String>,
}

/// In-memory host document.
///
/// Elements form a flat list in document order. Nesting is not modeled: each
/// element only keeps its inner markup as text, which is all anchors need.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocument {
    elements: Vec<MemoryElement>,
    roots: Vec<MemoryRoot>,
}

impl MemoryDocument {
    /// Construct new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append element to end of document.
    pub fn append(&mut self, element: MemoryElement) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    /// Render element along with its inner markup.
    pub fn outer_html(&self, element: ElementId) -> Option<String> {
        let element = self.elements.get(element.0)?;
        let mut out = format!("<{}", element.tag);
        for (name, value) in &element.attributes {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push_str(&format!(">{}</{}>", element.inner_html, element.tag));

        Some(out)
    }

    /// List roots currently mounted on anchor.
    pub fn live_roots(&self, anchor: ElementId) -> Vec<RootId> {
        self.roots
            .iter()
            .enumerate()
            .filter(|(_, root)| root.mounted && root.anchor == anchor)
            .map(|(index, _)| RootId(index))
            .collect()
    }

    /// Count every root ever created or hydrated.
    pub fn roots_created(&self) -> usize {
        self.roots.len()
    }

    /// Determine how root was mounted.
    pub fn mount_kind(&self, root: RootId) -> Option<MountKind> {
        self.roots.get(root.0).map(|root| root.kind)
    }

    /// Check if root is still mounted.
    pub fn is_mounted(&self, root: RootId) -> bool {
        self.roots.get(root.0).is_some_and(|root| root.mounted)
    }

    fn element(&self, element: ElementId) -> Result<&MemoryElement> {
        self.elements
            .get(element.0)
            .ok_or(HostError::UnknownElement(element.0))
    }

    fn open_root(&mut self, anchor: ElementId, kind: MountKind) -> Result<RootId> {
        self.element(anchor)?;
        if !self.live_roots(anchor).is_empty() {
            warn!("anchor {anchor:?} already has a mounted root");
        }

        self.roots.push(MemoryRoot {
            anchor,
            kind,
            mounted: true,
            injected: Vec::new(),
        });

        Ok(RootId(self.roots.len() - 1))
    }

    fn paint(&mut self, root: RootId, tree: &Node) -> Result<String> {
        let state = self
            .roots
            .get_mut(root.0)
            .ok_or(HostError::UnknownRoot(root.0))?;
        if !state.mounted {
            return Err(HostError::Unmounted(root.0));
        }

        // INVARIANT: Raw markup is injected once per root.
        //   - First render records what each raw node injected.
        //   - Later renders reuse the recorded markup regardless of the tree.
        let mut cursor = 0;
        let injected = &mut state.injected;
        let html = render_with(tree, |markup| {
            let html = match injected.get(cursor) {
                Some(html) => html.clone(),
                None => {
                    injected.push(markup.as_str().to_string());
                    markup.as_str().to_string()
                }
            };
            cursor += 1;
            html
        });

        Ok(html)
    }
}

impl Document for MemoryDocument {
    type Element = ElementId;

    fn query_selector_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| selector.matches(element.attribute(selector.attribute())))
            .map(|(index, _)| ElementId(index))
            .collect()
    }

    fn attribute(&self, element: &ElementId, name: &str) -> Option<String> {
        self.elements
            .get(element.0)
            .and_then(|element| element.attribute(name))
            .map(ToString::to_string)
    }

    fn inner_html(&self, element: &ElementId) -> String {
        self.elements
            .get(element.0)
            .map(|element| element.inner_html.clone())
            .unwrap_or_default()
    }
}

impl Host for MemoryDocument {
    type Root = RootId;

    fn create_root(&mut self, anchor: &ElementId) -> Result<RootId> {
        debug!("create root on {anchor:?}");
        self.open_root(*anchor, MountKind::Created)
    }

    fn render(&mut self, root: &RootId, tree: Node) -> Result<()> {
        let html = self.paint(*root, &tree)?;
        let anchor = self.roots[root.0].anchor;
        self.elements[anchor.0].inner_html = html;

        Ok(())
    }

    fn hydrate_root(&mut self, anchor: &ElementId, tree: Node) -> Result<RootId> {
        debug!("hydrate root on {anchor:?}");
        let root = self.open_root(*anchor, MountKind::Hydrated)?;
        let html = self.paint(root, &tree)?;

        let existing = &self.elements[anchor.0].inner_html;
        if !existing.trim().is_empty() && *existing != html {
            warn!("hydration of {anchor:?} does not match existing markup, patching it");
        }
        self.elements[anchor.0].inner_html = html;

        Ok(root)
    }

    fn unmount(&mut self, root: RootId) -> Result<()> {
        let state = self
            .roots
            .get_mut(root.0)
            .ok_or(HostError::UnknownRoot(root.0))?;
        if !state.mounted {
            return Err(HostError::Unmounted(root.0));
        }

        debug!("unmount root {root:?} from {:?}", state.anchor);
        state.mounted = false;
        let anchor = state.anchor;
        self.elements[anchor.0].inner_html.clear();

        Ok(())
    }
}

/// Host error types.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Element handle does not belong to the document.
    #[error("element #{0} does not exist")]
    UnknownElement(usize),

    /// Root handle does not belong to the host.
    #[error("root #{0} does not exist")]
    UnknownRoot(usize),

    /// Root was already unmounted.
    #[error("root #{0} is no longer mounted")]
    Unmounted(usize),

    /// Failure reported by a host backend.
    #[error("host backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Friendly result alias :3
pub type Result<T, E = HostError> = std::result::Result<T, E>;
