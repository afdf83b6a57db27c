// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Virtual markup trees.
//!
//! Island components do not talk to a host document directly. Instead they
//! return a small tree of [`Node`]s that a [`Host`](crate::dom::Host) mounts
//! into an anchor, or that [`render_to_string`] turns into static markup for
//! pre-rendering.
//!
//! # Preserved Markup
//!
//! An anchor's original inner markup can be carried into a component as a
//! [`Node::Raw`] child. Hosts treat this node as a placeholder whose markup is
//! swapped in exactly once, on first mount of the root that owns it. Later
//! updates of the same root keep whatever markup was injected on mount.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Elements that never carry children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Node of a virtual markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element with attributes and children.
    Element(Element),

    /// Text content, escaped on output.
    Text(String),

    /// Sequence of sibling nodes without a wrapping element.
    Fragment(Vec<Node>),

    /// Captured raw markup injected once on mount.
    Raw(PreservedMarkup),
}

impl Node {
    /// Construct text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Construct empty fragment.
    pub fn empty() -> Self {
        Self::Fragment(Vec::new())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<PreservedMarkup> for Node {
    fn from(markup: PreservedMarkup) -> Self {
        Self::Raw(markup)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl Display for Node {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(render_to_string(self).as_str())
    }
}

/// Markup element.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Construct new element with no attributes or children.
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

    /// Append child node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Append listing of child nodes.
    pub fn children(mut self, nodes: impl IntoIterator<Item = impl Into<Node>>) -> Self {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Raw markup captured from an anchor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreservedMarkup {
    html: String,
}

impl PreservedMarkup {
    /// Markup emitted in place of the raw content before it is injected.
    pub const PLACEHOLDER: &'static str = "<script></script>";

    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }
}

/// Render tree to static markup.
///
/// Raw nodes render as their placeholder since no mount effect ever runs
/// during static rendering.
pub fn render_to_string(node: &Node) -> String {
    render_with(node, |_| PreservedMarkup::PLACEHOLDER.to_string())
}

/// Render tree to markup, resolving each raw node through `inject`.
///
/// Raw nodes are visited in document order, which lets hosts pair each raw
/// node with the markup they injected for it on mount.
pub fn render_with<F>(node: &Node, mut inject: F) -> String
where
    F: FnMut(&PreservedMarkup) -> String,
{
    let mut out = String::new();
    write_node(node, &mut out, &mut inject);
    out
}

fn write_node(node: &Node, out: &mut String, inject: &mut dyn FnMut(&PreservedMarkup) -> String) {
    match node {
        Node::Text(text) => escape_into(text, out, false),
        Node::Raw(markup) => out.push_str(inject(markup).as_str()),
        Node::Fragment(nodes) => {
            for node in nodes {
                write_node(node, out, inject);
            }
        }
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, out, true);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                return;
            }

            for child in &element.children {
                write_node(child, out, inject);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, out: &mut String, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_nested_elements() {
        let tree = Node::from(
            Element::new("div")
                .attr("class", "card")
                .child(Element::new("h1").child("Hello"))
                .child(Element::new("br"))
                .child("tail"),
        );

        assert_eq!(
            render_to_string(&tree),
            r#"<div class="card"><h1>Hello</h1><br>tail</div>"#
        );
    }

    #[test]
    fn render_escapes_text_and_attributes() {
        let tree = Node::from(
            Element::new("span")
                .attr("title", r#"say "hi" & <leave>"#)
                .child("1 < 2 && \"quoted\""),
        );

        assert_eq!(
            render_to_string(&tree),
            r#"<span title="say &quot;hi&quot; &amp; &lt;leave&gt;">1 &lt; 2 &amp;&amp; "quoted"</span>"#
        );
    }

    #[test]
    fn attr_replaces_existing_value() {
        let element = Element::new("a").attr("href", "/one").attr("href", "/two");
        assert_eq!(element.attribute("href"), Some("/two"));
        assert_eq!(render_to_string(&element.into()), r#"<a href="/two"></a>"#);
    }

    #[test]
    fn raw_markup_renders_placeholder_statically() {
        let tree = Node::from(Element::new("div").child(PreservedMarkup::new("<p>old</p>")));
        assert_eq!(render_to_string(&tree), "<div><script></script></div>");
    }

    #[test]
    fn render_with_visits_raw_nodes_in_order() {
        let tree = Node::Fragment(vec![
            PreservedMarkup::new("<b>1</b>").into(),
            Element::new("i").child(PreservedMarkup::new("<b>2</b>")).into(),
        ]);

        let mut seen = Vec::new();
        let html = render_with(&tree, |markup| {
            seen.push(markup.as_str().to_string());
            markup.as_str().to_string()
        });

        assert_eq!(seen, vec!["<b>1</b>".to_string(), "<b>2</b>".to_string()]);
        assert_eq!(html, "<b>1</b><i><b>2</b></i>");
    }
}
