// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Island props and their attribute encoding.
//!
//! Anchors carry their initial props as JSON text inside the
//! [`PROPS_ATTRIBUTE`] attribute. Decoding is tolerant: absent payloads mean
//! no props, and malformed payloads fall back to no props with a warning.

use crate::runtime::markup::Node;

use serde_json::{Map, Value};
use tracing::warn;

/// Attribute holding serialized props on an anchor.
pub const PROPS_ATTRIBUTE: &str = "data-props";

/// Props handed to an island component.
///
/// Holds a string-keyed JSON object, plus an optional children slot that is
/// never part of the serialized payload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Props {
    values: Map<String, Value>,
    children: Option<Node>,
}

impl Props {
    /// Construct empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert value, returning the previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Insert value in builder fashion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn children(&self) -> Option<&Node> {
        self.children.as_ref()
    }

    pub fn set_children(&mut self, children: impl Into<Node>) {
        self.children = Some(children.into());
    }

    /// Check if there are neither values nor children.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_none()
    }

    /// Layer `fixed` over these props.
    ///
    /// Keys present in `fixed` replace keys of `self`, and children set in
    /// `fixed` replace children of `self`.
    pub fn overridden_by(mut self, fixed: &Props) -> Self {
        for (key, value) in &fixed.values {
            self.values.insert(key.clone(), value.clone());
        }

        if let Some(children) = &fixed.children {
            self.children = Some(children.clone());
        }

        self
    }
}

impl From<Map<String, Value>> for Props {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values,
            children: None,
        }
    }
}

/// Decode props attribute strictly.
///
/// Absent and empty payloads, as well as a literal `null`, decode to empty
/// props.
///
/// # Errors
///
/// - Return [`PropsError::Parse`] if payload is not valid JSON.
/// - Return [`PropsError::NotAnObject`] if payload is valid JSON, but not an
///   object.
pub fn decode(raw: Option<&str>) -> Result<Props> {
    let json = match raw {
        Some(json) if !json.is_empty() => json,
        _ => return Ok(Props::new()),
    };

    match serde_json::from_str::<Value>(json)? {
        Value::Object(values) => Ok(Props::from(values)),
        Value::Null => Ok(Props::new()),
        _ => Err(PropsError::NotAnObject { json: json.into() }),
    }
}

/// Decode props attribute, falling back to empty props on failure.
///
/// The failure, if any, is logged as a warning and handed back to the caller
/// so it can be reported.
pub fn decode_or_default(raw: Option<&str>) -> (Props, Option<PropsError>) {
    match decode(raw) {
        Ok(props) => (props, None),
        Err(error) => {
            warn!("could not parse JSON props for island: {error}");
            (Props::new(), Some(error))
        }
    }
}

/// Props decoding error types.
#[derive(Debug, thiserror::Error)]
pub enum PropsError {
    /// Payload is not valid JSON.
    #[error(transparent)]
    Parse(#[from] serde_json::Error),

    /// Payload is valid JSON, but not a dictionary object.
    #[error("parsed JSON is not a valid dictionary object: '{json}'")]
    NotAnObject { json: String },
}

/// Friendly result alias :3
pub type Result<T, E = PropsError> = std::result::Result<T, E>;
