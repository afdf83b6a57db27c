// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Component binding.

use crate::runtime::{markup::Node, props::Props};

use std::sync::Arc;

/// Stateless island component.
pub type Component = Arc<dyn Fn(&Props) -> Node + Send + Sync>;

/// Wrap closure as [`Component`].
pub fn component<F>(render: F) -> Component
where
    F: Fn(&Props) -> Node + Send + Sync + 'static,
{
    Arc::new(render)
}

/// Bind fixed props to a component.
///
/// The returned component layers `fixed` over whatever props it is called
/// with before calling `base`, so fixed props win on key collision. Handy for
/// deriving several variants of one component to use as separate islands.
pub fn with_props(base: Component, fixed: Props) -> Component {
    Arc::new(move |props: &Props| base(&props.clone().overridden_by(&fixed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::markup::Element;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn recording() -> (Component, Arc<Mutex<Vec<Props>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let base = component(move |props| {
            sink.lock().unwrap().push(props.clone());
            Element::new("div").into()
        });

        (base, seen)
    }

    #[test]
    fn fixed_props_override_caller_props() {
        let (base, seen) = recording();
        let bound = with_props(base, Props::new().with("a", 1));

        bound(&Props::new().with("a", 2).with("b", 3));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            Value::Object(seen[0].values().clone()),
            json!({"a": 1, "b": 3})
        );
    }

    #[test]
    fn binding_is_lazy() {
        let (base, seen) = recording();
        let _bound = with_props(base, Props::new().with("a", 1));

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn bound_output_matches_base() {
        let base = component(|props| {
            let label = props.get("label").and_then(Value::as_str).unwrap_or("none");
            Element::new("span").child(label).into()
        });
        let bound = with_props(base, Props::new().with("label", "fixed"));

        assert_eq!(
            bound(&Props::new().with("label", "caller")).to_string(),
            "<span>fixed</span>"
        );
    }
}
