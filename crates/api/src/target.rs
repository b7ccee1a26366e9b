//! Target specification for commands.
//!
//! Scripts name the items they create. Commands then refer to items by
//! name, by pick/grab/focus role, or through a structural query.

use serde::{Deserialize, Serialize};

/// Specifies which items a command targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The canvas root group.
    Root,

    /// One item by name.
    Item(String),

    /// Several items by name, in the given order.
    Items(Vec<String>),

    /// The item under the pointer, if any.
    Current,

    /// The item holding the pointer grab, if any.
    Grabbed,

    /// The item holding the keyboard focus, if any.
    Focused,

    /// Items matching a structural query.
    Query(ItemQuery),
}

impl Default for Target {
    fn default() -> Self {
        Self::Root
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::Item(name.to_owned())
    }
}

impl From<Vec<String>> for Target {
    fn from(names: Vec<String>) -> Self {
        Self::Items(names)
    }
}

/// Query to find items by their place in the tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemQuery {
    /// The topmost item at a world point, honouring the pick tolerance.
    At { x: f64, y: f64 },

    /// Direct children of the target groups, back to front.
    ChildrenOf(Box<Target>),

    /// Parents of the target items.
    ParentOf(Box<Target>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_targets_serialize_as_strings() {
        assert_eq!(serde_json::to_value(Target::Root).unwrap(), "root");
        assert_eq!(serde_json::to_value(Target::Current).unwrap(), "current");
    }

    #[test]
    fn named_target_deserializes() {
        let target: Target = serde_json::from_str(r#"{"item": "button"}"#).unwrap();
        assert_eq!(target, Target::from("button"));
    }

    #[test]
    fn nested_query_deserializes() {
        let target: Target =
            serde_json::from_str(r#"{"query": {"children_of": {"item": "toolbar"}}}"#).unwrap();
        assert_eq!(
            target,
            Target::Query(ItemQuery::ChildrenOf(Box::new(Target::from("toolbar"))))
        );

        let target: Target =
            serde_json::from_str(r#"{"query": {"at": {"x": 5, "y": 7.5}}}"#).unwrap();
        assert_eq!(target, Target::Query(ItemQuery::At { x: 5.0, y: 7.5 }));
    }
}
