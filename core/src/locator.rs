//! A device- and layout-resolvable predicate over node attributes.

use std::collections::BTreeMap;

use log::warn;

use crate::criterion::Criterion;
use crate::layout::{Layout, NodeId};
use crate::node::Node;

/// An unordered mapping from [`Criterion`] to identifier string, plus a
/// disambiguation index. Resolves to at most one node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Locator {
  pub criteria: BTreeMap<Criterion, String>,
  pub index: i32,
}

impl Locator {
  pub fn new(criteria: BTreeMap<Criterion, String>, index: i32) -> Self { Self { criteria, index } }

  pub fn single(criterion: Criterion, value: impl Into<String>, index: i32) -> Self {
    let mut criteria = BTreeMap::new();
    criteria.insert(criterion, value.into());
    Self { criteria, index }
  }

  fn node_matches(&self, node: &Node) -> bool {
    self.criteria.iter().all(|(criterion, identifier)| node.get(criterion.xml_attr()) == identifier)
  }

  /// Find the node at `self.index` among all nodes in `layout` satisfying
  /// every criterion, in document order.
  pub fn find_in_layout(&self, layout: &Layout) -> Option<NodeId> {
    let matched: Vec<NodeId> =
      layout.descendants().filter(|&id| layout.node(id).tag == "node" && self.node_matches(layout.node(id))).collect();
    matched.into_iter().nth(self.index.max(0) as usize)
  }

  /// Build a locator from a matched node's attributes, preferring
  /// `text`, then `content-desc`, then `resource-id`, falling back to
  /// `class`.
  pub fn from_node(node: &Node) -> Self {
    for (attr, criterion) in [("text", Criterion::Text), ("content-desc", Criterion::Desc), ("resource-id", Criterion::Id)]
    {
      let identifier = node.get(attr);
      if !identifier.is_empty() {
        return Self::single(criterion, identifier, node.attr_index(attr));
      }
    }
    Self::single(Criterion::Class, node.class(), node.attr_index("class"))
  }

  /// The u2-style keyword argument list, e.g. `(text='Documents', instance=1)`.
  pub fn render(&self) -> String {
    let mut parts: Vec<String> =
      self.criteria.iter().map(|(c, v)| format!("{}='{}'", c.external_name(), v)).collect();
    if self.index != 0 {
      parts.push(format!("instance={}", self.index));
    }
    format!("({})", parts.join(", "))
  }

  pub fn to_json(&self) -> serde_json::Value {
    let mut criteria = serde_json::Map::new();
    for (c, v) in &self.criteria {
      criteria.insert(c.wire_name().to_string(), serde_json::Value::String(v.clone()));
    }
    let mut obj = serde_json::Map::new();
    obj.insert("criteria".to_string(), serde_json::Value::Object(criteria));
    if self.index != 0 {
      obj.insert("index".to_string(), serde_json::Value::from(self.index));
    }
    serde_json::Value::Object(obj)
  }

  /// Unknown criterion names are dropped with a logged warning rather than
  /// treated as fatal.
  pub fn from_json(value: &serde_json::Value) -> Option<Self> {
    let obj = value.as_object()?;
    let criteria_obj = obj.get("criteria")?.as_object()?;
    let mut criteria = BTreeMap::new();
    for (k, v) in criteria_obj {
      let Some(value) = v.as_str() else { continue };
      match Criterion::from_wire_name(k) {
        Some(criterion) => {
          criteria.insert(criterion, value.to_string());
        }
        None => warn!("unknown criterion: {k}"),
      }
    }
    let index = obj.get("index").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
    Some(Self { criteria, index })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn finds_node_by_single_criterion() {
    let xml = r#"<hierarchy><node class="android.widget.TextView" text="a" resource-id="id/x" bounds="[0,0][10,10]"><node class="android.widget.TextView" text="b" resource-id="id/y" bounds="[0,0][10,10]"/></node></hierarchy>"#;
    let layout = Layout::parse(xml, None).expect("parses");
    let locator = Locator::single(Criterion::Text, "b", 0);
    assert!(locator.find_in_layout(&layout).is_some());
  }

  #[test]
  fn missing_criterion_value_resolves_to_none() {
    let xml = r#"<hierarchy><node class="android.widget.TextView" text="a" resource-id="id/x" bounds="[0,0][10,10]"/></hierarchy>"#;
    let layout = Layout::parse(xml, None).expect("parses");
    let locator = Locator::single(Criterion::Text, "nope", 0);
    assert!(locator.find_in_layout(&layout).is_none());
  }

  #[test]
  fn deserialize_drops_unknown_criterion() {
    let value: serde_json::Value =
      serde_json::from_str(r#"{"criteria":{"TEXT":"Documents","NAME":"bla"}}"#).unwrap();
    let locator = Locator::from_json(&value).expect("parses");
    assert_eq!(locator.criteria.len(), 1);
    assert_eq!(locator.criteria.get(&Criterion::Text), Some(&"Documents".to_string()));
    assert_eq!(locator.index, 0);
  }

  #[test]
  fn round_trips_through_json_when_all_criteria_recognized() {
    let locator = Locator::single(Criterion::Id, "android:id/id1", 2);
    let json = locator.to_json();
    let parsed = Locator::from_json(&json).expect("parses");
    assert_eq!(parsed, locator);
  }
}
