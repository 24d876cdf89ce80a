//! A single UI Automator hierarchy element: a bag of string attributes plus
//! the derived fields preprocessing adds.

use ahash::HashMap;

pub const TAG_HIERARCHY: &str = "hierarchy";
pub const TAG_NODE: &str = "node";

pub const ATTR_RESOURCE_ID: &str = "resource-id";
pub const ATTR_CONTENT_DESC: &str = "content-desc";
pub const ATTR_TEXT: &str = "text";
pub const ATTR_CLASS: &str = "class";
pub const ATTR_PACKAGE: &str = "package";
pub const ATTR_CLICKABLE: &str = "clickable";
pub const ATTR_BOUNDS: &str = "bounds";

/// Attributes `denote_index` assigns an occurrence index to.
pub const INDEXED_ATTRS: [&str; 4] = [ATTR_CLASS, ATTR_RESOURCE_ID, ATTR_CONTENT_DESC, ATTR_TEXT];

/// A parsed `<node>` or the `<hierarchy>` root, with both the attributes read
/// from XML and the `x,y,w,h`/`<attr>-index` fields preprocessing derives.
#[derive(Debug, Clone, Default)]
pub struct Node {
  pub tag: String,
  attrs: HashMap<String, String>,
}

impl Node {
  pub fn new(tag: impl Into<String>) -> Self { Self { tag: tag.into(), attrs: HashMap::default() } }

  pub fn get(&self, key: &str) -> &str { self.attrs.get(key).map(String::as_str).unwrap_or("") }

  pub fn get_i32(&self, key: &str) -> i32 { self.attrs.get(key).and_then(|v| v.parse().ok()).unwrap_or(0) }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.attrs.insert(key.into(), value.into());
  }

  pub fn set_i32(&mut self, key: impl Into<String>, value: i32) { self.set(key, value.to_string()); }

  pub fn is_hierarchy(&self) -> bool { self.tag == TAG_HIERARCHY }

  pub fn resource_id(&self) -> &str { self.get(ATTR_RESOURCE_ID) }
  pub fn content_desc(&self) -> &str { self.get(ATTR_CONTENT_DESC) }
  pub fn text(&self) -> &str { self.get(ATTR_TEXT) }
  pub fn class(&self) -> &str { self.get(ATTR_CLASS) }
  pub fn package(&self) -> &str { self.get(ATTR_PACKAGE) }
  pub fn bounds(&self) -> &str { self.get(ATTR_BOUNDS) }
  pub fn clickable(&self) -> bool { self.get(ATTR_CLICKABLE) == "true" }

  pub fn x(&self) -> i32 { self.get_i32("x") }
  pub fn y(&self) -> i32 { self.get_i32("y") }
  pub fn w(&self) -> i32 { self.get_i32("w") }
  pub fn h(&self) -> i32 { self.get_i32("h") }

  pub fn coordinate(&self) -> uidrift_geom::Coordinate {
    uidrift_geom::Coordinate::new(self.x(), self.y(), self.x() + self.w(), self.y() + self.h())
  }

  /// The occurrence index written for attribute `attr` by `denote_index`.
  pub fn attr_index(&self, attr: &str) -> i32 { self.get_i32(&format!("{attr}-index")) }

  pub fn set_attr_index(&mut self, attr: &str, index: i32) { self.set_i32(format!("{attr}-index"), index); }

  /// Iterate attributes in a stable, sorted order: used for canonical XML
  /// equality comparisons.
  pub fn sorted_attrs(&self) -> Vec<(&str, &str)> {
    let mut kv: Vec<(&str, &str)> = self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    kv.sort_unstable_by_key(|(k, _)| *k);
    kv
  }
}
