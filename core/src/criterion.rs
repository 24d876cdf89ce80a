//! The four attributes a [`crate::locator::Locator`] can constrain on.

use serde::{Deserialize, Serialize};

use crate::node::{ATTR_CLASS, ATTR_CONTENT_DESC, ATTR_RESOURCE_ID, ATTR_TEXT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Criterion {
  Id,
  Desc,
  Class,
  Text,
}

impl Criterion {
  /// The XML attribute this criterion reads.
  pub fn xml_attr(self) -> &'static str {
    match self {
      Criterion::Id => ATTR_RESOURCE_ID,
      Criterion::Desc => ATTR_CONTENT_DESC,
      Criterion::Class => ATTR_CLASS,
      Criterion::Text => ATTR_TEXT,
    }
  }

  /// The external parameter name used in locator/event JSON and repaired
  /// script output.
  pub fn external_name(self) -> &'static str {
    match self {
      Criterion::Id => "resourceId",
      Criterion::Desc => "description",
      Criterion::Class => "className",
      Criterion::Text => "text",
    }
  }

  /// Parse a wire-format criterion name (`"ID"`, `"DESC"`, `"CLASS"`,
  /// `"TEXT"`). Unknown names return `None`; callers drop the field with a
  /// logged warning rather than treat it as fatal.
  pub fn from_wire_name(name: &str) -> Option<Self> {
    match name {
      "ID" => Some(Criterion::Id),
      "DESC" => Some(Criterion::Desc),
      "CLASS" => Some(Criterion::Class),
      "TEXT" => Some(Criterion::Text),
      _ => None,
    }
  }

  pub fn wire_name(self) -> &'static str {
    match self {
      Criterion::Id => "ID",
      Criterion::Desc => "DESC",
      Criterion::Class => "CLASS",
      Criterion::Text => "TEXT",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn orders_id_before_text() {
    assert!(Criterion::Id < Criterion::Desc);
    assert!(Criterion::Desc < Criterion::Class);
    assert!(Criterion::Class < Criterion::Text);
  }

  #[test]
  fn round_trips_wire_names() {
    for c in [Criterion::Id, Criterion::Desc, Criterion::Class, Criterion::Text] {
      assert_eq!(Criterion::from_wire_name(c.wire_name()), Some(c));
    }
    assert_eq!(Criterion::from_wire_name("NAME"), None);
  }
}
