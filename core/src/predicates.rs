//! Node classification and attribute-comparison predicates. Everything here
//! operates on preprocessed nodes (see [`crate::layout::preprocess`]).

use std::sync::OnceLock;

use regex::Regex;
use uidrift_algo::similarity_ratio;
use uidrift_geom::{is_cover, is_overlap};

use crate::node::{ATTR_CONTENT_DESC, ATTR_RESOURCE_ID, ATTR_TEXT, Node};

const LIST_CLASSES: [&str; 8] = [
  "android.view.ViewGroup",
  "android.widget.GridView",
  "android.widget.ListView",
  "android.widget.FrameLayout",
  "android.widget.GridLayout",
  "android.widget.LinearLayout",
  "android.widget.RelativeLayout",
  "androidx.recyclerview.widget.RecyclerView",
];

const MAX_CHILD_AREA_FACTOR: f64 = 0.6;
const SCREEN_AREA_BASIS: f64 = 1080.0 * 1920.0;
const EDIT_TEXT_CLASS: &str = "android.widget.EditText";
const RADIO_BUTTON_CLASS: &str = "android.widget.RadioButton";
const CHECK_BOX_CLASS: &str = "android.widget.CheckBox";
const SWITCH_CLASS: &str = "android.widget.Switch";
const IME_RESOURCE_PREFIX: &str = "com.google.android.inputmethod";

pub fn is_list(n: &Node) -> bool { LIST_CLASSES.contains(&n.class()) }

/// A leaf node that's a plausible tap/long-press target.
pub fn is_child(n: &Node, has_children: bool) -> bool {
  if has_children || is_list(n) {
    return false;
  }
  let (w, h) = (n.w(), n.h());
  if w <= 0 || h <= 0 {
    return false;
  }
  if n.resource_id().starts_with(IME_RESOURCE_PREFIX) {
    return false;
  }
  if (w as f64) * (h as f64) >= SCREEN_AREA_BASIS * MAX_CHILD_AREA_FACTOR {
    return false;
  }
  let has_text = !n.text().is_empty();
  let has_any_label = has_text || !n.content_desc().is_empty() || !n.resource_id().is_empty();
  let big_enough = w >= 15 && h >= 15;
  has_text || has_any_label || big_enough
}

/// A node worth treating as a match-refinement scope.
pub fn is_parent(n: &Node, has_children: bool) -> bool {
  n.w() > 0
    && n.h() > 0
    && (!n.resource_id().is_empty() || !n.content_desc().is_empty())
    && (has_children || is_list(n))
}

fn normalize(s: &str) -> String { uidrift_algo::normalize_whitespace(&s.to_lowercase()) }

fn resource_id_prefix_pattern() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)*:id/").expect("static pattern")
  })
}

fn strip_resource_id_prefix(name: &str, value: &str) -> String {
  if name == ATTR_RESOURCE_ID {
    resource_id_prefix_pattern().replace(value, "").into_owned()
  } else {
    value.to_string()
  }
}

fn read_normalized_stripped(n: &Node, name: &str) -> String { normalize(&strip_resource_id_prefix(name, n.get(name))) }

/// Case/whitespace-normalized equality on a named attribute. Empty on
/// either side counts as "no equality". Unlike `attr_like`, this does not
/// strip a `resource-id` prefix.
pub fn attr_equal(a: &Node, b: &Node, name1: &str, name2: Option<&str>) -> bool {
  let va = normalize(a.get(name1));
  let vb = normalize(b.get(name2.unwrap_or(name1)));
  if va.is_empty() || vb.is_empty() {
    return false;
  }
  va == vb
}

const SIMILARITY_THRESHOLD: f64 = 0.70;

/// Levenshtein-ratio similarity, with `resource-id` prefix stripping.
pub fn attr_like(a: &Node, b: &Node, name1: &str, name2: Option<&str>) -> bool {
  let va = read_normalized_stripped(a, name1);
  let vb = read_normalized_stripped(b, name2.unwrap_or(name1));
  if va.is_empty() || vb.is_empty() {
    return false;
  }
  similarity_ratio(&va, &vb) >= SIMILARITY_THRESHOLD
}

/// Count of `{resource-id, content-desc, text}` equalities; `strict` needs
/// 2+, non-strict needs 1+.
pub fn is_match(a: &Node, b: &Node, strict: bool) -> bool {
  let count = [ATTR_RESOURCE_ID, ATTR_CONTENT_DESC, ATTR_TEXT]
    .into_iter()
    .filter(|name| attr_equal(a, b, name, None))
    .count();
  if strict { count >= 2 } else { count >= 1 }
}

pub fn is_like(a: &Node, b: &Node, strict: bool) -> bool {
  let both_text_desc_empty =
    a.text().is_empty() && b.text().is_empty() && a.content_desc().is_empty() && b.content_desc().is_empty();
  if both_text_desc_empty
    && attr_like(a, b, ATTR_RESOURCE_ID, None)
    && a.class() == b.class()
    && a.class() == EDIT_TEXT_CLASS
  {
    return true;
  }

  let id_ok = attr_like(a, b, ATTR_RESOURCE_ID, None) || !strict;
  if id_ok
    && (attr_like(a, b, ATTR_TEXT, None)
      || attr_like(a, b, ATTR_CONTENT_DESC, None)
      || attr_like(a, b, ATTR_TEXT, Some(ATTR_CONTENT_DESC))
      || attr_like(a, b, ATTR_CONTENT_DESC, Some(ATTR_TEXT)))
  {
    return true;
  }

  let cross_equal = attr_equal(a, b, ATTR_TEXT, Some(ATTR_CONTENT_DESC))
    || attr_equal(a, b, ATTR_CONTENT_DESC, Some(ATTR_TEXT));
  if cross_equal && a.class() != RADIO_BUTTON_CLASS && b.class() != RADIO_BUTTON_CLASS {
    return true;
  }

  false
}

/// Classes the keypoint-match and candidate-generation phases skip because
/// they carry their own, more reliable signals.
pub fn is_skippable_for_geometric_match(class: &str) -> bool {
  matches!(class, CHECK_BOX_CLASS | EDIT_TEXT_CLASS | SWITCH_CLASS)
}

pub use uidrift_geom::is_in_bound;

/// Re-exported so callers doing geometry comparisons stay in this module.
pub fn covers(a: &Node, b: &Node) -> bool { is_cover(a.coordinate(), b.coordinate()) }
pub fn overlaps(a: &Node, b: &Node) -> bool { is_overlap(a.coordinate(), b.coordinate()) }

#[cfg(test)]
mod tests {
  use super::*;

  fn node(attrs: &[(&str, &str)]) -> Node {
    let mut n = Node::new("node");
    for (k, v) in attrs {
      n.set(*k, *v);
    }
    n
  }

  #[test]
  fn attr_equal_requires_nonempty_both_sides() {
    let a = node(&[("resource-id", "android:id/id1")]);
    let b = node(&[("resource-id", "android:id/id1")]);
    assert!(attr_equal(&a, &b, "resource-id", None));
    let c = node(&[("text", "text1")]);
    let d = node(&[("text", "text2")]);
    assert!(!attr_equal(&c, &d, "text", None));
  }

  #[test]
  fn attr_like_strips_resource_id_prefix_and_uses_ratio() {
    let a = node(&[("resource-id", "com.veniosg.dir:id/primary_info")]);
    let b = node(&[("resource-id", "com.other.pkg:id/primary_info")]);
    assert!(attr_like(&a, &b, "resource-id", None));
  }

  #[test]
  fn attr_like_text_ratio_matches_near_misses() {
    let a = node(&[("text", "text1")]);
    let b = node(&[("text", "text2")]);
    assert!(attr_like(&a, &b, "text", None));
  }

  #[test]
  fn is_match_strict_needs_two_equalities() {
    let a = node(&[("resource-id", "id/a"), ("text", "Documents")]);
    let b = node(&[("resource-id", "id/a"), ("text", "Documents")]);
    assert!(is_match(&a, &b, true));
    let c = node(&[("resource-id", "id/a"), ("text", "Other")]);
    assert!(!is_match(&a, &c, true));
    assert!(is_match(&a, &c, false));
  }

  #[test]
  fn strict_match_implies_non_strict() {
    let a = node(&[("resource-id", "id/a"), ("text", "Documents")]);
    let b = node(&[("resource-id", "id/a"), ("text", "Documents")]);
    assert!(is_match(&a, &b, true));
    assert!(is_match(&a, &b, false));
  }
}
