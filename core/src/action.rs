//! The fixed set of interaction/assertion kinds a recorded step can carry.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
  Click,
  LongClick,
  SetText,
  Exist,
  NotExist,
  Equal,
  NotEqual,
  Back,
  Swipe,
}

impl Action {
  pub fn is_assertion(self) -> bool {
    matches!(self, Action::Exist | Action::NotExist | Action::Equal | Action::NotEqual)
  }

  /// Actions that carry no locator: they act on the device or current
  /// screen directly.
  pub fn needs_locator(self) -> bool { !matches!(self, Action::Back | Action::Swipe) }

  pub fn wire_name(self) -> &'static str {
    match self {
      Action::Click => "CLICK",
      Action::LongClick => "LONG_CLICK",
      Action::SetText => "SET_TEXT",
      Action::Exist => "EXIST",
      Action::NotExist => "NOT_EXIST",
      Action::Equal => "EQUAL",
      Action::NotEqual => "NOT_EQUAL",
      Action::Back => "BACK",
      Action::Swipe => "SWIPE",
    }
  }

  pub fn from_wire_name(name: &str) -> Option<Self> {
    Some(match name {
      "CLICK" => Action::Click,
      "LONG_CLICK" => Action::LongClick,
      "SET_TEXT" => Action::SetText,
      "EXIST" => Action::Exist,
      "NOT_EXIST" => Action::NotExist,
      "EQUAL" => Action::Equal,
      "NOT_EQUAL" => Action::NotEqual,
      "BACK" => Action::Back,
      "SWIPE" => Action::Swipe,
      _ => return None,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_assertions() {
    assert!(Action::Exist.is_assertion());
    assert!(Action::NotEqual.is_assertion());
    assert!(!Action::Click.is_assertion());
  }

  #[test]
  fn back_and_swipe_need_no_locator() {
    assert!(!Action::Back.needs_locator());
    assert!(!Action::Swipe.needs_locator());
    assert!(Action::Click.needs_locator());
  }

  #[test]
  fn round_trips_wire_names() {
    for a in
      [Action::Click, Action::LongClick, Action::SetText, Action::Exist, Action::NotExist, Action::Equal, Action::NotEqual, Action::Back, Action::Swipe]
    {
      assert_eq!(Action::from_wire_name(a.wire_name()), Some(a));
    }
  }
}
