//! `Ui` / `Step` / `TestCase`: a recorded interaction together with the UI
//! snapshots surrounding it.

use crate::event::Event;

/// A UI snapshot: hierarchy XML paired with a screenshot. Either or both
/// may be empty (synthetic steps carry no UI at all).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ui {
  pub xml: String,
  pub png: Vec<u8>,
}

impl Ui {
  pub fn new(xml: impl Into<String>, png: impl Into<Vec<u8>>) -> Self { Self { xml: xml.into(), png: png.into() } }

  pub fn is_empty(&self) -> bool { self.xml.is_empty() && self.png.is_empty() }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
  pub event: Event,
  pub ui_before: Ui,
  pub ui_after: Ui,
}

impl Step {
  pub fn new(event: Event, ui_before: Ui, ui_after: Ui) -> Self { Self { event, ui_before, ui_after } }

  /// A synthetic step (e.g. a post-processing-inserted assertion) carries
  /// no UI on either side.
  pub fn is_synthetic(&self) -> bool { self.ui_before.is_empty() && self.ui_after.is_empty() }

  pub fn has_ui(&self) -> bool { !self.ui_before.is_empty() && !self.ui_after.is_empty() }
}

pub type TestCase = Vec<Step>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::action::Action;
  use crate::event::Parameter;

  #[test]
  fn step_with_no_ui_on_either_side_is_synthetic() {
    let step = Step::new(Event::new(Action::Exist, None, Parameter::None), Ui::default(), Ui::default());
    assert!(step.is_synthetic());
    assert!(!step.has_ui());
  }

  #[test]
  fn step_with_both_uis_present_has_ui() {
    let step = Step::new(
      Event::new(Action::Click, None, Parameter::None),
      Ui::new("<hierarchy/>", vec![1]),
      Ui::new("<hierarchy/>", vec![2]),
    );
    assert!(step.has_ui());
    assert!(!step.is_synthetic());
  }
}
