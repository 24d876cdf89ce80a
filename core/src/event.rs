//! `Event`: an `(action, locator?, parameter)` triple, immutable once
//! constructed, with a JSON wire format and u2-style script rendering.

use log::warn;

use crate::action::Action;
use crate::locator::Locator;

/// The per-action typed payload. `None` for actions that carry no extra
/// data (`CLICK`, `LONG_CLICK`, `EXIST`, `NOT_EXIST`, `BACK`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Parameter {
  #[default]
  None,
  Text {
    text: String,
  },
  Swipe {
    fx: i32,
    fy: i32,
    tx: i32,
    ty: i32,
  },
  Oracle {
    attr: String,
    oracle: String,
  },
}

/// Sidecar bookkeeping flags, carried alongside the typed parameter rather
/// than mixed into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
  pub generated: bool,
  pub repaired: bool,
  pub failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
  pub action: Action,
  pub locator: Option<Locator>,
  pub parameter: Parameter,
  pub flags: Flags,
}

impl Event {
  pub fn new(action: Action, locator: Option<Locator>, parameter: Parameter) -> Self {
    Self { action, locator, parameter, flags: Flags::default() }
  }

  pub fn is_assertion(&self) -> bool { self.action.is_assertion() }

  pub fn is_generated_assertion(&self) -> bool { self.is_assertion() && self.flags.generated }

  pub fn with_flag_generated(mut self) -> Self {
    self.flags.generated = true;
    self
  }

  pub fn with_flag_repaired(mut self) -> Self {
    self.flags.repaired = true;
    self
  }

  pub fn with_flag_failed(mut self) -> Self {
    self.flags.failed = true;
    self
  }

  pub fn with_locator(&self, locator: Locator) -> Self {
    Event { action: self.action, locator: Some(locator), parameter: self.parameter.clone(), flags: self.flags }
  }

  pub fn to_json(&self) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("action".to_string(), serde_json::Value::String(self.action.wire_name().to_string()));
    if let Some(locator) = &self.locator {
      obj.insert("locator".to_string(), locator.to_json());
    }

    let mut parameter = serde_json::Map::new();
    match &self.parameter {
      Parameter::None => {}
      Parameter::Text { text } => {
        parameter.insert("text".to_string(), serde_json::Value::String(text.clone()));
      }
      Parameter::Swipe { fx, fy, tx, ty } => {
        parameter.insert("fx".to_string(), (*fx).into());
        parameter.insert("fy".to_string(), (*fy).into());
        parameter.insert("tx".to_string(), (*tx).into());
        parameter.insert("ty".to_string(), (*ty).into());
      }
      Parameter::Oracle { attr, oracle } => {
        parameter.insert("attr".to_string(), serde_json::Value::String(attr.clone()));
        parameter.insert("oracle".to_string(), serde_json::Value::String(oracle.clone()));
      }
    }
    if self.flags.generated {
      parameter.insert("generated".to_string(), true.into());
    }
    if self.flags.repaired {
      parameter.insert("repaired".to_string(), true.into());
    }
    if self.flags.failed {
      parameter.insert("failed".to_string(), true.into());
    }
    if !parameter.is_empty() {
      obj.insert("parameter".to_string(), serde_json::Value::Object(parameter));
    }
    serde_json::Value::Object(obj)
  }

  pub fn from_json(value: &serde_json::Value) -> Option<Self> {
    let obj = value.as_object()?;
    let action = Action::from_wire_name(obj.get("action")?.as_str()?)?;
    let locator = obj.get("locator").and_then(Locator::from_json);
    let param_obj = obj.get("parameter").and_then(|v| v.as_object());

    let get_str = |key: &str| param_obj.and_then(|p| p.get(key)).and_then(|v| v.as_str()).map(str::to_string);
    let get_i32 = |key: &str| param_obj.and_then(|p| p.get(key)).and_then(|v| v.as_i64()).map(|v| v as i32);

    let parameter = match action {
      Action::SetText => Parameter::Text { text: get_str("text").unwrap_or_default() },
      Action::Swipe => Parameter::Swipe {
        fx: get_i32("fx").unwrap_or(0),
        fy: get_i32("fy").unwrap_or(0),
        tx: get_i32("tx").unwrap_or(0),
        ty: get_i32("ty").unwrap_or(0),
      },
      Action::Equal | Action::NotEqual => {
        Parameter::Oracle { attr: get_str("attr").unwrap_or_default(), oracle: get_str("oracle").unwrap_or_default() }
      }
      _ => Parameter::None,
    };

    let mut flags = Flags::default();
    if let Some(p) = param_obj {
      for key in p.keys() {
        match key.as_str() {
          "generated" => flags.generated = p.get(key).and_then(|v| v.as_bool()).unwrap_or(false),
          "repaired" => flags.repaired = p.get(key).and_then(|v| v.as_bool()).unwrap_or(false),
          "failed" => flags.failed = p.get(key).and_then(|v| v.as_bool()).unwrap_or(false),
          "text" | "fx" | "fy" | "tx" | "ty" | "attr" | "oracle" => {}
          other => warn!("dropping unknown event parameter key: {other}"),
        }
      }
    }

    Some(Event { action, locator, parameter, flags })
  }

  /// Render one line of the repaired u2-style script.
  pub fn generate_u2(&self, device_part: &str) -> String {
    let locator_part = self.locator.as_ref().map(Locator::render).unwrap_or_default();
    let prefix = format!("{device_part}{locator_part}");
    let mut suffix = String::new();
    if self.flags.generated || self.flags.repaired {
      suffix.push_str("  # ");
      if self.flags.generated {
        suffix.push_str("generated");
      }
      if self.flags.repaired {
        suffix.push_str("repaired");
      }
    }

    match self.action {
      Action::Click => format!("{prefix}.click(){suffix}"),
      Action::LongClick => format!("{prefix}.long_click(){suffix}"),
      Action::SetText => {
        let text = if let Parameter::Text { text } = &self.parameter { text.as_str() } else { "" };
        format!("{prefix}.set_text(\"{text}\"){suffix}")
      }
      Action::Exist => {
        if self.flags.failed {
          format!("# assert {prefix}.exists{suffix}")
        } else {
          format!("assert {prefix}.exists{suffix}")
        }
      }
      Action::NotExist => format!("assert not {prefix}.exists{suffix}"),
      Action::Back => format!("{prefix}.press(\"back\"){suffix}"),
      Action::Equal => {
        let (attr, oracle) =
          if let Parameter::Oracle { attr, oracle } = &self.parameter { (attr.as_str(), oracle.as_str()) } else { ("", "") };
        format!("assert {prefix}.info[\"{attr}\"] == \"{oracle}\"{suffix}")
      }
      Action::NotEqual => {
        let (attr, oracle) =
          if let Parameter::Oracle { attr, oracle } = &self.parameter { (attr.as_str(), oracle.as_str()) } else { ("", "") };
        format!("assert {prefix}.info[\"{attr}\"] != \"{oracle}\"{suffix}")
      }
      Action::Swipe => {
        let (fx, fy, tx, ty) =
          if let Parameter::Swipe { fx, fy, tx, ty } = &self.parameter { (*fx, *fy, *tx, *ty) } else { (0, 0, 0, 0) };
        format!("{prefix}.swipe({fx}, {fy}, {tx}, {ty}){suffix}")
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::criterion::Criterion;

  #[test]
  fn round_trips_click_event_with_locator() {
    let event = Event::new(Action::Click, Some(Locator::single(Criterion::Text, "Documents", 0)), Parameter::None);
    let json = event.to_json();
    let parsed = Event::from_json(&json).expect("parses");
    assert_eq!(parsed, event);
  }

  #[test]
  fn round_trips_swipe_parameter() {
    let event = Event::new(Action::Swipe, None, Parameter::Swipe { fx: 1, fy: 2, tx: 3, ty: 4 });
    let parsed = Event::from_json(&event.to_json()).expect("parses");
    assert_eq!(parsed, event);
  }

  #[test]
  fn drops_unknown_parameter_keys() {
    let value: serde_json::Value = serde_json::from_str(r#"{"action":"CLICK","parameter":{"bogus":1}}"#).unwrap();
    let event = Event::from_json(&value).expect("parses");
    assert_eq!(event.parameter, Parameter::None);
  }

  #[test]
  fn generates_click_line() {
    let event = Event::new(Action::Click, Some(Locator::single(Criterion::Text, "Documents", 0)), Parameter::None);
    assert_eq!(event.generate_u2("d"), "d(text='Documents').click()");
  }

  #[test]
  fn generates_failed_exist_as_comment() {
    let event = Event::new(Action::Exist, Some(Locator::single(Criterion::Text, "x", 0)), Parameter::None)
      .with_flag_failed();
    assert_eq!(event.generate_u2("d"), "# assert d(text='x').exists");
  }

  #[test]
  fn generates_swipe_line() {
    let event = Event::new(Action::Swipe, None, Parameter::Swipe { fx: 1, fy: 2, tx: 3, ty: 4 });
    assert_eq!(event.generate_u2("d"), "d.swipe(1, 2, 3, 4)");
  }
}
