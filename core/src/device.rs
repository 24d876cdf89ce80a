//! The device capability surface the repair driver consumes, plus a
//! concrete `adb`-backed implementation.

use std::collections::BTreeMap;
use std::io;
use std::process::Command;

use crate::criterion::Criterion;
use crate::error::DeviceError;
use crate::layout::Layout;

/// A resolved (lazily, on each call) handle to a widget on the live device.
pub trait UiObject {
  fn click(&self) -> Result<(), DeviceError>;
  fn long_click(&self) -> Result<(), DeviceError>;
  fn set_text(&self, text: &str) -> Result<(), DeviceError>;
  fn exists(&self) -> bool;
  fn info(&self, attr: &str) -> Result<String, DeviceError>;
}

/// The capability set the repair engine drives a real (or fake, for tests)
/// device through. Mirrors the u2/UI Automator surface the original engine
/// layered over `adb`.
pub trait Device {
  fn dump_hierarchy(&mut self) -> Result<String, DeviceError>;
  fn screenshot(&mut self) -> Result<Vec<u8>, DeviceError>;
  fn object(&self, criteria: &BTreeMap<Criterion, String>, index: i32) -> Box<dyn UiObject>;
  fn press_back(&mut self) -> Result<(), DeviceError>;
  fn swipe(&mut self, fx: i32, fy: i32, tx: i32, ty: i32) -> Result<(), DeviceError>;
  fn shell(&mut self, argv: &[&str]) -> Result<String, DeviceError>;
  fn app_start(&mut self, package: &str) -> Result<(), DeviceError>;
  fn app_stop(&mut self, package: &str) -> Result<(), DeviceError>;
  fn app_clear(&mut self, package: &str) -> Result<(), DeviceError>;
  fn grant_permission(&mut self, package: &str, permission: &str) -> Result<(), DeviceError>;
  /// `None` when the package isn't installed.
  fn package_version(&mut self, package: &str) -> Result<Option<String>, DeviceError>;
  fn implicitly_wait(&mut self, seconds: f64);
}

const DEFAULT_IMPLICIT_WAIT: f64 = 3.0;

pub struct AdbDevice {
  serial: Option<String>,
  wait_seconds: f64,
}

impl AdbDevice {
  pub fn new(serial: Option<String>) -> Self { Self { serial, wait_seconds: DEFAULT_IMPLICIT_WAIT } }

  /// Check `adb` is reachable in `PATH`, the way a CLI preflight check would.
  pub fn ensure_available() -> Result<(), DeviceError> {
    match Command::new("adb").arg("--help").output() {
      Ok(_) => Ok(()),
      Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => Err(DeviceError::AdbMissing),
      Err(e) => Err(DeviceError::Io(e)),
    }
  }

  fn command(&self) -> Command {
    let mut cmd = Command::new("adb");
    if let Some(serial) = &self.serial {
      cmd.arg("-s").arg(serial);
    }
    cmd
  }

  fn run(&self, args: &[&str]) -> Result<Vec<u8>, DeviceError> {
    let output = self.command().args(args).output()?;
    if !output.status.success() {
      return Err(DeviceError::Shell(String::from_utf8_lossy(&output.stderr).into_owned()));
    }
    Ok(output.stdout)
  }

  fn run_text(&self, args: &[&str]) -> Result<String, DeviceError> {
    Ok(String::from_utf8_lossy(&self.run(args)?).into_owned())
  }

  fn resolve(&self, criteria: &BTreeMap<Criterion, String>, index: i32) -> Result<crate::node::Node, DeviceError> {
    let xml = self.run_text(&["shell", "uiautomator", "dump", "/dev/tty"])?;
    let layout = Layout::parse(&xml, None).map_err(|e| DeviceError::Shell(e.to_string()))?;
    let locator = crate::locator::Locator::new(criteria.clone(), index);
    let id =
      locator.find_in_layout(&layout).ok_or_else(|| DeviceError::WidgetNotFound(format!("{criteria:?}[{index}]")))?;
    Ok(layout.node(id).clone())
  }
}

impl Device for AdbDevice {
  fn dump_hierarchy(&mut self) -> Result<String, DeviceError> { self.run_text(&["shell", "uiautomator", "dump", "/dev/tty"]) }

  fn screenshot(&mut self) -> Result<Vec<u8>, DeviceError> { self.run(&["exec-out", "screencap", "-p"]) }

  fn object(&self, criteria: &BTreeMap<Criterion, String>, index: i32) -> Box<dyn UiObject> {
    Box::new(AdbUiObject { serial: self.serial.clone(), criteria: criteria.clone(), index })
  }

  fn press_back(&mut self) -> Result<(), DeviceError> { self.run(&["shell", "input", "keyevent", "KEYCODE_BACK"]).map(|_| ()) }

  fn swipe(&mut self, fx: i32, fy: i32, tx: i32, ty: i32) -> Result<(), DeviceError> {
    self
      .run(&["shell", "input", "swipe", &fx.to_string(), &fy.to_string(), &tx.to_string(), &ty.to_string()])
      .map(|_| ())
  }

  fn shell(&mut self, argv: &[&str]) -> Result<String, DeviceError> {
    let mut args = vec!["shell"];
    args.extend_from_slice(argv);
    self.run_text(&args)
  }

  fn app_start(&mut self, package: &str) -> Result<(), DeviceError> {
    self.run(&["shell", "monkey", "-p", package, "-c", "android.intent.category.LAUNCHER", "1"]).map(|_| ())
  }

  fn app_stop(&mut self, package: &str) -> Result<(), DeviceError> {
    self.run(&["shell", "am", "force-stop", package]).map(|_| ())
  }

  fn app_clear(&mut self, package: &str) -> Result<(), DeviceError> { self.run(&["shell", "pm", "clear", package]).map(|_| ()) }

  fn grant_permission(&mut self, package: &str, permission: &str) -> Result<(), DeviceError> {
    self.run(&["shell", "pm", "grant", package, permission]).map(|_| ())
  }

  fn package_version(&mut self, package: &str) -> Result<Option<String>, DeviceError> {
    let dump = self.run_text(&["shell", "dumpsys", "package", package])?;
    if dump.trim().is_empty() {
      return Ok(None);
    }
    Ok(
      dump
        .lines()
        .find_map(|line| line.trim().strip_prefix("versionName=").map(str::to_string)),
    )
  }

  fn implicitly_wait(&mut self, seconds: f64) { self.wait_seconds = seconds; }
}

struct AdbUiObject {
  serial: Option<String>,
  criteria: BTreeMap<Criterion, String>,
  index: i32,
}

impl AdbUiObject {
  fn device(&self) -> AdbDevice { AdbDevice::new(self.serial.clone()) }
}

impl UiObject for AdbUiObject {
  fn click(&self) -> Result<(), DeviceError> {
    let device = self.device();
    let node = device.resolve(&self.criteria, self.index)?;
    let (cx, cy) = (node.x() + node.w() / 2, node.y() + node.h() / 2);
    device.run(&["shell", "input", "tap", &cx.to_string(), &cy.to_string()]).map(|_| ())
  }

  fn long_click(&self) -> Result<(), DeviceError> {
    let device = self.device();
    let node = device.resolve(&self.criteria, self.index)?;
    let (cx, cy) = (node.x() + node.w() / 2, node.y() + node.h() / 2);
    device
      .run(&["shell", "input", "swipe", &cx.to_string(), &cy.to_string(), &cx.to_string(), &cy.to_string(), "600"])
      .map(|_| ())
  }

  fn set_text(&self, text: &str) -> Result<(), DeviceError> {
    let device = self.device();
    device.resolve(&self.criteria, self.index)?;
    device.run(&["shell", "input", "text", text]).map(|_| ())
  }

  fn exists(&self) -> bool { self.device().resolve(&self.criteria, self.index).is_ok() }

  fn info(&self, attr: &str) -> Result<String, DeviceError> {
    let node = self.device().resolve(&self.criteria, self.index)?;
    Ok(node.get(attr).to_string())
  }
}
