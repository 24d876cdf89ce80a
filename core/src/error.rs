//! Typed error enums, one per layer, composed behind `anyhow` at the CLI
//! boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
  #[error("failed to parse UI hierarchy XML: {0}")]
  MalformedXml(String),
  #[error("hierarchy has no root element")]
  EmptyHierarchy,
}

#[derive(Debug, Error)]
pub enum MatchError {
  #[error("layout error during matching: {0}")]
  Layout(#[from] LayoutError),
}

#[derive(Debug, Error)]
pub enum DeviceError {
  #[error("shell command failed: {0}")]
  Shell(String),
  #[error("widget not found for locator {0:?}")]
  WidgetNotFound(String),
  #[error("device I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("adb not found in PATH")]
  AdbMissing,
}

#[derive(Debug, Error)]
pub enum RepairError {
  #[error("assertion failed on current step: {0}")]
  AssertionFailed(String),
  #[error("perform failed after successful match: {0}")]
  PerformAfterMatchFailed(String),
  #[error("base-layout locator resolution failed: record is internally inconsistent")]
  BaseLocatorUnresolved,
  #[error("all exploration candidates exhausted")]
  ExplorationExhausted,
  #[error("record archive is malformed: {0}")]
  MalformedRecord(String),
  #[error("target package is not installed on the device")]
  PackageNotInstalled,
  #[error(transparent)]
  Device(#[from] DeviceError),
  #[error(transparent)]
  Match(#[from] MatchError),
  #[error(transparent)]
  Layout(#[from] LayoutError),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}
