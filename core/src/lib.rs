//! Layout parsing, matching and device-replay repair engine for UI
//! automation test scripts recorded against Android's u2/UI Automator stack.

mod action;
mod archive;
mod criterion;
mod device;
mod error;
mod event;
mod locator;
mod matcher;
mod node;
mod oracle;
mod layout;
mod predicates;
mod repair;
mod step;

pub use action::Action;
pub use archive::RecordedArchive;
pub use criterion::Criterion;
pub use device::{AdbDevice, Device, UiObject};
pub use error::{DeviceError, LayoutError, MatchError, RepairError};
pub use event::{Event, Flags, Parameter};
pub use layout::{Layout, NodeId};
pub use locator::Locator;
pub use matcher::{MatchOutcome, match_layout};
pub use node::Node;
pub use oracle::{AssertionOracle, OracleError};
pub use repair::{RepairOutcome, RepairSession, Sleeper, render_script};
pub use step::{Step, TestCase, Ui};
