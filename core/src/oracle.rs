//! The assertion-oracle contract: out of scope to implement (it names no
//! concrete network client), but honored as a pluggable strategy so a caller
//! can wire one in without the engine depending on it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
  #[error("oracle request failed: {0}")]
  Request(String),
  #[error("oracle response could not be parsed: {0}")]
  UnparsableResponse(String),
}

/// A caller-supplied strategy that judges whether an observed attribute
/// value satisfies whatever external check it encodes (e.g. an
/// expectation service). Implementations are responsible for their own
/// rate limiting; this crate's repair driver never calls one more often
/// than once per assertion.
///
/// The original tool's oracle client enforces a minimum 30-second gap
/// between requests. This crate does not reimplement that client, but any
/// implementation plugged in here must preserve that contract.
pub trait AssertionOracle {
  /// `Ok(None)` when the oracle produced no usable verdict (caller may
  /// retry per its own policy, per the candidate-generation error policy).
  fn check(&mut self, attr: &str, oracle_value: &str, observed: &str) -> Result<Option<bool>, OracleError>;
}
