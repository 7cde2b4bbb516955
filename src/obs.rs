//! Optional observability helpers for governance operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_warden.flow` with the `flow`
//!   (grant) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `oauth2_warden_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `oauth2_warden_permit_total` counter for every permit decision, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each token-request attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a lifecycle operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each permit decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermitOutcome {
	/// Permits were granted.
	Granted,
	/// Permits were denied without blocking.
	Denied,
	/// A bounded wait expired before permits became available.
	Exhausted,
}
impl PermitOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PermitOutcome::Granted => "granted",
			PermitOutcome::Denied => "denied",
			PermitOutcome::Exhausted => "exhausted",
		}
	}
}
impl Display for PermitOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
