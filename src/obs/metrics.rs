// self
use crate::{
	obs::{FlowOutcome, PermitOutcome},
	provider::GrantKind,
};

/// Records a token-flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(grant: GrantKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_warden_flow_total",
			"flow" => grant.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (grant, outcome);
	}
}

/// Records a permit decision via the global metrics recorder (when enabled).
pub fn record_permit_outcome(outcome: PermitOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_warden_permit_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_flow_outcome(GrantKind::Password, FlowOutcome::Failure);
		record_permit_outcome(PermitOutcome::Denied);
	}
}
