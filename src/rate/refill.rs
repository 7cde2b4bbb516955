//! Refill strategies that decide how many permits accrue as time passes.

// self
use crate::{_prelude::*, clock::TimeSource, error::ValidationError};

/// Computes how many permits a bucket gains given elapsed time.
///
/// Implementations own whatever timing state they need and must serialize it internally: two
/// threads observing the same elapsed window must never both be handed its permits.
pub trait RefillStrategy
where
	Self: Send + Sync,
{
	/// Returns the permits accrued since the previous call, consuming the elapsed time.
	fn refill(&self) -> u64;

	/// Time remaining until the next permit batch becomes available.
	///
	/// Returns [`Duration::ZERO`] once the boundary has passed.
	fn time_until_next_refill(&self) -> Duration;
}

/// Refills a permit bucket at a fixed, configurable interval.
///
/// Missed intervals are not forgotten: if three periods elapse between calls, the next
/// [`refill`](RefillStrategy::refill) returns three periods' worth of permits at once.
pub struct FixedIntervalRefillStrategy {
	permits_per_period: u64,
	period_nanos: u64,
	clock: Arc<dyn TimeSource>,
	timeline: Mutex<RefillTimeline>,
}
impl FixedIntervalRefillStrategy {
	/// Creates a strategy issuing `permits_per_period` permits every `period`, timed by `clock`.
	///
	/// Fails with a validation error unless both the rate and the period are strictly positive.
	pub fn new(
		permits_per_period: u64,
		period: Duration,
		clock: Arc<dyn TimeSource>,
	) -> Result<Self, ValidationError> {
		if permits_per_period == 0 {
			return Err(ValidationError::NonPositiveRate);
		}
		if !period.is_positive() {
			return Err(ValidationError::NonPositivePeriod);
		}

		let period_nanos = u64::try_from(period.whole_nanoseconds()).unwrap_or(u64::MAX);
		let now = clock.monotonic_nanos();
		let timeline = Mutex::new(RefillTimeline {
			last_refill: now,
			next_refill: now.saturating_add(period_nanos),
		});

		Ok(Self { permits_per_period, period_nanos, clock, timeline })
	}

	/// Permits issued per period.
	pub fn permits_per_period(&self) -> u64 {
		self.permits_per_period
	}

	/// Configured period length.
	pub fn period(&self) -> Duration {
		Duration::nanoseconds(i64::try_from(self.period_nanos).unwrap_or(i64::MAX))
	}
}
impl RefillStrategy for FixedIntervalRefillStrategy {
	fn refill(&self) -> u64 {
		let mut timeline = self.timeline.lock();
		let now = self.clock.monotonic_nanos();

		if now < timeline.next_refill {
			return 0;
		}

		// At least one full period has elapsed since last_refill.
		let elapsed_periods = (now - timeline.last_refill) / self.period_nanos;

		timeline.last_refill =
			timeline.last_refill.saturating_add(elapsed_periods.saturating_mul(self.period_nanos));
		timeline.next_refill = timeline.last_refill.saturating_add(self.period_nanos);

		elapsed_periods.saturating_mul(self.permits_per_period)
	}

	fn time_until_next_refill(&self) -> Duration {
		let next_refill = self.timeline.lock().next_refill;
		let now = self.clock.monotonic_nanos();
		let remaining = next_refill.saturating_sub(now);

		Duration::nanoseconds(i64::try_from(remaining).unwrap_or(i64::MAX))
	}
}
impl Debug for FixedIntervalRefillStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FixedIntervalRefillStrategy")
			.field("permits_per_period", &self.permits_per_period)
			.field("period", &self.period())
			.finish()
	}
}

#[derive(Clone, Copy, Debug)]
struct RefillTimeline {
	last_refill: u64,
	next_refill: u64,
}
