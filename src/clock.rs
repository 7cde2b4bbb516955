//! Monotonic clock seam used by the rate limiter and the auth lifecycle.
//!
//! Refill accounting and token expiry are both pure functions of elapsed time, so every
//! time-dependent component takes an `Arc<dyn TimeSource>` instead of reading the system clock
//! directly. Production code uses [`SystemTimeSource`]; tests drive [`ManualTimeSource`] to
//! simulate any schedule deterministically.

// std
use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::Instant,
};
// self
use crate::_prelude::*;

/// Source of monotonic time expressed in nanoseconds since an arbitrary origin.
///
/// Implementations must be monotonic: successive reads never decrease. The origin is
/// implementation-defined, so readings are only meaningful relative to one another.
pub trait TimeSource
where
	Self: Send + Sync,
{
	/// Current monotonic reading in nanoseconds.
	fn monotonic_nanos(&self) -> u64;
}

/// [`TimeSource`] backed by [`Instant`], anchored at construction.
#[derive(Debug)]
pub struct SystemTimeSource {
	origin: Instant,
}
impl SystemTimeSource {
	/// Creates a source anchored at the current instant.
	pub fn new() -> Self {
		Self { origin: Instant::now() }
	}
}
impl Default for SystemTimeSource {
	fn default() -> Self {
		Self::new()
	}
}
impl TimeSource for SystemTimeSource {
	fn monotonic_nanos(&self) -> u64 {
		u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
	}
}

/// Manually advanced [`TimeSource`] for deterministic tests.
///
/// Starts at zero and only moves when told to; sharing one instance between a component under
/// test and the test body makes refill and expiry schedules fully reproducible.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
	nanos: AtomicU64,
}
impl ManualTimeSource {
	/// Creates a source positioned at zero nanoseconds.
	pub fn new() -> Self {
		Self::default()
	}

	/// Advances the clock by the provided duration. Negative durations are ignored.
	pub fn advance(&self, by: Duration) {
		let nanos = u64::try_from(by.whole_nanoseconds()).unwrap_or(0);

		self.nanos.fetch_add(nanos, Ordering::SeqCst);
	}

	/// Moves the clock to an absolute reading. Readings never move backwards.
	pub fn set_nanos(&self, nanos: u64) {
		self.nanos.fetch_max(nanos, Ordering::SeqCst);
	}
}
impl TimeSource for ManualTimeSource {
	fn monotonic_nanos(&self) -> u64 {
		self.nanos.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn manual_source_advances_and_never_rewinds() {
		let clock = ManualTimeSource::new();

		assert_eq!(clock.monotonic_nanos(), 0);

		clock.advance(Duration::milliseconds(5));

		assert_eq!(clock.monotonic_nanos(), 5_000_000);

		clock.advance(Duration::milliseconds(-1));

		assert_eq!(clock.monotonic_nanos(), 5_000_000);

		clock.set_nanos(1_000);

		assert_eq!(clock.monotonic_nanos(), 5_000_000, "set_nanos must not rewind");
	}

	#[test]
	fn system_source_is_monotonic() {
		let clock = SystemTimeSource::new();
		let first = clock.monotonic_nanos();
		let second = clock.monotonic_nanos();

		assert!(second >= first);
	}
}
