//! Leaky-bucket rate limiter with burst capacity.

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	clock::{SystemTimeSource, TimeSource},
	error::ValidationError,
	obs::{self, PermitOutcome},
	rate::{FixedIntervalRefillStrategy, RateLimiter, RefillStrategy},
};

/// Smallest timed wait used while blocking, so a bad refill hint can never busy-spin.
const MIN_WAIT: std::time::Duration = std::time::Duration::from_millis(1);
/// Largest timed wait used while blocking, keeping acquirers responsive to manual refills.
const MAX_WAIT: std::time::Duration = std::time::Duration::from_secs(1);

/// Rate limiter implementing a flexible version of the leaky bucket algorithm.
///
/// The bucket starts empty and gains permits over time through its [`RefillStrategy`]. The
/// `capacity` bounds how many unspent permits may accumulate: with a capacity of 5 and one
/// permit per second, five idle seconds allow a burst of five acquisitions back to back. A
/// capacity of 1 forces every permit to be spent at the refill rate.
///
/// The permit pool and the strategy consultation share one critical section per operation, so
/// concurrent callers can never double-spend an elapsed refill window.
pub struct LeakyBucketRateLimiter {
	capacity: u64,
	refill_strategy: Arc<dyn RefillStrategy>,
	size: Mutex<u64>,
	available: Condvar,
}
impl LeakyBucketRateLimiter {
	/// Creates a bucket refilled at a fixed interval, timed by the system clock.
	pub fn new(
		capacity: u64,
		permits_per_period: u64,
		period: Duration,
	) -> Result<Self, ValidationError> {
		Self::with_clock(capacity, permits_per_period, period, Arc::new(SystemTimeSource::new()))
	}

	/// Creates a bucket refilled at a fixed interval, timed by the provided clock.
	pub fn with_clock(
		capacity: u64,
		permits_per_period: u64,
		period: Duration,
		clock: Arc<dyn TimeSource>,
	) -> Result<Self, ValidationError> {
		let strategy = FixedIntervalRefillStrategy::new(permits_per_period, period, clock)?;

		Self::with_strategy(capacity, Arc::new(strategy))
	}

	/// Creates a bucket gated by an arbitrary refill strategy.
	pub fn with_strategy(
		capacity: u64,
		refill_strategy: Arc<dyn RefillStrategy>,
	) -> Result<Self, ValidationError> {
		if capacity == 0 {
			return Err(ValidationError::NonPositiveCapacity);
		}

		Ok(Self { capacity, refill_strategy, size: Mutex::new(0), available: Condvar::new() })
	}

	/// Maximum amount of permits held at one time.
	pub fn capacity(&self) -> u64 {
		self.capacity
	}

	/// Permits currently available, after applying any accrued refills.
	pub fn available_permits(&self) -> u64 {
		let mut size = self.size.lock();

		self.apply_accrued(&mut size);

		*size
	}

	fn validate(&self, permits: u64) -> Result<(), ValidationError> {
		if permits == 0 || permits > self.capacity {
			return Err(ValidationError::PermitsOutOfRange { permits, capacity: self.capacity });
		}

		Ok(())
	}

	/// Folds newly accrued permits into the pool; must run under the pool lock.
	fn apply_accrued(&self, size: &mut u64) {
		let accrued = self.refill_strategy.refill();

		*size = size.saturating_add(accrued.min(self.capacity)).min(self.capacity);
	}

	/// One refill+check+deduct round under the pool lock.
	fn try_acquire_locked(&self, size: &mut u64, permits: u64) -> bool {
		self.apply_accrued(size);

		if permits <= *size {
			*size -= permits;

			true
		} else {
			false
		}
	}

	fn next_wait(&self) -> std::time::Duration {
		std::time::Duration::try_from(self.refill_strategy.time_until_next_refill())
			.unwrap_or(MIN_WAIT)
			.clamp(MIN_WAIT, MAX_WAIT)
	}

	fn block_until(&self, permits: u64, deadline: Option<Instant>) -> Result<bool> {
		self.validate(permits)?;

		let mut size = self.size.lock();

		loop {
			if self.try_acquire_locked(&mut size, permits) {
				obs::record_permit_outcome(PermitOutcome::Granted);

				return Ok(true);
			}

			let mut wait = self.next_wait();

			if let Some(deadline) = deadline {
				let now = Instant::now();

				if now >= deadline {
					obs::record_permit_outcome(PermitOutcome::Exhausted);

					return Ok(false);
				}

				wait = wait.min(deadline - now);
			}

			self.available.wait_for(&mut size, wait);
		}
	}
}
impl RateLimiter for LeakyBucketRateLimiter {
	fn try_acquire(&self, permits: u64) -> Result<bool> {
		self.validate(permits)?;

		let granted = self.try_acquire_locked(&mut self.size.lock(), permits);

		obs::record_permit_outcome(if granted {
			PermitOutcome::Granted
		} else {
			PermitOutcome::Denied
		});

		Ok(granted)
	}

	fn acquire(&self, permits: u64) -> Result<()> {
		self.block_until(permits, None).map(|_| ())
	}

	fn acquire_within(&self, permits: u64, wait_limit: Duration) -> Result<bool> {
		let wait_limit = std::time::Duration::try_from(wait_limit).unwrap_or_default();
		// A wait limit too large to represent as a deadline is effectively unbounded.
		let deadline = Instant::now().checked_add(wait_limit);

		self.block_until(permits, deadline)
	}

	fn refill(&self, permits: u64) {
		let mut size = self.size.lock();

		*size = size.saturating_add(permits.min(self.capacity - *size));

		self.available.notify_all();
	}
}
impl Debug for LeakyBucketRateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LeakyBucketRateLimiter")
			.field("capacity", &self.capacity)
			.field("size", &*self.size.lock())
			.finish()
	}
}
