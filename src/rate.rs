//! Admission control for outbound requests.
//!
//! A [`RateLimiter`] hands out permits; the transport layer asks for one before each dispatch.
//! [`LeakyBucketRateLimiter`] throttles with burst capacity while [`NoopRateLimiter`] disables
//! throttling without changing call sites.

pub mod leaky_bucket;
pub mod refill;

pub use leaky_bucket::*;
pub use refill::*;

// self
use crate::_prelude::*;

/// Bounded pool of permits distributed over time.
///
/// All operations are safe to call from multiple threads. Blocking variants have no fairness
/// guarantee: two competing callers may starve each other if repeatedly unlucky.
pub trait RateLimiter
where
	Self: Send + Sync,
{
	/// Attempts to acquire `permits` without blocking.
	///
	/// Returns `Ok(false)` when the pool is currently too small; the attempt still applies any
	/// permits accrued since the last call. Fails with a validation error when `permits` lies
	/// outside the acceptable window for this limiter.
	fn try_acquire(&self, permits: u64) -> Result<bool>;

	/// Blocks the calling thread until `permits` could be acquired.
	fn acquire(&self, permits: u64) -> Result<()>;

	/// Blocks like [`acquire`](Self::acquire), giving up once `wait_limit` has elapsed.
	///
	/// Returns `Ok(false)` if the wait limit expired before the permits became available.
	fn acquire_within(&self, permits: u64, wait_limit: Duration) -> Result<bool>;

	/// Manually adds permits to the pool, saturating at the limiter's capacity.
	fn refill(&self, permits: u64);

	/// Attempts to acquire a single permit without blocking.
	fn try_acquire_one(&self) -> Result<bool> {
		self.try_acquire(1)
	}

	/// Blocks until a single permit could be acquired.
	fn acquire_one(&self) -> Result<()> {
		self.acquire(1)
	}
}

/// Pass-through limiter that always grants and never blocks.
///
/// Useful for callers that want throttling to be configurable without branching at every
/// dispatch site.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRateLimiter;
impl RateLimiter for NoopRateLimiter {
	fn try_acquire(&self, _permits: u64) -> Result<bool> {
		Ok(true)
	}

	fn acquire(&self, _permits: u64) -> Result<()> {
		Ok(())
	}

	fn acquire_within(&self, _permits: u64, _wait_limit: Duration) -> Result<bool> {
		Ok(true)
	}

	fn refill(&self, _permits: u64) {}
}
