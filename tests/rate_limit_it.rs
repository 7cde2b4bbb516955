// std
use std::{sync::Arc, thread};
// crates.io
use time::Duration;
// self
use oauth2_warden::rate::{LeakyBucketRateLimiter, NoopRateLimiter, RateLimiter};

#[test]
fn admission_gate_serves_concurrent_dispatchers() {
	let limiter: Arc<dyn RateLimiter> = Arc::new(
		LeakyBucketRateLimiter::new(4, 4, Duration::milliseconds(25))
			.expect("Limiter fixture should be valid."),
	);
	let workers: Vec<_> = (0..4)
		.map(|_| {
			let limiter = limiter.clone();

			thread::spawn(move || limiter.acquire_one())
		})
		.collect();

	for worker in workers {
		worker
			.join()
			.expect("Dispatcher thread should complete.")
			.expect("Every dispatcher should eventually be admitted.");
	}
}

#[test]
fn bounded_waits_expire_instead_of_hanging() {
	let limiter = LeakyBucketRateLimiter::new(1, 1, Duration::hours(1))
		.expect("Limiter fixture should be valid.");
	let admitted = limiter
		.acquire_within(1, Duration::milliseconds(50))
		.expect("Bounded acquisition should not error.");

	assert!(!admitted, "An empty bucket with an hour-long refill cannot admit within 50ms.");
}

#[test]
fn noop_limiter_swaps_in_transparently() {
	let limiter: Arc<dyn RateLimiter> = Arc::new(NoopRateLimiter);

	limiter.acquire(10).expect("The noop limiter admits everything.");

	assert!(limiter.try_acquire(1_000_000).expect("The noop limiter admits everything."));
}
