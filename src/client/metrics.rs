//! Lock-free counters describing dispatch activity.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe dispatch counters.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	invocations: AtomicU64,
	throttled: AtomicU64,
	challenges: AtomicU64,
	solutions: AtomicU64,
	rejected: AtomicU64,
}
impl DispatchMetrics {
	/// Raw invocations handed to the transport.
	pub fn invocations(&self) -> u64 {
		self.invocations.load(Ordering::Relaxed)
	}

	/// Invocations that had to wait for the rate limiter.
	pub fn throttled(&self) -> u64 {
		self.throttled.load(Ordering::Relaxed)
	}

	/// Captcha challenges received.
	pub fn challenges(&self) -> u64 {
		self.challenges.load(Ordering::Relaxed)
	}

	/// Captcha solutions submitted.
	pub fn solutions(&self) -> u64 {
		self.solutions.load(Ordering::Relaxed)
	}

	/// Solutions reported incorrect.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	pub(crate) fn record_invocation(&self) {
		self.invocations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_throttled(&self) {
		self.throttled.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_challenge(&self) {
		self.challenges.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_solution(&self) {
		self.solutions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejected(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}
}
