//! Client-side request throttling.
//!
//! Each caller reserves the next free send slot under a short lock and then sleeps until the
//! slot without holding it, so concurrent callers are spaced by at least the minimum interval
//! while the network I/O itself stays unserialized.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::Instant;
// self
use crate::{_prelude::*, error::ConfigError};

/// Minimum spacing between requests for the given rate: `floor(1000 / rate) + 1` milliseconds,
/// or zero (throttling disabled) when the rate is zero.
pub fn min_interval(requests_per_second: f64) -> Result<Duration, ConfigError> {
	if requests_per_second.is_nan() || requests_per_second < 0. {
		return Err(ConfigError::InvalidRateLimit { value: requests_per_second });
	}
	if requests_per_second == 0. {
		return Ok(Duration::ZERO);
	}

	let millis = (1_000. / requests_per_second).floor() as i64;

	Ok(Duration::milliseconds(millis.saturating_add(1)))
}

/// Per-client rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
	state: Mutex<LimiterState>,
}
impl RateLimiter {
	/// Creates a limiter for the given rate.
	pub fn new(requests_per_second: f64) -> Result<Self, ConfigError> {
		let interval = min_interval(requests_per_second)?;

		Ok(Self {
			state: Mutex::new(LimiterState {
				requests_per_second,
				interval: to_std(interval),
				last_send: None,
				last_send_at: None,
			}),
		})
	}

	/// Changes the rate; invalid values leave the limiter untouched.
	pub fn set_rate(&self, requests_per_second: f64) -> Result<(), ConfigError> {
		let interval = min_interval(requests_per_second)?;
		let mut state = self.state.lock();

		state.requests_per_second = requests_per_second;
		state.interval = to_std(interval);

		Ok(())
	}

	/// Configured rate in requests per second.
	pub fn rate(&self) -> f64 {
		self.state.lock().requests_per_second
	}

	/// Current minimum interval between sends.
	pub fn min_interval(&self) -> Duration {
		Duration::try_from(self.state.lock().interval).unwrap_or(Duration::MAX)
	}

	/// Waits for the next send slot and records it as the latest invocation.
	///
	/// Returns how long the caller was suspended, or `None` when it could proceed immediately.
	pub async fn wait(&self) -> Option<StdDuration> {
		let now = Instant::now();
		let slot = self.state.lock().reserve(now);

		if slot <= now {
			return None;
		}

		tokio::time::sleep_until(slot).await;

		Some(slot - now)
	}

	/// Wall-clock time of the most recent reserved send slot.
	pub fn last_invoke_time(&self) -> Option<OffsetDateTime> {
		self.state.lock().last_send_at
	}

	/// Time elapsed since the most recent reserved send slot.
	pub fn time_since_last_invoke(&self) -> Option<Duration> {
		let last = self.state.lock().last_send?;
		let elapsed = Instant::now().saturating_duration_since(last);

		Some(Duration::try_from(elapsed).unwrap_or(Duration::MAX))
	}
}

#[derive(Debug)]
struct LimiterState {
	requests_per_second: f64,
	interval: StdDuration,
	last_send: Option<Instant>,
	last_send_at: Option<OffsetDateTime>,
}
impl LimiterState {
	fn reserve(&mut self, now: Instant) -> Instant {
		let slot = match self.last_send {
			Some(last) if !self.interval.is_zero() => now.max(last + self.interval),
			_ => now,
		};

		self.last_send = Some(slot);
		self.last_send_at = Some(OffsetDateTime::now_utc() + (slot - now));

		slot
	}
}

fn to_std(interval: Duration) -> StdDuration {
	StdDuration::try_from(interval).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn interval_rounds_up() {
		let millis = |rate| min_interval(rate).map(|d| d.whole_milliseconds());

		assert_eq!(millis(3.).ok(), Some(334));
		assert_eq!(millis(1.).ok(), Some(1_001));
		assert_eq!(millis(0.5).ok(), Some(2_001));
		assert_eq!(millis(2_000.).ok(), Some(1));
		assert_eq!(millis(0.).ok(), Some(0));
	}

	#[test]
	fn invalid_rates_are_rejected_without_state_change() {
		let limiter = RateLimiter::new(3.).expect("Rate 3 is valid.");

		assert!(matches!(min_interval(-1.), Err(ConfigError::InvalidRateLimit { .. })));
		assert!(min_interval(f64::NAN).is_err());
		assert!(limiter.set_rate(-0.5).is_err());
		assert_eq!(limiter.rate(), 3.);
		assert_eq!(limiter.min_interval(), Duration::milliseconds(334));
	}

	#[tokio::test(start_paused = true)]
	async fn first_call_never_waits() {
		let limiter = RateLimiter::new(1.).expect("Rate 1 is valid.");

		assert!(limiter.last_invoke_time().is_none());
		assert_eq!(limiter.wait().await, None);
		assert!(limiter.last_invoke_time().is_some());
		assert_eq!(limiter.wait().await, Some(StdDuration::from_millis(1_001)));
	}

	#[tokio::test(start_paused = true)]
	async fn zero_rate_disables_throttling() {
		let limiter = RateLimiter::new(0.).expect("Rate 0 is valid.");

		for _ in 0..5 {
			assert_eq!(limiter.wait().await, None);
		}
	}

	#[tokio::test(start_paused = true)]
	async fn elapsed_time_counts_toward_the_interval() {
		let limiter = RateLimiter::new(2.).expect("Rate 2 is valid.");

		limiter.wait().await;
		tokio::time::advance(StdDuration::from_millis(400)).await;

		assert_eq!(limiter.wait().await, Some(StdDuration::from_millis(101)));
		assert_eq!(limiter.time_since_last_invoke(), Some(Duration::ZERO));
	}
}
