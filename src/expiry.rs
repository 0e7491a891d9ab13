//! One-shot, restartable expiry timer and the listener registry it notifies.

// std
use std::{
	panic::{self, AssertUnwindSafe},
	sync::atomic::{AtomicU64, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use tokio::{runtime::Handle, task::JoinHandle};
// self
use crate::{_prelude::*, error::ConfigError};

/// Single-shot deferred callback that can be re-armed or cancelled.
///
/// Arming always cancels the previous timer first, and a fired timer clears its own slot before
/// running the callback, so each arm fires at most once.
#[derive(Debug, Default)]
pub struct ExpiryTimer {
	slot: Arc<Mutex<Option<ArmedTimer>>>,
	generation: AtomicU64,
}
impl ExpiryTimer {
	/// Creates a disarmed timer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Schedules `on_fire` after `delay`, replacing any pending timer.
	///
	/// A zero or negative delay disarms and never fires. Returns whether a timer is now pending.
	/// Positive delays need an ambient Tokio runtime.
	pub fn arm<F>(&self, delay: Duration, on_fire: F) -> Result<bool, ConfigError>
	where
		F: 'static + Send + FnOnce(),
	{
		let mut slot = self.slot.lock();

		if let Some(previous) = slot.take() {
			previous.handle.abort();
		}
		if !delay.is_positive() {
			return Ok(false);
		}

		let runtime = Handle::try_current().map_err(|_| ConfigError::MissingRuntime)?;
		let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
		let sleep_for = StdDuration::try_from(delay).unwrap_or(StdDuration::MAX);
		let shared = self.slot.clone();
		let handle = runtime.spawn(async move {
			tokio::time::sleep(sleep_for).await;

			let fired = {
				let mut slot = shared.lock();

				if slot.as_ref().is_some_and(|armed| armed.generation == generation) {
					slot.take();

					true
				} else {
					false
				}
			};

			if fired {
				on_fire();
			}
		});

		*slot = Some(ArmedTimer {
			generation,
			deadline: OffsetDateTime::now_utc().saturating_add(delay),
			handle,
		});

		Ok(true)
	}

	/// Cancels the pending timer, if any. Returns whether one was pending.
	pub fn disarm(&self) -> bool {
		match self.slot.lock().take() {
			Some(armed) => {
				armed.handle.abort();

				true
			},
			None => false,
		}
	}

	/// Returns true if a timer is pending.
	pub fn is_armed(&self) -> bool {
		self.slot.lock().is_some()
	}

	/// Wall-clock instant at which the pending timer fires.
	pub fn deadline(&self) -> Option<OffsetDateTime> {
		self.slot.lock().as_ref().map(|armed| armed.deadline)
	}
}
impl Drop for ExpiryTimer {
	fn drop(&mut self) {
		self.disarm();
	}
}

#[derive(Debug)]
struct ArmedTimer {
	generation: u64,
	deadline: OffsetDateTime,
	handle: JoinHandle<()>,
}

/// Handle returned by [`ExpiryNotifier::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback invoked with the expiring client.
pub type ExpiryListener<C> = Arc<dyn Fn(&C) + Send + Sync>;

/// Observer list notified when a token expires.
pub struct ExpiryNotifier<C> {
	listeners: RwLock<Vec<(ListenerId, ExpiryListener<C>)>>,
	next_id: AtomicU64,
}
impl<C> ExpiryNotifier<C> {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self { listeners: RwLock::new(Vec::new()), next_id: AtomicU64::new(1) }
	}

	/// Registers a listener.
	pub fn subscribe<F>(&self, listener: F) -> ListenerId
	where
		F: 'static + Send + Sync + Fn(&C),
	{
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));

		self.listeners.write().push((id, Arc::new(listener)));

		id
	}

	/// Removes a listener. Returns whether it was registered.
	pub fn unsubscribe(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.write();
		let before = listeners.len();

		listeners.retain(|(registered, _)| *registered != id);

		listeners.len() != before
	}

	/// Number of registered listeners.
	pub fn len(&self) -> usize {
		self.listeners.read().len()
	}

	/// Returns true if nobody listens.
	pub fn is_empty(&self) -> bool {
		self.listeners.read().is_empty()
	}

	/// Invokes every listener with `context`; a panicking listener does not stop the others.
	///
	/// Returns the number of listeners that panicked.
	pub fn notify(&self, context: &C) -> usize {
		let listeners = self.listeners.read().clone();
		let mut panicked = 0;

		for (id, listener) in listeners {
			if panic::catch_unwind(AssertUnwindSafe(|| listener(context))).is_err() {
				panicked += 1;

				#[cfg(feature = "tracing")]
				tracing::warn!(listener = id.0, "Expiry listener panicked.");
				#[cfg(not(feature = "tracing"))]
				let _ = id;
			}
		}

		panicked
	}
}
impl<C> Default for ExpiryNotifier<C> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C> Debug for ExpiryNotifier<C> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExpiryNotifier").field("listeners", &self.len()).finish()
	}
}
