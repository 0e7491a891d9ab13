//! The dispatching client: session owner, rate limiter, expiry timer, and captcha retry policy.

pub mod captcha;
pub mod metrics;

mod authorize;
mod call;

pub use captcha::*;
pub use metrics::*;

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	expiry::{ExpiryNotifier, ExpiryTimer, ListenerId},
	ext::CaptchaSolver,
	http::ApiTransport,
	limiter::RateLimiter,
	session::{Language, Session, TokenState},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestVkClient = Client<ReqwestTransport>;

/// Rate-limited, captcha-resilient API client.
///
/// Cloning is cheap; clones share one session, limiter, and expiry timer. Dropping the last clone
/// cancels the pending expiry notification.
pub struct Client<T>
where
	T: ?Sized + ApiTransport,
{
	inner: Arc<ClientInner<T>>,
}
impl<T> Client<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client over a caller-provided transport.
	///
	/// Fails with [`ConfigError::InvalidRateLimit`](crate::error::ConfigError::InvalidRateLimit)
	/// when the configured rate is negative or NaN, which only a config edited after
	/// [`build`](crate::config::ClientConfigBuilder::build) can carry.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Result<Self> {
		let limiter = RateLimiter::new(config.requests_per_second)?;
		let session = Session { language: config.language, ..Default::default() };

		Ok(Self {
			inner: Arc::new(ClientInner {
				transport: transport.into(),
				limiter,
				session: RwLock::new(session),
				expiry: ExpiryTimer::new(),
				listeners: ExpiryNotifier::new(),
				solver: RwLock::new(None),
				auth_guard: AsyncMutex::new(()),
				metrics: DispatchMetrics::default(),
				config,
			}),
		})
	}

	/// Registers the captcha solver consulted by calls and credential authorization.
	pub fn with_captcha_solver(self, solver: Arc<dyn CaptchaSolver>) -> Self {
		self.set_captcha_solver(Some(solver));

		self
	}

	/// Replaces or removes the captcha solver.
	pub fn set_captcha_solver(&self, solver: Option<Arc<dyn CaptchaSolver>>) {
		*self.inner.solver.write() = solver;
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	/// Shared transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.inner.transport
	}

	/// In-process dispatch counters.
	pub fn metrics(&self) -> &DispatchMetrics {
		&self.inner.metrics
	}

	/// Changes the request rate; negative or NaN values fail and leave the rate unchanged.
	pub fn set_rate_limit(&self, requests_per_second: f64) -> Result<()> {
		Ok(self.inner.limiter.set_rate(requests_per_second)?)
	}

	/// Current request rate.
	pub fn rate_limit(&self) -> f64 {
		self.inner.limiter.rate()
	}

	/// Wall-clock time of the latest throttled invocation.
	pub fn last_invoke_time(&self) -> Option<OffsetDateTime> {
		self.inner.limiter.last_invoke_time()
	}

	/// Time elapsed since the latest throttled invocation.
	pub fn time_since_last_invoke(&self) -> Option<Duration> {
		self.inner.limiter.time_since_last_invoke()
	}

	/// Sets or clears the response language.
	pub fn set_language(&self, language: Option<Language>) {
		self.inner.session.write().language = language;
	}

	/// Current response language.
	pub fn language(&self) -> Option<Language> {
		self.inner.session.read().language
	}

	/// Returns true if a non-blank token is installed.
	pub fn is_authorized(&self) -> bool {
		self.inner.session.read().is_authorized()
	}

	/// Owner of the current token.
	pub fn user_id(&self) -> Option<crate::auth::UserId> {
		self.inner.session.read().user_id
	}

	/// Token lifecycle state.
	pub fn token_state(&self) -> TokenState {
		self.inner.session.read().state
	}

	/// Snapshot of the session.
	pub fn session(&self) -> Session {
		self.inner.session.read().clone()
	}

	/// Registers a listener invoked with this client when the token's validity window elapses.
	pub fn on_token_expired<F>(&self, listener: F) -> ListenerId
	where
		F: 'static + Send + Sync + Fn(&Self),
	{
		self.inner.listeners.subscribe(listener)
	}

	/// Removes an expiry listener. Returns whether it was registered.
	pub fn remove_expiry_listener(&self, id: ListenerId) -> bool {
		self.inner.listeners.unsubscribe(id)
	}

	/// Cancels the pending expiry notification. Safe to call repeatedly.
	pub fn dispose(&self) {
		self.inner.expiry.disarm();
	}

	fn captcha_solver(&self) -> Option<Arc<dyn CaptchaSolver>> {
		self.inner.solver.read().clone()
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_transport(config, ReqwestTransport::default())
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.inner.config)
			.field("session", &*self.inner.session.read())
			.field("captcha_solver_set", &self.inner.solver.read().is_some())
			.finish()
	}
}

struct ClientInner<T>
where
	T: ?Sized + ApiTransport,
{
	config: ClientConfig,
	limiter: RateLimiter,
	session: RwLock<Session>,
	expiry: ExpiryTimer,
	listeners: ExpiryNotifier<Client<T>>,
	solver: RwLock<Option<Arc<dyn CaptchaSolver>>>,
	auth_guard: AsyncMutex<()>,
	metrics: DispatchMetrics,
	transport: Arc<T>,
}
