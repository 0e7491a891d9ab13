//! Token lifecycle: credential and token authorization, refresh, validation, expiry arming.
//!
//! Every path runs under the client's authorization guard, disarms the pending expiry timer
//! first, and only touches the session once a token is in hand, so a failed attempt leaves the
//! previous session intact.

// self
use crate::{
	_prelude::*,
	auth::{AuthParams, AuthorizationRequest, AuthorizationResult, Secret, UserId},
	client::{CaptchaRetryLoop, Client},
	ext::TwoFactorProvider,
	http::ApiTransport,
	obs::{CallKind, CallSpan},
	session::{Session, TokenState},
};

/// Safety margin subtracted from the reported token lifetime.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(10);

impl<T> Client<T>
where
	T: ?Sized + ApiTransport,
{
	/// Authorizes the client.
	///
	/// A request carrying an access token installs it directly (failing with
	/// [`Error::MissingCredential`] when it is blank). Otherwise the direct-auth handshake runs
	/// through the captcha retry policy, and the credentials are kept for [`refresh`](Self::refresh).
	pub async fn authorize(&self, request: AuthorizationRequest) -> Result<()> {
		CallSpan::new(CallKind::Authorize, "authorize")
			.run(async move {
				let _guard = self.inner.auth_guard.lock().await;

				self.authorize_locked(request).await
			})
			.await
	}

	/// Replays the stored credentials.
	///
	/// `two_factor` replaces the stored two-factor provider when given. Fails with
	/// [`Error::NotRefreshable`] when the session was not obtained from credentials.
	pub async fn refresh(&self, two_factor: Option<Arc<dyn TwoFactorProvider>>) -> Result<()> {
		CallSpan::new(CallKind::Refresh, "refresh")
			.run(async move {
				let _guard = self.inner.auth_guard.lock().await;
				let mut request =
					self.inner.session.read().credentials.clone().ok_or(Error::NotRefreshable)?;

				if two_factor.is_some() {
					request.two_factor = two_factor;
				}

				request.captcha = None;

				self.authorize_locked(request).await
			})
			.await
	}

	/// Completes an out-of-band validation page and installs the resulting token.
	///
	/// Stored credentials survive, so a validated session stays refreshable.
	pub async fn validate(&self, url: &Url, phone: Option<&str>) -> Result<()> {
		CallSpan::new(CallKind::Validate, "validate")
			.run(async move {
				let _guard = self.inner.auth_guard.lock().await;
				let grant = self.inner.transport.validate(url, phone).await?;

				if !grant.is_authorized() {
					return Err(Error::ValidationFailed {
						reason: "validation did not yield an access token".into(),
					});
				}

				let credentials = self.inner.session.read().credentials.clone();

				self.install_grant(grant, credentials)
			})
			.await
	}

	/// Drops the token, owner, and stored credentials, and cancels the expiry notification.
	pub async fn log_out(&self) {
		let _guard = self.inner.auth_guard.lock().await;

		self.inner.expiry.disarm();
		self.inner.session.write().clear();
	}

	async fn authorize_locked(&self, request: AuthorizationRequest) -> Result<()> {
		self.inner.expiry.disarm();

		if let Some(token) = request.access_token.clone() {
			if token.is_blank() {
				return Err(Error::MissingCredential);
			}

			return self.install(token, request.user_id, request.token_ttl, None);
		}

		let config = &self.inner.config;
		let base = AuthParams::from_request(&request, config.oauth_endpoint.clone(), &config.api_version)?;
		let attempt = AuthenticatingState::enter(&self.inner.session);
		let solver = self.captcha_solver();
		let grant = CaptchaRetryLoop::new(solver.as_deref(), config.max_captcha_attempts)
			.with_metrics(&self.inner.metrics)
			.run(request.captcha.clone(), |answer| {
				let mut params = base.clone();

				params.captcha = answer;

				async move { self.inner.transport.authorize(&params).await }
			})
			.await?;

		if !grant.is_authorized() {
			return Err(Error::AuthenticationFailed {
				reason: "token endpoint issued no access token".into(),
			});
		}

		self.install_grant(grant, Some(request))?;
		attempt.complete();

		Ok(())
	}

	fn install_grant(
		&self,
		grant: AuthorizationResult,
		credentials: Option<AuthorizationRequest>,
	) -> Result<()> {
		let ttl = if grant.expires_in > 0 {
			Duration::seconds(grant.expires_in) - EXPIRY_MARGIN
		} else {
			Duration::ZERO
		};

		self.install(grant.access_token, grant.user_id, ttl, credentials)
	}

	fn install(
		&self,
		token: Secret,
		user_id: Option<UserId>,
		ttl: Duration,
		credentials: Option<AuthorizationRequest>,
	) -> Result<()> {
		let armed = self.arm_expiry(ttl)?;
		let expires_at = armed.then(|| OffsetDateTime::now_utc().saturating_add(ttl));

		self.inner.session.write().install(token, user_id, expires_at, credentials);

		#[cfg(feature = "tracing")]
		tracing::debug!(user_id = ?user_id, expires = armed, "Session token installed.");

		Ok(())
	}

	fn arm_expiry(&self, ttl: Duration) -> Result<bool> {
		let inner = Arc::downgrade(&self.inner);

		Ok(self.inner.expiry.arm(ttl, move || {
			let Some(inner) = inner.upgrade() else {
				return;
			};
			let client = Client { inner };

			{
				let mut session = client.inner.session.write();

				if session.state == TokenState::Authorized {
					session.state = TokenState::Expiring;
				}
			}

			client.inner.listeners.notify(&client);
		})?)
	}
}

/// Marks the session as authenticating and puts the previous state back when dropped before
/// [`complete`](Self::complete), including when the handshake future is cancelled.
struct AuthenticatingState<'a> {
	session: &'a RwLock<Session>,
	previous: TokenState,
	completed: bool,
}
impl<'a> AuthenticatingState<'a> {
	fn enter(session: &'a RwLock<Session>) -> Self {
		let previous = std::mem::replace(&mut session.write().state, TokenState::Authenticating);

		Self { session, previous, completed: false }
	}

	fn complete(mut self) {
		self.completed = true;
	}
}
impl Drop for AuthenticatingState<'_> {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let mut session = self.session.write();

		if session.state == TokenState::Authenticating {
			session.state = self.previous;
		}
	}
}
