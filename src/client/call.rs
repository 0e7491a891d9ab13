//! API method dispatch: authorization check, parameter defaults, throttling, captcha retries,
//! classification, and decoding.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	client::{CaptchaRetryLoop, Client},
	ext::CaptchaAnswer,
	http::ApiTransport,
	obs::{CallKind, CallSpan},
	params::Params,
	protocol::{self, Outcome},
};

/// Parameter carrying the API version.
pub const VERSION_PARAM: &str = "v";
/// Parameter carrying the response language.
pub const LANGUAGE_PARAM: &str = "lang";
/// Parameter carrying the access token.
pub const TOKEN_PARAM: &str = "access_token";

impl<T> Client<T>
where
	T: ?Sized + ApiTransport,
{
	/// Invokes `method` and returns the raw response text.
	///
	/// Fails with [`Error::Unauthorized`] before any network interaction when the client holds no
	/// token and `skip_authorization` is false. Authorized calls pass through the rate limiter;
	/// skipped ones are sent immediately. Captcha challenges are retried through the registered
	/// solver, and recognized API errors surface as [`Error::Remote`].
	pub async fn invoke(
		&self,
		method: &str,
		params: Params,
		skip_authorization: bool,
	) -> Result<String> {
		CallSpan::new(CallKind::Invoke, "invoke")
			.with_method(method)
			.run(self.dispatch(method, params, skip_authorization))
			.await
	}

	/// Invokes `method` and returns its `response` field as an untyped value.
	pub async fn call(&self, method: &str, params: Params, skip_authorization: bool) -> Result<Value> {
		let raw = self.invoke(method, params, skip_authorization).await?;

		protocol::response_value(&raw)
	}

	/// Invokes `method` and decodes its `response` field into `R`.
	pub async fn call_as<R>(&self, method: &str, params: Params, skip_authorization: bool) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let raw = self.invoke(method, params, skip_authorization).await?;

		protocol::response_as(&raw)
	}

	async fn dispatch(&self, method: &str, params: Params, skip_authorization: bool) -> Result<String> {
		if !skip_authorization && !self.is_authorized() {
			return Err(Error::Unauthorized);
		}

		let url = self.inner.config.method_url(method)?;
		let params = self.with_defaults(params);
		let Some(solver) = self.captcha_solver() else {
			return self.send_once(&url, &params, skip_authorization).await?.into_result();
		};

		CaptchaRetryLoop::new(Some(solver.as_ref()), self.inner.config.max_captcha_attempts)
			.with_metrics(&self.inner.metrics)
			.run(None, |answer| {
				let mut attempt = params.clone();
				let url = &url;

				CaptchaAnswer::merge_into(answer.as_ref(), &mut attempt);

				async move { self.send_once(url, &attempt, skip_authorization).await }
			})
			.await
	}

	fn with_defaults(&self, mut params: Params) -> Params {
		let session = self.inner.session.read();

		params.insert_if_absent(VERSION_PARAM, &self.inner.config.api_version);

		if let Some(language) = session.language {
			params.insert_if_absent(LANGUAGE_PARAM, language);
		}
		if let Some(token) = session.access_token.as_ref().filter(|token| !token.is_blank()) {
			params.insert_if_absent(TOKEN_PARAM, token.expose());
		}

		params
	}

	async fn send_once(
		&self,
		url: &Url,
		params: &Params,
		skip_authorization: bool,
	) -> Result<Outcome<String>> {
		if !skip_authorization {
			if let Some(waited) = self.inner.limiter.wait().await {
				self.inner.metrics.record_throttled();

				#[cfg(feature = "tracing")]
				tracing::debug!(waited_ms = waited.as_millis() as u64, "Throttled before sending.");
				#[cfg(not(feature = "tracing"))]
				let _ = waited;
			}
		}

		self.inner.metrics.record_invocation();

		let raw = self.inner.transport.send(url.clone(), params).await?;

		protocol::classify(raw)
	}
}
