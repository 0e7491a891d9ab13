//! Rate-limited, captcha-resilient request dispatch for the VK API, with a token lifecycle that
//! authorizes, arms expiry notifications, and replays credentials on refresh.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
#[cfg(feature = "blocking")] pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod expiry;
pub mod ext;
pub mod http;
pub mod limiter;
pub mod obs;
pub mod params;
pub mod protocol;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::Client,
		config::ClientConfig,
		ext::{CaptchaFuture, CaptchaSolver},
		http::{ApiTransport, TransportFuture},
		auth::{AuthParams, AuthorizationResult},
		params::Params,
		protocol::Outcome,
	};

	/// Transport spy that replays scripted responses and records every request it receives.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		/// Raw API responses returned by [`ApiTransport::send`], front first.
		pub responses: Mutex<Vec<String>>,
		/// Authorization outcomes returned by [`ApiTransport::authorize`], front first.
		pub authorizations: Mutex<Vec<Result<Outcome<AuthorizationResult>>>>,
		/// Every `(url, params)` pair passed to [`ApiTransport::send`].
		pub sent: Mutex<Vec<(Url, Params)>>,
		/// Every form submitted through [`ApiTransport::authorize`].
		pub auth_forms: Mutex<Vec<Params>>,
	}
	impl ScriptedTransport {
		/// Queues a raw API response.
		pub fn push_response(&self, raw: impl Into<String>) {
			self.responses.lock().push(raw.into());
		}

		/// Queues an authorization outcome.
		pub fn push_authorization(&self, outcome: Result<Outcome<AuthorizationResult>>) {
			self.authorizations.lock().push(outcome);
		}

		/// Number of API requests observed so far.
		pub fn send_count(&self) -> usize {
			self.sent.lock().len()
		}

		/// Number of authorization handshakes observed so far.
		pub fn authorize_count(&self) -> usize {
			self.auth_forms.lock().len()
		}
	}
	impl ApiTransport for ScriptedTransport {
		fn authorize<'a>(
			&'a self,
			params: &'a AuthParams,
		) -> TransportFuture<'a, Outcome<AuthorizationResult>> {
			Box::pin(async move {
				self.auth_forms.lock().push(params.form());

				let mut queue = self.authorizations.lock();

				if queue.is_empty() {
					return Err(Error::AuthenticationFailed {
						reason: "No scripted authorization outcome left.".into(),
					});
				}

				queue.remove(0)
			})
		}

		fn send<'a>(&'a self, url: Url, params: &'a Params) -> TransportFuture<'a, String> {
			Box::pin(async move {
				self.sent.lock().push((url, params.clone()));

				let mut queue = self.responses.lock();

				if queue.is_empty() {
					return Ok("{\"response\":1}".into());
				}

				Ok(queue.remove(0))
			})
		}

		fn validate<'a>(
			&'a self,
			_url: &'a Url,
			_phone: Option<&'a str>,
		) -> TransportFuture<'a, AuthorizationResult> {
			Box::pin(async move {
				let mut queue = self.authorizations.lock();

				if queue.is_empty() {
					return Err(Error::ValidationFailed {
						reason: "No scripted validation outcome left.".into(),
					});
				}

				queue.remove(0)?.into_result()
			})
		}
	}

	/// Solver spy that hands out scripted answers and counts rejections.
	#[derive(Debug, Default)]
	pub struct ScriptedSolver {
		/// Answers returned by [`CaptchaSolver::solve`], front first; `None` once drained.
		pub answers: Mutex<Vec<String>>,
		/// Image URIs the solver was asked about.
		pub solved: Mutex<Vec<Url>>,
		/// Number of [`CaptchaSolver::report_incorrect`] calls.
		pub rejected: Mutex<usize>,
	}
	impl ScriptedSolver {
		/// Builds a solver that returns the given answers in order.
		pub fn with_answers<I, S>(answers: I) -> Self
		where
			I: IntoIterator<Item = S>,
			S: Into<String>,
		{
			Self { answers: Mutex::new(answers.into_iter().map(Into::into).collect()), ..Default::default() }
		}

		/// Number of solve requests served.
		pub fn solve_count(&self) -> usize {
			self.solved.lock().len()
		}

		/// Number of answers reported as incorrect.
		pub fn rejected_count(&self) -> usize {
			*self.rejected.lock()
		}
	}
	impl CaptchaSolver for ScriptedSolver {
		fn solve<'a>(&'a self, image: &'a Url) -> CaptchaFuture<'a, Option<String>> {
			Box::pin(async move {
				self.solved.lock().push(image.clone());

				let mut answers = self.answers.lock();

				if answers.is_empty() { None } else { Some(answers.remove(0)) }
			})
		}

		fn report_incorrect(&self) -> CaptchaFuture<'_, ()> {
			Box::pin(async move {
				*self.rejected.lock() += 1;
			})
		}
	}

	/// Builds a client over a [`ScriptedTransport`] with throttling disabled.
	pub fn scripted_client() -> (Client<ScriptedTransport>, Arc<ScriptedTransport>) {
		let transport = Arc::new(ScriptedTransport::default());
		let config = ClientConfig::builder()
			.requests_per_second(0.)
			.build()
			.expect("Default test configuration should be valid.");
		let client = Client::with_transport(config, transport.clone())
			.expect("Validated configuration should build a client.");

		(client, transport)
	}

	/// Builds a successful authorization result fixture.
	pub fn authorized(token: &str, user_id: i64, expires_in: i64) -> AuthorizationResult {
		AuthorizationResult::new(token, Some(crate::auth::UserId::new(user_id)), expires_in)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;

pub use client::Client;
pub use error::{Error, Result};
