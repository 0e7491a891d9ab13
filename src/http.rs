//! Transport primitives for API calls and the direct-auth handshake.
//!
//! The client only depends on [`ApiTransport`]. The `reqwest` feature ships
//! [`ReqwestTransport`], which posts form bodies, resolves two-factor prompts with the request's
//! [`TwoFactorProvider`](crate::ext::TwoFactorProvider), and reads validation redirects.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::{Proxy, header::LOCATION};
// self
use crate::{
	_prelude::*,
	auth::{AuthParams, AuthorizationResult, Secret},
	params::Params,
	protocol::Outcome,
};
#[cfg(feature = "reqwest")]
use crate::{
	error::{ConfigError, TransportError},
	protocol::{self, OAuthReply},
};

/// Boxed future returned by [`ApiTransport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// HTTP capability consumed by the client.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by every
/// clone of a client and by the background expiry task.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Runs the direct-auth handshake, reporting captcha demands as [`Outcome::Challenge`].
	fn authorize<'a>(
		&'a self,
		params: &'a AuthParams,
	) -> TransportFuture<'a, Outcome<AuthorizationResult>>;

	/// Sends an API call and returns the raw response text.
	fn send<'a>(&'a self, url: Url, params: &'a Params) -> TransportFuture<'a, String>;

	/// Completes an out-of-band validation page and returns the resulting grant.
	fn validate<'a>(
		&'a self,
		url: &'a Url,
		phone: Option<&'a str>,
	) -> TransportFuture<'a, AuthorizationResult>;
}

/// Forward proxy settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
	/// Proxy host.
	pub host: String,
	/// Proxy port.
	pub port: u16,
	/// Proxy login.
	#[serde(default)]
	pub login: Option<String>,
	/// Proxy password.
	#[serde(default)]
	pub password: Option<Secret>,
}
impl ProxyConfig {
	/// Creates an unauthenticated proxy.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self { host: host.into(), port, login: None, password: None }
	}

	/// Adds basic credentials.
	pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<Secret>) -> Self {
		self.login = Some(login.into());
		self.password = Some(password.into());

		self
	}

	/// Proxy URL (`http://host:port`).
	pub fn url(&self) -> String {
		format!("http://{}:{}", self.host, self.port)
	}

	/// Builds a reqwest client that routes every request through this proxy.
	#[cfg(feature = "reqwest")]
	pub fn client(&self) -> Result<ReqwestClient> {
		let invalid = |e: ReqwestError| ConfigError::InvalidProxy {
			host: self.host.clone(),
			port: self.port,
			source: Box::new(e),
		};
		let mut proxy = Proxy::all(self.url()).map_err(invalid)?;

		if let (Some(login), Some(password)) = (&self.login, &self.password) {
			proxy = proxy.basic_auth(login, password.expose());
		}

		Ok(ReqwestClient::builder().proxy(proxy).build().map_err(ConfigError::from)?)
	}
}
impl Debug for ProxyConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProxyConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("login", &self.login)
			.field("password", &self.password)
			.finish()
	}
}

/// Thin wrapper around [`ReqwestClient`] implementing [`ApiTransport`].
///
/// Validation reads the token from the `Location` header when the wrapped client does not follow
/// redirects, and from the final URL otherwise.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport whose every request goes through `proxy`.
	pub fn with_proxy(proxy: &ProxyConfig) -> Result<Self> {
		Ok(Self(proxy.client()?))
	}

	fn client_for(&self, proxy: Option<&ProxyConfig>) -> Result<ReqwestClient> {
		match proxy {
			Some(proxy) => proxy.client(),
			None => Ok(self.0.clone()),
		}
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn authorize<'a>(
		&'a self,
		params: &'a AuthParams,
	) -> TransportFuture<'a, Outcome<AuthorizationResult>> {
		Box::pin(async move {
			let client = self.client_for(params.proxy.as_ref())?;
			let mut form = params.form();
			let mut code_sent = false;

			loop {
				let body = post_form(&client, params.endpoint.clone(), &form).await?;
				let reply = protocol::parse_oauth_reply(&body)?;
				let two_factor = reply.is_two_factor() && !code_sent;

				match reply {
					OAuthReply::Granted(result) => return Ok(Outcome::Complete(result)),
					OAuthReply::Challenge(challenge) => return Ok(Outcome::Challenge(challenge)),
					OAuthReply::NeedValidation { .. } if two_factor => {
						let provider = params.two_factor.as_ref().ok_or_else(|| {
							Error::ValidationFailed {
								reason: "account requires a two-factor code but no provider is set"
									.into(),
							}
						})?;
						let code = provider
							.code()
							.await
							.filter(|code| !code.trim().is_empty())
							.ok_or_else(|| Error::ValidationFailed {
								reason: "two-factor code provider returned no code".into(),
							})?;

						form = params.form_with_code(&code);
						code_sent = true;
					},
					OAuthReply::NeedValidation { redirect_uri, .. } =>
						return Err(Error::ValidationFailed {
							reason: match redirect_uri {
								Some(uri) => format!("validation required at {uri}"),
								None => "validation required".into(),
							},
						}),
					OAuthReply::Rejected { error, description } =>
						return Err(Error::AuthenticationFailed {
							reason: match description {
								Some(description) => format!("{error}: {description}"),
								None => error,
							},
						}),
				}
			}
		})
	}

	fn send<'a>(&'a self, url: Url, params: &'a Params) -> TransportFuture<'a, String> {
		Box::pin(async move { post_form(&self.0, url, params).await })
	}

	fn validate<'a>(
		&'a self,
		url: &'a Url,
		phone: Option<&'a str>,
	) -> TransportFuture<'a, AuthorizationResult> {
		Box::pin(async move {
			let mut url = url.clone();

			if let Some(phone) = phone {
				url.query_pairs_mut().append_pair("phone", phone);
			}

			let response = self.0.get(url).send().await.map_err(TransportError::from)?;
			let landing = response
				.headers()
				.get(LOCATION)
				.and_then(|location| location.to_str().ok())
				.and_then(|location| response.url().join(location).ok())
				.unwrap_or_else(|| response.url().clone());

			AuthorizationResult::from_fragment(&landing).ok_or_else(|| Error::ValidationFailed {
				reason: "validation did not yield an access token".into(),
			})
		})
	}
}

#[cfg(feature = "reqwest")]
async fn post_form(client: &ReqwestClient, url: Url, form: &Params) -> Result<String> {
	let response = client.post(url).form(form).send().await.map_err(TransportError::from)?;
	let status = response.status();
	let body = response.text().await.map_err(TransportError::from)?;

	if status.is_server_error() || (!status.is_success() && body.trim().is_empty()) {
		return Err(TransportError::Status { status: status.as_u16() }.into());
	}

	Ok(body)
}
