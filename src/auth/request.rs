//! Authorization requests and the transport-facing direct-auth parameter set.

// self
use crate::{
	_prelude::*,
	auth::{AppId, Permissions, Secret, UserId},
	ext::{CaptchaAnswer, TwoFactorProvider},
	http::ProxyConfig,
	params::Params,
};

/// Everything needed to obtain a session token.
///
/// Either a credential set (application id, login, password) for the direct-auth handshake or an
/// externally supplied access token. When [`access_token`](Self::access_token) is present it wins
/// and the credential fields are ignored.
#[derive(Clone, Default)]
pub struct AuthorizationRequest {
	/// Registered application identifier (`client_id`).
	pub app_id: Option<AppId>,
	/// Account login (phone or email).
	pub login: Option<String>,
	/// Account password.
	pub password: Option<Secret>,
	/// Application secret for trusted direct-auth applications.
	pub client_secret: Option<Secret>,
	/// Requested access rights.
	pub permissions: Permissions,
	/// Forward proxy used for the handshake.
	pub proxy: Option<ProxyConfig>,
	/// Supplies two-factor codes when the account requires them.
	pub two_factor: Option<Arc<dyn TwoFactorProvider>>,
	/// Pre-solved captcha submitted with the first handshake attempt.
	pub captcha: Option<CaptchaAnswer>,
	/// Externally supplied access token.
	pub access_token: Option<Secret>,
	/// Owner of the externally supplied token.
	pub user_id: Option<UserId>,
	/// Lifetime of the externally supplied token; zero or negative means it never expires.
	pub token_ttl: Duration,
}
impl AuthorizationRequest {
	/// Builds a credential-based request.
	pub fn with_credentials(
		app_id: AppId,
		login: impl Into<String>,
		password: impl Into<Secret>,
	) -> Self {
		Self {
			app_id: Some(app_id),
			login: Some(login.into()),
			password: Some(password.into()),
			..Default::default()
		}
	}

	/// Builds a request carrying an externally supplied token that never expires.
	pub fn with_token(access_token: impl Into<Secret>) -> Self {
		Self { access_token: Some(access_token.into()), ..Default::default() }
	}

	/// Sets the owner of an externally supplied token.
	pub fn user_id(mut self, user_id: UserId) -> Self {
		self.user_id = Some(user_id);

		self
	}

	/// Sets the lifetime of an externally supplied token.
	pub fn token_ttl(mut self, ttl: Duration) -> Self {
		self.token_ttl = ttl;

		self
	}

	/// Sets the requested access rights.
	pub fn permissions(mut self, permissions: Permissions) -> Self {
		self.permissions = permissions;

		self
	}

	/// Sets the application secret.
	pub fn client_secret(mut self, secret: impl Into<Secret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Routes the handshake through a forward proxy.
	pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
		self.proxy = Some(proxy);

		self
	}

	/// Registers a two-factor code provider.
	pub fn two_factor(mut self, provider: Arc<dyn TwoFactorProvider>) -> Self {
		self.two_factor = Some(provider);

		self
	}

	/// Attaches a captcha answer to the first handshake attempt.
	pub fn captcha(mut self, answer: CaptchaAnswer) -> Self {
		self.captcha = Some(answer);

		self
	}
}
impl Debug for AuthorizationRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationRequest")
			.field("app_id", &self.app_id)
			.field("login", &self.login)
			.field("password", &self.password)
			.field("client_secret", &self.client_secret)
			.field("permissions", &self.permissions)
			.field("proxy", &self.proxy)
			.field("two_factor", &self.two_factor.is_some())
			.field("captcha", &self.captcha)
			.field("access_token", &self.access_token)
			.field("user_id", &self.user_id)
			.field("token_ttl", &self.token_ttl)
			.finish()
	}
}

/// Direct-auth handshake parameters handed to [`ApiTransport::authorize`](crate::http::ApiTransport::authorize).
#[derive(Clone)]
pub struct AuthParams {
	/// Token endpoint.
	pub endpoint: Url,
	/// API version sent as `v`.
	pub api_version: String,
	/// Application identifier.
	pub app_id: AppId,
	/// Account login.
	pub login: String,
	/// Account password.
	pub password: Secret,
	/// Application secret.
	pub client_secret: Option<Secret>,
	/// Requested access rights.
	pub permissions: Permissions,
	/// Captcha answer for this attempt.
	pub captcha: Option<CaptchaAnswer>,
	/// Two-factor code provider.
	pub two_factor: Option<Arc<dyn TwoFactorProvider>>,
	/// Forward proxy.
	pub proxy: Option<ProxyConfig>,
}
impl AuthParams {
	/// Grant type used by the direct-auth handshake.
	pub const GRANT_TYPE: &'static str = "password";

	/// Extracts handshake parameters from a credential-based request.
	///
	/// Fails with [`Error::MissingCredential`] when the application id, login, or password is
	/// absent or blank.
	pub fn from_request(
		request: &AuthorizationRequest,
		endpoint: Url,
		api_version: impl Into<String>,
	) -> Result<Self> {
		let (Some(app_id), Some(login), Some(password)) =
			(request.app_id, request.login.as_ref(), request.password.as_ref())
		else {
			return Err(Error::MissingCredential);
		};

		if login.trim().is_empty() || password.is_blank() {
			return Err(Error::MissingCredential);
		}

		Ok(Self {
			endpoint,
			api_version: api_version.into(),
			app_id,
			login: login.clone(),
			password: password.clone(),
			client_secret: request.client_secret.clone(),
			permissions: request.permissions,
			captcha: None,
			two_factor: request.two_factor.clone(),
			proxy: request.proxy.clone(),
		})
	}

	/// Renders the form posted to the token endpoint.
	pub fn form(&self) -> Params {
		let mut form = Params::new()
			.with("grant_type", Self::GRANT_TYPE)
			.with("client_id", self.app_id)
			.with("username", &self.login)
			.with("password", self.password.expose())
			.with("v", &self.api_version)
			.with("2fa_supported", 1);

		form.set_optional("client_secret", self.client_secret.as_ref().map(Secret::expose));

		if !self.permissions.is_empty() {
			form.insert("scope", self.permissions.bits());
		}

		CaptchaAnswer::merge_into(self.captcha.as_ref(), &mut form);

		form
	}

	/// Renders the form resubmitted with a two-factor code.
	pub fn form_with_code(&self, code: &str) -> Params {
		let mut form = self.form();

		form.set_optional("code", Some(code));

		form
	}
}
impl Debug for AuthParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthParams")
			.field("endpoint", &self.endpoint.as_str())
			.field("app_id", &self.app_id)
			.field("login", &self.login)
			.field("permissions", &self.permissions)
			.field("captcha", &self.captcha)
			.field("two_factor", &self.two_factor.is_some())
			.field("proxy", &self.proxy)
			.finish_non_exhaustive()
	}
}
