//! Result of a successful (or rejected) handshake.

// self
use crate::{
	_prelude::*,
	auth::{Secret, UserId},
};

/// Token grant reported by a transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
	/// Issued access token; blank when the handshake did not authorize.
	pub access_token: Secret,
	/// Owner of the token.
	#[serde(default)]
	pub user_id: Option<UserId>,
	/// Reported lifetime in seconds; zero means the token never expires.
	#[serde(default)]
	pub expires_in: i64,
}
impl AuthorizationResult {
	/// Creates a new result.
	pub fn new(access_token: impl Into<Secret>, user_id: Option<UserId>, expires_in: i64) -> Self {
		Self { access_token: access_token.into(), user_id, expires_in }
	}

	/// Returns true if a non-blank token was issued.
	pub fn is_authorized(&self) -> bool {
		!self.access_token.is_blank()
	}

	/// Reads a token grant from a redirect URL fragment
	/// (`#access_token=..&expires_in=..&user_id=..`).
	pub fn from_fragment(url: &Url) -> Option<Self> {
		let fragment = url.fragment()?;
		let mut result = Self::new("", None, 0);

		for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
			match key.as_ref() {
				"access_token" => result.access_token = Secret::new(value.into_owned()),
				"expires_in" => result.expires_in = value.parse().unwrap_or_default(),
				"user_id" => result.user_id = value.parse().ok(),
				_ => (),
			}
		}

		result.is_authorized().then_some(result)
	}
}
