//! Session state owned by a client: token, owner, expiry deadline, and language.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationRequest, Secret, UserId},
};

/// Language requested for localized API responses (`lang`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	/// Russian.
	Ru,
	/// Ukrainian.
	Uk,
	/// Belarusian.
	Be,
	/// English.
	En,
	/// Spanish.
	Es,
	/// Finnish.
	Fi,
	/// German.
	De,
	/// Italian.
	It,
}
impl Language {
	/// Wire code sent as the `lang` parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Ru => "ru",
			Self::Uk => "uk",
			Self::Be => "be",
			Self::En => "en",
			Self::Es => "es",
			Self::Fi => "fi",
			Self::De => "de",
			Self::It => "it",
		}
	}
}
impl Display for Language {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Language {
	type Err = LanguageError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let language = match s.trim().to_ascii_lowercase().as_str() {
			"ru" => Self::Ru,
			"uk" | "ua" => Self::Uk,
			"be" => Self::Be,
			"en" => Self::En,
			"es" => Self::Es,
			"fi" => Self::Fi,
			"de" => Self::De,
			"it" => Self::It,
			_ => return Err(LanguageError::Unsupported { code: s.to_owned() }),
		};

		Ok(language)
	}
}

/// Error returned when a language code is not supported.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LanguageError {
	/// Unknown code.
	#[error("Language `{code}` is not supported.")]
	Unsupported {
		/// Rejected code.
		code: String,
	},
}

/// Token lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TokenState {
	/// No token.
	#[default]
	Unauthenticated,
	/// A credential handshake is running.
	Authenticating,
	/// A token is installed.
	Authorized,
	/// The token's validity window elapsed and listeners were notified.
	Expiring,
}

/// Snapshot of the client's session.
#[derive(Clone, Debug, Default)]
pub struct Session {
	/// Current access token.
	pub access_token: Option<Secret>,
	/// Owner of the current token.
	pub user_id: Option<UserId>,
	/// Instant at which the expiry notification fires; `None` for tokens that never expire.
	pub expires_at: Option<OffsetDateTime>,
	/// Preferred response language.
	pub language: Option<Language>,
	/// Lifecycle state.
	pub state: TokenState,
	pub(crate) credentials: Option<AuthorizationRequest>,
}
impl Session {
	/// Returns true if a non-blank access token is installed.
	pub fn is_authorized(&self) -> bool {
		self.access_token.as_ref().is_some_and(|token| !token.is_blank())
	}

	/// Returns true if the session can be refreshed by replaying credentials.
	pub fn is_refreshable(&self) -> bool {
		self.credentials.is_some()
	}

	pub(crate) fn install(
		&mut self,
		access_token: Secret,
		user_id: Option<UserId>,
		expires_at: Option<OffsetDateTime>,
		credentials: Option<AuthorizationRequest>,
	) {
		self.access_token = Some(access_token);
		self.user_id = user_id;
		self.expires_at = expires_at;
		self.state = TokenState::Authorized;
		self.credentials = credentials;
	}

	pub(crate) fn clear(&mut self) {
		self.access_token = None;
		self.user_id = None;
		self.expires_at = None;
		self.state = TokenState::Unauthenticated;
		self.credentials = None;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authorization_requires_non_blank_token() {
		let mut session = Session::default();

		assert!(!session.is_authorized());

		session.install(Secret::new(" "), None, None, None);

		assert!(!session.is_authorized());

		session.install(Secret::new("token"), Some(UserId::new(1)), None, None);

		assert!(session.is_authorized());
		assert!(!session.is_refreshable());
		assert_eq!(session.state, TokenState::Authorized);

		session.clear();

		assert!(!session.is_authorized());
		assert_eq!(session.state, TokenState::Unauthenticated);
	}

	#[test]
	fn languages_round_trip_through_codes() {
		assert_eq!(Language::from_str("EN"), Ok(Language::En));
		assert_eq!(Language::Uk.to_string(), "uk");
		assert!(Language::from_str("xx").is_err());
	}
}
