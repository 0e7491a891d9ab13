//! Client configuration and its validating builder.

mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError, session::Language};

/// Default API method endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.vk.com/method/";
/// Default direct-auth token endpoint.
pub const DEFAULT_OAUTH_ENDPOINT: &str = "https://oauth.vk.com/token";
/// Default API version sent as `v`.
pub const DEFAULT_API_VERSION: &str = "5.199";
/// Default request rate.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 3.;
/// Default bound on captcha solve attempts per call.
pub const DEFAULT_MAX_CAPTCHA_ATTEMPTS: u32 = 5;

/// Validated client configuration.
///
/// Deserialization runs the same validation as [`ClientConfigBuilder::build`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClientConfigBuilder")]
pub struct ClientConfig {
	/// Base URL method names are joined onto; always ends with `/`.
	pub api_endpoint: Url,
	/// Direct-auth token endpoint.
	pub oauth_endpoint: Url,
	/// API version sent with every call.
	pub api_version: String,
	/// Initial request rate; zero disables throttling.
	pub requests_per_second: f64,
	/// Captcha solve attempts per call before giving up.
	pub max_captcha_attempts: u32,
	/// Initial response language.
	pub language: Option<Language>,
}
impl ClientConfig {
	/// Creates a builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Resolves the URL of an API method such as `users.get`.
	pub fn method_url(&self, method: &str) -> Result<Url, ConfigError> {
		let valid = !method.is_empty()
			&& method.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');

		if !valid {
			return Err(ConfigError::InvalidMethod { method: method.to_owned() });
		}

		self.api_endpoint
			.join(method)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "method", source })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn method_names_join_onto_the_endpoint() {
		let config = ClientConfig::builder().build().expect("Defaults should be valid.");

		assert_eq!(
			config.method_url("users.get").expect("Method name is valid.").as_str(),
			"https://api.vk.com/method/users.get"
		);
		assert!(matches!(
			config.method_url("../token"),
			Err(ConfigError::InvalidMethod { .. })
		));
		assert!(config.method_url("").is_err());
	}

	#[test]
	fn deserialization_validates() {
		let config: ClientConfig =
			serde_json::from_str("{\"api_version\":\"5.131\",\"language\":\"en\"}")
				.expect("Partial configs fall back to defaults.");

		assert_eq!(config.api_version, "5.131");
		assert_eq!(config.language, Some(Language::En));
		assert_eq!(config.max_captcha_attempts, DEFAULT_MAX_CAPTCHA_ATTEMPTS);
		assert!(serde_json::from_str::<ClientConfig>("{\"requests_per_second\":-1}").is_err());

		let round_trip: ClientConfig = serde_json::from_value(
			serde_json::to_value(&config).expect("Config should serialize."),
		)
		.expect("Serialized configs should deserialize.");

		assert_eq!(round_trip, config);
	}
}
