// self
use crate::{
	_prelude::*,
	config::{
		ClientConfig, DEFAULT_API_ENDPOINT, DEFAULT_API_VERSION, DEFAULT_MAX_CAPTCHA_ATTEMPTS,
		DEFAULT_OAUTH_ENDPOINT, DEFAULT_REQUESTS_PER_SECOND,
	},
	error::ConfigError,
	limiter,
	session::Language,
};

/// Builder for [`ClientConfig`] values; also the serde shape of a config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigBuilder {
	/// API method endpoint.
	pub api_endpoint: String,
	/// Token endpoint.
	pub oauth_endpoint: String,
	/// API version.
	pub api_version: String,
	/// Request rate.
	pub requests_per_second: f64,
	/// Captcha solve bound.
	pub max_captcha_attempts: u32,
	/// Response language.
	pub language: Option<Language>,
}
impl ClientConfigBuilder {
	/// Overrides the API method endpoint.
	pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.api_endpoint = endpoint.into();

		self
	}

	/// Overrides the token endpoint.
	pub fn oauth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.oauth_endpoint = endpoint.into();

		self
	}

	/// Overrides the API version.
	pub fn api_version(mut self, version: impl Into<String>) -> Self {
		self.api_version = version.into();

		self
	}

	/// Sets the request rate; zero disables throttling.
	pub fn requests_per_second(mut self, rate: f64) -> Self {
		self.requests_per_second = rate;

		self
	}

	/// Sets the captcha solve bound.
	pub fn max_captcha_attempts(mut self, attempts: u32) -> Self {
		self.max_captcha_attempts = attempts;

		self
	}

	/// Sets the response language.
	pub fn language(mut self, language: Language) -> Self {
		self.language = Some(language);

		self
	}

	/// Validates and produces the configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let api_endpoint = parse_endpoint("api", &self.api_endpoint)?;
		let oauth_endpoint = parse_endpoint("oauth", &self.oauth_endpoint)?;

		if !api_endpoint.path().ends_with('/') {
			return Err(ConfigError::MalformedEndpoint { endpoint: "api", url: self.api_endpoint });
		}
		if self.api_version.trim().is_empty() {
			return Err(ConfigError::BlankApiVersion);
		}

		limiter::min_interval(self.requests_per_second)?;

		Ok(ClientConfig {
			api_endpoint,
			oauth_endpoint,
			api_version: self.api_version.trim().to_owned(),
			requests_per_second: self.requests_per_second,
			max_captcha_attempts: self.max_captcha_attempts,
			language: self.language,
		})
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			api_endpoint: DEFAULT_API_ENDPOINT.into(),
			oauth_endpoint: DEFAULT_OAUTH_ENDPOINT.into(),
			api_version: DEFAULT_API_VERSION.into(),
			requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
			max_captcha_attempts: DEFAULT_MAX_CAPTCHA_ATTEMPTS,
			language: None,
		}
	}
}
impl From<ClientConfig> for ClientConfigBuilder {
	fn from(config: ClientConfig) -> Self {
		Self {
			api_endpoint: config.api_endpoint.into(),
			oauth_endpoint: config.oauth_endpoint.into(),
			api_version: config.api_version,
			requests_per_second: config.requests_per_second,
			max_captcha_attempts: config.max_captcha_attempts,
			language: config.language,
		}
	}
}
impl TryFrom<ClientConfigBuilder> for ClientConfig {
	type Error = ConfigError;

	fn try_from(builder: ClientConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })?;

	match url.scheme() {
		"http" | "https" => Ok(url),
		_ => Err(ConfigError::MalformedEndpoint { endpoint, url: raw.to_owned() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_build() {
		let config = ClientConfig::builder().build().expect("Defaults should be valid.");

		assert_eq!(config.api_endpoint.as_str(), DEFAULT_API_ENDPOINT);
		assert_eq!(config.oauth_endpoint.as_str(), DEFAULT_OAUTH_ENDPOINT);
		assert_eq!(config.api_version, DEFAULT_API_VERSION);
		assert_eq!(config.requests_per_second, 3.);
		assert!(config.language.is_none());
	}

	#[test]
	fn invalid_settings_are_rejected() {
		assert!(matches!(
			ClientConfig::builder().requests_per_second(-2.).build(),
			Err(ConfigError::InvalidRateLimit { .. })
		));
		assert!(matches!(
			ClientConfig::builder().api_endpoint("https://api.vk.com/method").build(),
			Err(ConfigError::MalformedEndpoint { endpoint: "api", .. })
		));
		assert!(matches!(
			ClientConfig::builder().oauth_endpoint("ftp://oauth.vk.com/token").build(),
			Err(ConfigError::MalformedEndpoint { endpoint: "oauth", .. })
		));
		assert!(matches!(
			ClientConfig::builder().api_endpoint("not a url").build(),
			Err(ConfigError::InvalidEndpoint { .. })
		));
		assert!(matches!(
			ClientConfig::builder().api_version(" ").build(),
			Err(ConfigError::BlankApiVersion)
		));
	}
}
