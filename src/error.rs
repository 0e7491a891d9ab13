//! Client-level error types shared by dispatch, authorization, and transports.

// self
use crate::{_prelude::*, ext::CaptchaChallenge, protocol::RemoteErrorKind};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; raised before any state change.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The call succeeded but its payload could not be interpreted.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// The API answered with a recognized error payload.
	#[error(transparent)]
	Remote(#[from] RemoteError),

	/// A call requiring authorization was attempted without a token.
	#[error("Client is not authorized; authorize before calling API methods.")]
	Unauthorized,
	/// Authorization was requested without a usable token or credential set.
	#[error("Authorization request is missing a credential.")]
	MissingCredential,
	/// Refresh was requested but the session was not obtained from credentials.
	#[error("Session cannot be refreshed because it was not authorized with credentials.")]
	NotRefreshable,
	/// The API demands a solved captcha before the call can proceed.
	#[error("Captcha {challenge} must be solved before the call can proceed.")]
	ChallengeRequired {
		/// Last unresolved challenge.
		challenge: CaptchaChallenge,
	},
	/// Credential handshake was rejected.
	#[error("Authorization failed: {reason}.")]
	AuthenticationFailed {
		/// Server- or client-supplied reason string.
		reason: String,
	},
	/// Out-of-band (phone / two-factor) validation did not complete.
	#[error("Validation failed: {reason}.")]
	ValidationFailed {
		/// Server- or client-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns the pending challenge if this error is [`Error::ChallengeRequired`].
	pub fn challenge(&self) -> Option<&CaptchaChallenge> {
		match self {
			Self::ChallengeRequired { challenge } => Some(challenge),
			_ => None,
		}
	}

	/// Returns the remote error classification, if the API produced this failure.
	pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
		match self {
			Self::Remote(remote) => Some(remote.kind),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Rate limit must be a non-negative number.
	#[error("Rate limit must be a non-negative number of requests per second, got {value}.")]
	InvalidRateLimit {
		/// Rejected value.
		value: f64,
	},
	/// Endpoint URL cannot be parsed or joined.
	#[error("Endpoint `{endpoint}` is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint URL has an unusable shape.
	#[error("The {endpoint} endpoint is malformed: {url}.")]
	MalformedEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// API version string is blank.
	#[error("API version cannot be blank.")]
	BlankApiVersion,
	/// Method name cannot be joined onto the API endpoint.
	#[error("Method name `{method}` is invalid.")]
	InvalidMethod {
		/// Rejected method name.
		method: String,
	},
	/// Private runtime of the blocking facade could not start.
	#[error("Blocking runtime could not be started.")]
	RuntimeBuild(#[source] std::io::Error),
	/// Timers need an ambient Tokio runtime.
	#[error("Expiry timer requires a running Tokio runtime.")]
	MissingRuntime,
	/// Proxy settings are unusable.
	#[error("Proxy `{host}:{port}` is invalid.")]
	InvalidProxy {
		/// Proxy host.
		host: String,
		/// Proxy port.
		port: u16,
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Endpoint answered with an unexpected HTTP status.
	#[error("API endpoint answered with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures interpreting a successful response.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Raw text is not JSON or does not match the requested shape.
	#[error("Response does not match the requested shape.")]
	Json {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Payload has no top-level `response` field.
	#[error("Response payload has no `response` field.")]
	MissingResponse,
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
	fn from(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Json { source }
	}
}

/// Recognized error payload returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("API error {code} ({kind:?}): {message}.")]
pub struct RemoteError {
	/// Classified error kind.
	pub kind: RemoteErrorKind,
	/// Raw numeric error code.
	pub code: i64,
	/// Server-supplied message.
	pub message: String,
}
