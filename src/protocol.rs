//! Response classification and decoding for API and token-endpoint payloads.
//!
//! API methods answer either `{"response": ..}` or
//! `{"error": {"error_code": .., "error_msg": .., "captcha_sid": .., "captcha_img": ..}}`.
//! The token endpoint answers either a token grant or `{"error": "..", ..}`.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::AuthorizationResult,
	error::{DecodeError, RemoteError},
	ext::CaptchaChallenge,
};

/// Tagged result of one remote round trip.
///
/// Challenges are ordinary values so retry loops branch on the tag instead of on an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
	/// The call completed.
	Complete(T),
	/// The API requires a solved captcha before the call can complete.
	Challenge(CaptchaChallenge),
}
impl<T> Outcome<T> {
	/// Converts the outcome into a result, surfacing challenges as [`Error::ChallengeRequired`].
	pub fn into_result(self) -> Result<T> {
		match self {
			Self::Complete(value) => Ok(value),
			Self::Challenge(challenge) => Err(Error::ChallengeRequired { challenge }),
		}
	}
}

macro_rules! remote_error_kinds {
	($($(#[doc = $doc:literal])* $variant:ident = $code:literal,)+) => {
		/// Classification of API error codes.
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum RemoteErrorKind {
			$($(#[doc = $doc])* $variant,)+
			/// Code without a dedicated variant.
			Other(i64),
		}
		impl RemoteErrorKind {
			/// Maps a numeric error code onto its kind.
			pub const fn from_code(code: i64) -> Self {
				match code {
					$($code => Self::$variant,)+
					other => Self::Other(other),
				}
			}

			/// Numeric error code of this kind.
			pub const fn code(self) -> i64 {
				match self {
					$(Self::$variant => $code,)+
					Self::Other(code) => code,
				}
			}
		}
	};
}

remote_error_kinds! {
	/// Unknown error occurred.
	Unknown = 1,
	/// Application is disabled.
	AppDisabled = 2,
	/// Unknown method passed.
	UnknownMethod = 3,
	/// Incorrect signature.
	InvalidSignature = 4,
	/// User authorization failed.
	AuthorizationFailed = 5,
	/// Too many requests per second.
	TooManyRequests = 6,
	/// Permission to perform this action is denied.
	PermissionDenied = 7,
	/// Invalid request.
	InvalidRequest = 8,
	/// Flood control.
	FloodControl = 9,
	/// Internal server error.
	InternalServerError = 10,
	/// Application must be turned off while in test mode.
	TestMode = 11,
	/// Captcha needed.
	Captcha = 14,
	/// Access denied.
	AccessDenied = 15,
	/// HTTPS required.
	HttpsRequired = 16,
	/// Validation required.
	ValidationRequired = 17,
	/// User was deleted or banned.
	UserDeletedOrBanned = 18,
	/// Permission denied for non-standalone applications.
	StandaloneOnly = 20,
	/// Permission allowed only to standalone and Open API applications.
	StandaloneAndOpenApiOnly = 21,
	/// Method was disabled.
	MethodDisabled = 23,
	/// Confirmation required.
	ConfirmationRequired = 24,
	/// Group authorization failed.
	GroupTokenForbidden = 27,
	/// Application authorization failed.
	AppTokenForbidden = 28,
	/// Rate limit reached.
	RateLimitReached = 29,
	/// Profile is private.
	PrivateProfile = 30,
	/// One of the parameters is missing or invalid.
	InvalidParameter = 100,
	/// Invalid application id.
	InvalidAppId = 101,
	/// Invalid user id.
	InvalidUserId = 113,
	/// Access to the album is denied.
	AlbumAccessDenied = 200,
	/// Access to the audio is denied.
	AudioAccessDenied = 201,
	/// Access to the group is denied.
	GroupAccessDenied = 203,
	/// Current user is in the blacklist.
	Blacklisted = 900,
	/// User has forbidden messages from the group.
	MessagesForbidden = 901,
	/// Privacy settings prevent the action.
	PrivacySettings = 902,
}

/// Classifies a raw API response.
///
/// Recognized error payloads become [`Error::Remote`], captcha errors become
/// [`Outcome::Challenge`], and everything else (including text that is not JSON) passes through
/// untouched for the decoding step to judge.
pub fn classify(raw: String) -> Result<Outcome<String>> {
	let Ok(Value::Object(envelope)) = serde_json::from_str::<Value>(&raw) else {
		return Ok(Outcome::Complete(raw));
	};
	let Some(Value::Object(error)) = envelope.get("error") else {
		return Ok(Outcome::Complete(raw));
	};
	let Some(code) = error.get("error_code").and_then(Value::as_i64) else {
		return Ok(Outcome::Complete(raw));
	};
	let kind = RemoteErrorKind::from_code(code);

	if kind == RemoteErrorKind::Captcha {
		if let Some(challenge) = challenge_from(error) {
			return Ok(Outcome::Challenge(challenge));
		}
	}

	let message = error.get("error_msg").and_then(Value::as_str).unwrap_or_default().to_owned();

	Err(RemoteError { kind, code, message }.into())
}

/// Extracts the top-level `response` field as an untyped value.
pub fn response_value(raw: &str) -> Result<Value> {
	let de = &mut serde_json::Deserializer::from_str(raw);
	let mut envelope: Map<String, Value> =
		serde_path_to_error::deserialize(de).map_err(DecodeError::from)?;

	envelope.remove("response").ok_or_else(|| DecodeError::MissingResponse.into())
}

/// Decodes the top-level `response` field into `T`, reporting the failing JSON path.
pub fn response_as<T>(raw: &str) -> Result<T>
where
	T: DeserializeOwned,
{
	let value = response_value(raw)?;

	Ok(serde_path_to_error::deserialize(value).map_err(DecodeError::from)?)
}

/// Interpreted token-endpoint reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OAuthReply {
	/// Token was issued.
	Granted(AuthorizationResult),
	/// Handshake must be repeated with a solved captcha.
	Challenge(CaptchaChallenge),
	/// Account needs out-of-band validation.
	NeedValidation {
		/// Validation type (`2fa_sms`, `2fa_app`, ..), when reported.
		validation_type: Option<String>,
		/// Page where validation completes.
		redirect_uri: Option<String>,
	},
	/// Handshake was rejected.
	Rejected {
		/// Error code (`invalid_client`, `invalid_request`, ..).
		error: String,
		/// Human-readable description, when reported.
		description: Option<String>,
	},
}
impl OAuthReply {
	/// Returns true if validation can be completed with a two-factor code.
	pub fn is_two_factor(&self) -> bool {
		matches!(
			self,
			Self::NeedValidation { validation_type: Some(kind), .. } if kind.starts_with("2fa_")
		)
	}
}

/// Interprets a token-endpoint body.
pub fn parse_oauth_reply(raw: &str) -> Result<OAuthReply> {
	let de = &mut serde_json::Deserializer::from_str(raw);
	let body: Map<String, Value> = serde_path_to_error::deserialize(de).map_err(DecodeError::from)?;
	let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_owned);

	if let Some(token) = text("access_token") {
		return Ok(OAuthReply::Granted(AuthorizationResult::new(
			token,
			body.get("user_id").and_then(Value::as_i64).map(Into::into),
			body.get("expires_in").and_then(Value::as_i64).unwrap_or_default(),
		)));
	}

	let error = text("error").unwrap_or_else(|| "unknown_error".into());

	let reply = match error.as_str() {
		"need_captcha" => challenge_from(&body).map(OAuthReply::Challenge),
		"need_validation" => Some(OAuthReply::NeedValidation {
			validation_type: text("validation_type"),
			redirect_uri: text("redirect_uri"),
		}),
		_ => None,
	};

	Ok(reply.unwrap_or_else(|| OAuthReply::Rejected { error, description: text("error_description") }))
}

fn challenge_from(fields: &Map<String, Value>) -> Option<CaptchaChallenge> {
	let id = match fields.get("captcha_sid")? {
		Value::Number(number) => number.as_u64()?,
		Value::String(text) => text.trim().parse().ok()?,
		_ => return None,
	};
	let image = fields.get("captcha_img").and_then(Value::as_str).and_then(|uri| Url::parse(uri).ok())?;

	Some(CaptchaChallenge::new(id, image))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn code_table_is_one_to_one() {
		for code in [1, 5, 6, 7, 9, 14, 29, 100, 113, 203, 900, 902] {
			assert_eq!(RemoteErrorKind::from_code(code).code(), code);
		}

		assert_eq!(RemoteErrorKind::from_code(7), RemoteErrorKind::PermissionDenied);
		assert_eq!(RemoteErrorKind::from_code(4242), RemoteErrorKind::Other(4242));
	}

	#[test]
	fn classify_passes_successful_payloads_through() {
		let raw = "{\"response\":{\"a\":1}}".to_owned();

		assert_eq!(classify(raw.clone()).expect("Success payload is not an error."), Outcome::Complete(raw));
	}

	#[test]
	fn classify_maps_error_codes() {
		let err = classify(
			"{\"error\":{\"error_code\":900,\"error_msg\":\"Can't send messages\"}}".into(),
		)
		.expect_err("Error payloads must fail.");

		match err {
			Error::Remote(remote) => {
				assert_eq!(remote.kind, RemoteErrorKind::Blacklisted);
				assert_eq!(remote.code, 900);
				assert_eq!(remote.message, "Can't send messages");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn classify_turns_captcha_errors_into_challenges() {
		let outcome = classify(
			"{\"error\":{\"error_code\":14,\"error_msg\":\"Captcha needed\",\"captcha_sid\":\"548\",\
			 \"captcha_img\":\"https://api.vk.com/captcha.php?sid=548\"}}"
				.into(),
		)
		.expect("Captcha errors are challenges, not failures.");

		match outcome {
			Outcome::Challenge(challenge) => {
				assert_eq!(challenge.id, 548);
				assert_eq!(challenge.image.as_str(), "https://api.vk.com/captcha.php?sid=548");
			},
			other => panic!("Unexpected outcome: {other:?}."),
		}
	}

	#[test]
	fn captcha_errors_without_image_are_remote_failures() {
		let err = classify("{\"error\":{\"error_code\":14,\"error_msg\":\"Captcha needed\"}}".into())
			.expect_err("Incomplete challenges cannot be retried.");

		assert_eq!(err.remote_kind(), Some(RemoteErrorKind::Captcha));
	}

	#[test]
	fn response_decodes_untyped_and_typed() {
		#[derive(Debug, Deserialize)]
		struct Shape {
			a: i64,
		}

		let raw = "{\"response\":{\"a\":1}}";

		assert_eq!(response_value(raw).expect("Payload has a response."), serde_json::json!({ "a": 1 }));
		assert_eq!(response_as::<Shape>(raw).expect("Payload matches the shape.").a, 1);
	}

	#[test]
	fn decode_failures_are_distinct() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Shape {
			a: i64,
		}

		assert!(matches!(
			response_value("{\"other\":1}"),
			Err(Error::Decode(DecodeError::MissingResponse))
		));
		assert!(matches!(response_value("not json"), Err(Error::Decode(DecodeError::Json { .. }))));

		match response_as::<Shape>("{\"response\":{\"a\":\"x\"}}") {
			Err(Error::Decode(DecodeError::Json { source })) =>
				assert_eq!(source.path().to_string(), "a"),
			other => panic!("Unexpected decode result: {other:?}."),
		}
	}

	#[test]
	fn oauth_replies_are_interpreted() {
		assert_eq!(
			parse_oauth_reply("{\"access_token\":\"t\",\"expires_in\":0,\"user_id\":9}")
				.expect("Grant should parse."),
			OAuthReply::Granted(AuthorizationResult::new("t", Some(9.into()), 0))
		);

		let captcha = parse_oauth_reply(
			"{\"error\":\"need_captcha\",\"captcha_sid\":12,\"captcha_img\":\"https://api.vk.com/captcha.php?sid=12\"}",
		)
		.expect("Captcha reply should parse.");

		assert!(matches!(captcha, OAuthReply::Challenge(ref c) if c.id == 12));

		let two_factor = parse_oauth_reply(
			"{\"error\":\"need_validation\",\"validation_type\":\"2fa_sms\",\"redirect_uri\":\"https://m.vk.com/login?act=authcheck\"}",
		)
		.expect("Validation reply should parse.");

		assert!(two_factor.is_two_factor());
		assert_eq!(
			parse_oauth_reply("{\"error\":\"invalid_client\",\"error_description\":\"Username or password is incorrect\"}")
				.expect("Rejection should parse."),
			OAuthReply::Rejected {
				error: "invalid_client".into(),
				description: Some("Username or password is incorrect".into()),
			}
		);
	}
}
