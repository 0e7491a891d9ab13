//! Captcha challenge contracts shared by the dispatch and authorization paths.

// self
use crate::{_prelude::*, params::Params};

/// Boxed future returned by [`CaptchaSolver`] hooks.
pub type CaptchaFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Collaborator able to turn a captcha image into its solution text.
///
/// The client calls [`solve`](CaptchaSolver::solve) once per challenge and
/// [`report_incorrect`](CaptchaSolver::report_incorrect) whenever the API answers a submitted
/// solution with another challenge. Returning `None` from `solve` means the solver gave up, which
/// ends the retry loop with [`Error::ChallengeRequired`].
pub trait CaptchaSolver
where
	Self: Send + Sync,
{
	/// Produces the solution text for the captcha behind `image`.
	fn solve<'a>(&'a self, image: &'a Url) -> CaptchaFuture<'a, Option<String>>;

	/// Signals that the most recent solution was rejected.
	fn report_incorrect(&self) -> CaptchaFuture<'_, ()>;
}

/// Server-issued captcha that must be solved before a call can succeed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptchaChallenge {
	/// Challenge identifier (`captcha_sid`).
	pub id: u64,
	/// Image the solver must read (`captcha_img`).
	pub image: Url,
}
impl CaptchaChallenge {
	/// Creates a new challenge.
	pub fn new(id: u64, image: Url) -> Self {
		Self { id, image }
	}
}
impl Display for CaptchaChallenge {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.id)
	}
}

/// Solution submitted alongside the retried request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptchaAnswer {
	/// Identifier of the challenge being answered.
	pub sid: u64,
	/// Solution text.
	pub key: String,
}
impl CaptchaAnswer {
	/// Form/query key carrying the challenge identifier.
	pub const SID_PARAM: &'static str = "captcha_sid";
	/// Form/query key carrying the solution text.
	pub const KEY_PARAM: &'static str = "captcha_key";

	/// Creates an answer for the provided challenge identifier.
	pub fn new(sid: u64, key: impl Into<String>) -> Self {
		Self { sid, key: key.into() }
	}

	/// Writes `captcha_sid`/`captcha_key` into `params`, or clears both when no answer exists.
	///
	/// A blank solution counts as no answer, so transports never see empty captcha fields.
	pub fn merge_into(answer: Option<&Self>, params: &mut Params) {
		match answer.filter(|answer| !answer.key.trim().is_empty()) {
			Some(answer) => {
				params.insert(Self::SID_PARAM, answer.sid);
				params.insert(Self::KEY_PARAM, &answer.key);
			},
			None => {
				params.remove(Self::SID_PARAM);
				params.remove(Self::KEY_PARAM);
			},
		}
	}
}
