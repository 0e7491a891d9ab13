// self
use crate::{
	_prelude::*,
	obs::{self, CallKind, CallOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapped around one client operation.
///
/// The span carries `kind` and `stage` from creation, `method` for API invocations, and
/// `outcome` once [`run`](Self::run) finishes.
#[derive(Clone, Debug)]
pub struct CallSpan {
	kind: CallKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a span tagged with the operation kind and call site.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"vk_dispatch.call",
				kind = kind.as_str(),
				stage,
				method = tracing::field::Empty,
				outcome = tracing::field::Empty,
			);

			Self { kind, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self { kind }
		}
	}

	/// Records the API method name (`users.get`, ..).
	pub fn with_method(self, method: &str) -> Self {
		#[cfg(feature = "tracing")]
		self.span.record("method", method);
		#[cfg(not(feature = "tracing"))]
		let _ = method;

		self
	}

	/// Operation kind the span was created for.
	pub fn kind(&self) -> CallKind {
		self.kind
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Runs `fut` inside the span, counting the attempt and its outcome.
	pub async fn run<T, Fut>(&self, fut: Fut) -> Result<T>
	where
		Fut: Future<Output = Result<T>>,
	{
		obs::record_call_outcome(self.kind, CallOutcome::Attempt);

		let result = self.instrument(fut).await;
		let outcome = CallOutcome::of(&result);

		#[cfg(feature = "tracing")]
		self.span.record("outcome", outcome.as_str());

		obs::record_call_outcome(self.kind, outcome);

		result
	}
}
