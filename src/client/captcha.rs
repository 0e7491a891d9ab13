//! Bounded captcha retry policy.

// self
use crate::{
	_prelude::*,
	client::DispatchMetrics,
	ext::{CaptchaAnswer, CaptchaSolver},
	protocol::Outcome,
};

/// Wraps an operation that may answer with a captcha challenge.
///
/// Up to `max_attempts` solutions are requested, which allows `max_attempts + 1` raw calls. A
/// solution is reported incorrect only when the API answers it with another challenge, so the
/// first challenge never triggers a report. Without a solver the first challenge is returned as
/// [`Error::ChallengeRequired`].
#[derive(Clone, Copy)]
pub struct CaptchaRetryLoop<'a> {
	solver: Option<&'a dyn CaptchaSolver>,
	max_attempts: u32,
	metrics: Option<&'a DispatchMetrics>,
}
impl<'a> CaptchaRetryLoop<'a> {
	/// Creates a retry loop.
	pub fn new(solver: Option<&'a dyn CaptchaSolver>, max_attempts: u32) -> Self {
		Self { solver, max_attempts, metrics: None }
	}

	/// Records challenges and solutions in `metrics`.
	pub fn with_metrics(mut self, metrics: &'a DispatchMetrics) -> Self {
		self.metrics = Some(metrics);

		self
	}

	/// Runs `op` until it completes or the retry budget is spent.
	///
	/// `op` receives the answer to submit with the attempt; `initial` is submitted with the first
	/// attempt and is never reported as incorrect since the solver did not produce it.
	pub async fn run<T, F, Fut>(&self, initial: Option<CaptchaAnswer>, mut op: F) -> Result<T>
	where
		F: FnMut(Option<CaptchaAnswer>) -> Fut,
		Fut: Future<Output = Result<Outcome<T>>>,
	{
		let mut remaining_solves = self.max_attempts;
		let mut remaining_calls = self.max_attempts.saturating_add(1);
		let mut answer = initial;
		let mut solver_answered = false;

		loop {
			remaining_calls -= 1;

			let challenge = match op(answer.clone()).await? {
				Outcome::Complete(value) => return Ok(value),
				Outcome::Challenge(challenge) => challenge,
			};

			if let Some(metrics) = self.metrics {
				metrics.record_challenge();
			}

			#[cfg(feature = "tracing")]
			tracing::debug!(captcha_sid = challenge.id, "Captcha challenge received.");

			let Some(solver) = self.solver else {
				return Err(Error::ChallengeRequired { challenge });
			};

			if solver_answered {
				solver.report_incorrect().await;

				if let Some(metrics) = self.metrics {
					metrics.record_rejected();
				}
			}
			if remaining_calls == 0 || remaining_solves == 0 {
				return Err(Error::ChallengeRequired { challenge });
			}

			let Some(key) = solver.solve(&challenge.image).await else {
				return Err(Error::ChallengeRequired { challenge });
			};

			remaining_solves -= 1;
			answer = Some(CaptchaAnswer::new(challenge.id, key));
			solver_answered = true;

			if let Some(metrics) = self.metrics {
				metrics.record_solution();
			}
		}
	}
}
impl Debug for CaptchaRetryLoop<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CaptchaRetryLoop")
			.field("solver_set", &self.solver.is_some())
			.field("max_attempts", &self.max_attempts)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{_preludet::ScriptedSolver, ext::CaptchaChallenge};

	fn challenge(id: u64) -> CaptchaChallenge {
		CaptchaChallenge::new(
			id,
			Url::parse(&format!("https://api.vk.com/captcha.php?sid={id}"))
				.expect("Fixture URL should parse."),
		)
	}

	#[tokio::test]
	async fn success_needs_no_solver() {
		let calls = AtomicUsize::new(0);
		let value = CaptchaRetryLoop::new(None, 5)
			.run(None, |_| {
				calls.fetch_add(1, Ordering::SeqCst);

				async { Ok(Outcome::Complete(7)) }
			})
			.await
			.expect("Completed outcomes pass through.");

		assert_eq!(value, 7);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn missing_solver_propagates_the_first_challenge() {
		let calls = AtomicUsize::new(0);
		let err = CaptchaRetryLoop::new(None, 5)
			.run(None, |_| {
				calls.fetch_add(1, Ordering::SeqCst);

				async { Ok::<Outcome<()>, Error>(Outcome::Challenge(challenge(1))) }
			})
			.await
			.expect_err("Challenges cannot be solved without a solver.");

		assert_eq!(err.challenge().map(|c| c.id), Some(1));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn wrong_answers_are_reported_before_success() {
		let solver = ScriptedSolver::with_answers(["a", "b", "c", "right"]);
		let metrics = DispatchMetrics::default();
		let submitted = Mutex::new(Vec::new());
		let value = CaptchaRetryLoop::new(Some(&solver), 5)
			.with_metrics(&metrics)
			.run(None, |answer| {
				let outcome = match &answer {
					Some(answer) if answer.key == "right" => Outcome::Complete("done"),
					_ => Outcome::Challenge(challenge(submitted.lock().len() as u64 + 10)),
				};

				submitted.lock().push(answer);

				async move { Ok(outcome) }
			})
			.await
			.expect("Fourth answer is accepted.");

		assert_eq!(value, "done");
		assert_eq!(solver.solve_count(), 4);
		assert_eq!(solver.rejected_count(), 3);
		assert_eq!(metrics.challenges(), 4);
		assert_eq!(metrics.rejected(), 3);

		let submitted = submitted.lock();

		assert_eq!(submitted.len(), 5);
		assert!(submitted[0].is_none());
		assert_eq!(submitted[1].as_ref().map(|a| a.sid), Some(10));
		assert_eq!(submitted[4].as_ref().map(|a| (a.sid, a.key.as_str())), Some((13, "right")));
	}

	#[tokio::test]
	async fn never_correct_solver_exhausts_the_budget() {
		let solver = ScriptedSolver::with_answers(["1", "2", "3", "4", "5", "6", "7"]);
		let calls = AtomicUsize::new(0);
		let err = CaptchaRetryLoop::new(Some(&solver), 5)
			.run(None, |_| {
				let id = calls.fetch_add(1, Ordering::SeqCst) as u64;

				async move { Ok::<Outcome<()>, Error>(Outcome::Challenge(challenge(id))) }
			})
			.await
			.expect_err("Budget is exhausted.");

		assert_eq!(calls.load(Ordering::SeqCst), 6);
		assert_eq!(solver.solve_count(), 5);
		assert_eq!(solver.rejected_count(), 5);
		assert_eq!(err.challenge().map(|c| c.id), Some(5));
	}

	#[tokio::test]
	async fn exhausted_solver_ends_the_loop() {
		let solver = ScriptedSolver::with_answers(["only"]);
		let calls = AtomicUsize::new(0);
		let err = CaptchaRetryLoop::new(Some(&solver), 5)
			.run(None, |_| {
				calls.fetch_add(1, Ordering::SeqCst);

				async { Ok::<Outcome<()>, Error>(Outcome::Challenge(challenge(3))) }
			})
			.await
			.expect_err("Solver gave up.");

		assert!(matches!(err, Error::ChallengeRequired { .. }));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert_eq!(solver.solve_count(), 2);
		assert_eq!(solver.rejected_count(), 1);
	}

	#[tokio::test]
	async fn operation_failures_are_not_retried() {
		let solver = ScriptedSolver::with_answers(["x"]);
		let err = CaptchaRetryLoop::new(Some(&solver), 5)
			.run(None, |_| async { Err::<Outcome<()>, _>(Error::Unauthorized) })
			.await
			.expect_err("Failures propagate.");

		assert!(matches!(err, Error::Unauthorized));
		assert_eq!(solver.solve_count(), 0);
	}
}
