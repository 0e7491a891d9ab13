//! Two-factor code provider consulted when the OAuth endpoint asks for a second factor.

// self
use crate::_prelude::*;

/// Boxed future returned by [`TwoFactorProvider::code`].
pub type CodeFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + 'a + Send>>;

/// Supplies one-time codes for `2fa_*` validation.
///
/// Any `Fn() -> Option<String>` closure implements the trait, which covers the common case of
/// reading a code from a prompt or an authenticator secret.
pub trait TwoFactorProvider
where
	Self: Send + Sync,
{
	/// Returns the current code, or `None` when no code can be produced.
	fn code(&self) -> CodeFuture<'_>;
}
impl<F> TwoFactorProvider for F
where
	F: Fn() -> Option<String> + Send + Sync,
{
	fn code(&self) -> CodeFuture<'_> {
		let code = self();

		Box::pin(async move { code })
	}
}
