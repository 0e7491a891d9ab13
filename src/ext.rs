//! Public extension contracts for collaborators the client consults mid-call.
//!
//! Neither contract ships a concrete implementation: captcha solving may be a human in the loop
//! or an external recognition service, and two-factor codes usually come from an authenticator
//! the embedding application owns. Both traits return boxed futures so implementations stay
//! runtime-agnostic and object-safe behind `Arc<dyn …>`.

pub mod captcha;
pub mod two_factor;

pub use captcha::*;
pub use two_factor::*;
