//! Auth-domain identifiers, secrets, permission masks, and authorization payloads.

pub mod id;
pub mod permissions;
pub mod request;
pub mod result;
pub mod secret;

pub use id::*;
pub use permissions::*;
pub use request::*;
pub use result::*;
pub use secret::*;
