//! Strongly typed numeric identifiers used by the API.

// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $inner:ty, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name($inner);
		impl $name {
			/// Wraps a raw identifier.
			pub const fn new(value: $inner) -> Self {
				Self(value)
			}

			/// Returns the raw identifier.
			pub const fn get(self) -> $inner {
				self.0
			}
		}
		impl From<$inner> for $name {
			fn from(value: $inner) -> Self {
				Self(value)
			}
		}
		impl From<$name> for $inner {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				Display::fmt(&self.0, f)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				s.trim()
					.parse::<$inner>()
					.map(Self)
					.map_err(|_| IdentifierError::Invalid { kind: $kind, value: s.to_owned() })
			}
		}
	};
}

/// Error returned when identifier parsing fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier is not a valid number.
	#[error("{kind} identifier `{value}` is not a valid number.")]
	Invalid {
		/// Kind of identifier (user, app).
		kind: &'static str,
		/// Rejected input.
		value: String,
	},
}

def_id! { UserId, i64, "Identifier of the user that owns a session token.", "User" }
def_id! { AppId, u64, "Identifier of the registered application (`client_id`).", "App" }

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_parse_and_format() {
		let user = UserId::from_str(" 42 ").expect("Padded digits should parse.");

		assert_eq!(user.get(), 42);
		assert_eq!(user.to_string(), "42");
		assert_eq!(format!("{user:?}"), "User(42)");
		assert!(AppId::from_str("-1").is_err(), "App identifiers are unsigned.");
		assert!(UserId::from_str("abc").is_err());
	}

	#[test]
	fn serde_is_transparent() {
		let user: UserId = serde_json::from_str("1").expect("User id should deserialize.");

		assert_eq!(user, UserId::new(1));
		assert_eq!(serde_json::to_string(&AppId::new(7)).expect("App id should serialize."), "7");
	}
}
