//! Application permission bitmask requested during authorization.

// std
use std::ops::{BitOr, BitOrAssign};
// self
use crate::_prelude::*;

/// Errors emitted when parsing permission lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum PermissionsError {
	/// The permission name is not recognized.
	#[error("Permission `{name}` is not recognized.")]
	Unknown {
		/// The offending permission name.
		name: String,
	},
}

/// Access rights bitmask sent as the `scope` field of the direct-auth form.
///
/// Names parse case-insensitively from comma- or whitespace-separated lists; a bare
/// number is accepted as a raw mask. [`Display`] renders the canonical comma list.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u64);
impl Permissions {
	/// Ads cabinet.
	pub const ADS: Self = Self(1 << 15);
	/// Audio.
	pub const AUDIO: Self = Self(1 << 3);
	/// Documents.
	pub const DOCS: Self = Self(1 << 17);
	/// Email address.
	pub const EMAIL: Self = Self(1 << 22);
	/// Friends.
	pub const FRIENDS: Self = Self(1 << 1);
	/// Communities.
	pub const GROUPS: Self = Self(1 << 18);
	/// Market.
	pub const MARKET: Self = Self(1 << 27);
	/// Left-menu link.
	pub const MENU: Self = Self(1 << 8);
	/// Messages (legacy apps only).
	pub const MESSAGES: Self = Self(1 << 12);
	/// Notes.
	pub const NOTES: Self = Self(1 << 11);
	/// Notifications.
	pub const NOTIFICATIONS: Self = Self(1 << 19);
	/// User allowed to send notifications.
	pub const NOTIFY: Self = Self(1);
	/// Token that never expires.
	pub const OFFLINE: Self = Self(1 << 16);
	/// Wiki pages.
	pub const PAGES: Self = Self(1 << 7);
	/// Photos.
	pub const PHOTOS: Self = Self(1 << 2);
	/// Statistics.
	pub const STATS: Self = Self(1 << 20);
	/// Status.
	pub const STATUS: Self = Self(1 << 10);
	/// Stories.
	pub const STORIES: Self = Self(1 << 6);
	/// Video.
	pub const VIDEO: Self = Self(1 << 4);
	/// Wall.
	pub const WALL: Self = Self(1 << 13);

	const NAMED: [(&'static str, Self); 20] = [
		("notify", Self::NOTIFY),
		("friends", Self::FRIENDS),
		("photos", Self::PHOTOS),
		("audio", Self::AUDIO),
		("video", Self::VIDEO),
		("stories", Self::STORIES),
		("pages", Self::PAGES),
		("menu", Self::MENU),
		("status", Self::STATUS),
		("notes", Self::NOTES),
		("messages", Self::MESSAGES),
		("wall", Self::WALL),
		("ads", Self::ADS),
		("offline", Self::OFFLINE),
		("docs", Self::DOCS),
		("groups", Self::GROUPS),
		("notifications", Self::NOTIFICATIONS),
		("stats", Self::STATS),
		("email", Self::EMAIL),
		("market", Self::MARKET),
	];

	/// Empty mask.
	pub const fn empty() -> Self {
		Self(0)
	}

	/// Wraps a raw mask, keeping unknown bits.
	pub const fn from_bits(bits: u64) -> Self {
		Self(bits)
	}

	/// Raw mask value.
	pub const fn bits(self) -> u64 {
		self.0
	}

	/// Returns true if no permission is requested.
	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Returns true if every bit of `other` is set.
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Names of the known permissions present in the mask, in bit order.
	pub fn names(self) -> impl Iterator<Item = &'static str> {
		Self::NAMED.into_iter().filter(move |(_, flag)| self.contains(*flag)).map(|(name, _)| name)
	}
}
impl BitOr for Permissions {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self::Output {
		Self(self.0 | rhs.0)
	}
}
impl BitOrAssign for Permissions {
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}
impl FromIterator<Permissions> for Permissions {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = Permissions>,
	{
		iter.into_iter().fold(Self::empty(), BitOr::bitor)
	}
}
impl FromStr for Permissions {
	type Err = PermissionsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Ok(bits) = s.trim().parse::<u64>() {
			return Ok(Self(bits));
		}

		s.split(|c: char| c == ',' || c.is_whitespace())
			.filter(|name| !name.is_empty())
			.map(|name| {
				Self::NAMED
					.iter()
					.find(|(known, _)| known.eq_ignore_ascii_case(name))
					.map(|(_, flag)| *flag)
					.ok_or_else(|| PermissionsError::Unknown { name: name.to_owned() })
			})
			.collect()
	}
}
impl Debug for Permissions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Permissions({self})")
	}
}
impl Display for Permissions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.names().collect::<Vec<_>>().join(","))
	}
}
