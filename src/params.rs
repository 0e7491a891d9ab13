//! Ordered request parameter map sent as form fields or query pairs.

// std
use std::collections::btree_map::{IntoIter, Iter};
// self
use crate::_prelude::*;

const REDACTED_KEYS: [&str; 4] = ["access_token", "password", "client_secret", "code"];

/// Ordered request parameter map.
///
/// Values are stored in their wire (string) form. Keys are kept sorted so requests are stable
/// across runs, which keeps logs and mock expectations deterministic. The [`Debug`] output
/// redacts credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);
impl Params {
	/// Creates an empty parameter map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert.
	pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
		self.insert(key, value);

		self
	}

	/// Inserts or replaces a value, returning the previous one.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Display) -> Option<String> {
		self.0.insert(key.into(), value.to_string())
	}

	/// Inserts `value` only when the caller has not set `key` already.
	pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Display) {
		self.0.entry(key.into()).or_insert_with(|| value.to_string());
	}

	/// Inserts a value when present and non-blank, otherwise removes the key.
	pub fn set_optional(&mut self, key: impl Into<String>, value: Option<impl Display>) {
		let key = key.into();

		match value.map(|value| value.to_string()).filter(|value| !value.trim().is_empty()) {
			Some(value) => {
				self.0.insert(key, value);
			},
			None => {
				self.0.remove(&key);
			},
		}
	}

	/// Removes a key, returning its value.
	pub fn remove(&mut self, key: &str) -> Option<String> {
		self.0.remove(key)
	}

	/// Looks up a value.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Returns true if `key` is present.
	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over `(key, value)` pairs in key order.
	pub fn iter(&self) -> Iter<'_, String, String> {
		self.0.iter()
	}
}
impl Debug for Params {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (key, value) in &self.0 {
			if REDACTED_KEYS.contains(&key.as_str()) {
				map.entry(key, &"<redacted>");
			} else {
				map.entry(key, value);
			}
		}

		map.finish()
	}
}
impl From<BTreeMap<String, String>> for Params {
	fn from(value: BTreeMap<String, String>) -> Self {
		Self(value)
	}
}
impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Display,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut params = Self::new();

		for (key, value) in iter {
			params.insert(key, value);
		}

		params
	}
}
impl IntoIterator for Params {
	type IntoIter = IntoIter<String, String>;
	type Item = (String, String);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl<'a> IntoIterator for &'a Params {
	type IntoIter = Iter<'a, String, String>;
	type Item = (&'a String, &'a String);

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn caller_values_win_over_defaults() {
		let mut params = Params::new().with("v", "5.0");

		params.insert_if_absent("v", "5.199");
		params.insert_if_absent("lang", "en");

		assert_eq!(params.get("v"), Some("5.0"));
		assert_eq!(params.get("lang"), Some("en"));
	}

	#[test]
	fn optional_values_treat_blank_as_absent() {
		let mut params = Params::new().with("captcha_key", "old");

		params.set_optional("captcha_key", Some(""));

		assert!(!params.contains("captcha_key"));

		params.set_optional("captcha_key", None::<&str>);

		assert!(params.is_empty());
	}

	#[test]
	fn debug_redacts_credentials() {
		let params: Params = [("access_token", "secret"), ("user_id", "1")].into_iter().collect();
		let rendered = format!("{params:?}");

		assert!(!rendered.contains("secret"));
		assert!(rendered.contains("\"user_id\": \"1\""));
	}
}
