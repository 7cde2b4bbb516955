//! Scope modeling helpers shared by authorization URLs and token responses.

// std
use std::{collections::BTreeSet, str::FromStr};
// self
use crate::{_prelude::*, error::ValidationError};

/// Normalized set of OAuth scopes.
///
/// Scopes are deduplicated and sorted so equality and ordering remain stable no matter how the
/// caller supplied them. Authorization URLs join the set with spaces; token-endpoint responses
/// deliver it comma-separated and are parsed leniently via
/// [`from_comma_separated`](Self::from_comma_separated).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopeSet {
	scopes: Vec<String>,
}
impl ScopeSet {
	/// Creates a normalized scope set from any iterator, validating every entry.
	pub fn new<I, S>(scopes: I) -> Result<Self, ValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ValidationError::EmptyScope);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ValidationError::ScopeContainsWhitespace { scope: owned });
			}

			set.insert(owned);
		}

		Ok(Self { scopes: set.into_iter().collect() })
	}

	/// Parses the comma-separated `scope` field of a token-endpoint response.
	///
	/// Provider output is accepted as-is: entries are trimmed and blanks are skipped rather
	/// than rejected, so an odd provider response can never fail a successful token exchange.
	pub fn from_comma_separated(raw: &str) -> Self {
		let set: BTreeSet<String> =
			raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();

		Self { scopes: set.into_iter().collect() }
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the normalized set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Space-joined representation used in authorization URL `scope` parameters.
	pub fn to_query_value(&self) -> String {
		self.scopes.join(" ")
	}
}
impl FromStr for ScopeSet {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ValidationError::EmptyScope);
		}

		Self::new(s.split_whitespace())
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.to_query_value())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_normalize_stably() {
		let lhs = ScopeSet::new(["identity", "read", "read"])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::new(["read", "identity"]).expect("Right-hand scope set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.to_query_value(), "identity read");
	}

	#[test]
	fn invalid_scopes_error() {
		assert!(matches!(ScopeSet::new([""]), Err(ValidationError::EmptyScope)));
		assert!(matches!(
			ScopeSet::new(["contains space"]),
			Err(ValidationError::ScopeContainsWhitespace { .. }),
		));
	}

	#[test]
	fn comma_separated_parsing_is_lenient() {
		let scopes = ScopeSet::from_comma_separated("read, identity,,history ");

		assert_eq!(scopes.len(), 3);
		assert!(scopes.contains("identity"));
		assert!(scopes.contains("history"));
		assert_eq!(scopes.to_query_value(), "history identity read");
	}

	#[test]
	fn from_str_splits_on_whitespace() {
		let scopes = ScopeSet::from_str("read identity").expect("Scope string should parse.");

		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["identity", "read"]);
		assert!(ScopeSet::from_str("").expect("Empty string is an empty set.").is_empty());
		assert!(ScopeSet::from_str("   ").is_err());
	}
}
