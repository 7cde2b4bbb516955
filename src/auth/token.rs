//! Issued-token model and token-endpoint response parsing.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::NetworkError,
};

/// One issued token as returned by the token endpoint.
///
/// Instances are immutable; a renewal produces a fresh `TokenData` that replaces the previous
/// one wholesale inside [`AuthManager`](crate::manager::AuthManager). The shelf life is relative:
/// the manager anchors it against its own clock at the moment the data is adopted.
#[derive(Clone, Debug)]
pub struct TokenData {
	/// Access token attached to outbound requests as a Bearer credential.
	pub access_token: TokenSecret,
	/// Token type reported by the provider, normally `bearer`.
	pub token_type: String,
	/// Shelf life: how long the access token remains valid from issuance.
	pub expires_in: Duration,
	/// Scopes the token has permission for.
	pub scopes: ScopeSet,
	/// Refresh token, if one was requested and granted.
	pub refresh_token: Option<TokenSecret>,
}
impl TokenData {
	/// Parses a successful token-endpoint JSON body.
	///
	/// `expires_in` arrives in seconds and `scope` comma-separated; a missing `token_type`
	/// defaults to `bearer`. Malformed JSON is reported with the path of the offending field.
	pub fn parse(body: &[u8]) -> Result<Self, NetworkError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);
		let wire: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| NetworkError::ResponseParse { source })?;

		Ok(wire.into())
	}

	/// Returns true if the provider granted a refresh token alongside this one.
	pub fn has_refresh_token(&self) -> bool {
		self.refresh_token.is_some()
	}
}

/// Wire shape of the token endpoint's success response.
#[derive(Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	#[serde(default = "default_token_type")]
	token_type: String,
	expires_in: u64,
	#[serde(default)]
	scope: String,
	#[serde(default)]
	refresh_token: Option<String>,
}
impl From<TokenEndpointResponse> for TokenData {
	fn from(wire: TokenEndpointResponse) -> Self {
		Self {
			access_token: TokenSecret::new(wire.access_token),
			token_type: wire.token_type,
			expires_in: Duration::seconds(i64::try_from(wire.expires_in).unwrap_or(i64::MAX)),
			scopes: ScopeSet::from_comma_separated(&wire.scope),
			refresh_token: wire.refresh_token.map(TokenSecret::new),
		}
	}
}

fn default_token_type() -> String {
	"bearer".into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_a_full_response() {
		let data = TokenData::parse(
			br#"{
				"access_token": "abc123",
				"token_type": "bearer",
				"expires_in": 3600,
				"scope": "read,identity",
				"refresh_token": "refresh456"
			}"#,
		)
		.expect("Full token response should parse.");

		assert_eq!(data.access_token.expose(), "abc123");
		assert_eq!(data.token_type, "bearer");
		assert_eq!(data.expires_in, Duration::seconds(3_600));
		assert!(data.scopes.contains("identity"));
		assert!(data.has_refresh_token());
	}

	#[test]
	fn optional_fields_default() {
		let data = TokenData::parse(br#"{"access_token": "abc", "expires_in": 60}"#)
			.expect("Minimal token response should parse.");

		assert_eq!(data.token_type, "bearer");
		assert!(data.scopes.is_empty());
		assert!(!data.has_refresh_token());
	}

	#[test]
	fn malformed_responses_name_the_offending_field() {
		let err = TokenData::parse(br#"{"access_token": "abc", "expires_in": "soon"}"#)
			.expect_err("Non-numeric expires_in must fail.");
		let NetworkError::ResponseParse { source } = err else {
			panic!("Expected a response parse failure, got {err:?}");
		};

		assert_eq!(source.path().to_string(), "expires_in");
	}
}
