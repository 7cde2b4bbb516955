//! Governance-layer error types shared across the rate limiter and the auth lifecycle.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical governance error exposed by public APIs.
///
/// The taxonomy exists so callers can pick retry policy per class: validation and state errors
/// are programming mistakes and never retried, [`Error::Authentication`] means the credentials
/// themselves are wrong, while [`Error::Network`] covers transient transport failures that a
/// caller may reasonably retry.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller-supplied argument failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Token endpoint rejected the client or user credentials (HTTP 401).
	#[error("Authentication failed: {reason}.")]
	Authentication {
		/// Short description distinguishing which credentials were rejected.
		reason: String,
	},
	/// Authorization provider reported an explicit error on the redirect callback.
	#[error("Provider rejected the authorization: {reason}.")]
	Provider {
		/// Error value carried by the callback's `error` parameter.
		reason: String,
	},
	/// Operation invoked out of sequence or without the state it requires.
	#[error(transparent)]
	State(#[from] StateError),
	/// Transport failure or unexpected token-endpoint response.
	#[error(transparent)]
	Network(#[from] NetworkError),
}

/// Argument validation failures raised synchronously at the call site.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// Permit capacity must be strictly positive.
	#[error("Permit capacity must be above 0.")]
	NonPositiveCapacity,
	/// Permit request outside the acceptable `(0, capacity]` window.
	#[error("Requested permits must be within (0, {capacity}], got {permits}.")]
	PermitsOutOfRange {
		/// Requested permit count.
		permits: u64,
		/// Capacity of the bucket the request was issued against.
		capacity: u64,
	},
	/// Refill rate must be strictly positive.
	#[error("Permits per period must be above 0.")]
	NonPositiveRate,
	/// Refill period must be strictly positive.
	#[error("Refill period must be above 0.")]
	NonPositivePeriod,
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	EmptyScope,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ScopeContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
	/// Endpoint configuration lacks the installed-client grant URI.
	#[error("Provider endpoints do not define an installed-client grant URI.")]
	MissingInstalledClientGrant,
	/// Redirect callback URL could not be parsed.
	#[error("Callback URL is malformed.")]
	MalformedCallback {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Interactive authorization started with a non-interactive credential variant.
	#[error("Credential variant does not use interactive authorization.")]
	NonInteractiveCredentials,
	/// Redirect callback URL is missing a required query parameter.
	#[error("Callback URL did not contain the `{name}` query parameter.")]
	MissingCallbackParam {
		/// Name of the absent parameter.
		name: &'static str,
	},
}

/// Sequencing failures; fatal to the operation that raised them.
#[derive(Debug, ThisError)]
pub enum StateError {
	/// No token has ever been issued to this session.
	#[error("No token data is currently held.")]
	NoCurrentToken,
	/// Session cannot be renewed without user interaction.
	#[error("Cannot renew: no refresh token held and not a non-interactive method.")]
	RenewalUnavailable,
	/// Interactive helper driven out of order.
	#[error("Expecting auth status {expected}, got {actual}.")]
	UnexpectedAuthStatus {
		/// Status the operation requires.
		expected: &'static str,
		/// Status the helper was actually in.
		actual: &'static str,
	},
	/// Callback `state` parameter did not match the pending state token.
	#[error("Authorization state did not match.")]
	StateMismatch,
}

/// Transport-level failures and unexpected token-endpoint responses.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint answered with an unexpected, non-401 status.
	#[error("Token endpoint returned HTTP {status}.")]
	UnexpectedStatus {
		/// HTTP status code of the rejection.
		status: u16,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned a malformed response.")]
	ResponseParse {
		/// Structured parsing failure pointing at the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl NetworkError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for NetworkError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}
