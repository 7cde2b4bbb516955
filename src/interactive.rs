//! Interactive (user-consent) authorization flow.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, ScopeSet},
	clock::{SystemTimeSource, TimeSource},
	error::{StateError, ValidationError},
	http::{HttpExecute, TokenEndpointRequest},
	manager::{self, AuthManager},
	provider::{GrantKind, ProviderEndpoints},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

const STATE_LEN: usize = 32;

/// Progress of one interactive authorization attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
	/// An instance has been created but no action has been performed.
	Init,
	/// An authorization URL has been created, but the user has not accepted or declined yet.
	WaitingForChallenge,
	/// Authorized and ready to send requests.
	Authorized,
}
impl AuthStatus {
	/// Returns a stable label suitable for error messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthStatus::Init => "init",
			AuthStatus::WaitingForChallenge => "waiting_for_challenge",
			AuthStatus::Authorized => "authorized",
		}
	}
}
impl Display for AuthStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Drives the browser-redirect consent flow for installed and web apps.
///
/// One helper serves one authorization attempt:
/// [`authorization_url`](Self::authorization_url) moves it from [`AuthStatus::Init`] to
/// [`AuthStatus::WaitingForChallenge`], and a successful
/// [`on_user_challenge`](Self::on_user_challenge) lands in the terminal
/// [`AuthStatus::Authorized`], yielding an [`AuthManager`] that wraps the issued token. There
/// is no path back: a helper whose challenge failed a state check must be discarded and the
/// flow restarted with a fresh instance.
///
/// Each call to `authorization_url` generates a new cryptographically random `state` token, so
/// re-issuing the URL invalidates any challenge still carrying the previous state.
pub struct StatefulAuthHelper<C>
where
	C: ?Sized + HttpExecute,
{
	http_client: Arc<C>,
	credentials: Credentials,
	endpoints: ProviderEndpoints,
	clock: Arc<dyn TimeSource>,
	redirect_url: Url,
	progress: Mutex<Progress>,
}
impl<C> StatefulAuthHelper<C>
where
	C: ?Sized + HttpExecute,
{
	/// Creates a helper for an interactive credential variant.
	///
	/// Fails with a validation error for script and userless credentials, which renew without
	/// user interaction and never need this flow.
	pub fn with_http_client(
		credentials: Credentials,
		endpoints: ProviderEndpoints,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self, ValidationError> {
		let Some(redirect_url) = credentials.redirect_url().cloned() else {
			return Err(ValidationError::NonInteractiveCredentials);
		};

		Ok(Self {
			http_client: http_client.into(),
			credentials,
			endpoints,
			clock: Arc::new(SystemTimeSource::new()),
			redirect_url,
			progress: Mutex::new(Progress { status: AuthStatus::Init, pending_state: None }),
		})
	}

	/// Replaces the clock handed to the authenticated session on success.
	pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
		self.clock = clock;

		self
	}

	/// Current progress of the flow.
	pub fn status(&self) -> AuthStatus {
		self.progress.lock().status
	}

	/// Builds the authorization URL to send the user to, arming the CSRF state token.
	///
	/// `permanent` requests a refresh token alongside the access token so the resulting session
	/// can renew non-interactively later. `use_mobile_site` selects the provider's
	/// mobile-optimized consent page when one is configured. Valid until the flow has
	/// authorized; calling it again replaces the pending state token.
	pub fn authorization_url(
		&self,
		permanent: bool,
		use_mobile_site: bool,
		scopes: &ScopeSet,
	) -> Result<Url> {
		let mut progress = self.progress.lock();

		if progress.status == AuthStatus::Authorized {
			return Err(StateError::UnexpectedAuthStatus {
				expected: "init or waiting_for_challenge",
				actual: AuthStatus::Authorized.as_str(),
			}
			.into());
		}

		let state = random_state();
		let mut url = self.endpoints.authorization_for(use_mobile_site).clone();

		url.query_pairs_mut()
			.append_pair("client_id", self.credentials.client_id())
			.append_pair("response_type", "code")
			.append_pair("state", &state)
			.append_pair("redirect_uri", self.redirect_url.as_str())
			.append_pair("duration", if permanent { "permanent" } else { "temporary" })
			.append_pair("scope", &scopes.to_query_value());

		progress.pending_state = Some(state);
		progress.status = AuthStatus::WaitingForChallenge;

		Ok(url)
	}

	/// Consumes the provider's redirect callback and exchanges its code for a token.
	///
	/// Validates, in order: an explicit `error` parameter, the presence and CSRF match of
	/// `state`, and the presence of `code`. A state mismatch is fatal to this helper even when
	/// the code is valid. On success the helper becomes [`AuthStatus::Authorized`] and the
	/// returned [`AuthManager`] wraps the freshly issued token.
	pub fn on_user_challenge(&self, callback_url: &str) -> Result<AuthManager<C>> {
		let mut progress = self.progress.lock();

		if progress.status != AuthStatus::WaitingForChallenge {
			return Err(StateError::UnexpectedAuthStatus {
				expected: AuthStatus::WaitingForChallenge.as_str(),
				actual: progress.status.as_str(),
			}
			.into());
		}

		let callback = Url::parse(callback_url)
			.map_err(|source| ValidationError::MalformedCallback { source })?;
		let query: Vec<(String, String)> =
			callback.query_pairs().map(|(name, value)| (name.into(), value.into())).collect();
		let lookup = |name: &str| {
			query.iter().find(|(n, _)| n == name).map(|(_, value)| value.as_str())
		};

		if let Some(reason) = lookup("error") {
			return Err(Error::Provider { reason: reason.into() });
		}

		let state =
			lookup("state").ok_or(ValidationError::MissingCallbackParam { name: "state" })?;

		if progress.pending_state.as_deref() != Some(state) {
			return Err(StateError::StateMismatch.into());
		}

		let code = lookup("code").ok_or(ValidationError::MissingCallbackParam { name: "code" })?;
		let request = TokenEndpointRequest::new(
			self.endpoints.token.clone(),
			GrantKind::AuthorizationCode,
			self.credentials.client_id(),
			self.credentials.client_secret(),
		)
		.param("code", code)
		.param("redirect_uri", self.redirect_url.as_str());
		let data = manager::request_token(
			self.http_client.as_ref(),
			request,
			"on_user_challenge",
			"invalid client credentials",
		)?;

		progress.status = AuthStatus::Authorized;

		let session = AuthManager::with_http_client(
			self.credentials.clone(),
			self.endpoints.clone(),
			self.http_client.clone(),
		)
		.with_clock(self.clock.clone());

		session.update(data);

		Ok(session)
	}
}
impl<C> Debug for StatefulAuthHelper<C>
where
	C: ?Sized + HttpExecute,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StatefulAuthHelper")
			.field("credentials", &self.credentials)
			.field("status", &self.status())
			.finish()
	}
}
#[cfg(feature = "reqwest")]
impl StatefulAuthHelper<ReqwestHttpClient> {
	/// Creates a helper with the crate's default blocking reqwest transport.
	pub fn new(
		credentials: Credentials,
		endpoints: ProviderEndpoints,
	) -> Result<Self, ValidationError> {
		Self::with_http_client(credentials, endpoints, ReqwestHttpClient::default())
	}
}

struct Progress {
	status: AuthStatus,
	pending_state: Option<String>,
}

/// Generates the CSRF state token: 32 alphanumeric characters, well above 128 bits of entropy.
fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
