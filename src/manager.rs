//! Non-interactive session lifecycle: token ownership, expiry tracking, and renewal.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenData, TokenSecret},
	clock::{SystemTimeSource, TimeSource},
	error::{NetworkError, StateError, ValidationError},
	http::{HttpExecute, TokenEndpointRequest},
	obs::{self, FlowOutcome, FlowSpan},
	provider::{GrantKind, ProviderEndpoints},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Maintains and renews the access token for one credential configuration.
///
/// The manager owns the current [`TokenData`], the expiry instant derived from its shelf life,
/// and the sticky refresh token. Script and userless apps renew statelessly by re-requesting a
/// token; interactive apps renew through the refresh token obtained when the user authorized
/// with `permanent` set (see [`StatefulAuthHelper`](crate::interactive::StatefulAuthHelper)).
///
/// At most one renewal is ever in flight per manager: callers that hit an expired token while
/// another thread is already renewing block on the same guard and reuse its result instead of
/// issuing a second token request.
pub struct AuthManager<C>
where
	C: ?Sized + HttpExecute,
{
	/// HTTP capability used for every token request.
	http_client: Arc<C>,
	credentials: Credentials,
	endpoints: ProviderEndpoints,
	clock: Arc<dyn TimeSource>,
	session: Mutex<Session>,
	renewal: Mutex<()>,
}
impl<C> AuthManager<C>
where
	C: ?Sized + HttpExecute,
{
	/// Creates a manager that reuses the caller-provided transport, timed by the system clock.
	pub fn with_http_client(
		credentials: Credentials,
		endpoints: ProviderEndpoints,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			credentials,
			endpoints,
			clock: Arc::new(SystemTimeSource::new()),
			session: Mutex::new(Session::default()),
			renewal: Mutex::new(()),
		}
	}

	/// Replaces the clock used for expiry accounting.
	pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
		self.clock = clock;

		self
	}

	/// Credential configuration this manager renews for.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Provider endpoints this manager issues token requests against.
	pub fn endpoints(&self) -> &ProviderEndpoints {
		&self.endpoints
	}

	/// The token used to authenticate API requests, renewing it first when it is expired and
	/// renewal is possible without user interaction.
	///
	/// Fails with a state error if no token data has ever been set. An expired token that
	/// cannot be renewed here is returned as-is; the caller decides whether to restart an
	/// interactive flow.
	pub fn access_token(&self) -> Result<String> {
		if self.needs_renewing() && self.can_renew() {
			let _flight = self.renewal.lock();

			// A renewal that completed while this thread waited already did the work.
			if self.needs_renewing() {
				self.renew_locked()?;
			}
		}

		self.session
			.lock()
			.current
			.as_ref()
			.map(|active| active.data.access_token.expose().to_string())
			.ok_or_else(|| StateError::NoCurrentToken.into())
	}

	/// Snapshot of the most up-to-date token data as understood by this manager.
	pub fn current(&self) -> Option<TokenData> {
		self.session.lock().current.as_ref().map(|active| active.data.clone())
	}

	/// The sticky refresh token, if one has ever been issued to this manager.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.session.lock().refresh_token.clone()
	}

	/// Returns true if there is no current token data or it has already expired.
	pub fn needs_renewing(&self) -> bool {
		let session = self.session.lock();

		match &session.current {
			Some(active) => self.clock.monotonic_nanos() >= active.expires_at,
			None => true,
		}
	}

	/// Time left before the current token expires; `None` when no token is held.
	///
	/// Exposes enough state for a transport layer to schedule preemptive renewals or its own
	/// retry policy.
	pub fn time_until_expiry(&self) -> Option<Duration> {
		let session = self.session.lock();
		let active = session.current.as_ref()?;
		let remaining = active.expires_at.saturating_sub(self.clock.monotonic_nanos());

		Some(Duration::nanoseconds(i64::try_from(remaining).unwrap_or(i64::MAX)))
	}

	/// Returns true if renewal can proceed without user interaction.
	///
	/// Script and userless apps can simply request a new token since no user has to authorize
	/// it; the interactive variants need a previously issued refresh token.
	pub fn can_renew(&self) -> bool {
		if matches!(self.credentials, Credentials::Script { .. }) || self.credentials.is_userless()
		{
			true
		} else {
			self.session.lock().refresh_token.is_some()
		}
	}

	/// Obtains more up-to-date token data, serialized against concurrent renewals.
	pub fn renew(&self) -> Result<()> {
		let _flight = self.renewal.lock();

		self.renew_locked()
	}

	/// Adopts token data obtained out of band, e.g. from the interactive flow or a persisted
	/// session.
	///
	/// Recomputes the expiry instant from the data's shelf life. A refresh token carried by the
	/// new data is adopted only when none is held yet; renewal responses that omit the refresh
	/// token therefore never clear a previously issued one.
	pub fn update(&self, data: TokenData) {
		let expires_at = self
			.clock
			.monotonic_nanos()
			.saturating_add(u64::try_from(data.expires_in.whole_nanoseconds()).unwrap_or(0));
		let mut session = self.session.lock();

		if session.refresh_token.is_none()
			&& let Some(refresh_token) = &data.refresh_token
		{
			session.refresh_token = Some(refresh_token.clone());
		}

		session.current = Some(ActiveToken { data, expires_at });
	}

	/// Performs one renewal; the caller must hold the renewal guard.
	fn renew_locked(&self) -> Result<()> {
		let request = match &self.credentials {
			Credentials::Script { username, password, .. } => self
				.token_request(GrantKind::Password)
				.param("username", username)
				.param("password", password),
			Credentials::Userless { .. } => self.token_request(GrantKind::ClientCredentials),
			Credentials::UserlessApp { device_id, .. } => {
				let grant_uri = self
					.endpoints
					.installed_client_grant
					.as_deref()
					.ok_or(ValidationError::MissingInstalledClientGrant)?;

				self.token_request(GrantKind::InstalledClient)
					.with_grant_type_uri(grant_uri)
					.param("device_id", device_id)
			},
			Credentials::InstalledApp { .. } | Credentials::WebApp { .. } => {
				let refresh_token =
					self.session.lock().refresh_token.clone().ok_or(StateError::RenewalUnavailable)?;

				self.token_request(GrantKind::RefreshToken)
					.param("refresh_token", refresh_token.expose())
			},
		};
		let auth_reason = match request.grant {
			GrantKind::Password => "invalid user credentials",
			_ => "incorrect client ID and/or client secret",
		};
		let data = request_token(self.http_client.as_ref(), request, "renew", auth_reason)?;

		self.update(data);

		Ok(())
	}

	fn token_request(&self, grant: GrantKind) -> TokenEndpointRequest {
		TokenEndpointRequest::new(
			self.endpoints.token.clone(),
			grant,
			self.credentials.client_id(),
			self.credentials.client_secret(),
		)
	}
}
impl<C> Debug for AuthManager<C>
where
	C: ?Sized + HttpExecute,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let session = self.session.lock();

		f.debug_struct("AuthManager")
			.field("credentials", &self.credentials)
			.field("token_held", &session.current.is_some())
			.field("refresh_token_held", &session.refresh_token.is_some())
			.finish()
	}
}
#[cfg(feature = "reqwest")]
impl AuthManager<ReqwestHttpClient> {
	/// Creates a manager with the crate's default blocking reqwest transport.
	pub fn new(credentials: Credentials, endpoints: ProviderEndpoints) -> Self {
		Self::with_http_client(credentials, endpoints, ReqwestHttpClient::default())
	}
}

#[derive(Default)]
struct Session {
	current: Option<ActiveToken>,
	refresh_token: Option<TokenSecret>,
}

struct ActiveToken {
	data: TokenData,
	expires_at: u64,
}

/// Executes one token request and maps the endpoint's verdict onto the error taxonomy.
///
/// A 401 means the credentials themselves were rejected and surfaces as an authentication
/// error carrying `auth_reason`; any other non-2xx status is a network-class failure the
/// caller may retry.
pub(crate) fn request_token<C>(
	http_client: &C,
	request: TokenEndpointRequest,
	stage: &'static str,
	auth_reason: &str,
) -> Result<TokenData>
where
	C: ?Sized + HttpExecute,
{
	let grant = request.grant;
	let _span = FlowSpan::new(grant, stage).entered();

	obs::record_flow_outcome(grant, FlowOutcome::Attempt);

	let result = execute_and_parse(http_client, request, auth_reason);

	match &result {
		Ok(_) => obs::record_flow_outcome(grant, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(grant, FlowOutcome::Failure),
	}

	result
}

fn execute_and_parse<C>(
	http_client: &C,
	request: TokenEndpointRequest,
	auth_reason: &str,
) -> Result<TokenData>
where
	C: ?Sized + HttpExecute,
{
	let response = http_client.execute(&request)?;

	if response.status == 401 {
		return Err(Error::Authentication { reason: auth_reason.into() });
	}
	if !response.is_success() {
		return Err(NetworkError::UnexpectedStatus { status: response.status }.into());
	}

	Ok(TokenData::parse(&response.body)?)
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// self
	use super::*;
	use crate::{_preludet::ScriptedHttpClient, clock::ManualTimeSource, http::HttpResponse};

	const TOKEN_JSON: &str = r#"{
		"access_token": "token-1",
		"token_type": "bearer",
		"expires_in": 3600,
		"scope": "read"
	}"#;

	fn endpoints() -> ProviderEndpoints {
		ProviderEndpoints::new(
			Url::parse("https://provider.example/authorize").expect("Fixture URL should parse."),
			Url::parse("https://provider.example/token").expect("Fixture URL should parse."),
		)
		.with_installed_client_grant("https://provider.example/grants/installed_client")
	}

	fn manager(credentials: Credentials) -> (AuthManager<ScriptedHttpClient>, Arc<ScriptedHttpClient>, Arc<ManualTimeSource>) {
		let http_client = Arc::new(ScriptedHttpClient::default());
		let clock = Arc::new(ManualTimeSource::new());
		let manager =
			AuthManager::with_http_client(credentials, endpoints(), http_client.clone())
				.with_clock(clock.clone());

		(manager, http_client, clock)
	}

	fn token_data(expires_in: Duration, refresh_token: Option<&str>) -> TokenData {
		let refresh = refresh_token
			.map(|token| format!(r#", "refresh_token": "{token}""#))
			.unwrap_or_default();
		let body =
			format!(r#"{{"access_token": "seeded", "expires_in": {}{refresh}}}"#, expires_in.whole_seconds());

		TokenData::parse(body.as_bytes()).expect("Seed token fixture should parse.")
	}

	#[test]
	fn expiry_follows_the_simulated_clock() {
		let (manager, _http, clock) = manager(Credentials::script("u", "p", "id", "secret"));

		assert!(manager.needs_renewing(), "No data has ever been set.");

		manager.update(token_data(Duration::seconds(1), None));

		assert!(!manager.needs_renewing());
		assert_eq!(manager.time_until_expiry(), Some(Duration::seconds(1)));

		clock.advance(Duration::milliseconds(999));

		assert!(!manager.needs_renewing());

		clock.advance(Duration::milliseconds(1));

		assert!(manager.needs_renewing());
		assert_eq!(manager.time_until_expiry(), Some(Duration::ZERO));
	}

	#[test]
	fn script_renewal_issues_a_password_grant() {
		let (manager, http_client, _clock) =
			manager(Credentials::script("user", "pass", "id", "secret"));

		http_client.push_json(TOKEN_JSON);
		manager.renew().expect("Scripted renewal should succeed.");

		let requests = http_client.requests();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].grant, GrantKind::Password);
		assert_eq!(requests[0].form_value("grant_type"), Some("password"));
		assert_eq!(requests[0].form_value("username"), Some("user"));
		assert_eq!(requests[0].form_value("password"), Some("pass"));
		assert_eq!(requests[0].client_id(), "id");
		assert_eq!(
			manager.access_token().expect("Token should be present after renewal."),
			"token-1",
		);
	}

	#[test]
	fn userless_variants_pick_their_grants() {
		let (manager, http_client, _clock) = manager(Credentials::userless("id", "secret", "dev"));

		http_client.push_json(TOKEN_JSON);
		manager.renew().expect("Userless renewal should succeed.");

		assert_eq!(http_client.requests()[0].form_value("grant_type"), Some("client_credentials"));

		let (manager, http_client, _clock) = manager_userless_app();

		http_client.push_json(TOKEN_JSON);
		manager.renew().expect("Userless app renewal should succeed.");

		let requests = http_client.requests();

		assert_eq!(
			requests[0].form_value("grant_type"),
			Some("https://provider.example/grants/installed_client"),
		);
		assert_eq!(requests[0].form_value("device_id"), Some("device-9"));
	}

	fn manager_userless_app() -> (AuthManager<ScriptedHttpClient>, Arc<ScriptedHttpClient>, Arc<ManualTimeSource>) {
		manager(Credentials::userless_app("id", "device-9"))
	}

	#[test]
	fn interactive_renewal_requires_a_refresh_token() {
		let (manager, http_client, _clock) = manager(Credentials::web_app(
			"id",
			"secret",
			Url::parse("https://app.example/cb").expect("Fixture URL should parse."),
		));

		assert!(!manager.can_renew());
		assert!(matches!(
			manager.renew().expect_err("Renewal without a refresh token must fail."),
			Error::State(StateError::RenewalUnavailable),
		));

		manager.update(token_data(Duration::seconds(0), Some("refresh-x")));
		http_client.push_json(TOKEN_JSON);

		assert!(manager.can_renew());

		manager.renew().expect("Refresh-token renewal should succeed.");

		let requests = http_client.requests();

		assert_eq!(requests[0].form_value("grant_type"), Some("refresh_token"));
		assert_eq!(requests[0].form_value("refresh_token"), Some("refresh-x"));
	}

	#[test]
	fn unauthorized_renewal_is_an_authentication_error() {
		let (manager, http_client, _clock) = manager(Credentials::script("u", "p", "id", "bad"));

		http_client.push_status(401);

		assert!(matches!(
			manager.renew().expect_err("A 401 must fail the renewal."),
			Error::Authentication { .. },
		));

		http_client.push_status(503);

		assert!(matches!(
			manager.renew().expect_err("A non-401 rejection must fail the renewal."),
			Error::Network(NetworkError::UnexpectedStatus { status: 503 }),
		));
	}

	#[test]
	fn refresh_token_is_sticky() {
		let (manager, _http, _clock) = manager(Credentials::web_app(
			"id",
			"secret",
			Url::parse("https://app.example/cb").expect("Fixture URL should parse."),
		));

		manager.update(token_data(Duration::seconds(10), Some("X")));
		manager.update(token_data(Duration::seconds(10), None));

		assert_eq!(
			manager.refresh_token().expect("Refresh token should survive omission.").expose(),
			"X",
		);

		manager.update(token_data(Duration::seconds(10), Some("Y")));

		assert_eq!(
			manager.refresh_token().expect("Refresh token should remain held.").expose(),
			"X",
			"A held refresh token is never replaced.",
		);
	}

	#[test]
	fn access_token_renews_expired_sessions_once() {
		let (manager, http_client, clock) = manager(Credentials::script("u", "p", "id", "secret"));

		manager.update(token_data(Duration::seconds(1), None));
		clock.advance(Duration::seconds(2));
		http_client.push_json(TOKEN_JSON);

		let manager = Arc::new(manager);
		let workers: Vec<_> = (0..4)
			.map(|_| {
				let manager = manager.clone();

				thread::spawn(move || {
					manager.access_token().expect("Concurrent access should succeed.")
				})
			})
			.collect();

		for worker in workers {
			assert_eq!(worker.join().expect("Worker thread should complete."), "token-1");
		}

		assert_eq!(http_client.request_count(), 1, "Renewal must be single-flight.");
	}

	#[test]
	fn in_flight_renewals_absorb_late_callers() {
		struct SlowTransport(ScriptedHttpClient);
		impl HttpExecute for SlowTransport {
			fn execute(
				&self,
				request: &TokenEndpointRequest,
			) -> Result<HttpResponse, NetworkError> {
				thread::sleep(std::time::Duration::from_millis(50));
				self.0.execute(request)
			}
		}

		let transport = Arc::new(SlowTransport(ScriptedHttpClient::default()));

		transport.0.push_json(TOKEN_JSON);

		let manager = Arc::new(
			AuthManager::<SlowTransport>::with_http_client(
				Credentials::script("u", "p", "id", "secret"),
				endpoints(),
				transport.clone(),
			),
		);
		let workers: Vec<_> = (0..4)
			.map(|_| {
				let manager = manager.clone();

				thread::spawn(move || {
					manager.access_token().expect("Concurrent access should succeed.")
				})
			})
			.collect();

		for worker in workers {
			assert_eq!(worker.join().expect("Worker thread should complete."), "token-1");
		}

		assert_eq!(transport.0.request_count(), 1, "Only one renewal may be in flight.");
	}

	#[test]
	fn stale_tokens_are_returned_when_renewal_is_unavailable() {
		let (manager, _http, clock) = manager(Credentials::web_app(
			"id",
			"secret",
			Url::parse("https://app.example/cb").expect("Fixture URL should parse."),
		));

		assert!(matches!(
			manager.access_token().expect_err("No token has ever been set."),
			Error::State(StateError::NoCurrentToken),
		));

		manager.update(token_data(Duration::seconds(1), None));
		clock.advance(Duration::seconds(5));

		assert_eq!(
			manager.access_token().expect("The stale token is still returned."),
			"seeded",
			"Expired-but-unrenewable sessions surface the stale token; retry policy is the caller's.",
		);
	}
}
