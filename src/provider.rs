//! Provider endpoint configuration and grant identifiers.

// self
use crate::_prelude::*;

/// OAuth2 grant flavors issued against the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantKind {
	/// Resource-owner password grant, used by script apps.
	Password,
	/// Refresh-token grant for previously authorized interactive sessions.
	RefreshToken,
	/// Client-credentials grant for confidential userless apps.
	ClientCredentials,
	/// Provider-specific installed-client grant for public userless apps.
	InstalledClient,
	/// Authorization-code grant completing the interactive consent flow.
	AuthorizationCode,
}
impl GrantKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantKind::Password => "password",
			GrantKind::RefreshToken => "refresh_token",
			GrantKind::ClientCredentials => "client_credentials",
			GrantKind::InstalledClient => "installed_client",
			GrantKind::AuthorizationCode => "authorization_code",
		}
	}
}
impl Display for GrantKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Endpoints of the OAuth2 provider the governance layer talks to.
///
/// The installed-client grant has no RFC identifier; providers that support it publish their own
/// grant URI, configured via [`with_installed_client_grant`](Self::with_installed_client_grant).
/// Providers with a lighter-weight consent page for mobile browsers can expose it via
/// [`with_mobile_authorization`](Self::with_mobile_authorization).
#[derive(Clone, Debug)]
pub struct ProviderEndpoints {
	/// Browser-facing authorization URL users are sent to for consent.
	pub authorization: Url,
	/// Mobile-optimized authorization URL, when the provider offers one.
	pub mobile_authorization: Option<Url>,
	/// Token endpoint receiving every grant request.
	pub token: Url,
	/// Grant-type URI for the provider's installed-client grant.
	pub installed_client_grant: Option<String>,
}
impl ProviderEndpoints {
	/// Creates a configuration from the two mandatory endpoints.
	pub fn new(authorization: Url, token: Url) -> Self {
		Self { authorization, mobile_authorization: None, token, installed_client_grant: None }
	}

	/// Sets the mobile-optimized authorization URL.
	pub fn with_mobile_authorization(mut self, url: Url) -> Self {
		self.mobile_authorization = Some(url);

		self
	}

	/// Sets the grant-type URI used for the installed-client grant.
	pub fn with_installed_client_grant(mut self, grant_uri: impl Into<String>) -> Self {
		self.installed_client_grant = Some(grant_uri.into());

		self
	}

	/// Authorization URL for the requested site flavor, falling back to the desktop URL.
	pub fn authorization_for(&self, mobile: bool) -> &Url {
		if mobile {
			self.mobile_authorization.as_ref().unwrap_or(&self.authorization)
		} else {
			&self.authorization
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn mobile_authorization_falls_back() {
		let endpoints = ProviderEndpoints::new(
			Url::parse("https://provider.example/authorize").expect("Fixture URL should parse."),
			Url::parse("https://provider.example/token").expect("Fixture URL should parse."),
		);

		assert_eq!(endpoints.authorization_for(true), &endpoints.authorization);

		let endpoints = endpoints.with_mobile_authorization(
			Url::parse("https://provider.example/authorize.compact")
				.expect("Fixture URL should parse."),
		);

		assert!(endpoints.authorization_for(true).as_str().ends_with(".compact"));
		assert_eq!(endpoints.authorization_for(false), &endpoints.authorization);
	}

	#[test]
	fn grant_labels_are_wire_identifiers() {
		assert_eq!(GrantKind::Password.as_str(), "password");
		assert_eq!(GrantKind::AuthorizationCode.as_str(), "authorization_code");
		assert_eq!(GrantKind::InstalledClient.to_string(), "installed_client");
	}
}
