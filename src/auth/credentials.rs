//! Credential variants for the five supported OAuth2 application types.

// self
use crate::_prelude::*;

/// Immutable description of one OAuth2 application configuration.
///
/// Each variant carries exactly the fields its authentication method requires, so a
/// partially-populated configuration is unrepresentable. Construct one at application setup via
/// the factory methods and share it for the lifetime of the client.
///
/// The two userless variants authenticate without any end-user context; everything they need is
/// known at setup time, which is why [`AuthManager`](crate::manager::AuthManager) can renew them
/// non-interactively.
#[derive(Clone)]
pub enum Credentials {
	/// Script app acting as the account that registered it.
	Script {
		/// Account username.
		username: String,
		/// Account password.
		password: String,
		/// OAuth2 app client ID.
		client_id: String,
		/// OAuth2 app client secret.
		client_secret: String,
	},
	/// Installed app (mobile/desktop); public client without a secret.
	InstalledApp {
		/// OAuth2 app client ID.
		client_id: String,
		/// URL users are redirected to after authorizing the app.
		redirect_url: Url,
	},
	/// Web app holding a confidential client secret.
	WebApp {
		/// OAuth2 app client ID.
		client_id: String,
		/// OAuth2 app client secret.
		client_secret: String,
		/// URL users are redirected to after authorizing the app.
		redirect_url: Url,
	},
	/// Confidential app running without the context of a user.
	Userless {
		/// OAuth2 app client ID.
		client_id: String,
		/// OAuth2 app client secret.
		client_secret: String,
		/// Unique per-device identifier.
		device_id: String,
	},
	/// Installed app running without the context of a user; public client without a secret.
	UserlessApp {
		/// OAuth2 app client ID.
		client_id: String,
		/// Unique per-device identifier.
		device_id: String,
	},
}
impl Credentials {
	/// Creates credentials for a script app.
	pub fn script(
		username: impl Into<String>,
		password: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self::Script {
			username: username.into(),
			password: password.into(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
		}
	}

	/// Creates credentials for an installed app (Android, iOS, desktop).
	pub fn installed_app(client_id: impl Into<String>, redirect_url: Url) -> Self {
		Self::InstalledApp { client_id: client_id.into(), redirect_url }
	}

	/// Creates credentials for a web app.
	pub fn web_app(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_url: Url,
	) -> Self {
		Self::WebApp {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			redirect_url,
		}
	}

	/// Creates credentials for a confidential app running without the context of a user.
	pub fn userless(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		device_id: impl Into<String>,
	) -> Self {
		Self::Userless {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			device_id: device_id.into(),
		}
	}

	/// Creates credentials for an installed app running without the context of a user.
	pub fn userless_app(client_id: impl Into<String>, device_id: impl Into<String>) -> Self {
		Self::UserlessApp { client_id: client_id.into(), device_id: device_id.into() }
	}

	/// OAuth2 app client ID.
	pub fn client_id(&self) -> &str {
		match self {
			Self::Script { client_id, .. }
			| Self::InstalledApp { client_id, .. }
			| Self::WebApp { client_id, .. }
			| Self::Userless { client_id, .. }
			| Self::UserlessApp { client_id, .. } => client_id,
		}
	}

	/// OAuth2 app client secret; empty for public clients, which authenticate as `client_id:`.
	pub fn client_secret(&self) -> &str {
		match self {
			Self::Script { client_secret, .. }
			| Self::WebApp { client_secret, .. }
			| Self::Userless { client_secret, .. } => client_secret,
			Self::InstalledApp { .. } | Self::UserlessApp { .. } => "",
		}
	}

	/// Redirect URL; present only for the interactive variants.
	pub fn redirect_url(&self) -> Option<&Url> {
		match self {
			Self::InstalledApp { redirect_url, .. } | Self::WebApp { redirect_url, .. } =>
				Some(redirect_url),
			Self::Script { .. } | Self::Userless { .. } | Self::UserlessApp { .. } => None,
		}
	}

	/// Per-device identifier; present only for the userless variants.
	pub fn device_id(&self) -> Option<&str> {
		match self {
			Self::Userless { device_id, .. } | Self::UserlessApp { device_id, .. } =>
				Some(device_id),
			Self::Script { .. } | Self::InstalledApp { .. } | Self::WebApp { .. } => None,
		}
	}

	/// Returns true for the variants that require no end-user context.
	pub fn is_userless(&self) -> bool {
		matches!(self, Self::Userless { .. } | Self::UserlessApp { .. })
	}

	/// Returns true for the variants whose authorization requires a browser redirect.
	pub fn is_interactive(&self) -> bool {
		matches!(self, Self::InstalledApp { .. } | Self::WebApp { .. })
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let name = match self {
			Self::Script { .. } => "Script",
			Self::InstalledApp { .. } => "InstalledApp",
			Self::WebApp { .. } => "WebApp",
			Self::Userless { .. } => "Userless",
			Self::UserlessApp { .. } => "UserlessApp",
		};
		let mut out = f.debug_struct(name);

		out.field("client_id", &self.client_id());

		if !self.client_secret().is_empty() {
			out.field("client_secret", &"<redacted>");
		}
		if let Self::Script { username, .. } = self {
			out.field("username", username).field("password", &"<redacted>");
		}
		if let Some(redirect_url) = self.redirect_url() {
			out.field("redirect_url", &redirect_url.as_str());
		}
		if let Some(device_id) = self.device_id() {
			out.field("device_id", &device_id);
		}

		out.finish()
	}
}
