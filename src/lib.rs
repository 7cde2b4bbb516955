//! Request governance for API clients—leaky-bucket admission control and OAuth2 credential
//! lifecycles behind one deterministic-clock seam.
//!
//! The crate decides two things for a transport layer: whether an outbound request may proceed
//! right now ([`rate`]) and which bearer credential to attach to it ([`manager`], [`interactive`]).
//! Everything else—request building, domain serialization, endpoint mapping—belongs to the caller.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod error;
pub mod http;
pub mod interactive;
pub mod manager;
pub mod obs;
pub mod provider;
pub mod rate;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience fixtures for unit and downstream tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		error::NetworkError,
		http::{HttpExecute, HttpResponse, TokenEndpointRequest},
	};

	enum ScriptedOutcome {
		Response(HttpResponse),
		TransportFailure,
	}

	/// Canned-response transport that records every request it executes.
	///
	/// Responses are served in FIFO order; executing past the end of the script fails with a
	/// transport error so a test never silently swallows an extra token request.
	#[derive(Default)]
	pub struct ScriptedHttpClient {
		responses: Mutex<VecDeque<ScriptedOutcome>>,
		requests: Mutex<Vec<TokenEndpointRequest>>,
	}
	impl ScriptedHttpClient {
		/// Queues a `200 OK` JSON response.
		pub fn push_json(&self, body: &str) {
			self.push_response(HttpResponse { status: 200, body: body.as_bytes().to_vec() });
		}

		/// Queues a non-2xx response with an empty body.
		pub fn push_status(&self, status: u16) {
			self.push_response(HttpResponse { status, body: Vec::new() });
		}

		/// Queues a raw response.
		pub fn push_response(&self, response: HttpResponse) {
			self.responses.lock().push_back(ScriptedOutcome::Response(response));
		}

		/// Queues a simulated transport failure.
		pub fn push_transport_failure(&self) {
			self.responses.lock().push_back(ScriptedOutcome::TransportFailure);
		}

		/// Number of requests executed so far.
		pub fn request_count(&self) -> usize {
			self.requests.lock().len()
		}

		/// Snapshot of the executed requests, oldest first.
		pub fn requests(&self) -> Vec<TokenEndpointRequest> {
			self.requests.lock().clone()
		}
	}
	impl HttpExecute for ScriptedHttpClient {
		fn execute(&self, request: &TokenEndpointRequest) -> Result<HttpResponse, NetworkError> {
			self.requests.lock().push(request.clone());

			match self.responses.lock().pop_front() {
				Some(ScriptedOutcome::Response(response)) => Ok(response),
				Some(ScriptedOutcome::TransportFailure) =>
					Err(NetworkError::network(ScriptedFailure("simulated outage"))),
				None => Err(NetworkError::network(ScriptedFailure("no response queued"))),
			}
		}
	}

	#[derive(Debug, ThisError)]
	#[error("Scripted transport failure: {0}.")]
	struct ScriptedFailure(&'static str);
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		sync::Arc,
	};

	pub use parking_lot::{Condvar, Mutex};
	#[cfg(feature = "reqwest")]
	pub use reqwest::blocking::Client as ReqwestClient;
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
