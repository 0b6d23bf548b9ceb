//! Confirm payment intents and drive their next actions (3-D Secure redirects, in-app
//! challenges, out-of-band approvals) to a single, exactly-once outcome.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod action;
pub mod api;
pub mod challenge;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod intent;
pub mod obs;
pub mod strategy;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and scripted collaborators for integration tests; enabled via
	//! `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	#[cfg(feature = "reqwest")] use crate::api::{ApiConfig, ReqwestApiClient};
	use crate::{
		api::{ApiFuture, ChallengeSubmission, ChallengeVerdict, PaymentApiClient},
		challenge::{ChallengeCapability, ChallengeFuture, ChallengeRequest, ChallengeRun},
		context::{AuthenticationContext, ContextError, Presentation, ReturnSignal},
		error::TransportError,
		handler::PaymentHandler,
		intent::{
			ClientSecret, ConfirmParams, IntentStatus, PaymentIntentId, PaymentIntentSnapshot,
			PaymentMethodId,
		},
	};

	/// Builds a reqwest API client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_api_client(config: ApiConfig) -> ReqwestApiClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestApiClient::with_client(client, config)
	}

	/// Handler type alias used by the scripted integration tests.
	pub type ScriptedHandler = PaymentHandler<ScriptedApiClient>;

	/// Builds a snapshot fixture for `pi_test` with the provided status and raw `next_action`.
	pub fn snapshot(
		status: IntentStatus,
		next_action: Option<serde_json::Value>,
	) -> PaymentIntentSnapshot {
		let mut payload = serde_json::json!({
			"id": "pi_test",
			"object": "payment_intent",
			"status": status.as_str(),
			"client_secret": "pi_test_secret_abc",
			"amount": 1099,
			"currency": "usd",
		});

		if let Some(next_action) = next_action {
			payload["next_action"] = next_action;
		}

		PaymentIntentSnapshot::from_json(payload.to_string().as_bytes())
			.expect("Snapshot fixture should decode.")
	}

	/// Confirm parameters for the `pi_test` fixture.
	pub fn confirm_params() -> ConfirmParams {
		let secret = ClientSecret::new("pi_test_secret_abc")
			.expect("Client secret fixture should be valid.");
		let method = PaymentMethodId::new("pm_card_threeDSecure2Required")
			.expect("Payment method fixture should be valid.");

		ConfirmParams::new(secret).with_payment_method(method)
	}

	/// One scripted reply for a [`ScriptedApiClient`] call.
	pub type Scripted<T> = Result<T, TransportError>;

	/// Calls recorded by a [`ScriptedApiClient`].
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub enum ApiCall {
		/// `confirm` was invoked for the intent.
		Confirm(String),
		/// `fetch` was invoked for the intent.
		Fetch(String),
		/// `submit_challenge_response` was invoked with the challenge source.
		SubmitChallenge(String),
	}

	/// In-memory [`PaymentApiClient`] replaying queued replies in order.
	///
	/// An exhausted queue answers with a network error so tests surface unexpected calls.
	#[derive(Debug, Default)]
	pub struct ScriptedApiClient {
		confirms: Mutex<VecDeque<Scripted<PaymentIntentSnapshot>>>,
		fetches: Mutex<VecDeque<Scripted<PaymentIntentSnapshot>>>,
		submissions: Mutex<VecDeque<Scripted<ChallengeVerdict>>>,
		calls: Mutex<Vec<ApiCall>>,
	}
	impl ScriptedApiClient {
		/// Queues a reply for the next `confirm` call.
		pub fn push_confirm(&self, reply: Scripted<PaymentIntentSnapshot>) {
			self.confirms.lock().push_back(reply);
		}

		/// Queues a reply for the next `fetch` call.
		pub fn push_fetch(&self, reply: Scripted<PaymentIntentSnapshot>) {
			self.fetches.lock().push_back(reply);
		}

		/// Queues a reply for the next `submit_challenge_response` call.
		pub fn push_submission(&self, reply: Scripted<ChallengeVerdict>) {
			self.submissions.lock().push_back(reply);
		}

		/// Returns every call observed so far.
		pub fn calls(&self) -> Vec<ApiCall> {
			self.calls.lock().clone()
		}

		/// Counts the `fetch` calls observed so far.
		pub fn fetch_count(&self) -> usize {
			self.calls.lock().iter().filter(|call| matches!(call, ApiCall::Fetch(_))).count()
		}

		fn pop<T>(queue: &Mutex<VecDeque<Scripted<T>>>) -> Scripted<T> {
			queue.lock().pop_front().unwrap_or_else(|| {
				Err(TransportError::network(std::io::Error::other("no scripted reply left")))
			})
		}
	}
	impl PaymentApiClient for ScriptedApiClient {
		fn confirm<'a>(
			&'a self,
			intent: &'a PaymentIntentId,
			_params: &'a ConfirmParams,
		) -> ApiFuture<'a, PaymentIntentSnapshot> {
			self.calls.lock().push(ApiCall::Confirm(intent.to_string()));

			let reply = Self::pop(&self.confirms);

			Box::pin(async move { reply })
		}

		fn fetch<'a>(
			&'a self,
			intent: &'a PaymentIntentId,
			_secret: &'a ClientSecret,
		) -> ApiFuture<'a, PaymentIntentSnapshot> {
			self.calls.lock().push(ApiCall::Fetch(intent.to_string()));

			let reply = Self::pop(&self.fetches);

			Box::pin(async move { reply })
		}

		fn submit_challenge_response<'a>(
			&'a self,
			_intent: &'a PaymentIntentId,
			submission: &'a ChallengeSubmission,
		) -> ApiFuture<'a, ChallengeVerdict> {
			self.calls.lock().push(ApiCall::SubmitChallenge(submission.source.clone()));

			let reply = Self::pop(&self.submissions);

			Box::pin(async move { reply })
		}
	}

	/// How a [`RecordingContext`] reacts to a presentation.
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub enum ContextBehavior {
		/// Keep the signal and answer nothing (tests fire it manually).
		Hold,
		/// Immediately report that control returned to the app.
		Return,
		/// Immediately report that the user dismissed the presentation.
		Dismiss,
		/// Drop the signal without firing it.
		Abandon,
		/// Refuse to present.
		Refuse,
	}

	/// Host adapter fixture that records presentations and dismissals.
	#[derive(Debug)]
	pub struct RecordingContext {
		behavior: ContextBehavior,
		presented: Mutex<Vec<Presentation>>,
		signals: Mutex<Vec<ReturnSignal>>,
		dismissals: Mutex<usize>,
	}
	impl RecordingContext {
		/// Creates a context with the provided behavior.
		pub fn new(behavior: ContextBehavior) -> Arc<Self> {
			Arc::new(Self {
				behavior,
				presented: Default::default(),
				signals: Default::default(),
				dismissals: Default::default(),
			})
		}

		/// Returns every presentation received so far.
		pub fn presented(&self) -> Vec<Presentation> {
			self.presented.lock().clone()
		}

		/// Returns the number of `dismiss` calls received.
		pub fn dismissals(&self) -> usize {
			*self.dismissals.lock()
		}

		/// Returns the most recent return signal, if any.
		pub fn last_signal(&self) -> Option<ReturnSignal> {
			self.signals.lock().last().cloned()
		}

		/// True when every presentation has been matched by a dismissal.
		pub fn is_released(&self) -> bool {
			self.presented.lock().len() == self.dismissals()
		}
	}
	impl AuthenticationContext for RecordingContext {
		fn present(
			&self,
			presentation: Presentation,
			signal: ReturnSignal,
		) -> Result<(), ContextError> {
			if self.behavior == ContextBehavior::Refuse {
				return Err(ContextError::Unavailable { reason: "test host refused".into() });
			}

			self.presented.lock().push(presentation);

			match self.behavior {
				ContextBehavior::Return => {
					signal.returned();
				},
				ContextBehavior::Dismiss => {
					signal.dismissed();
				},
				ContextBehavior::Abandon => drop(signal),
				_ => self.signals.lock().push(signal),
			}

			Ok(())
		}

		fn dismiss(&self) {
			*self.dismissals.lock() += 1;
		}
	}

	/// Device challenge fixture replaying a fixed run result.
	#[derive(Debug)]
	pub struct ScriptedChallenge {
		run: Mutex<Option<ChallengeRun>>,
		requests: Mutex<Vec<ChallengeRequest>>,
		never_finishes: bool,
	}
	impl ScriptedChallenge {
		/// Creates a challenge fixture that answers with `run`.
		pub fn new(run: ChallengeRun) -> Arc<Self> {
			Arc::new(Self {
				run: Mutex::new(Some(run)),
				requests: Default::default(),
				never_finishes: false,
			})
		}

		/// Creates a challenge fixture whose run never completes.
		pub fn pending() -> Arc<Self> {
			Arc::new(Self {
				run: Mutex::new(None),
				requests: Default::default(),
				never_finishes: true,
			})
		}

		/// Returns the challenge requests observed so far.
		pub fn requests(&self) -> Vec<ChallengeRequest> {
			self.requests.lock().clone()
		}
	}
	impl ChallengeCapability for ScriptedChallenge {
		fn run_challenge<'a>(
			&'a self,
			request: &'a ChallengeRequest,
			_host: &'a dyn AuthenticationContext,
		) -> ChallengeFuture<'a> {
			self.requests.lock().push(request.clone());

			let run = self.run.lock().take();
			let never_finishes = self.never_finishes;

			Box::pin(async move {
				match run {
					Some(run) if !never_finishes => run,
					_ => std::future::pending().await,
				}
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
