//! Remote payment API contract consumed by the handler.
//!
//! [`PaymentApiClient`] is the handler's only dependency on the processor. Implementations
//! own transport, serialization, and authentication; the handler only sees decoded
//! [`PaymentIntentSnapshot`] values and [`TransportError`] failures, which it surfaces
//! verbatim. The default `reqwest` feature ships [`ReqwestApiClient`].

#[cfg(feature = "reqwest")] mod client;

#[cfg(feature = "reqwest")] pub use client::*;

// self
use crate::{
	_prelude::*,
	action::ChallengeParameters,
	challenge::{ChallengeResponse, TransactionStatus},
	error::TransportError,
	intent::{ClientSecret, ConfirmParams, PaymentIntentId, PaymentIntentSnapshot},
};

/// Boxed future returned by [`PaymentApiClient`] calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Processor operations the handler relies on.
///
/// Implementations must not retry on their own behalf of the handler's semantics: a failed
/// call is reported once and the handler surfaces it to the caller.
pub trait PaymentApiClient
where
	Self: 'static + Send + Sync,
{
	/// Confirms the intent with the provided parameters.
	fn confirm<'a>(
		&'a self,
		intent: &'a PaymentIntentId,
		params: &'a ConfirmParams,
	) -> ApiFuture<'a, PaymentIntentSnapshot>;

	/// Fetches the current state of the intent.
	fn fetch<'a>(
		&'a self,
		intent: &'a PaymentIntentId,
		secret: &'a ClientSecret,
	) -> ApiFuture<'a, PaymentIntentSnapshot>;

	/// Submits an in-app challenge response and returns the processor's verdict.
	fn submit_challenge_response<'a>(
		&'a self,
		intent: &'a PaymentIntentId,
		submission: &'a ChallengeSubmission,
	) -> ApiFuture<'a, ChallengeVerdict>;
}

/// Challenge response as submitted to the processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeSubmission {
	/// Processor-side identifier of the authentication attempt.
	pub source: String,
	/// Result code reported by the device.
	pub transaction_status: TransactionStatus,
	/// Base64url-encoded challenge response message.
	pub encoded_response: String,
}
impl ChallengeSubmission {
	/// Pairs a device response with the parameters of the challenge that produced it.
	pub fn new(parameters: &ChallengeParameters, response: &ChallengeResponse) -> Self {
		Self {
			source: parameters.source.clone(),
			transaction_status: response.transaction_status,
			encoded_response: response.encoded_payload(),
		}
	}

	/// Flattens the submission into form pairs.
	pub fn to_form(&self) -> Vec<(&'static str, String)> {
		vec![
			("source", self.source.clone()),
			("transaction_status", self.transaction_status.as_str().to_owned()),
			("challenge_response", self.encoded_response.clone()),
		]
	}
}

/// Processor verdict for a submitted challenge response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeVerdict {
	/// The processor accepted the authentication.
	Authenticated,
	/// The processor rejected the authentication.
	NotAuthenticated,
}
