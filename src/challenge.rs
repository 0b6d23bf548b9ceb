//! Device challenge capability used by the in-app challenge strategy.
//!
//! The handler never renders challenge UI or speaks the 3-D Secure protocol itself. A
//! [`ChallengeCapability`] does both, given the processor's [`ChallengeParameters`] and a host
//! [`AuthenticationContext`] to draw on, and answers with a [`ChallengeRun`].

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	_prelude::*,
	action::ChallengeParameters,
	config::ChallengeCustomization,
	context::AuthenticationContext,
};

/// Boxed future returned by [`ChallengeCapability::run_challenge`].
pub type ChallengeFuture<'a> = Pin<Box<dyn Future<Output = ChallengeRun> + 'a + Send>>;

/// Device-level challenge/response implementation.
///
/// Dropping the returned future is the cancellation signal; implementations must tear down
/// any protocol state they own when that happens.
pub trait ChallengeCapability
where
	Self: Send + Sync,
{
	/// Runs the challenge and collects the cardholder's response.
	fn run_challenge<'a>(
		&'a self,
		request: &'a ChallengeRequest,
		host: &'a dyn AuthenticationContext,
	) -> ChallengeFuture<'a>;
}

/// Everything a [`ChallengeCapability`] needs to run one challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeRequest {
	/// Processor-issued challenge parameters.
	pub parameters: ChallengeParameters,
	/// Display-only UI customization.
	pub customization: ChallengeCustomization,
	/// Time left for the whole authentication attempt when the challenge starts.
	pub time_budget: Duration,
}

/// How a challenge run ended on the device.
#[derive(Debug)]
pub enum ChallengeRun {
	/// The cardholder finished the challenge; the response still needs processor approval.
	Completed(ChallengeResponse),
	/// The cardholder canceled the challenge.
	Canceled,
	/// The challenge protocol failed.
	Error(ChallengeProtocolError),
}

/// Result code of a 3-D Secure 2 challenge (`transStatus`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
	/// `Y`: authentication verified.
	#[serde(rename = "Y")]
	Authenticated,
	/// `N`: not authenticated.
	#[serde(rename = "N")]
	NotAuthenticated,
	/// `A`: attempt processed without full authentication.
	#[serde(rename = "A")]
	Attempted,
	/// `U`: authentication could not be performed.
	#[serde(rename = "U")]
	Unavailable,
	/// `R`: the issuer rejected the authentication.
	#[serde(rename = "R")]
	Rejected,
}
impl TransactionStatus {
	/// Returns the protocol's single-letter code.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Authenticated => "Y",
			Self::NotAuthenticated => "N",
			Self::Attempted => "A",
			Self::Unavailable => "U",
			Self::Rejected => "R",
		}
	}
}

/// Response collected by a completed challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeResponse {
	/// Result code reported by the access control server.
	pub transaction_status: TransactionStatus,
	/// Raw challenge response message.
	pub payload: Vec<u8>,
}
impl ChallengeResponse {
	/// Creates a response from the result code and raw message.
	pub fn new(transaction_status: TransactionStatus, payload: impl Into<Vec<u8>>) -> Self {
		Self { transaction_status, payload: payload.into() }
	}

	/// Encodes the raw message as unpadded base64url for submission.
	pub fn encoded_payload(&self) -> String {
		URL_SAFE_NO_PAD.encode(&self.payload)
	}
}

/// Failures reported by a [`ChallengeCapability`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ChallengeProtocolError {
	/// The challenge protocol reported an error message.
	#[error("Challenge protocol error {code}: {description}.")]
	Protocol {
		/// Protocol error code.
		code: String,
		/// Protocol error description.
		description: String,
		/// Additional detail, when supplied.
		detail: Option<String>,
	},
	/// The capability failed outside the protocol (crypto, rendering, device state).
	#[error("Challenge runtime error: {message}.")]
	Runtime {
		/// Capability-supplied message.
		message: String,
	},
}
