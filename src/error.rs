//! Handler-level error types shared across the coordinator, strategies, and transports.

// self
use crate::{
	_prelude::*,
	challenge::ChallengeProtocolError,
	config::HandlerConfigError,
	context::ContextError,
	intent::IntentStatus,
};

/// Handler-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical handler error delivered with every failed outcome.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The next action requires an authentication method the handler does not support.
	#[error("Next action `{kind}` requires an unsupported authentication method.")]
	UnsupportedAuthentication {
		/// Raw next-action type reported by the processor.
		kind: String,
	},
	/// The processor cleared the payment method; a new one must be attached.
	#[error("The payment intent is missing a payment method.")]
	RequiresPaymentMethod,
	/// The payment intent ended in a status the handler cannot resolve.
	#[error("The payment intent status `{status}` cannot be resolved.")]
	IntentStatus {
		/// Status observed on the final snapshot.
		status: IntentStatus,
	},
	/// Authentication did not finish before the configured timeout.
	#[error("Authentication timed out after {after}.")]
	TimedOut {
		/// Timeout that elapsed.
		after: Duration,
	},
	/// The device challenge capability reported a protocol failure.
	#[error(transparent)]
	ChallengeCapability(#[from] ChallengeProtocolError),
	/// The processor rejected the authentication result.
	#[error("The transaction did not authenticate.")]
	NotAuthenticated,
	/// Another action is already in flight on this handler.
	#[error("The payment handler does not support concurrent actions.")]
	NoConcurrentActions,
	/// The next action needs a host authentication context but none was provided.
	#[error("The next action requires an authentication context.")]
	RequiresAuthenticationContext,
	/// The processor could not be queried after the strategy reported success.
	#[error("Could not verify the payment intent after authentication.")]
	PostAuthenticationVerification {
		/// Transport failure raised by the verification query.
		#[source]
		source: TransportError,
	},

	/// The snapshot handed to the handler does not carry a client secret, so the intent
	/// cannot be re-fetched.
	#[error("The payment intent snapshot does not carry a client secret.")]
	MissingClientSecret,
	/// Transport failure raised by the remote API client.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Host authentication context failure.
	#[error(transparent)]
	Context(#[from] ContextError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] HandlerConfigError),
}
impl Error {
	/// Returns the stable handler classification, if the error has one.
	///
	/// Transport, context, and configuration failures keep their own classification and
	/// return `None`, as do local argument problems.
	pub fn code(&self) -> Option<ErrorCode> {
		Some(match self {
			Self::UnsupportedAuthentication { .. } => ErrorCode::UnsupportedAuthentication,
			Self::RequiresPaymentMethod => ErrorCode::RequiresPaymentMethod,
			Self::IntentStatus { .. } => ErrorCode::IntentStatus,
			Self::TimedOut { .. } => ErrorCode::TimedOut,
			Self::ChallengeCapability(_) => ErrorCode::ChallengeCapability,
			Self::NotAuthenticated => ErrorCode::NotAuthenticated,
			Self::NoConcurrentActions => ErrorCode::NoConcurrentActions,
			Self::RequiresAuthenticationContext => ErrorCode::RequiresAuthenticationContext,
			Self::PostAuthenticationVerification { .. } =>
				ErrorCode::PostAuthenticationVerification,
			Self::MissingClientSecret
			| Self::Transport(_)
			| Self::Context(_)
			| Self::Config(_) => return None,
		})
	}
}

/// Stable error classifications produced by the handler itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
	/// See [`Error::UnsupportedAuthentication`].
	UnsupportedAuthentication,
	/// See [`Error::RequiresPaymentMethod`].
	RequiresPaymentMethod,
	/// See [`Error::IntentStatus`].
	IntentStatus,
	/// See [`Error::TimedOut`].
	TimedOut,
	/// See [`Error::ChallengeCapability`].
	ChallengeCapability,
	/// See [`Error::NotAuthenticated`].
	NotAuthenticated,
	/// See [`Error::NoConcurrentActions`].
	NoConcurrentActions,
	/// See [`Error::RequiresAuthenticationContext`].
	RequiresAuthenticationContext,
	/// See [`Error::PostAuthenticationVerification`].
	PostAuthenticationVerification,
}
impl ErrorCode {
	/// Returns a stable label suitable for logs and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::UnsupportedAuthentication => "unsupported_authentication",
			Self::RequiresPaymentMethod => "requires_payment_method",
			Self::IntentStatus => "intent_status",
			Self::TimedOut => "timed_out",
			Self::ChallengeCapability => "challenge_capability",
			Self::NotAuthenticated => "not_authenticated",
			Self::NoConcurrentActions => "no_concurrent_actions",
			Self::RequiresAuthenticationContext => "requires_authentication_context",
			Self::PostAuthenticationVerification => "post_authentication_verification",
		}
	}
}
impl Display for ErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-level failures raised by [`PaymentApiClient`](crate::api::PaymentApiClient)
/// implementations.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the payment API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the payment API.")]
	Io(#[from] std::io::Error),
	/// The processor answered with a structured API error.
	#[error("Payment API rejected the request ({status}): {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Processor error type (e.g. `card_error`, `invalid_request_error`).
		kind: Option<String>,
		/// Processor error code (e.g. `payment_intent_unexpected_state`).
		code: Option<String>,
		/// Human-readable message supplied by the processor.
		message: String,
	},
	/// The processor answered with a body that could not be decoded.
	#[error("Payment API returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns the HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } => Some(*status),
			Self::Decode { status, .. } => *status,
			Self::Network { .. } | Self::Io(_) => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
