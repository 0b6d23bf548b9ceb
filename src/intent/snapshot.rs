//! Point-in-time payment intent snapshots decoded from processor responses.

// self
use crate::{
	_prelude::*,
	action::ActionDescriptor,
	error::TransportError,
	intent::{ClientSecret, IntentStatus, PaymentIntentId},
};

/// Immutable point-in-time view of a remote payment intent.
///
/// Every processor query yields a fresh snapshot; status and next action always come from
/// the same decoded response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentSnapshot {
	/// Intent identifier.
	pub id: PaymentIntentId,
	/// Lifecycle status at the time of the query.
	pub status: IntentStatus,
	/// Next action requested by the processor, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next_action: Option<ActionDescriptor>,
	/// Client secret echoed by the processor, when exposed to publishable keys.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<ClientSecret>,
	/// Amount in the currency's minor unit.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount: Option<i64>,
	/// Three-letter ISO currency code, lowercase.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub currency: Option<String>,
	/// Creation instant.
	#[serde(
		default,
		with = "time::serde::timestamp::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub created: Option<OffsetDateTime>,
	/// Error attached to the most recent failed attempt.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_payment_error: Option<LastPaymentError>,
}
impl PaymentIntentSnapshot {
	/// Decodes a snapshot from a processor response body.
	pub fn from_json(body: &[u8]) -> Result<Self, TransportError> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| TransportError::Decode { source, status: None })
	}

	/// Returns the next action when the processor is waiting on one.
	pub fn pending_action(&self) -> Option<&ActionDescriptor> {
		match self.status {
			IntentStatus::RequiresAction => self.next_action.as_ref(),
			_ => None,
		}
	}

	/// True when the processor reports the payment as succeeded.
	pub fn is_succeeded(&self) -> bool {
		self.status == IntentStatus::Succeeded
	}
}

/// Processor error recorded on the intent's last payment attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPaymentError {
	/// Error type (e.g. `card_error`).
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	/// Error code (e.g. `payment_intent_authentication_failure`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Human-readable message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}
