//! Payment intent lifecycle statuses.

// self
use crate::_prelude::*;

/// Processor-reported lifecycle status of a payment intent.
///
/// Unrecognized strings decode into [`IntentStatus::Unknown`] so new processor statuses
/// never break decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
	/// The intent needs a (new) payment method.
	#[serde(alias = "requires_source")]
	RequiresPaymentMethod,
	/// The intent has a payment method and awaits confirmation.
	RequiresConfirmation,
	/// The intent needs an additional action (e.g. authentication).
	#[serde(alias = "requires_source_action")]
	RequiresAction,
	/// The processor is still working on the payment.
	Processing,
	/// Funds were authorized and await capture.
	RequiresCapture,
	/// The payment completed.
	Succeeded,
	/// The intent was canceled.
	Canceled,
	/// Any status this crate does not recognize.
	#[serde(other)]
	Unknown,
}
impl IntentStatus {
	/// Returns the processor's wire identifier for the status.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::RequiresPaymentMethod => "requires_payment_method",
			Self::RequiresConfirmation => "requires_confirmation",
			Self::RequiresAction => "requires_action",
			Self::Processing => "processing",
			Self::RequiresCapture => "requires_capture",
			Self::Succeeded => "succeeded",
			Self::Canceled => "canceled",
			Self::Unknown => "unknown",
		}
	}
}
impl Display for IntentStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unknown_statuses_decode() {
		let status: IntentStatus = serde_json::from_str("\"requires_reauthorization\"")
			.expect("Unrecognized statuses should decode as Unknown.");

		assert_eq!(status, IntentStatus::Unknown);
		assert_eq!(
			serde_json::from_str::<IntentStatus>("\"requires_action\"")
				.expect("Known statuses should decode."),
			IntentStatus::RequiresAction
		);
		assert_eq!(IntentStatus::RequiresPaymentMethod.to_string(), "requires_payment_method");
	}

	#[test]
	fn legacy_source_statuses_map_to_current_ones() {
		assert_eq!(
			serde_json::from_str::<IntentStatus>("\"requires_source_action\"")
				.expect("Legacy action status should decode."),
			IntentStatus::RequiresAction
		);
		assert_eq!(
			serde_json::from_str::<IntentStatus>("\"requires_source\"")
				.expect("Legacy payment method status should decode."),
			IntentStatus::RequiresPaymentMethod
		);
	}
}
