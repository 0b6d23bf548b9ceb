//! Confirmation parameters submitted with a payment intent.

// self
use crate::{
	_prelude::*,
	intent::{ClientSecret, PaymentIntentId, PaymentMethodId},
};

/// How the payment method may be reused after this payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupFutureUsage {
	/// Reuse only while the customer is present.
	OnSession,
	/// Reuse without the customer present.
	OffSession,
}
impl SetupFutureUsage {
	/// Returns the processor's wire identifier.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::OnSession => "on_session",
			Self::OffSession => "off_session",
		}
	}
}

/// Parameters submitted when confirming a payment intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmParams {
	/// Client secret of the intent being confirmed.
	pub client_secret: ClientSecret,
	/// Payment method to attach, when not already attached.
	pub payment_method: Option<PaymentMethodId>,
	/// URL the cardholder returns to after a redirect-based action.
	pub return_url: Option<Url>,
	/// Future usage hint for the payment method.
	pub setup_future_usage: Option<SetupFutureUsage>,
	/// Additional form parameters forwarded verbatim.
	pub extra: BTreeMap<String, String>,
}
impl ConfirmParams {
	/// Creates parameters for the intent owning `client_secret`.
	pub fn new(client_secret: ClientSecret) -> Self {
		Self {
			client_secret,
			payment_method: None,
			return_url: None,
			setup_future_usage: None,
			extra: BTreeMap::new(),
		}
	}

	/// Attaches a payment method.
	pub fn with_payment_method(mut self, id: PaymentMethodId) -> Self {
		self.payment_method = Some(id);

		self
	}

	/// Sets the return URL used by redirect-based actions.
	pub fn with_return_url(mut self, url: Url) -> Self {
		self.return_url = Some(url);

		self
	}

	/// Sets the future usage hint.
	pub fn with_setup_future_usage(mut self, usage: SetupFutureUsage) -> Self {
		self.setup_future_usage = Some(usage);

		self
	}

	/// Adds a verbatim form parameter.
	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.insert(key.into(), value.into());

		self
	}

	/// Returns the intent identifier embedded in the client secret.
	pub fn intent_id(&self) -> PaymentIntentId {
		self.client_secret.intent_id()
	}

	/// Flattens the parameters into form pairs.
	///
	/// `use_stripe_sdk=true` is always sent so the processor answers with in-app challenge
	/// descriptors when the card supports them.
	pub fn to_form(&self) -> Vec<(String, String)> {
		let mut form = vec![
			("client_secret".to_owned(), self.client_secret.expose().to_owned()),
			("use_stripe_sdk".to_owned(), "true".to_owned()),
		];

		if let Some(method) = &self.payment_method {
			form.push(("payment_method".into(), method.to_string()));
		}
		if let Some(url) = &self.return_url {
			form.push(("return_url".into(), url.to_string()));
		}
		if let Some(usage) = self.setup_future_usage {
			form.push(("setup_future_usage".into(), usage.as_str().into()));
		}

		form.extend(
			self.extra
				.iter()
				.filter(|(key, _)| !form_reserved(key))
				.map(|(key, value)| (key.clone(), value.clone())),
		);

		form
	}
}

fn form_reserved(key: &str) -> bool {
	matches!(
		key,
		"client_secret" | "use_stripe_sdk" | "payment_method" | "return_url" | "setup_future_usage"
	)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn form_keeps_reserved_keys_authoritative() {
		let secret =
			ClientSecret::new("pi_7_secret_s").expect("Client secret fixture should be valid.");
		let params = ConfirmParams::new(secret)
			.with_payment_method(
				PaymentMethodId::new("pm_card_visa")
					.expect("Payment method fixture should be valid."),
			)
			.with_return_url(Url::parse("shop://return").expect("Return URL should parse."))
			.with_setup_future_usage(SetupFutureUsage::OffSession)
			.with_extra("client_secret", "pi_other_secret_x")
			.with_extra("mandate", "mandate_1");
		let form = params.to_form();

		assert_eq!(params.intent_id().as_ref(), "pi_7");
		assert_eq!(form.iter().filter(|(key, _)| key == "client_secret").count(), 1);
		assert!(form.contains(&("payment_method".into(), "pm_card_visa".into())));
		assert!(form.contains(&("return_url".into(), "shop://return".into())));
		assert!(form.contains(&("setup_future_usage".into(), "off_session".into())));
		assert!(form.contains(&("mandate".into(), "mandate_1".into())));
	}
}
