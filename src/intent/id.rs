//! Strongly typed identifiers and the redacted client secret.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 255;
const CLIENT_SECRET_MARKER: &str = "_secret_";

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (payment intent, payment method, client secret).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (payment intent, payment method, client secret).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (payment intent, payment method, client secret).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The client secret does not embed a payment intent identifier.
	#[error("Client secret must have the form `<intent>_secret_<suffix>`.")]
	MalformedClientSecret,
}

def_id! { PaymentIntentId, "Identifier of a remote payment intent (`pi_…`).", "PaymentIntent" }
def_id! { PaymentMethodId, "Identifier of a remote payment method (`pm_…`).", "PaymentMethod" }
def_id! { ActionId, "Locally generated identifier of one in-flight action.", "Action" }

impl ActionId {
	const LEN: usize = 24;

	/// Generates a random action identifier.
	pub fn generate() -> Self {
		// crates.io
		use rand::{Rng, distr::Alphanumeric};

		let suffix: String =
			rand::rng().sample_iter(&Alphanumeric).take(Self::LEN).map(char::from).collect();

		Self(format!("act_{suffix}"))
	}
}

/// Redacted client secret scoping publishable-key access to one payment intent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientSecret(String);
impl ClientSecret {
	/// Validates and wraps a client secret.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view("ClientSecret", view)?;

		match view.split_once(CLIENT_SECRET_MARKER) {
			Some((intent, suffix)) if !intent.is_empty() && !suffix.is_empty() =>
				Ok(Self(view.to_owned())),
			_ => Err(IdentifierError::MalformedClientSecret),
		}
	}

	/// Returns the payment intent identifier embedded in the secret.
	pub fn intent_id(&self) -> PaymentIntentId {
		let intent =
			self.0.split_once(CLIENT_SECRET_MARKER).map(|(intent, _)| intent).unwrap_or_default();

		PaymentIntentId(intent.to_owned())
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl TryFrom<String> for ClientSecret {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<ClientSecret> for String {
	fn from(value: ClientSecret) -> Self {
		value.0
	}
}
impl Debug for ClientSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ClientSecret").field(&"<redacted>").finish()
	}
}
impl Display for ClientSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_validate() {
		assert!(PaymentIntentId::new(" pi_123").is_err(), "Leading whitespace must be rejected.");
		assert!(PaymentMethodId::new("").is_err());

		let intent = PaymentIntentId::new("pi_123").expect("Intent fixture should be valid.");

		assert_eq!(intent.as_ref(), "pi_123");
		assert_eq!(format!("{intent:?}"), "PaymentIntent(pi_123)");
		assert!(PaymentIntentId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn client_secret_embeds_intent_and_redacts() {
		let secret =
			ClientSecret::new("pi_123_secret_abc").expect("Client secret fixture should be valid.");

		assert_eq!(secret.intent_id().as_ref(), "pi_123");
		assert_eq!(format!("{secret:?}"), "ClientSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(ClientSecret::new("pi_123"), Err(IdentifierError::MalformedClientSecret));
		assert_eq!(ClientSecret::new("_secret_abc"), Err(IdentifierError::MalformedClientSecret));
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let secret: ClientSecret = serde_json::from_str("\"pi_42_secret_x\"")
			.expect("Client secret should deserialize successfully.");

		assert_eq!(secret.expose(), "pi_42_secret_x");
		assert!(serde_json::from_str::<ClientSecret>("\"pi_42\"").is_err());
		assert!(serde_json::from_str::<PaymentIntentId>("\"with space\"").is_err());
	}

	#[test]
	fn generated_action_ids_are_unique() {
		let a = ActionId::generate();
		let b = ActionId::generate();

		assert!(a.starts_with("act_"));
		assert_eq!(a.len(), 4 + ActionId::LEN);
		assert_ne!(a, b);
	}
}
