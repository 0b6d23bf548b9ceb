//! Normalized "next action" descriptors returned by the payment processor.
//!
//! The processor encodes the next step as an object with a `type` discriminator and a
//! payload stored under a key of the same name. [`ActionDescriptor`] decodes that shape into
//! a closed set of variants. Unknown discriminators, unknown SDK sub-types, and malformed
//! payloads of known variants all land in [`ActionDescriptor::Unsupported`] instead of
//! failing the surrounding snapshot decode, so new processor behavior fails closed at
//! dispatch time.

pub mod parameters;

pub use parameters::*;

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

const REDIRECT_TO_URL: &str = "redirect_to_url";
const USE_SDK: &str = "use_stripe_sdk";
const OUT_OF_BAND: &str = "out_of_band";
const NO_ACTION: &str = "none";
const SDK_3DS2_CHALLENGE: &str = "stripe_3ds2_challenge";
const SDK_3DS2_FINGERPRINT: &str = "stripe_3ds2_fingerprint";
const SDK_3DS_REDIRECT: &str = "three_d_secure_redirect";

/// What the processor wants the client to do next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawNextAction", into = "RawNextAction")]
pub enum ActionDescriptor {
	/// Send the cardholder to an external page or app and wait for the return.
	RedirectToUrl(RedirectTarget),
	/// Run an in-app cryptographic challenge through the device challenge capability.
	UseSdk(ChallengeParameters),
	/// Wait for the cardholder to approve the payment out of band.
	OutOfBand(OutOfBandApproval),
	/// Nothing left to do on the client.
	NoAction,
	/// A next action this crate does not understand.
	Unsupported {
		/// Raw discriminator (`type`, or `use_stripe_sdk.<type>` for SDK sub-types).
		kind: String,
	},
}
impl ActionDescriptor {
	/// Returns a stable label describing the variant.
	pub fn kind(&self) -> &str {
		match self {
			Self::RedirectToUrl(_) => REDIRECT_TO_URL,
			Self::UseSdk(_) => USE_SDK,
			Self::OutOfBand(_) => OUT_OF_BAND,
			Self::NoAction => NO_ACTION,
			Self::Unsupported { kind } => kind,
		}
	}

	/// True when handling this action needs a host authentication context.
	pub fn requires_context(&self) -> bool {
		matches!(self, Self::RedirectToUrl(_) | Self::UseSdk(_))
	}

	fn unsupported(kind: impl Into<String>) -> Self {
		Self::Unsupported { kind: kind.into() }
	}

	fn decode_sdk(payload: Value) -> Self {
		let sub_kind = payload.get("type").and_then(Value::as_str).unwrap_or_default().to_owned();

		match sub_kind.as_str() {
			SDK_3DS2_CHALLENGE | SDK_3DS2_FINGERPRINT =>
				serde_json::from_value(payload).map(Self::UseSdk).unwrap_or_else(|_| {
					Self::unsupported(format!("{USE_SDK}.{sub_kind}"))
				}),
			SDK_3DS_REDIRECT => payload
				.get("stripe_js")
				.and_then(Value::as_str)
				.and_then(|raw| Url::parse(raw).ok())
				.map(|url| Self::RedirectToUrl(RedirectTarget::new(url)))
				.unwrap_or_else(|| Self::unsupported(format!("{USE_SDK}.{sub_kind}"))),
			_ => Self::unsupported(format!("{USE_SDK}.{sub_kind}")),
		}
	}
}

/// Wire shape of a next action: discriminator plus untyped payloads.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawNextAction {
	#[serde(rename = "type", default)]
	kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	redirect_to_url: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	use_stripe_sdk: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	out_of_band: Option<Value>,
}
impl From<RawNextAction> for ActionDescriptor {
	fn from(raw: RawNextAction) -> Self {
		let RawNextAction { kind, redirect_to_url, use_stripe_sdk, out_of_band } = raw;
		let decoded = match kind.as_str() {
			REDIRECT_TO_URL => redirect_to_url
				.and_then(|payload| serde_json::from_value(payload).ok())
				.map(Self::RedirectToUrl),
			USE_SDK => use_stripe_sdk.map(Self::decode_sdk),
			OUT_OF_BAND => match out_of_band {
				None => Some(Self::OutOfBand(OutOfBandApproval::default())),
				Some(payload) => serde_json::from_value(payload).ok().map(Self::OutOfBand),
			},
			NO_ACTION => Some(Self::NoAction),
			_ => None,
		};

		decoded.unwrap_or_else(|| Self::unsupported(kind))
	}
}
impl From<ActionDescriptor> for RawNextAction {
	fn from(descriptor: ActionDescriptor) -> Self {
		let kind = descriptor.kind().to_owned();

		match descriptor {
			ActionDescriptor::RedirectToUrl(target) => Self {
				kind,
				redirect_to_url: serde_json::to_value(target).ok(),
				..Default::default()
			},
			ActionDescriptor::UseSdk(params) => {
				let mut payload = serde_json::to_value(params).unwrap_or_default();

				if let Value::Object(map) = &mut payload {
					map.insert("type".into(), Value::from(SDK_3DS2_CHALLENGE));
				}

				Self { kind, use_stripe_sdk: Some(payload), ..Default::default() }
			},
			ActionDescriptor::OutOfBand(approval) => Self {
				kind,
				out_of_band: serde_json::to_value(approval).ok(),
				..Default::default()
			},
			ActionDescriptor::NoAction | ActionDescriptor::Unsupported { .. } =>
				Self { kind, ..Default::default() },
		}
	}
}
