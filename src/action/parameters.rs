//! Typed payloads carried by [`ActionDescriptor`](crate::action::ActionDescriptor) variants.

// self
use crate::_prelude::*;

/// Target of a redirect-based authentication step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectTarget {
	/// Resource the cardholder must visit (bank page, banking app link).
	pub url: Url,
	/// Marker URL the processor sends the cardholder back to, when one was supplied.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub return_url: Option<Url>,
}
impl RedirectTarget {
	/// Creates a redirect target without a return marker.
	pub fn new(url: Url) -> Self {
		Self { url, return_url: None }
	}

	/// Attaches the return marker URL.
	pub fn with_return_url(mut self, return_url: Url) -> Self {
		self.return_url = Some(return_url);

		self
	}

	/// Checks whether `candidate` points at this target's return marker.
	///
	/// Scheme, host, port, and path must match; query and fragment are ignored because
	/// processors append their own parameters on the way back.
	pub fn matches_return(&self, candidate: &Url) -> bool {
		self.return_url.as_ref().is_some_and(|expected| {
			expected.scheme() == candidate.scheme()
				&& expected.host_str() == candidate.host_str()
				&& expected.port_or_known_default() == candidate.port_or_known_default()
				&& expected.path().trim_end_matches('/') == candidate.path().trim_end_matches('/')
		})
	}
}

/// Parameters the device challenge capability needs to run an in-app challenge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeParameters {
	/// Processor-side identifier of the authentication attempt.
	#[serde(rename = "three_d_secure_2_source")]
	pub source: String,
	/// Card network directory server (e.g. `visa`, `mastercard`).
	pub directory_server_name: String,
	/// Transaction identifier assigned by the 3DS server.
	pub server_transaction_id: String,
	/// Transaction identifier assigned by the access control server.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub acs_transaction_id: Option<String>,
	/// Reference number of the access control server.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub acs_reference_number: Option<String>,
	/// Signed content (JWS) produced by the access control server.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub acs_signed_content: Option<String>,
}

/// Out-of-band approval details (e.g. confirm in a banking app).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfBandApproval {
	/// Text the host may show while waiting for approval.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hint: Option<String>,
	/// Processor-suggested interval between status checks, in milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub poll_interval_ms: Option<u64>,
}
impl OutOfBandApproval {
	/// Returns the processor-suggested poll interval, ignoring a zero hint.
	pub fn poll_interval(&self) -> Option<Duration> {
		self.poll_interval_ms
			.filter(|ms| *ms > 0)
			.map(|ms| Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX)))
	}
}
