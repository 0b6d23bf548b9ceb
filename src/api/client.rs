// crates.io
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{ApiFuture, ChallengeSubmission, ChallengeVerdict, PaymentApiClient},
	error::TransportError,
	intent::{ClientSecret, ConfirmParams, PaymentIntentId, PaymentIntentSnapshot},
};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";
const ACCOUNT_HEADER: &str = "Stripe-Account";
const MESSAGE_PREVIEW_LIMIT: usize = 256;

/// Errors raised while validating an [`ApiConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ApiConfigError {
	/// The base URL must use HTTPS (loopback hosts may use HTTP).
	#[error("The API base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Rejected URL.
		url: String,
	},
	/// The base URL cannot carry path segments.
	#[error("The API base URL cannot be used as a base: {url}.")]
	OpaqueBaseUrl {
		/// Rejected URL.
		url: String,
	},
	/// Publishable keys start with `pk_`.
	#[error("The publishable key is malformed.")]
	MalformedKey,
}

/// Redacted publishable API key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishableKey(String);
impl PublishableKey {
	/// Validates and wraps a publishable key.
	pub fn new(value: impl Into<String>) -> Result<Self, ApiConfigError> {
		let value = value.into();

		if value.starts_with("pk_") && value.len() > 3 && !value.chars().any(char::is_whitespace)
		{
			Ok(Self(value))
		} else {
			Err(ApiConfigError::MalformedKey)
		}
	}

	/// Returns the inner key. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for PublishableKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PublishableKey").field(&"<redacted>").finish()
	}
}

/// Connection settings for [`ReqwestApiClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
	/// API root, e.g. `https://api.stripe.com`.
	pub base_url: Url,
	/// Key authenticating every request.
	pub publishable_key: PublishableKey,
	/// Connected account to act on behalf of, if any.
	pub account: Option<String>,
}
impl ApiConfig {
	/// Creates a configuration against a validated API root.
	pub fn new(base_url: Url, publishable_key: PublishableKey) -> Result<Self, ApiConfigError> {
		let loopback = matches!(base_url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

		if base_url.scheme() != "https" && !(loopback && base_url.scheme() == "http") {
			return Err(ApiConfigError::InsecureBaseUrl { url: base_url.to_string() });
		}
		if base_url.cannot_be_a_base() {
			return Err(ApiConfigError::OpaqueBaseUrl { url: base_url.to_string() });
		}

		Ok(Self { base_url, publishable_key, account: None })
	}

	/// Creates a configuration against the public Stripe API root.
	pub fn stripe(publishable_key: PublishableKey) -> Result<Self, ApiConfigError> {
		let base_url = Url::parse(DEFAULT_BASE_URL)
			.map_err(|_| ApiConfigError::OpaqueBaseUrl { url: DEFAULT_BASE_URL.into() })?;

		Self::new(base_url, publishable_key)
	}

	/// Acts on behalf of a connected account.
	pub fn with_account(mut self, account: impl Into<String>) -> Self {
		self.account = Some(account.into());

		self
	}

	fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.base_url.clone();

		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}
}

/// [`PaymentApiClient`] backed by reqwest.
///
/// Requests carry bearer authentication and form-encoded bodies; responses are decoded with
/// path-aware JSON errors. Redirects should stay disabled on custom clients because the API
/// answers directly.
#[derive(Clone, Debug)]
pub struct ReqwestApiClient {
	http: ReqwestClient,
	config: Arc<ApiConfig>,
}
impl ReqwestApiClient {
	/// Creates a client with a default reqwest transport.
	pub fn new(config: ApiConfig) -> Self {
		Self::with_client(ReqwestClient::default(), config)
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(http: ReqwestClient, config: ApiConfig) -> Self {
		Self { http, config: Arc::new(config) }
	}

	/// Returns the connection settings.
	pub fn config(&self) -> &ApiConfig {
		&self.config
	}

	fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
		let request = request.bearer_auth(self.config.publishable_key.expose());

		match &self.config.account {
			Some(account) => request.header(ACCOUNT_HEADER, account),
			None => request,
		}
	}

	async fn send<T>(&self, request: RequestBuilder) -> Result<T, TransportError>
	where
		T: DeserializeOwned,
	{
		let response = self.authorize(request).send().await?;
		let status = response.status();
		let body = response.bytes().await?;

		if !status.is_success() {
			return Err(map_api_error(status, &body));
		}

		decode(status, &body)
	}
}
impl PaymentApiClient for ReqwestApiClient {
	fn confirm<'a>(
		&'a self,
		intent: &'a PaymentIntentId,
		params: &'a ConfirmParams,
	) -> ApiFuture<'a, PaymentIntentSnapshot> {
		Box::pin(async move {
			let url = self.config.endpoint(&["v1", "payment_intents", intent.as_ref(), "confirm"]);

			self.send(self.http.post(url).form(&params.to_form())).await
		})
	}

	fn fetch<'a>(
		&'a self,
		intent: &'a PaymentIntentId,
		secret: &'a ClientSecret,
	) -> ApiFuture<'a, PaymentIntentSnapshot> {
		Box::pin(async move {
			let url = self.config.endpoint(&["v1", "payment_intents", intent.as_ref()]);

			self.send(self.http.get(url).query(&[("client_secret", secret.expose())])).await
		})
	}

	fn submit_challenge_response<'a>(
		&'a self,
		intent: &'a PaymentIntentId,
		submission: &'a ChallengeSubmission,
	) -> ApiFuture<'a, ChallengeVerdict> {
		Box::pin(async move {
			let url = self.config.endpoint(&["v1", "3ds2", "challenge_complete"]);
			let mut form = submission.to_form();

			form.push(("payment_intent", intent.to_string()));

			let completion: ChallengeCompletion =
				self.send(self.http.post(url).form(&form)).await?;

			Ok(completion.verdict)
		})
	}
}

#[derive(Debug, Deserialize)]
struct ChallengeCompletion {
	verdict: ChallengeVerdict,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
	error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
	#[serde(rename = "type", default)]
	kind: Option<String>,
	#[serde(default)]
	code: Option<String>,
	#[serde(default)]
	message: Option<String>,
}

fn decode<T>(status: StatusCode, body: &[u8]) -> Result<T, TransportError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TransportError::Decode { source, status: Some(status.as_u16()) })
}

fn map_api_error(status: StatusCode, body: &[u8]) -> TransportError {
	let status = status.as_u16();

	match serde_json::from_slice::<ApiErrorEnvelope>(body) {
		Ok(ApiErrorEnvelope { error }) => TransportError::Api {
			status,
			kind: error.kind,
			code: error.code,
			message: error.message.unwrap_or_else(|| format!("HTTP {status}")),
		},
		Err(_) => TransportError::Api {
			status,
			kind: None,
			code: None,
			message: preview(&String::from_utf8_lossy(body)),
		},
	}
}

fn preview(body: &str) -> String {
	let body = body.trim();

	if body.is_empty() {
		return "empty response body".into();
	}
	if body.chars().count() <= MESSAGE_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = body.chars().take(MESSAGE_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn key() -> PublishableKey {
		PublishableKey::new("pk_test_123").expect("Publishable key fixture should be valid.")
	}

	#[test]
	fn config_validates_base_url_and_key() {
		assert_eq!(PublishableKey::new("sk_live_1"), Err(ApiConfigError::MalformedKey));
		assert_eq!(format!("{:?}", key()), "PublishableKey(\"<redacted>\")");

		let insecure = Url::parse("http://api.example.com").expect("URL fixture should parse.");

		assert!(matches!(
			ApiConfig::new(insecure, key()),
			Err(ApiConfigError::InsecureBaseUrl { .. })
		));

		let loopback = Url::parse("http://127.0.0.1:12111").expect("URL fixture should parse.");

		ApiConfig::new(loopback, key()).expect("Loopback HTTP should be allowed.");
	}

	#[test]
	fn endpoints_escape_identifiers() {
		let config = ApiConfig::stripe(key()).expect("Default API root should be valid.");
		let intent =
			PaymentIntentId::new("pi_1/../x").expect("Identifier fixture should be valid.");
		let url = config.endpoint(&["v1", "payment_intents", intent.as_ref(), "confirm"]);

		assert_eq!(
			url.as_str(),
			"https://api.stripe.com/v1/payment_intents/pi_1%2F..%2Fx/confirm"
		);
	}

	#[test]
	fn api_errors_keep_processor_fields() {
		let err = map_api_error(
			StatusCode::PAYMENT_REQUIRED,
			br#"{"error":{"type":"card_error","code":"card_declined","message":"Your card was declined."}}"#,
		);

		assert!(matches!(
			err,
			TransportError::Api { status: 402, code: Some(ref code), .. } if code == "card_declined"
		));

		let err = map_api_error(StatusCode::BAD_GATEWAY, b"<html>upstream</html>");

		assert!(matches!(
			err,
			TransportError::Api { status: 502, ref message, .. }
				if message == "<html>upstream</html>"
		));
	}
}
