// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use payment_handler::{
	_preludet::test_reqwest_api_client,
	action::ActionDescriptor,
	api::{
		ApiConfig, ChallengeSubmission, ChallengeVerdict, PaymentApiClient, PublishableKey,
		ReqwestApiClient,
	},
	challenge::TransactionStatus,
	error::TransportError,
	intent::{ClientSecret, ConfirmParams, IntentStatus, PaymentIntentId, PaymentMethodId},
};

const KEY: &str = "pk_test_123";

fn client(server: &MockServer) -> ReqwestApiClient {
	let key = PublishableKey::new(KEY).expect("Publishable key fixture should be valid.");
	let base_url = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let config = ApiConfig::new(base_url, key)
		.expect("Loopback mock server should be accepted.")
		.with_account("acct_connected");

	test_reqwest_api_client(config)
}

fn intent() -> PaymentIntentId {
	PaymentIntentId::new("pi_test").expect("Intent fixture should be valid.")
}

fn secret() -> ClientSecret {
	ClientSecret::new("pi_test_secret_abc").expect("Client secret fixture should be valid.")
}

#[tokio::test]
async fn confirm_posts_form_and_decodes_next_action() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/payment_intents/pi_test/confirm")
				.header("authorization", format!("Bearer {KEY}"))
				.header("stripe-account", "acct_connected")
				.form_urlencoded_tuple("payment_method", "pm_card_visa")
				.form_urlencoded_tuple("use_stripe_sdk", "true");
			then.status(200).header("content-type", "application/json").body(
				r#"{
					"id": "pi_test",
					"object": "payment_intent",
					"status": "requires_action",
					"client_secret": "pi_test_secret_abc",
					"next_action": {
						"type": "redirect_to_url",
						"redirect_to_url": {
							"url": "https://bank.example/auth",
							"return_url": "shop://payments/return"
						}
					}
				}"#,
			);
		})
		.await;
	let params = ConfirmParams::new(secret()).with_payment_method(
		PaymentMethodId::new("pm_card_visa").expect("Payment method fixture should be valid."),
	);
	let snapshot = client(&server)
		.confirm(&intent(), &params)
		.await
		.expect("Confirm should succeed against the mock server.");

	mock.assert_async().await;

	assert_eq!(snapshot.status, IntentStatus::RequiresAction);
	assert!(matches!(snapshot.pending_action(), Some(ActionDescriptor::RedirectToUrl(_))));
}

#[tokio::test]
async fn fetch_sends_the_client_secret() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/payment_intents/pi_test")
				.query_param("client_secret", "pi_test_secret_abc");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":"pi_test","status":"succeeded","amount":1099,"currency":"usd"}"#);
		})
		.await;
	let snapshot = client(&server)
		.fetch(&intent(), &secret())
		.await
		.expect("Fetch should succeed against the mock server.");

	mock.assert_async().await;

	assert!(snapshot.is_succeeded());
	assert_eq!(snapshot.amount, Some(1099));
}

#[tokio::test]
async fn challenge_completion_returns_the_verdict() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/3ds2/challenge_complete")
				.form_urlencoded_tuple("source", "src_1")
				.form_urlencoded_tuple("transaction_status", "Y")
				.form_urlencoded_tuple("payment_intent", "pi_test");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"verdict":"authenticated"}"#);
		})
		.await;
	let submission = ChallengeSubmission {
		source: "src_1".into(),
		transaction_status: TransactionStatus::Authenticated,
		encoded_response: "eyJ0cmFuc1N0YXR1cyI6IlkifQ".into(),
	};
	let verdict = client(&server)
		.submit_challenge_response(&intent(), &submission)
		.await
		.expect("Challenge completion should succeed against the mock server.");

	mock.assert_async().await;

	assert_eq!(verdict, ChallengeVerdict::Authenticated);
}

#[tokio::test]
async fn api_errors_map_to_structured_transport_errors() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/payment_intents/pi_test/confirm");
			then.status(400).header("content-type", "application/json").body(
				r#"{"error":{"type":"invalid_request_error","code":"payment_intent_unexpected_state","message":"This PaymentIntent has already succeeded."}}"#,
			);
		})
		.await;
	let err = client(&server)
		.confirm(&intent(), &ConfirmParams::new(secret()))
		.await
		.expect_err("A 400 response should surface as an error.");

	mock.assert_async().await;

	assert!(matches!(
		err,
		TransportError::Api { status: 400, code: Some(ref code), .. }
			if code == "payment_intent_unexpected_state"
	));
}

#[tokio::test]
async fn malformed_bodies_report_the_failing_path() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/payment_intents/pi_test");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":"pi_test","status":"succeeded","amount":"lots"}"#);
		})
		.await;
	let err = client(&server)
		.fetch(&intent(), &secret())
		.await
		.expect_err("A malformed body should fail to decode.");

	mock.assert_async().await;

	let TransportError::Decode { source, status } = err else {
		panic!("Malformed bodies should map to TransportError::Decode.");
	};

	assert_eq!(source.path().to_string(), "amount");
	assert_eq!(status, Some(200));
}
