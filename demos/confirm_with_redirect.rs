//! Confirms a payment that requires a bank redirect, then delivers the app's deep link back
//! to the handler, against a mocked processor.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use parking_lot::Mutex;
use url::Url;
// self
use payment_handler::{
	api::{ApiConfig, PublishableKey, ReqwestApiClient},
	context::{AuthenticationContext, ContextError, Presentation, ReturnSignal},
	handler::{ActionPhase, ReqwestPaymentHandler},
	intent::{ClientSecret, ConfirmParams, PaymentMethodId},
	reqwest::Client,
};

/// Host that "opens" pages by printing them.
///
/// The signal is kept while the page is open; dropping it would read as a dismissal.
#[derive(Default)]
struct TerminalHost {
	signal: Mutex<Option<ReturnSignal>>,
}
impl AuthenticationContext for TerminalHost {
	fn present(
		&self,
		presentation: Presentation,
		signal: ReturnSignal,
	) -> Result<(), ContextError> {
		if let Presentation::Redirect { url, .. } = presentation {
			println!("Open {url} to authenticate.");
		}

		*self.signal.lock() = Some(signal);

		Ok(())
	}

	fn dismiss(&self) {
		self.signal.lock().take();

		println!("Authentication page closed.");
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let confirm_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/payment_intents/pi_demo/confirm");
			then.status(200).header("content-type", "application/json").body(
				r#"{
					"id": "pi_demo",
					"status": "requires_action",
					"client_secret": "pi_demo_secret_123",
					"next_action": {
						"type": "redirect_to_url",
						"redirect_to_url": { "url": "https://bank.example/3ds/pi_demo" }
					}
				}"#,
			);
		})
		.await;
	let fetch_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/payment_intents/pi_demo");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":"pi_demo","status":"succeeded","amount":2500,"currency":"eur"}"#);
		})
		.await;
	let config =
		ApiConfig::new(Url::parse(&server.base_url())?, PublishableKey::new("pk_test_demo")?)?;
	let http = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let handler = ReqwestPaymentHandler::new(ReqwestApiClient::with_client(http, config));
	let params = ConfirmParams::new(ClientSecret::new("pi_demo_secret_123")?)
		.with_payment_method(PaymentMethodId::new("pm_card_threeDSecureRequired")?)
		.with_return_url(Url::parse("shop://payments/return")?);
	let host: Arc<dyn AuthenticationContext> = Arc::new(TerminalHost::default());
	let action = tokio::spawn(handler.confirm(params, Some(host)));

	while handler.phase() < ActionPhase::Authenticating && !action.is_finished() {
		tokio::task::yield_now().await;
	}

	// The operating system hands the app its deep link once the bank is done.
	let delivered =
		handler.handle_return_url(&Url::parse("shop://payments/return?payment_intent=pi_demo")?);
	let outcome = action.await?;

	println!("Return delivered: {delivered}; outcome: {}.", outcome.status());

	confirm_mock.assert_async().await;
	fetch_mock.assert_async().await;

	Ok(())
}
