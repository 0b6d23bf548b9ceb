// crates.io
use serde_json::json;
// self
use payment_handler::{
	_preludet::*,
	config::HandlerConfig,
	context::ReturnSignal,
	handler::{ActionPhase, ActionStatus},
	intent::{IntentStatus, PaymentIntentSnapshot},
};

type Deliveries = Arc<Mutex<Vec<(ActionStatus, Option<IntentStatus>, Option<String>)>>>;

fn redirect_snapshot() -> PaymentIntentSnapshot {
	snapshot(
		IntentStatus::RequiresAction,
		Some(json!({
			"type": "redirect_to_url",
			"redirect_to_url": {
				"url": "https://bank.example/auth",
				"return_url": "shop://payments/return"
			}
		})),
	)
}

type Completion =
	Box<dyn Send + FnOnce(ActionStatus, Option<PaymentIntentSnapshot>, Option<Error>)>;

fn recorder() -> (Deliveries, Completion) {
	let deliveries = Deliveries::default();
	let sink = deliveries.clone();
	let completion: Completion = Box::new(move |status, snapshot, error| {
		sink.lock().push((
			status,
			snapshot.map(|snapshot| snapshot.status),
			error.and_then(|error| error.code()).map(|code| code.to_string()),
		));
	});

	(deliveries, completion)
}

async fn presented_signal(context: &RecordingContext) -> ReturnSignal {
	loop {
		if let Some(signal) = context.last_signal() {
			return signal;
		}

		tokio::task::yield_now().await;
	}
}

#[tokio::test]
async fn second_action_is_rejected_without_disturbing_the_first() {
	let api = Arc::new(ScriptedApiClient::default());
	let handler = ScriptedHandler::new(api.clone());
	let context = RecordingContext::new(ContextBehavior::Hold);
	let (first, first_completion) = recorder();
	let (second, second_completion) = recorder();

	api.push_fetch(Ok(snapshot(IntentStatus::Succeeded, None)));

	let task = tokio::spawn(handler.handle_next_action(
		redirect_snapshot(),
		Some(context.clone()),
		first_completion,
	));
	let signal = presented_signal(&context).await;
	// The rejection is delivered before the returned future is ever polled.
	let rejected = handler.confirm_payment(confirm_params(), None, second_completion);

	assert_eq!(
		second.lock().as_slice(),
		&[(ActionStatus::Failed, None, Some("no_concurrent_actions".into()))]
	);
	assert_eq!(handler.phase(), ActionPhase::Authenticating);
	assert!(first.lock().is_empty());

	rejected.await;
	signal.returned();
	task.await.expect("Action task should not panic.");

	assert_eq!(
		first.lock().as_slice(),
		&[(ActionStatus::Succeeded, Some(IntentStatus::Succeeded), None)]
	);
	assert_eq!(second.lock().len(), 1);
	assert_eq!(handler.metrics().attempts(), 2);
	assert_eq!(handler.metrics().rejected(), 1);
	assert_eq!(handler.metrics().succeeded(), 1);
	assert!(
		api.calls().iter().all(|call| !matches!(call, ApiCall::Confirm(_))),
		"The rejected confirm must never reach the processor."
	);
}

#[tokio::test(start_paused = true)]
async fn timeout_releases_the_presentation_and_ignores_late_returns() {
	let api = Arc::new(ScriptedApiClient::default());
	let config = HandlerConfig::builder()
		.authentication_timeout(Duration::seconds(30))
		.poll_interval(Duration::seconds(1))
		.build()
		.expect("Test configuration should be valid.");
	let handler = ScriptedHandler::new(api.clone()).with_config(config);
	let context = RecordingContext::new(ContextBehavior::Hold);
	let (deliveries, completion) = recorder();

	handler.handle_next_action(redirect_snapshot(), Some(context.clone()), completion).await;

	assert_eq!(
		deliveries.lock().as_slice(),
		&[(ActionStatus::Failed, Some(IntentStatus::RequiresAction), Some("timed_out".into()))]
	);
	assert!(context.is_released(), "Timed out presentations must be dismissed.");
	assert_eq!(api.fetch_count(), 0, "A timed out action is not revalidated.");

	let late = context.last_signal().expect("The redirect should have handed out a signal.");

	assert!(!late.returned(), "A return after the timeout must be discarded.");
	assert!(!handler.handle_return_url(
		&Url::parse("shop://payments/return").expect("URL should parse.")
	));
	assert_eq!(deliveries.lock().len(), 1, "The completion must fire exactly once.");
	assert_eq!(handler.phase(), ActionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn stuck_challenge_times_out() {
	let api = Arc::new(ScriptedApiClient::default());
	let config = HandlerConfig::builder()
		.authentication_timeout(Duration::seconds(10))
		.poll_interval(Duration::seconds(1))
		.build()
		.expect("Test configuration should be valid.");
	let handler = ScriptedHandler::new(api.clone())
		.with_config(config)
		.with_challenge_capability(ScriptedChallenge::pending());
	let context = RecordingContext::new(ContextBehavior::Hold);
	let challenge = snapshot(
		IntentStatus::RequiresAction,
		Some(json!({
			"type": "use_stripe_sdk",
			"use_stripe_sdk": {
				"type": "stripe_3ds2_challenge",
				"three_d_secure_2_source": "src_1",
				"directory_server_name": "mastercard",
				"server_transaction_id": "srv_1"
			}
		})),
	);
	let outcome = handler.next_action(challenge, Some(context.clone())).await;

	assert!(matches!(
		outcome.error(),
		Some(Error::TimedOut { after }) if *after == Duration::seconds(10)
	));
	assert!(context.is_released());
	assert!(api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn out_of_band_polls_at_the_configured_cadence() {
	let api = Arc::new(ScriptedApiClient::default());
	let config = HandlerConfig::builder()
		.authentication_timeout(Duration::milliseconds(4_500))
		.poll_interval(Duration::seconds(1))
		.build()
		.expect("Test configuration should be valid.");
	let handler = ScriptedHandler::new(api.clone()).with_config(config);
	let approval =
		|| snapshot(IntentStatus::RequiresAction, Some(json!({ "type": "out_of_band" })));

	for _ in 0..10 {
		api.push_fetch(Ok(approval()));
	}

	let outcome = handler.next_action(approval(), None).await;

	assert!(matches!(
		outcome.error(),
		Some(Error::TimedOut { after }) if *after == Duration::milliseconds(4_500)
	));
	assert_eq!(api.fetch_count(), 4, "One fetch per elapsed poll interval is expected.");
}

#[tokio::test]
async fn longest_accepted_timeout_runs_actions() {
	let api = Arc::new(ScriptedApiClient::default());
	let config = HandlerConfig::builder()
		.authentication_timeout(HandlerConfig::MAX_AUTHENTICATION_TIMEOUT)
		.build()
		.expect("The maximum timeout should be accepted.");
	let handler = ScriptedHandler::new(api.clone()).with_config(config);

	api.push_fetch(Ok(snapshot(IntentStatus::Succeeded, None)));

	let outcome = handler
		.next_action(
			snapshot(IntentStatus::RequiresAction, Some(json!({ "type": "none" }))),
			None,
		)
		.await;

	assert_eq!(outcome.status(), ActionStatus::Succeeded);
	assert!(
		HandlerConfig::builder().authentication_timeout(Duration::MAX).build().is_err(),
		"Timeouts beyond the maximum must be rejected."
	);
}

#[tokio::test]
async fn handler_is_reusable_after_completion() {
	let api = Arc::new(ScriptedApiClient::default());
	let handler = ScriptedHandler::new(api.clone());

	api.push_confirm(Ok(snapshot(IntentStatus::Succeeded, None)));
	api.push_confirm(Ok(snapshot(IntentStatus::Succeeded, None)));

	for _ in 0..2 {
		let outcome = handler.confirm(confirm_params(), None).await;

		assert_eq!(outcome.status(), ActionStatus::Succeeded);
	}

	assert_eq!(handler.metrics().rejected(), 0);
}
