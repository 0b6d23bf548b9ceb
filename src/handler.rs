//! Payment handler: the public entry points and the single-flight action coordinator.
//!
//! A [`PaymentHandler`] runs at most one action at a time. Every entry point claims the
//! handler's slot synchronously; a second invocation while an action is in flight fails at
//! once with [`Error::NoConcurrentActions`] and leaves the live action untouched. Clones of a
//! handler share the slot, metrics, and configuration.
//!
//! Each action moves through [`ActionPhase`]s: confirm (confirm entry point only), inspect
//! the intent, authenticate through the strategy matching its next action, then re-fetch
//! the intent and classify the final state. One timeout bounds the authentication phase.
//! Outcomes are delivered exactly once, either as the output of the returned future
//! ([`PaymentHandler::confirm`], [`PaymentHandler::next_action`]) or through a completion
//! callback ([`PaymentHandler::confirm_payment`], [`PaymentHandler::handle_next_action`]).

mod coordinator;
mod metrics;
mod outcome;
mod slot;

pub use metrics::ActionMetrics;
pub use outcome::{ActionOutcome, ActionStatus};
pub use slot::ActionPhase;

pub(crate) use slot::ActionLease;

// self
use crate::{
	_prelude::*,
	api::PaymentApiClient,
	challenge::ChallengeCapability,
	config::HandlerConfig,
	context::AuthenticationContext,
	handler::{coordinator::ActionRequest, outcome::OutcomeReporter, slot::ActionSlot},
	intent::{ConfirmParams, PaymentIntentSnapshot},
	obs::{self, ActionLabel},
};
#[cfg(feature = "reqwest")] use crate::api::{ApiConfig, ReqwestApiClient};

/// Boxed future returned by the handler's entry points.
pub type ActionFuture<T> = Pin<Box<dyn Future<Output = T> + 'static + Send>>;

#[cfg(feature = "reqwest")]
/// Handler specialized for the crate's default reqwest API client.
pub type ReqwestPaymentHandler = PaymentHandler<ReqwestApiClient>;

/// Confirms payment intents and drives their next actions to a single outcome.
pub struct PaymentHandler<A>
where
	A: ?Sized + PaymentApiClient,
{
	api: Arc<A>,
	challenge: Option<Arc<dyn ChallengeCapability>>,
	config: Arc<HandlerConfig>,
	slot: Arc<ActionSlot>,
	metrics: Arc<ActionMetrics>,
}
impl<A> PaymentHandler<A>
where
	A: ?Sized + PaymentApiClient,
{
	/// Creates a handler with the default configuration and no in-app challenge support.
	pub fn new(api: impl Into<Arc<A>>) -> Self {
		Self {
			api: api.into(),
			challenge: None,
			config: Default::default(),
			slot: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Replaces the configuration.
	pub fn with_config(mut self, config: HandlerConfig) -> Self {
		self.config = Arc::new(config);

		self
	}

	/// Enables in-app challenges backed by `capability`.
	pub fn with_challenge_capability(mut self, capability: Arc<dyn ChallengeCapability>) -> Self {
		self.challenge = Some(capability);

		self
	}

	/// Returns the API client.
	pub fn api(&self) -> &Arc<A> {
		&self.api
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &HandlerConfig {
		&self.config
	}

	/// Returns the shared action counters.
	pub fn metrics(&self) -> &ActionMetrics {
		&self.metrics
	}

	/// Returns the phase of the action in flight, or [`ActionPhase::Idle`].
	pub fn phase(&self) -> ActionPhase {
		self.slot.phase()
	}

	/// Confirms the intent behind `params`, then handles any next action it requires.
	///
	/// The slot is claimed before this method returns. Dropping the future cancels the
	/// action and frees the slot.
	pub fn confirm(
		&self,
		params: ConfirmParams,
		context: Option<Arc<dyn AuthenticationContext>>,
	) -> ActionFuture<ActionOutcome> {
		self.launch_outcome(ActionRequest::Confirm(params), context)
	}

	/// Handles the next action of an already confirmed intent.
	///
	/// The snapshot must carry the intent's client secret whenever authentication is needed.
	pub fn next_action(
		&self,
		snapshot: PaymentIntentSnapshot,
		context: Option<Arc<dyn AuthenticationContext>>,
	) -> ActionFuture<ActionOutcome> {
		self.launch_outcome(ActionRequest::NextAction(snapshot), context)
	}

	/// Callback form of [`PaymentHandler::confirm`].
	///
	/// `completion` runs exactly once: synchronously when the handler is busy, otherwise
	/// when the returned future finishes, or with [`ActionStatus::Canceled`] if the future
	/// is dropped first.
	pub fn confirm_payment<F>(
		&self,
		params: ConfirmParams,
		context: Option<Arc<dyn AuthenticationContext>>,
		completion: F,
	) -> ActionFuture<()>
	where
		F: 'static + Send + FnOnce(ActionStatus, Option<PaymentIntentSnapshot>, Option<Error>),
	{
		self.launch_reported(
			ActionRequest::Confirm(params),
			context,
			OutcomeReporter::new(completion),
		)
	}

	/// Callback form of [`PaymentHandler::next_action`].
	pub fn handle_next_action<F>(
		&self,
		snapshot: PaymentIntentSnapshot,
		context: Option<Arc<dyn AuthenticationContext>>,
		completion: F,
	) -> ActionFuture<()>
	where
		F: 'static + Send + FnOnce(ActionStatus, Option<PaymentIntentSnapshot>, Option<Error>),
	{
		self.launch_reported(
			ActionRequest::NextAction(snapshot),
			context,
			OutcomeReporter::new(completion),
		)
	}

	/// Delivers a redirect return received by the host (deep link, universal link).
	///
	/// Returns `true` when `url` matches the return marker of the redirect in flight and the
	/// redirect was still waiting for it.
	pub fn handle_return_url(&self, url: &Url) -> bool {
		self.slot.deliver_return(url)
	}

	fn launch_outcome(
		&self,
		request: ActionRequest,
		context: Option<Arc<dyn AuthenticationContext>>,
	) -> ActionFuture<ActionOutcome> {
		match self.launch(request, context) {
			Ok(run) => Box::pin(async move {
				let (outcome, _lease) = run.await;

				outcome
			}),
			Err(e) => Box::pin(std::future::ready(ActionOutcome::failed(e, None))),
		}
	}

	fn launch_reported(
		&self,
		request: ActionRequest,
		context: Option<Arc<dyn AuthenticationContext>>,
		reporter: OutcomeReporter,
	) -> ActionFuture<()> {
		match self.launch(request, context) {
			Ok(run) => Box::pin(async move {
				let (outcome, lease) = run.await;

				reporter.report(outcome);
				drop(lease);
			}),
			Err(e) => {
				reporter.report(ActionOutcome::failed(e, None));

				Box::pin(std::future::ready(()))
			},
		}
	}

	/// Claims the slot and returns the action future, which yields the lease alongside the
	/// outcome so callers decide when the slot is freed.
	fn launch(
		&self,
		request: ActionRequest,
		context: Option<Arc<dyn AuthenticationContext>>,
	) -> Result<impl Future<Output = (ActionOutcome, ActionLease)> + 'static + Send> {
		let entry = request.entry();

		self.metrics.record_attempt();
		obs::record_action_outcome(entry, ActionLabel::Attempt);

		let lease = self.slot.try_acquire().inspect_err(|_| {
			self.metrics.record_rejected();
			obs::record_action_outcome(entry, ActionLabel::Rejected);
		})?;
		let handler = self.clone();

		Ok(async move {
			let outcome = handler.execute(&lease, request, context).await;

			(outcome, lease)
		})
	}
}
#[cfg(feature = "reqwest")]
impl PaymentHandler<ReqwestApiClient> {
	/// Creates a handler talking to the processor through a default reqwest client.
	pub fn with_api_config(config: ApiConfig) -> Self {
		Self::new(ReqwestApiClient::new(config))
	}
}
impl<A> Clone for PaymentHandler<A>
where
	A: ?Sized + PaymentApiClient,
{
	fn clone(&self) -> Self {
		Self {
			api: self.api.clone(),
			challenge: self.challenge.clone(),
			config: self.config.clone(),
			slot: self.slot.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<A> Debug for PaymentHandler<A>
where
	A: ?Sized + PaymentApiClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PaymentHandler")
			.field("config", &self.config)
			.field("challenge_capability", &self.challenge.is_some())
			.field("phase", &self.phase())
			.finish()
	}
}
