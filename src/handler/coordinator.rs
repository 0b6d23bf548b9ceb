//! The action state machine: confirm, inspect, authenticate, revalidate.

// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	action::ActionDescriptor,
	api::PaymentApiClient,
	config::{HandlerConfig, HandlerConfigError},
	context::AuthenticationContext,
	error::TransportError,
	handler::{ActionLease, ActionOutcome, ActionPhase, PaymentHandler},
	intent::{ConfirmParams, IntentStatus, PaymentIntentSnapshot},
	obs::{self, ActionEntry, ActionSpan},
	strategy::{Attempt, Strategy, StrategyVerdict},
};

/// What an entry point asked the handler to do.
#[derive(Debug)]
pub(super) enum ActionRequest {
	Confirm(ConfirmParams),
	NextAction(PaymentIntentSnapshot),
}
impl ActionRequest {
	pub(super) fn entry(&self) -> ActionEntry {
		match self {
			Self::Confirm(_) => ActionEntry::Confirm,
			Self::NextAction(_) => ActionEntry::NextAction,
		}
	}
}

impl<A> PaymentHandler<A>
where
	A: ?Sized + PaymentApiClient,
{
	/// Runs one claimed action to its sanitized outcome.
	pub(super) async fn execute(
		&self,
		lease: &ActionLease,
		request: ActionRequest,
		context: Option<Arc<dyn AuthenticationContext>>,
	) -> ActionOutcome {
		let entry = request.entry();
		let span = ActionSpan::new(entry, lease.id());
		let outcome = span
			.instrument(async {
				let outcome = self.drive(lease, request, context).await.sanitize();

				lease.advance(ActionPhase::Completed);

				outcome
			})
			.await;

		self.metrics.record_outcome(outcome.status());
		obs::record_action_outcome(entry, outcome.status().label());

		outcome
	}

	async fn drive(
		&self,
		lease: &ActionLease,
		request: ActionRequest,
		context: Option<Arc<dyn AuthenticationContext>>,
	) -> ActionOutcome {
		let (snapshot, secret, return_url) = match request {
			ActionRequest::Confirm(params) => {
				lease.advance(ActionPhase::Confirming);

				let intent = params.intent_id();
				let confirmed = self.api.confirm(&intent, &params).await;

				match confirmed {
					Ok(snapshot) => (snapshot, Some(params.client_secret), params.return_url),
					Err(e) => return ActionOutcome::failed(e.into(), None),
				}
			},
			ActionRequest::NextAction(snapshot) => {
				let secret = snapshot.client_secret.clone();

				(snapshot, secret, None)
			},
		};

		lease.advance(ActionPhase::Inspecting);

		let descriptor = match (snapshot.status, snapshot.next_action.clone()) {
			(IntentStatus::RequiresAction, Some(descriptor)) => descriptor,
			_ => return classify(snapshot),
		};
		let strategy = match Strategy::select(
			with_return_fallback(descriptor, return_url),
			context.is_some(),
			self.challenge.as_ref(),
		) {
			Ok(strategy) => strategy,
			Err(e) => return ActionOutcome::failed(e, Some(snapshot)),
		};
		let Some(secret) = secret else {
			return ActionOutcome::failed(Error::MissingClientSecret, Some(snapshot));
		};

		obs::record_strategy(strategy.kind());
		lease.advance(ActionPhase::Authenticating);

		let timeout = self.config.authentication_timeout();
		let Some(deadline) = Instant::now().checked_add(timeout.unsigned_abs()) else {
			let error = HandlerConfigError::TimeoutTooLong {
				timeout,
				max: HandlerConfig::MAX_AUTHENTICATION_TIMEOUT,
			};

			return ActionOutcome::failed(error.into(), Some(snapshot));
		};
		let attempt = Attempt {
			api: &*self.api,
			intent: &snapshot.id,
			secret: &secret,
			context,
			customization: self.config.challenge_customization().clone(),
			poll_interval: self.config.poll_interval(),
			deadline,
			lease,
		};
		let verdict = match tokio::time::timeout_at(deadline, strategy.attempt(attempt)).await {
			Ok(verdict) => verdict,
			Err(_) => {
				// The strategy future is gone; a late return must not reach its signal.
				lease.clear_return();

				return ActionOutcome::failed(Error::TimedOut { after: timeout }, Some(snapshot));
			},
		};

		lease.advance(ActionPhase::Revalidating);

		let refreshed = self.api.fetch(&snapshot.id, &secret).await;

		revalidate(verdict, refreshed)
	}
}

/// Maps a snapshot that needs no (further) authentication onto an outcome.
fn classify(snapshot: PaymentIntentSnapshot) -> ActionOutcome {
	match snapshot.status {
		IntentStatus::Succeeded => ActionOutcome::Succeeded(snapshot),
		IntentStatus::Canceled => ActionOutcome::Canceled(Some(snapshot)),
		IntentStatus::RequiresPaymentMethod =>
			ActionOutcome::failed(Error::RequiresPaymentMethod, Some(snapshot)),
		status => ActionOutcome::failed(Error::IntentStatus { status }, Some(snapshot)),
	}
}

/// Reconciles a strategy verdict with the processor's view of the intent.
///
/// `requires_action` never loops back into authentication.
fn revalidate(
	verdict: StrategyVerdict,
	refreshed: Result<PaymentIntentSnapshot, TransportError>,
) -> ActionOutcome {
	let snapshot = match refreshed {
		Ok(snapshot) => snapshot,
		Err(source) =>
			return match verdict {
				StrategyVerdict::Authenticated =>
					ActionOutcome::failed(Error::PostAuthenticationVerification { source }, None),
				StrategyVerdict::UserCanceled => ActionOutcome::Canceled(None),
				StrategyVerdict::Failed(error) => ActionOutcome::failed(error, None),
			},
	};

	match (snapshot.status, verdict) {
		(IntentStatus::Succeeded | IntentStatus::Canceled, _) => classify(snapshot),
		(_, StrategyVerdict::Failed(error)) => ActionOutcome::failed(error, Some(snapshot)),
		(IntentStatus::RequiresAction, StrategyVerdict::UserCanceled) =>
			ActionOutcome::Canceled(Some(snapshot)),
		_ => classify(snapshot),
	}
}

fn with_return_fallback(descriptor: ActionDescriptor, fallback: Option<Url>) -> ActionDescriptor {
	match (descriptor, fallback) {
		(ActionDescriptor::RedirectToUrl(target), Some(url)) if target.return_url.is_none() =>
			ActionDescriptor::RedirectToUrl(target.with_return_url(url)),
		(descriptor, _) => descriptor,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::snapshot, handler::ActionStatus};

	fn network_error() -> TransportError {
		TransportError::network(std::io::Error::other("connection reset"))
	}

	#[test]
	fn processor_status_wins_over_the_verdict() {
		let outcome = revalidate(
			StrategyVerdict::Failed(Error::NotAuthenticated),
			Ok(snapshot(IntentStatus::Succeeded, None)),
		);

		assert_eq!(outcome.status(), ActionStatus::Succeeded);

		let outcome = revalidate(
			StrategyVerdict::Authenticated,
			Ok(snapshot(IntentStatus::Canceled, None)),
		);

		assert_eq!(outcome.status(), ActionStatus::Canceled);
	}

	#[test]
	fn unresolved_statuses_after_authentication_fail() {
		for status in [
			IntentStatus::RequiresAction,
			IntentStatus::Processing,
			IntentStatus::RequiresConfirmation,
		] {
			let outcome = revalidate(StrategyVerdict::Authenticated, Ok(snapshot(status, None)));

			assert!(
				matches!(outcome.error(), Some(Error::IntentStatus { status: s }) if *s == status),
				"Status {status} should stay unresolved."
			);
		}

		let outcome = revalidate(
			StrategyVerdict::UserCanceled,
			Ok(snapshot(IntentStatus::RequiresPaymentMethod, None)),
		);

		assert!(matches!(outcome.error(), Some(Error::RequiresPaymentMethod)));
	}

	#[test]
	fn user_cancel_with_pending_action_is_a_cancellation() {
		let outcome = revalidate(
			StrategyVerdict::UserCanceled,
			Ok(snapshot(IntentStatus::RequiresAction, None)),
		);

		assert_eq!(outcome.status(), ActionStatus::Canceled);
		assert!(outcome.snapshot().is_some());
	}

	#[test]
	fn fetch_failures_depend_on_the_verdict() {
		let outcome = revalidate(StrategyVerdict::Authenticated, Err(network_error()));

		assert!(matches!(outcome.error(), Some(Error::PostAuthenticationVerification { .. })));
		assert!(outcome.snapshot().is_none());

		let outcome = revalidate(StrategyVerdict::UserCanceled, Err(network_error()));

		assert_eq!(outcome.status(), ActionStatus::Canceled);
		assert!(outcome.snapshot().is_none());

		let outcome =
			revalidate(StrategyVerdict::Failed(Error::NotAuthenticated), Err(network_error()));

		assert!(matches!(outcome.error(), Some(Error::NotAuthenticated)));
	}

	#[test]
	fn confirm_return_url_backs_redirects_without_one() {
		let bank = Url::parse("https://bank.example/auth").expect("URL should parse.");
		let fallback = Url::parse("shop://return").expect("URL should parse.");
		let descriptor = with_return_fallback(
			ActionDescriptor::RedirectToUrl(crate::action::RedirectTarget::new(bank)),
			Some(fallback.clone()),
		);

		assert!(matches!(
			descriptor,
			ActionDescriptor::RedirectToUrl(target) if target.return_url == Some(fallback)
		));
	}
}
