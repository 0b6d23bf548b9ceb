//! Out-of-band approval: poll the processor until the intent leaves `requires_action`.

// std
use std::pin::pin;
// self
use crate::{
	_prelude::*,
	action::OutOfBandApproval,
	api::PaymentApiClient,
	context::{Presentation, PresentationGuard, ReturnEvent, ReturnSignal},
	intent::IntentStatus,
	strategy::{Attempt, StrategyVerdict},
};

pub(super) async fn run<A>(
	approval: OutOfBandApproval,
	attempt: &Attempt<'_, A>,
) -> Result<StrategyVerdict>
where
	A: ?Sized + PaymentApiClient,
{
	let interval = approval.poll_interval().unwrap_or(attempt.poll_interval).unsigned_abs();
	let (guard, waiter) = match attempt.context.clone() {
		Some(context) => {
			let (signal, waiter) = ReturnSignal::channel();
			let presentation = Presentation::AwaitingApproval { hint: approval.hint.clone() };
			let guard = PresentationGuard::present(context, presentation, signal).await?;

			(Some(guard), Some(waiter))
		},
		None => (None, None),
	};
	let mut watching = waiter.is_some();
	let mut host = pin!(async move {
		match waiter {
			Some(waiter) => waiter.wait().await,
			None => std::future::pending().await,
		}
	});

	loop {
		tokio::select! {
			event = &mut host, if watching => {
				watching = false;

				if event == ReturnEvent::Dismissed {
					return Ok(StrategyVerdict::UserCanceled);
				}
			},
			() = tokio::time::sleep(interval) => {},
		}

		let snapshot = attempt.api.fetch(attempt.intent, attempt.secret).await?;

		if snapshot.status != IntentStatus::RequiresAction {
			if let Some(guard) = guard {
				guard.release();
			}

			return Ok(StrategyVerdict::Authenticated);
		}
	}
}
