//! Redirect-based authentication: open the processor's page and wait for the return.

// self
use crate::{
	_prelude::*,
	action::RedirectTarget,
	context::{Presentation, PresentationGuard, ReturnEvent, ReturnSignal},
	strategy::{Attempt, StrategyVerdict},
};

pub(super) async fn run<A>(
	target: RedirectTarget,
	attempt: &Attempt<'_, A>,
) -> Result<StrategyVerdict>
where
	A: ?Sized,
{
	let context = attempt.context()?;
	let (signal, waiter) = ReturnSignal::channel();
	let presentation =
		Presentation::Redirect { url: target.url.clone(), return_url: target.return_url.clone() };

	// Registered before presenting so a return delivered during `present` is still routed.
	attempt.lease.expect_return(target, &signal);

	let guard = match PresentationGuard::present(context, presentation, signal).await {
		Ok(guard) => guard,
		Err(e) => {
			attempt.lease.clear_return();

			return Err(e.into());
		},
	};
	let event = waiter.wait().await;

	guard.release();
	attempt.lease.clear_return();

	Ok(match event {
		// Optimistic; revalidation decides whether the bank actually approved.
		ReturnEvent::Returned => StrategyVerdict::Authenticated,
		ReturnEvent::Dismissed => StrategyVerdict::UserCanceled,
	})
}
