//! In-app challenge: hand the device capability a surface, then submit its response.

// self
use crate::{
	_prelude::*,
	action::ChallengeParameters,
	api::{ChallengeSubmission, ChallengeVerdict, PaymentApiClient},
	challenge::{ChallengeCapability, ChallengeRequest, ChallengeRun},
	context::{Presentation, PresentationGuard, ReturnEvent, ReturnSignal, ReturnWaiter},
	strategy::{Attempt, StrategyVerdict},
};

pub(super) async fn run<A>(
	parameters: ChallengeParameters,
	capability: &dyn ChallengeCapability,
	attempt: &Attempt<'_, A>,
) -> Result<StrategyVerdict>
where
	A: ?Sized + PaymentApiClient,
{
	let context = attempt.context()?;
	let (signal, waiter) = ReturnSignal::channel();
	let presentation = Presentation::Challenge {
		directory_server_name: parameters.directory_server_name.clone(),
		customization: attempt.customization.clone(),
	};
	let guard = PresentationGuard::present(context.clone(), presentation, signal).await?;
	let request = ChallengeRequest {
		parameters,
		customization: attempt.customization.clone(),
		time_budget: attempt.time_budget(),
	};
	let run = tokio::select! {
		run = capability.run_challenge(&request, &*context) => run,
		() = dismissal(waiter) => ChallengeRun::Canceled,
	};
	let verdict = match run {
		ChallengeRun::Completed(response) => {
			let submission = ChallengeSubmission::new(&request.parameters, &response);

			match attempt.api.submit_challenge_response(attempt.intent, &submission).await? {
				ChallengeVerdict::Authenticated => StrategyVerdict::Authenticated,
				ChallengeVerdict::NotAuthenticated =>
					StrategyVerdict::Failed(Error::NotAuthenticated),
			}
		},
		ChallengeRun::Canceled => StrategyVerdict::UserCanceled,
		ChallengeRun::Error(e) => StrategyVerdict::Failed(e.into()),
	};

	guard.release();

	Ok(verdict)
}

// Resolves only when the host reports that the user closed the challenge surface.
async fn dismissal(waiter: ReturnWaiter) {
	if waiter.wait().await == ReturnEvent::Returned {
		std::future::pending::<()>().await;
	}
}
