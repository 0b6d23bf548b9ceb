//! Authentication strategies, one per supported next-action kind.
//!
//! Dispatch is a closed enum over [`ActionDescriptor`] variants. Every strategy reports a
//! [`StrategyVerdict`]; none of them decides the final outcome, which is left to the
//! coordinator's revalidation. Presentations are held through a guard, so dropping a
//! strategy future (the timeout path) takes any UI it put on screen down with it.

mod challenge;
mod out_of_band;
mod redirect;

// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	action::{ActionDescriptor, ChallengeParameters, OutOfBandApproval, RedirectTarget},
	api::PaymentApiClient,
	challenge::ChallengeCapability,
	config::ChallengeCustomization,
	context::AuthenticationContext,
	handler::ActionLease,
	intent::{ClientSecret, PaymentIntentId},
};

/// What a strategy concluded about the authentication attempt.
#[derive(Debug)]
pub enum StrategyVerdict {
	/// The cardholder went through authentication; the processor still has the final say.
	Authenticated,
	/// The cardholder abandoned authentication.
	UserCanceled,
	/// Authentication failed.
	Failed(Error),
}

/// Strategy selected for one next action.
pub(crate) enum Strategy {
	Redirect(RedirectTarget),
	Challenge { parameters: ChallengeParameters, capability: Arc<dyn ChallengeCapability> },
	OutOfBand(OutOfBandApproval),
	NoAction,
}
impl Strategy {
	/// Picks the strategy for `descriptor`, failing fast on anything the handler cannot run.
	pub(crate) fn select(
		descriptor: ActionDescriptor,
		has_context: bool,
		capability: Option<&Arc<dyn ChallengeCapability>>,
	) -> Result<Self> {
		let kind = descriptor.kind().to_owned();
		let requires_context = descriptor.requires_context();
		let strategy = match descriptor {
			ActionDescriptor::Unsupported { kind } =>
				return Err(Error::UnsupportedAuthentication { kind }),
			ActionDescriptor::RedirectToUrl(target) => Self::Redirect(target),
			ActionDescriptor::UseSdk(parameters) => match capability {
				Some(capability) => Self::Challenge { parameters, capability: capability.clone() },
				None => return Err(Error::UnsupportedAuthentication { kind }),
			},
			ActionDescriptor::OutOfBand(approval) => Self::OutOfBand(approval),
			ActionDescriptor::NoAction => Self::NoAction,
		};

		if requires_context && !has_context {
			return Err(Error::RequiresAuthenticationContext);
		}

		Ok(strategy)
	}

	/// Returns a stable label for logs.
	pub(crate) fn kind(&self) -> &'static str {
		match self {
			Self::Redirect(_) => "redirect",
			Self::Challenge { .. } => "in_app_challenge",
			Self::OutOfBand(_) => "out_of_band",
			Self::NoAction => "no_action",
		}
	}

	/// Runs the strategy to a verdict.
	pub(crate) async fn attempt<A>(self, attempt: Attempt<'_, A>) -> StrategyVerdict
	where
		A: ?Sized + PaymentApiClient,
	{
		let result = match self {
			Self::Redirect(target) => redirect::run(target, &attempt).await,
			Self::Challenge { parameters, capability } =>
				challenge::run(parameters, capability.as_ref(), &attempt).await,
			Self::OutOfBand(approval) => out_of_band::run(approval, &attempt).await,
			Self::NoAction => Ok(StrategyVerdict::Authenticated),
		};

		result.unwrap_or_else(StrategyVerdict::Failed)
	}
}

/// Inputs shared by every strategy for one authentication attempt.
pub(crate) struct Attempt<'a, A>
where
	A: ?Sized,
{
	pub(crate) api: &'a A,
	pub(crate) intent: &'a PaymentIntentId,
	pub(crate) secret: &'a ClientSecret,
	pub(crate) context: Option<Arc<dyn AuthenticationContext>>,
	pub(crate) customization: ChallengeCustomization,
	pub(crate) poll_interval: Duration,
	pub(crate) deadline: Instant,
	pub(crate) lease: &'a ActionLease,
}
impl<A> Attempt<'_, A>
where
	A: ?Sized,
{
	fn context(&self) -> Result<Arc<dyn AuthenticationContext>> {
		self.context.clone().ok_or(Error::RequiresAuthenticationContext)
	}

	fn time_budget(&self) -> Duration {
		Duration::try_from(self.deadline.saturating_duration_since(Instant::now()))
			.unwrap_or(Duration::ZERO)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::ScriptedChallenge, challenge::ChallengeRun};

	fn challenge_descriptor() -> ActionDescriptor {
		ActionDescriptor::UseSdk(ChallengeParameters {
			source: "src_1".into(),
			directory_server_name: "visa".into(),
			server_transaction_id: "srv_1".into(),
			acs_transaction_id: None,
			acs_reference_number: None,
			acs_signed_content: None,
		})
	}

	#[test]
	fn unsupported_kinds_fail_before_context_checks() {
		let err = Strategy::select(
			ActionDescriptor::Unsupported { kind: "alipay_handle_redirect".into() },
			false,
			None,
		)
		.err()
		.expect("Unsupported descriptors should not select a strategy.");

		assert!(matches!(
			err,
			Error::UnsupportedAuthentication { ref kind } if kind == "alipay_handle_redirect"
		));
	}

	#[test]
	fn in_app_challenge_needs_a_capability_and_a_context() {
		let err = Strategy::select(challenge_descriptor(), true, None)
			.err()
			.expect("Challenges without a capability should be unsupported.");

		assert!(matches!(
			err,
			Error::UnsupportedAuthentication { ref kind } if kind == "use_stripe_sdk"
		));

		let capability: Arc<dyn ChallengeCapability> =
			ScriptedChallenge::new(ChallengeRun::Canceled);
		let err = Strategy::select(challenge_descriptor(), false, Some(&capability))
			.err()
			.expect("Challenges without a context should be rejected.");

		assert!(matches!(err, Error::RequiresAuthenticationContext));

		let strategy = Strategy::select(challenge_descriptor(), true, Some(&capability))
			.expect("Challenge with capability and context should be selected.");

		assert_eq!(strategy.kind(), "in_app_challenge");
	}

	#[test]
	fn polling_and_no_action_run_headless() {
		let strategy =
			Strategy::select(ActionDescriptor::OutOfBand(OutOfBandApproval::default()), false, None)
				.expect("Out-of-band approval should not need a context.");

		assert_eq!(strategy.kind(), "out_of_band");

		let strategy = Strategy::select(ActionDescriptor::NoAction, false, None)
			.expect("No-action descriptors should always be selected.");

		assert_eq!(strategy.kind(), "no_action");
	}
}
