//! Terminal outcomes and their exactly-once delivery.

// self
use crate::{
	_prelude::*,
	intent::{IntentStatus, PaymentIntentSnapshot},
	obs::ActionLabel,
};

type Completion =
	Box<dyn FnOnce(ActionStatus, Option<PaymentIntentSnapshot>, Option<Error>) + Send>;

/// Status reported to the completion callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
	/// The payment succeeded.
	Succeeded,
	/// The action was canceled, by the cardholder or the processor.
	Canceled,
	/// The action failed; an error is always attached.
	Failed,
}
impl ActionStatus {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Succeeded => "succeeded",
			Self::Canceled => "canceled",
			Self::Failed => "failed",
		}
	}

	pub(crate) const fn label(self) -> ActionLabel {
		match self {
			Self::Succeeded => ActionLabel::Succeeded,
			Self::Canceled => ActionLabel::Canceled,
			Self::Failed => ActionLabel::Failed,
		}
	}
}
impl Display for ActionStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal result of one handler action.
///
/// A `Succeeded` outcome always carries a snapshot whose status is `succeeded`; `Canceled`
/// and `Failed` outcomes never do.
#[derive(Debug)]
pub enum ActionOutcome {
	/// The payment succeeded.
	Succeeded(PaymentIntentSnapshot),
	/// The action was canceled.
	Canceled(Option<PaymentIntentSnapshot>),
	/// The action failed.
	Failed {
		/// Reason for the failure.
		error: Error,
		/// Latest snapshot observed, when one is available.
		snapshot: Option<PaymentIntentSnapshot>,
	},
}
impl ActionOutcome {
	pub(crate) fn failed(error: Error, snapshot: Option<PaymentIntentSnapshot>) -> Self {
		Self::Failed { error, snapshot }
	}

	/// Returns the status reported for this outcome.
	pub fn status(&self) -> ActionStatus {
		match self {
			Self::Succeeded(_) => ActionStatus::Succeeded,
			Self::Canceled(_) => ActionStatus::Canceled,
			Self::Failed { .. } => ActionStatus::Failed,
		}
	}

	/// Returns the attached snapshot, if any.
	pub fn snapshot(&self) -> Option<&PaymentIntentSnapshot> {
		match self {
			Self::Succeeded(snapshot) => Some(snapshot),
			Self::Canceled(snapshot) | Self::Failed { snapshot, .. } => snapshot.as_ref(),
		}
	}

	/// Returns the failure reason, if any.
	pub fn error(&self) -> Option<&Error> {
		match self {
			Self::Failed { error, .. } => Some(error),
			_ => None,
		}
	}

	/// Splits the outcome into the completion callback's arguments.
	pub fn into_parts(self) -> (ActionStatus, Option<PaymentIntentSnapshot>, Option<Error>) {
		match self {
			Self::Succeeded(snapshot) => (ActionStatus::Succeeded, Some(snapshot), None),
			Self::Canceled(snapshot) => (ActionStatus::Canceled, snapshot, None),
			Self::Failed { error, snapshot } => (ActionStatus::Failed, snapshot, Some(error)),
		}
	}

	/// Enforces the pairing between status and snapshot.
	pub(crate) fn sanitize(self) -> Self {
		match self {
			Self::Succeeded(snapshot) if !snapshot.is_succeeded() =>
				Self::failed(Error::IntentStatus { status: snapshot.status }, Some(snapshot)),
			Self::Canceled(snapshot) => Self::Canceled(snapshot.filter(not_succeeded)),
			Self::Failed { error, snapshot } =>
				Self::Failed { error, snapshot: snapshot.filter(not_succeeded) },
			outcome => outcome,
		}
	}
}

/// Delivers an outcome to the completion callback exactly once.
///
/// A reporter dropped before [`OutcomeReporter::report`] (the action future was dropped)
/// reports `Canceled` without a snapshot.
pub(crate) struct OutcomeReporter(Option<Completion>);
impl OutcomeReporter {
	pub(crate) fn new<F>(completion: F) -> Self
	where
		F: 'static + Send + FnOnce(ActionStatus, Option<PaymentIntentSnapshot>, Option<Error>),
	{
		Self(Some(Box::new(completion)))
	}

	pub(crate) fn report(mut self, outcome: ActionOutcome) {
		if let Some(completion) = self.0.take() {
			let (status, snapshot, error) = outcome.into_parts();

			completion(status, snapshot, error);
		}
	}
}
impl Drop for OutcomeReporter {
	fn drop(&mut self) {
		if let Some(completion) = self.0.take() {
			completion(ActionStatus::Canceled, None, None);
		}
	}
}
impl Debug for OutcomeReporter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OutcomeReporter").field("pending", &self.0.is_some()).finish()
	}
}

fn not_succeeded(snapshot: &PaymentIntentSnapshot) -> bool {
	snapshot.status != IntentStatus::Succeeded
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::snapshot;

	type Deliveries = Arc<Mutex<Vec<(ActionStatus, Option<IntentStatus>, bool)>>>;

	fn recording_reporter() -> (OutcomeReporter, Deliveries) {
		let deliveries = Deliveries::default();
		let sink = deliveries.clone();
		let reporter = OutcomeReporter::new(move |status, snapshot, error| {
			sink.lock().push((status, snapshot.map(|s| s.status), error.is_some()));
		});

		(reporter, deliveries)
	}

	#[test]
	fn succeeded_requires_a_succeeded_snapshot() {
		let outcome =
			ActionOutcome::Succeeded(snapshot(IntentStatus::Processing, None)).sanitize();

		assert_eq!(outcome.status(), ActionStatus::Failed);
		assert!(matches!(
			outcome.error(),
			Some(Error::IntentStatus { status: IntentStatus::Processing })
		));
	}

	#[test]
	fn failures_never_carry_a_succeeded_snapshot() {
		let outcome = ActionOutcome::failed(
			Error::NotAuthenticated,
			Some(snapshot(IntentStatus::Succeeded, None)),
		)
		.sanitize();

		assert_eq!(outcome.status(), ActionStatus::Failed);
		assert!(outcome.snapshot().is_none());

		let outcome =
			ActionOutcome::Canceled(Some(snapshot(IntentStatus::Succeeded, None))).sanitize();

		assert!(outcome.snapshot().is_none());
	}

	#[test]
	fn reporter_delivers_once() {
		let (reporter, deliveries) = recording_reporter();

		reporter.report(ActionOutcome::Succeeded(snapshot(IntentStatus::Succeeded, None)));

		assert_eq!(
			deliveries.lock().as_slice(),
			&[(ActionStatus::Succeeded, Some(IntentStatus::Succeeded), false)]
		);
	}

	#[test]
	fn dropped_reporter_reports_cancellation() {
		let (reporter, deliveries) = recording_reporter();

		drop(reporter);

		assert_eq!(deliveries.lock().as_slice(), &[(ActionStatus::Canceled, None, false)]);
	}
}
