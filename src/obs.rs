//! Optional observability helpers for handler actions.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every action inside a `payment_handler.action` span carrying the
//!   `entry` (entry point) and `action_id` fields, with phase transitions logged at `debug`.
//! - Enable `metrics` to increment the `payment_handler_action_total` counter for every
//!   attempt and terminal outcome, labeled by `entry` + `outcome`.

mod tracing;

pub use tracing::*;

// self
use crate::_prelude::*;

/// Entry points an action can start from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionEntry {
	/// Confirm the intent, then handle whatever it requires.
	Confirm,
	/// Handle the next action of an already confirmed intent.
	NextAction,
}
impl ActionEntry {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ActionEntry::Confirm => "confirm",
			ActionEntry::NextAction => "next_action",
		}
	}
}
impl Display for ActionEntry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionLabel {
	/// Entry to a handler entry point.
	Attempt,
	/// Rejected because another action was in flight.
	Rejected,
	/// The payment succeeded.
	Succeeded,
	/// The action was canceled.
	Canceled,
	/// The action failed.
	Failed,
}
impl ActionLabel {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ActionLabel::Attempt => "attempt",
			ActionLabel::Rejected => "rejected",
			ActionLabel::Succeeded => "succeeded",
			ActionLabel::Canceled => "canceled",
			ActionLabel::Failed => "failed",
		}
	}
}
impl Display for ActionLabel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Counts an attempt, rejection, or terminal outcome under
/// `payment_handler_action_total{entry, outcome}`; a no-op without the `metrics` feature.
pub fn record_action_outcome(entry: ActionEntry, label: ActionLabel) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"payment_handler_action_total",
		"entry" => entry.as_str(),
		"outcome" => label.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (entry, label);
	}
}
