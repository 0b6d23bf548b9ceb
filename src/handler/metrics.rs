// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::handler::ActionStatus;

/// Thread-safe counters for handler actions.
#[derive(Debug, Default)]
pub struct ActionMetrics {
	attempts: AtomicU64,
	succeeded: AtomicU64,
	canceled: AtomicU64,
	failed: AtomicU64,
	rejected: AtomicU64,
}
impl ActionMetrics {
	/// Returns the number of entry-point invocations, rejected ones included.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of actions that ended with a succeeded payment.
	pub fn succeeded(&self) -> u64 {
		self.succeeded.load(Ordering::Relaxed)
	}

	/// Returns the number of canceled actions.
	pub fn canceled(&self) -> u64 {
		self.canceled.load(Ordering::Relaxed)
	}

	/// Returns the number of failed actions (rejections excluded).
	pub fn failed(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations rejected because an action was in flight.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejected(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_outcome(&self, status: ActionStatus) {
		let counter = match status {
			ActionStatus::Succeeded => &self.succeeded,
			ActionStatus::Canceled => &self.canceled,
			ActionStatus::Failed => &self.failed,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
