// self
use crate::{_prelude::*, handler::ActionPhase, intent::ActionId, obs::ActionEntry};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAction<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAction<F> = F;

/// Span wrapping one handler action from slot acquisition to outcome.
#[derive(Clone, Debug)]
pub struct ActionSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ActionSpan {
	/// Creates a new span tagged with the entry point and action identifier.
	pub fn new(entry: ActionEntry, action_id: &ActionId) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"payment_handler.action",
				entry = entry.as_str(),
				action_id = action_id.as_ref()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (entry, action_id);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAction<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a phase transition of the current action.
pub fn record_phase(phase: ActionPhase) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(phase = phase.as_str(), "Action phase advanced.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = phase;
	}
}

/// Logs the strategy chosen for the current action.
pub fn record_strategy(kind: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(strategy = kind, "Authentication strategy selected.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = kind;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn action_span_noop_without_tracing() {
		let id = ActionId::generate();
		let span = ActionSpan::new(ActionEntry::Confirm, &id);

		record_phase(ActionPhase::Inspecting);

		let _ = span;
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = ActionSpan::new(ActionEntry::NextAction, &ActionId::generate());
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
