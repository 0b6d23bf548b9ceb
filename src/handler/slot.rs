//! Per-handler single-flight slot holding the live action.

// self
use crate::{
	_prelude::*,
	action::RedirectTarget,
	context::{ReturnRoute, ReturnSignal},
	intent::ActionId,
	obs,
};

/// Coordinator phases of the live action. Phases only advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionPhase {
	/// No action in flight.
	Idle,
	/// Submitting the confirmation.
	Confirming,
	/// Classifying the intent status and next action.
	Inspecting,
	/// Running an authentication strategy.
	Authenticating,
	/// Re-fetching the intent after authentication.
	Revalidating,
	/// Outcome decided; the completion is being delivered.
	Completed,
}
impl ActionPhase {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Confirming => "confirming",
			Self::Inspecting => "inspecting",
			Self::Authenticating => "authenticating",
			Self::Revalidating => "revalidating",
			Self::Completed => "completed",
		}
	}
}
impl Display for ActionPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Default)]
pub(crate) struct ActionSlot {
	active: Mutex<Option<ActiveAction>>,
}
impl ActionSlot {
	/// Claims the slot, or fails with [`Error::NoConcurrentActions`] without touching the
	/// action already in flight.
	pub(crate) fn try_acquire(self: &Arc<Self>) -> Result<ActionLease> {
		let mut active = self.active.lock();

		if active.is_some() {
			return Err(Error::NoConcurrentActions);
		}

		let id = ActionId::generate();

		*active = Some(ActiveAction {
			id: id.clone(),
			phase: ActionPhase::Idle,
			pending_return: None,
		});

		Ok(ActionLease { slot: self.clone(), id })
	}

	pub(crate) fn phase(&self) -> ActionPhase {
		self.active.lock().as_ref().map_or(ActionPhase::Idle, |action| action.phase)
	}

	/// Fires the live redirect's return signal when `url` matches its return marker.
	pub(crate) fn deliver_return(&self, url: &Url) -> bool {
		let route = self
			.active
			.lock()
			.as_ref()
			.and_then(|action| action.pending_return.as_ref())
			.filter(|pending| pending.target.matches_return(url))
			.map(|pending| pending.route.clone());

		route.is_some_and(|route| route.returned())
	}
}

#[derive(Debug)]
struct ActiveAction {
	id: ActionId,
	phase: ActionPhase,
	pending_return: Option<PendingReturn>,
}

#[derive(Debug)]
struct PendingReturn {
	target: RedirectTarget,
	route: ReturnRoute,
}

/// Exclusive claim on an [`ActionSlot`]; dropping it frees the slot.
#[derive(Debug)]
pub(crate) struct ActionLease {
	slot: Arc<ActionSlot>,
	id: ActionId,
}
impl ActionLease {
	pub(crate) fn id(&self) -> &ActionId {
		&self.id
	}

	/// Moves the live action forward; attempts to move backwards are ignored.
	pub(crate) fn advance(&self, phase: ActionPhase) {
		self.with_active(|action| {
			if phase > action.phase {
				action.phase = phase;

				obs::record_phase(phase);
			}
		});
	}

	/// Routes matching return URLs to `signal` while the redirect is presented.
	///
	/// The slot only keeps a weak route, so a host dropping `signal` still reads as a
	/// dismissal.
	pub(crate) fn expect_return(&self, target: RedirectTarget, signal: &ReturnSignal) {
		let route = signal.downgrade();

		self.with_active(|action| action.pending_return = Some(PendingReturn { target, route }));
	}

	pub(crate) fn clear_return(&self) {
		self.with_active(|action| action.pending_return = None);
	}

	fn with_active(&self, f: impl FnOnce(&mut ActiveAction)) {
		if let Some(action) =
			self.slot.active.lock().as_mut().filter(|action| action.id == self.id)
		{
			f(action);
		}
	}
}
impl Drop for ActionLease {
	fn drop(&mut self) {
		let mut active = self.slot.active.lock();

		if active.as_ref().is_some_and(|action| action.id == self.id) {
			*active = None;
		}
	}
}
