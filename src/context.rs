//! Host-supplied authentication context and the scoped presentation it lends to strategies.
//!
//! The host application implements [`AuthenticationContext`] to put authentication UI on
//! screen (open a bank page, show a challenge sheet) and to take it down again. Every
//! presentation carries a [`ReturnSignal`]; the host fires it once control comes back to the
//! app or the user dismisses the presentation. Strategies hold presentations through a
//! guard that dismisses on drop, so timeouts and early returns never leave UI on screen.

// std
use std::sync::Weak;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, config::ChallengeCustomization};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SignalSlot = Mutex<Option<oneshot::Sender<ReturnEvent>>>;

/// Boxed future returned by [`AuthenticationContext::prepare_for_presentation`].
pub type ContextFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Capability surface the handler needs from its host application.
pub trait AuthenticationContext
where
	Self: Send + Sync,
{
	/// Gives the host a chance to get ready (e.g. dismiss its own sheets) before presenting.
	fn prepare_for_presentation(&self) -> ContextFuture<'_> {
		Box::pin(async {})
	}

	/// Presents authentication UI.
	///
	/// The host keeps `signal` and fires it when the cardholder comes back
	/// ([`ReturnSignal::returned`]) or abandons the flow ([`ReturnSignal::dismissed`]).
	fn present(
		&self,
		presentation: Presentation,
		signal: ReturnSignal,
	) -> Result<(), ContextError>;

	/// Removes whatever [`AuthenticationContext::present`] put on screen.
	///
	/// Called exactly once for every successful `present`, on every exit path.
	fn dismiss(&self);
}

/// What the host is asked to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Presentation {
	/// Open an external page or app.
	Redirect {
		/// Resource to open.
		url: Url,
		/// Marker URL the processor returns the cardholder to, when known.
		return_url: Option<Url>,
	},
	/// Provide a surface for the device challenge capability.
	Challenge {
		/// Card network directory server running the challenge.
		directory_server_name: String,
		/// Display-only customization for the challenge UI.
		customization: ChallengeCustomization,
	},
	/// Show a waiting state while the cardholder approves elsewhere.
	AwaitingApproval {
		/// Processor-supplied hint, if any.
		hint: Option<String>,
	},
}

/// Host-side failures raised while presenting authentication UI.
#[derive(Debug, ThisError)]
pub enum ContextError {
	/// The host cannot present right now (backgrounded, no window, etc.).
	#[error("Authentication context is unavailable: {reason}.")]
	Unavailable {
		/// Host-supplied reason string.
		reason: String,
	},
	/// Presenting failed inside the host.
	#[error("Authentication context failed to present.")]
	Presentation {
		/// Host-specific failure.
		#[source]
		source: BoxError,
	},
}
impl ContextError {
	/// Wraps a host-specific presentation failure.
	pub fn presentation(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Presentation { source: Box::new(src) }
	}
}

/// How a presentation ended, as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReturnEvent {
	/// Control came back to the app; the outcome is unknown until revalidation.
	Returned,
	/// The user dismissed the presentation without completing it.
	Dismissed,
}

/// One-shot handle the host fires when a presentation ends.
///
/// Clones share the same slot: the first call to [`ReturnSignal::returned`] or
/// [`ReturnSignal::dismissed`] wins and later calls are ignored. Dropping every clone without
/// firing reports a dismissal.
#[derive(Clone)]
pub struct ReturnSignal(Arc<SignalSlot>);
impl ReturnSignal {
	pub(crate) fn channel() -> (Self, ReturnWaiter) {
		let (tx, rx) = oneshot::channel();

		(Self(Arc::new(Mutex::new(Some(tx)))), ReturnWaiter(rx))
	}

	/// Reports that control returned to the app. Returns `false` if the signal already fired.
	pub fn returned(&self) -> bool {
		self.fire(ReturnEvent::Returned)
	}

	/// Reports that the user dismissed the presentation. Returns `false` if the signal
	/// already fired.
	pub fn dismissed(&self) -> bool {
		self.fire(ReturnEvent::Dismissed)
	}

	pub(crate) fn downgrade(&self) -> ReturnRoute {
		ReturnRoute(Arc::downgrade(&self.0))
	}

	/// True until the signal fires.
	pub fn is_pending(&self) -> bool {
		self.0.lock().as_ref().is_some_and(|tx| !tx.is_closed())
	}

	fn fire(&self, event: ReturnEvent) -> bool {
		match self.0.lock().take() {
			Some(tx) => tx.send(event).is_ok(),
			None => false,
		}
	}
}
impl Debug for ReturnSignal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReturnSignal").field("pending", &self.is_pending()).finish()
	}
}

/// Weak handle that fires a [`ReturnSignal`] only while the host still holds it.
#[derive(Clone, Debug)]
pub(crate) struct ReturnRoute(Weak<SignalSlot>);
impl ReturnRoute {
	pub(crate) fn returned(&self) -> bool {
		self.0.upgrade().is_some_and(|slot| ReturnSignal(slot).returned())
	}
}

/// Receiving half of a [`ReturnSignal`].
#[derive(Debug)]
pub(crate) struct ReturnWaiter(oneshot::Receiver<ReturnEvent>);
impl ReturnWaiter {
	/// Waits for the host; a signal dropped unanswered counts as a dismissal.
	pub(crate) async fn wait(self) -> ReturnEvent {
		self.0.await.unwrap_or(ReturnEvent::Dismissed)
	}
}

/// Scoped ownership of the host's presentation surface.
///
/// Dropping the guard dismisses the presentation, which covers timeouts (the strategy future
/// is dropped mid-await) as well as error returns.
pub(crate) struct PresentationGuard {
	context: Arc<dyn AuthenticationContext>,
	active: bool,
}
impl PresentationGuard {
	/// Prepares the host and presents, returning a guard that owns the surface.
	pub(crate) async fn present(
		context: Arc<dyn AuthenticationContext>,
		presentation: Presentation,
		signal: ReturnSignal,
	) -> Result<Self, ContextError> {
		context.prepare_for_presentation().await;
		context.present(presentation, signal)?;

		Ok(Self { context, active: true })
	}

	/// Dismisses the presentation now instead of at drop.
	pub(crate) fn release(mut self) {
		self.dismiss_once();
	}

	fn dismiss_once(&mut self) {
		if std::mem::take(&mut self.active) {
			self.context.dismiss();
		}
	}
}
impl Drop for PresentationGuard {
	fn drop(&mut self) {
		self.dismiss_once();
	}
}
impl Debug for PresentationGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PresentationGuard").field("active", &self.active).finish()
	}
}
