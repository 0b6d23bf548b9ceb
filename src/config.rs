//! Handler configuration: timeouts, polling cadence, and challenge UI customization.

// self
use crate::_prelude::*;

/// Errors raised while validating a [`HandlerConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum HandlerConfigError {
	/// The authentication timeout must be positive.
	#[error("Authentication timeout must be positive.")]
	NonPositiveTimeout,
	/// The authentication timeout exceeds the supported maximum.
	#[error("Authentication timeout {timeout} exceeds the maximum of {max}.")]
	TimeoutTooLong {
		/// Configured authentication timeout.
		timeout: Duration,
		/// Largest accepted timeout.
		max: Duration,
	},
	/// The poll interval must be positive.
	#[error("Poll interval must be positive.")]
	NonPositivePollInterval,
	/// Polling slower than the timeout would never observe a change.
	#[error(
		"Poll interval {poll_interval} must be shorter than the authentication timeout {timeout}."
	)]
	PollIntervalExceedsTimeout {
		/// Configured poll interval.
		poll_interval: Duration,
		/// Configured authentication timeout.
		timeout: Duration,
	},
	/// Customization colors must be `#RRGGBB`.
	#[error("Customization color `{value}` for {field} must use the #RRGGBB form.")]
	InvalidColor {
		/// Customization field holding the value.
		field: &'static str,
		/// Rejected value.
		value: String,
	},
}

/// Display-only settings forwarded to the challenge UI.
///
/// None of these fields affect how the handler sequences an action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeCustomization {
	/// Title shown in the challenge toolbar.
	pub toolbar_title: Option<String>,
	/// Label of the cancel button.
	pub cancel_button_text: Option<String>,
	/// Accent color (`#RRGGBB`) for buttons and highlights.
	pub accent_color: Option<String>,
	/// Background color (`#RRGGBB`) of the challenge surface.
	pub background_color: Option<String>,
	/// Prefer a dark appearance when the host supports one.
	pub prefer_dark_appearance: bool,
}
impl ChallengeCustomization {
	fn validate(&self) -> Result<(), HandlerConfigError> {
		validate_color("accent_color", self.accent_color.as_deref())?;
		validate_color("background_color", self.background_color.as_deref())?;

		Ok(())
	}
}

/// Validated handler configuration.
///
/// Only [`HandlerConfigBuilder::build`] and [`Default`] produce values, so every instance
/// holds a positive timeout no longer than [`HandlerConfig::MAX_AUTHENTICATION_TIMEOUT`] and a
/// positive poll interval shorter than it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerConfig {
	authentication_timeout: Duration,
	poll_interval: Duration,
	challenge_customization: ChallengeCustomization,
}
impl HandlerConfig {
	/// Default authentication timeout.
	pub const DEFAULT_AUTHENTICATION_TIMEOUT: Duration = Duration::minutes(5);
	/// Default out-of-band poll interval.
	pub const DEFAULT_POLL_INTERVAL: Duration = Duration::seconds(3);
	/// Largest accepted authentication timeout.
	pub const MAX_AUTHENTICATION_TIMEOUT: Duration = Duration::days(1);

	/// Creates a builder seeded with the defaults.
	pub fn builder() -> HandlerConfigBuilder {
		HandlerConfigBuilder::default()
	}

	/// Wall-clock budget for the whole authentication attempt.
	pub fn authentication_timeout(&self) -> Duration {
		self.authentication_timeout
	}

	/// Interval between status checks while awaiting out-of-band approval.
	pub fn poll_interval(&self) -> Duration {
		self.poll_interval
	}

	/// Challenge UI customization consulted once per authentication attempt.
	pub fn challenge_customization(&self) -> &ChallengeCustomization {
		&self.challenge_customization
	}
}
impl Default for HandlerConfig {
	fn default() -> Self {
		Self {
			authentication_timeout: Self::DEFAULT_AUTHENTICATION_TIMEOUT,
			poll_interval: Self::DEFAULT_POLL_INTERVAL,
			challenge_customization: ChallengeCustomization::default(),
		}
	}
}

/// Builder for [`HandlerConfig`] values.
#[derive(Clone, Debug)]
pub struct HandlerConfigBuilder {
	/// Wall-clock budget for the whole authentication attempt.
	pub authentication_timeout: Duration,
	/// Interval between status checks while awaiting out-of-band approval.
	pub poll_interval: Duration,
	/// Challenge UI customization.
	pub challenge_customization: ChallengeCustomization,
}
impl HandlerConfigBuilder {
	/// Overrides the authentication timeout.
	pub fn authentication_timeout(mut self, timeout: Duration) -> Self {
		self.authentication_timeout = timeout;

		self
	}

	/// Overrides the out-of-band poll interval.
	pub fn poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;

		self
	}

	/// Overrides the challenge UI customization.
	pub fn challenge_customization(mut self, customization: ChallengeCustomization) -> Self {
		self.challenge_customization = customization;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<HandlerConfig, HandlerConfigError> {
		if !self.authentication_timeout.is_positive() {
			return Err(HandlerConfigError::NonPositiveTimeout);
		}
		if self.authentication_timeout > HandlerConfig::MAX_AUTHENTICATION_TIMEOUT {
			return Err(HandlerConfigError::TimeoutTooLong {
				timeout: self.authentication_timeout,
				max: HandlerConfig::MAX_AUTHENTICATION_TIMEOUT,
			});
		}
		if !self.poll_interval.is_positive() {
			return Err(HandlerConfigError::NonPositivePollInterval);
		}
		if self.poll_interval >= self.authentication_timeout {
			return Err(HandlerConfigError::PollIntervalExceedsTimeout {
				poll_interval: self.poll_interval,
				timeout: self.authentication_timeout,
			});
		}

		self.challenge_customization.validate()?;

		Ok(HandlerConfig {
			authentication_timeout: self.authentication_timeout,
			poll_interval: self.poll_interval,
			challenge_customization: self.challenge_customization,
		})
	}
}
impl Default for HandlerConfigBuilder {
	fn default() -> Self {
		let HandlerConfig { authentication_timeout, poll_interval, challenge_customization } =
			HandlerConfig::default();

		Self { authentication_timeout, poll_interval, challenge_customization }
	}
}

fn validate_color(field: &'static str, value: Option<&str>) -> Result<(), HandlerConfigError> {
	let Some(value) = value else {
		return Ok(());
	};
	let valid = value.len() == 7
		&& value.starts_with('#')
		&& value[1..].chars().all(|ch| ch.is_ascii_hexdigit());

	if valid {
		Ok(())
	} else {
		Err(HandlerConfigError::InvalidColor { field, value: value.to_owned() })
	}
}
