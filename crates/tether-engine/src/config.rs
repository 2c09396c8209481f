//! Bridge configuration, validation, and error types.
//!
//! [`BridgeConfig`] is the input to
//! [`HostContext::initialize`](crate::context::HostContext::initialize).
//! [`validate()`](BridgeConfig::validate) checks every field before any
//! host call is made.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tether_core::BindingError;

/// Longest accepted settling delay.
pub const MAX_SETTLE_DELAY: Duration = Duration::from_secs(60);

// ── StagingMode ───────────────────────────────────────────────────

/// Where a scheduled mutation's target and payload live until it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StagingMode {
    /// One shared slot per mutation kind. A second same-kind submission
    /// before the first runs overwrites the slot; the earlier entry then
    /// executes the later payload and the later entry is skipped.
    #[default]
    SingleSlot,
    /// Each queue entry carries its own target and payload. Nothing is
    /// overwritten; every submission runs with the values it was given.
    Inline,
}

// ── SettleDelays ──────────────────────────────────────────────────

/// Pauses inside the remove composite, on the host thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettleDelays {
    /// After restaging the position, before the close call. Default: 1 s.
    pub before_close: Duration,
    /// After the close call. Default: 1 s.
    pub after_close: Duration,
}

impl SettleDelays {
    /// No pauses at all.
    pub const NONE: SettleDelays = SettleDelays {
        before_close: Duration::ZERO,
        after_close: Duration::ZERO,
    };
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            before_close: Duration::from_secs(1),
            after_close: Duration::from_secs(1),
        }
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected during [`BridgeConfig::validate()`] or while
/// bringing up the bridge.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Host bindings could not be initialized.
    Binding(BindingError),
    /// `tick_rate_hz` is NaN, infinite, zero, or negative.
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// `drain_budget` is `Some(0)`.
    ZeroDrainBudget,
    /// A settling delay exceeds [`MAX_SETTLE_DELAY`].
    SettleTooLong {
        /// Which delay.
        name: &'static str,
        /// The configured value.
        value: Duration,
    },
    /// The host loop thread could not be spawned.
    ThreadSpawnFailed {
        /// OS error text.
        reason: String,
    },
    /// The executor could not be recovered from the host loop (the thread panicked).
    ExecutorRecoveryFailed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding(e) => write!(f, "binding: {e}"),
            Self::InvalidTickRate { value } => {
                write!(f, "tick_rate_hz must be finite and positive, got {value}")
            }
            Self::ZeroDrainBudget => write!(f, "drain_budget must be at least 1 when set"),
            Self::SettleTooLong { name, value } => write!(
                f,
                "settle delay {name} is {value:?}, maximum is {MAX_SETTLE_DELAY:?}"
            ),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
            Self::ExecutorRecoveryFailed => {
                write!(f, "executor could not be recovered from host loop")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Binding(e) => Some(e),
            _ => None,
        }
    }
}

impl ConfigError {
    /// The fatal binding failure, when bring-up stopped at attach or
    /// required type resolution.
    pub fn binding(&self) -> Option<&BindingError> {
        match self {
            Self::Binding(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BindingError> for ConfigError {
    fn from(e: BindingError) -> Self {
        Self::Binding(e)
    }
}

// ── BridgeConfig ──────────────────────────────────────────────────

/// Complete configuration for a host binding context.
#[derive(Clone, Debug, PartialEq)]
pub struct BridgeConfig {
    /// Pauses inside the remove composite.
    pub settle: SettleDelays,
    /// Staging strategy for typed mutations. Default: [`StagingMode::SingleSlot`].
    pub staging: StagingMode,
    /// Rate at which [`HostLoop`](crate::host_loop::HostLoop) steps and
    /// drains. Default: 60.
    pub tick_rate_hz: f64,
    /// Maximum entries executed per drain. `None` drains everything that
    /// was queued when the drain started.
    pub drain_budget: Option<usize>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            settle: SettleDelays::default(),
            staging: StagingMode::default(),
            tick_rate_hz: 60.0,
            drain_budget: None,
        }
    }
}

impl BridgeConfig {
    /// Validate all fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Reciprocal must be finite too: Duration::from_secs_f64 panics on inf.
        let hz = self.tick_rate_hz;
        if !hz.is_finite() || hz <= 0.0 || !(1.0 / hz).is_finite() {
            return Err(ConfigError::InvalidTickRate { value: hz });
        }
        if self.drain_budget == Some(0) {
            return Err(ConfigError::ZeroDrainBudget);
        }
        for (name, value) in [
            ("before_close", self.settle.before_close),
            ("after_close", self.settle.after_close),
        ] {
            if value > MAX_SETTLE_DELAY {
                return Err(ConfigError::SettleTooLong { name, value });
            }
        }
        Ok(())
    }

    /// Wall-clock budget of one host loop tick.
    pub fn tick_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_failure_is_reachable() {
        let err: ConfigError = BindingError::TypeResolution {
            role: "Entity".into(),
        }
        .into();
        assert_eq!(
            err.binding(),
            Some(&BindingError::TypeResolution {
                role: "Entity".into()
            })
        );
        assert!(err.source().is_some());
        assert_eq!(ConfigError::ZeroDrainBudget.binding(), None);
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = BridgeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.staging, StagingMode::SingleSlot);
        assert_eq!(cfg.settle.before_close, Duration::from_secs(1));
        assert_eq!(cfg.settle.after_close, Duration::from_secs(1));
    }

    #[test]
    fn zero_tick_rate_rejected() {
        let cfg = BridgeConfig {
            tick_rate_hz: 0.0,
            ..BridgeConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidTickRate { value: 0.0 })
        );
    }

    #[test]
    fn nan_and_subnormal_tick_rates_rejected() {
        for hz in [f64::NAN, f64::INFINITY, -5.0, f64::MIN_POSITIVE / 1e3] {
            let cfg = BridgeConfig {
                tick_rate_hz: hz,
                ..BridgeConfig::default()
            };
            assert!(
                matches!(cfg.validate(), Err(ConfigError::InvalidTickRate { .. })),
                "{hz} accepted"
            );
        }
    }

    #[test]
    fn zero_drain_budget_rejected() {
        let cfg = BridgeConfig {
            drain_budget: Some(0),
            ..BridgeConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDrainBudget));
    }

    #[test]
    fn overlong_settle_rejected() {
        let cfg = BridgeConfig {
            settle: SettleDelays {
                before_close: Duration::from_millis(10),
                after_close: Duration::from_secs(61),
            },
            ..BridgeConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::SettleTooLong { name, .. }) => assert_eq!(name, "after_close"),
            other => panic!("expected SettleTooLong, got {other:?}"),
        }
    }

    #[test]
    fn tick_budget_matches_rate() {
        let cfg = BridgeConfig {
            tick_rate_hz: 50.0,
            ..BridgeConfig::default()
        };
        assert!((cfg.tick_budget().as_secs_f64() - 0.02).abs() < 1e-9);
    }
}
