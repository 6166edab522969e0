use std::fmt;

use serde::{Deserialize, Serialize};

use super::or_not_set;
use crate::error::DeviceModelError;

/// Coarse lifecycle phase of a device's registration.
///
/// ```text
/// unconfigured -> configuring -> configured
///                     ^              |
///                     +--------------+   (re-registration)
///
/// unconfigured | configuring | configured -> failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigPhase {
    /// Initial phase. Nothing returns here once it is left.
    #[default]
    Unconfigured,
    /// Registration accepted, services being configured.
    Configuring,
    /// Terminal success. May go back to `Configuring` to re-register.
    Configured,
    /// Terminal failure.
    Failed,
}

impl ConfigPhase {
    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configuring => "configuring",
            Self::Configured => "configured",
            Self::Failed => "failed",
        }
    }

    /// `true` when the state machine has an edge `self -> to`.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Unconfigured | Self::Configured, Self::Configuring)
                | (Self::Configuring, Self::Configured)
                | (
                    Self::Unconfigured | Self::Configuring | Self::Configured,
                    Self::Failed
                )
        )
    }

    /// Check the edge `self -> to` and return the target phase.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::InvalidTransition`] naming both phases when
    /// the edge is not allowed.
    pub fn transition(self, to: Self) -> Result<Self, DeviceModelError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(DeviceModelError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for ConfigPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device's configuration phase and when it last changed.
///
/// `last_update_time` is set by every successful transition and never
/// otherwise, so it is present exactly when the phase has left its initial
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigState {
    /// `None` is accepted on input and treated as `unconfigured`.
    #[serde(default)]
    pub state: Option<ConfigPhase>,
    /// Epoch seconds of the last transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<u64>,
}

impl ConfigState {
    /// The initial state: `unconfigured`, never transitioned.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Some(ConfigPhase::Unconfigured),
            last_update_time: None,
        }
    }

    /// Effective phase; an unset phase is `unconfigured`.
    #[must_use]
    pub fn phase(&self) -> ConfigPhase {
        self.state.unwrap_or_default()
    }

    /// Transition to `target`, stamped with the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::InvalidTransition`] when the edge is not
    /// allowed.
    pub fn transition_to(&self, target: ConfigPhase) -> Result<Self, DeviceModelError> {
        self.transition_at(target, now_epoch_secs())
    }

    /// Transition to `target` at `now` (epoch seconds).
    ///
    /// Phase and timestamp change together in the returned value; `self` is
    /// left untouched. If `now` is earlier than the previous stamp the
    /// previous stamp is kept, so stamps never decrease.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::InvalidTransition`] when the edge is not
    /// allowed.
    pub fn transition_at(&self, target: ConfigPhase, now: u64) -> Result<Self, DeviceModelError> {
        let phase = self.phase().transition(target)?;
        let stamp = self.last_update_time.map_or(now, |prev| prev.max(now));
        Ok(Self {
            state: Some(phase),
            last_update_time: Some(stamp),
        })
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State: {}, Time: {}",
            or_not_set(self.state.as_ref()),
            or_not_set(self.last_update_time.as_ref())
        )
    }
}

/// Current wall-clock time in epoch seconds, `0` before the epoch.
#[must_use]
pub fn now_epoch_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const ALL: [ConfigPhase; 4] = [
        ConfigPhase::Unconfigured,
        ConfigPhase::Configuring,
        ConfigPhase::Configured,
        ConfigPhase::Failed,
    ];

    #[test]
    fn unconfigured_cannot_jump_to_configured() {
        let err = ConfigState::new()
            .transition_at(ConfigPhase::Configured, 10)
            .unwrap_err();
        assert_eq!(
            err,
            DeviceModelError::InvalidTransition {
                from: ConfigPhase::Unconfigured,
                to: ConfigPhase::Configured,
            }
        );
        assert!(err.to_string().contains("unconfigured"));
        assert!(err.to_string().contains("configured"));
    }

    #[test]
    fn happy_path_stamps_non_decreasing_times() {
        let s0 = ConfigState::new();
        assert_eq!(s0.last_update_time, None);

        let s1 = s0.transition_at(ConfigPhase::Configuring, 100).unwrap();
        assert_eq!(s1.state, Some(ConfigPhase::Configuring));
        assert_eq!(s1.last_update_time, Some(100));

        let s2 = s1.transition_at(ConfigPhase::Configured, 105).unwrap();
        assert_eq!(s2.state, Some(ConfigPhase::Configured));
        assert!(s2.last_update_time >= s1.last_update_time);

        // input untouched
        assert_eq!(s0, ConfigState::new());
    }

    #[test]
    fn wall_clock_is_after_the_epoch() {
        assert!(now_epoch_secs() > 1_600_000_000);
    }

    #[test]
    fn wall_clock_transition_sets_time() {
        let s = ConfigState::new()
            .transition_to(ConfigPhase::Configuring)
            .unwrap();
        let t1 = s.last_update_time.unwrap();
        let s = s.transition_to(ConfigPhase::Configured).unwrap();
        assert!(s.last_update_time.unwrap() >= t1);
    }

    #[test]
    fn clock_going_backwards_keeps_previous_stamp() {
        let s = ConfigState::new()
            .transition_at(ConfigPhase::Configuring, 500)
            .unwrap()
            .transition_at(ConfigPhase::Configured, 400)
            .unwrap();
        assert_eq!(s.last_update_time, Some(500));
    }

    #[test]
    fn reregistration_is_allowed() {
        let s = ConfigState {
            state: Some(ConfigPhase::Configured),
            last_update_time: Some(1),
        };
        let s = s.transition_at(ConfigPhase::Configuring, 2).unwrap();
        assert_eq!(s.phase(), ConfigPhase::Configuring);
    }

    #[test]
    fn nothing_returns_to_unconfigured_and_failed_is_terminal() {
        for from in ALL {
            assert!(!from.can_transition(ConfigPhase::Unconfigured));
            assert!(!ConfigPhase::Failed.can_transition(from));
        }
        for from in [
            ConfigPhase::Unconfigured,
            ConfigPhase::Configuring,
            ConfigPhase::Configured,
        ] {
            assert!(from.can_transition(ConfigPhase::Failed));
        }
    }

    #[test]
    fn self_loops_are_rejected() {
        for phase in ALL {
            assert!(phase.transition(phase).is_err(), "{phase} -> {phase}");
        }
    }

    #[test]
    fn unset_phase_behaves_as_unconfigured() {
        let s = ConfigState {
            state: None,
            last_update_time: None,
        };
        assert_eq!(s.phase(), ConfigPhase::Unconfigured);
        assert!(s.transition_at(ConfigPhase::Configuring, 1).is_ok());
    }

    #[test]
    fn wire_format() {
        let json = serde_json::to_value(ConfigState::new()).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "unconfigured" }));

        let unset = ConfigState {
            state: None,
            last_update_time: None,
        };
        assert_eq!(
            serde_json::to_value(unset).unwrap(),
            serde_json::json!({ "state": null })
        );

        let parsed: ConfigState =
            serde_json::from_str(r#"{"state":"configured","last_update_time":42}"#).unwrap();
        assert_eq!(parsed.phase(), ConfigPhase::Configured);
        assert_eq!(parsed.last_update_time, Some(42));

        assert!(serde_json::from_str::<ConfigState>(r#"{"state":"bogus"}"#).is_err());
    }

    #[test]
    fn rendering_handles_unset_fields() {
        let unset = ConfigState {
            state: None,
            last_update_time: None,
        };
        assert_eq!(unset.to_string(), "State: not set, Time: not set");
        let set = ConfigState {
            state: Some(ConfigPhase::Configured),
            last_update_time: Some(7),
        };
        assert_eq!(set.to_string(), "State: configured, Time: 7");
    }
}
