//! Cutoff modes: named threshold presets with exactly one active.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::threshold::{Threshold, ThresholdError};

/// Mode activated on a fresh install.
pub const DEFAULT_ACTIVE_MODE: &str = "balanced";

/// Fallback when no mode is stored at all.
pub const FALLBACK_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CutoffError {
    #[error("unknown cutoff mode: {0}")]
    UnknownMode(String),

    #[error("active mode changed: expected {expected}, found {actual}")]
    Conflict { expected: String, actual: String },

    #[error("no cutoff modes defined")]
    Empty,

    #[error("duplicate cutoff mode: {0}")]
    Duplicate(String),
}

/// A named threshold preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CutoffMode {
    pub mode_id: String,
    pub name: String,
    pub description: String,
    pub threshold: f64,
}

impl CutoffMode {
    /// The preset as a validated threshold.
    ///
    /// # Errors
    ///
    /// Returns `ThresholdError` if the stored value is out of range.
    pub fn threshold(&self) -> Result<Threshold, ThresholdError> {
        Threshold::new(self.threshold)
    }
}

/// A mode together with whether it is the active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffModeView {
    #[serde(flatten)]
    pub mode: CutoffMode,
    pub is_active: bool,
}

/// The three presets every shop starts with.
#[must_use]
pub fn default_modes() -> Vec<CutoffMode> {
    let mode = |id: &str, name: &str, description: &str, threshold: f64| CutoffMode {
        mode_id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        threshold,
    };

    vec![
        mode(
            "aggressive",
            "Aggressive Growth",
            "Focuses on high revenue and only removes critical orders, keeps the maximum volume.",
            85.0,
        ),
        mode(
            "balanced",
            "Balanced Profit",
            "Maintains balance between aggressive and maximum profit.",
            70.0,
        ),
        mode(
            "maximum",
            "Maximum Profit",
            "Focuses on maintaining low upfront costs and maximizing net profit.",
            50.0,
        ),
    ]
}

/// In-memory set of modes holding the single-active invariant.
///
/// The active mode is an index rather than a flag per mode, so there is no
/// state in which zero or two modes are active.
#[derive(Debug, Clone)]
pub struct CutoffModeSet {
    modes: Vec<CutoffMode>,
    active: usize,
}

impl CutoffModeSet {
    /// Build a set with `active_id` active.
    ///
    /// # Errors
    ///
    /// Fails if `modes` is empty, has duplicate ids, or lacks `active_id`.
    pub fn new(modes: Vec<CutoffMode>, active_id: &str) -> Result<Self, CutoffError> {
        if modes.is_empty() {
            return Err(CutoffError::Empty);
        }
        for (i, mode) in modes.iter().enumerate() {
            if modes.iter().skip(i + 1).any(|m| m.mode_id == mode.mode_id) {
                return Err(CutoffError::Duplicate(mode.mode_id.clone()));
            }
        }
        let active = modes
            .iter()
            .position(|m| m.mode_id == active_id)
            .ok_or_else(|| CutoffError::UnknownMode(active_id.to_string()))?;

        Ok(Self { modes, active })
    }

    /// The default presets with `balanced` active.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in presets.
    pub fn with_defaults() -> Result<Self, CutoffError> {
        Self::new(default_modes(), DEFAULT_ACTIVE_MODE)
    }

    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn active(&self) -> &CutoffMode {
        // `active` always indexes into the non-empty `modes`
        &self.modes[self.active]
    }

    /// Activate `mode_id`, optionally only if `expected` is still active.
    ///
    /// # Errors
    ///
    /// `UnknownMode` if `mode_id` is not in the set, `Conflict` if another
    /// mode became active since the caller last looked.
    pub fn activate(
        &mut self,
        mode_id: &str,
        expected: Option<&str>,
    ) -> Result<&CutoffMode, CutoffError> {
        let target = self
            .modes
            .iter()
            .position(|m| m.mode_id == mode_id)
            .ok_or_else(|| CutoffError::UnknownMode(mode_id.to_string()))?;

        if let Some(expected) = expected {
            let actual = &self.active().mode_id;
            if actual != expected {
                return Err(CutoffError::Conflict {
                    expected: expected.to_string(),
                    actual: actual.clone(),
                });
            }
        }

        self.active = target;
        Ok(self.active())
    }

    /// All modes ordered by threshold, highest first.
    #[must_use]
    pub fn list(&self) -> Vec<CutoffModeView> {
        let active_id = &self.active().mode_id;
        let mut views: Vec<CutoffModeView> = self
            .modes
            .iter()
            .map(|mode| CutoffModeView {
                is_active: &mode.mode_id == active_id,
                mode: mode.clone(),
            })
            .collect();
        views.sort_by(|a, b| b.mode.threshold.total_cmp(&a.mode.threshold));
        views
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let set = CutoffModeSet::with_defaults().unwrap();
        assert_eq!(set.active().mode_id, "balanced");
        assert!((set.active().threshold - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_activate_keeps_exactly_one_active() {
        let mut set = CutoffModeSet::with_defaults().unwrap();

        for id in ["aggressive", "maximum", "maximum", "balanced"] {
            set.activate(id, None).unwrap();
            let active: Vec<_> = set.list().into_iter().filter(|m| m.is_active).collect();
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].mode.mode_id, id);
        }
    }

    #[test]
    fn test_activate_unknown_mode() {
        let mut set = CutoffModeSet::with_defaults().unwrap();
        let err = set.activate("reckless", None).unwrap_err();
        assert_eq!(err, CutoffError::UnknownMode("reckless".to_string()));
        assert_eq!(set.active().mode_id, "balanced");
    }

    #[test]
    fn test_activate_with_stale_expectation() {
        let mut set = CutoffModeSet::with_defaults().unwrap();
        set.activate("aggressive", Some("balanced")).unwrap();

        let err = set.activate("maximum", Some("balanced")).unwrap_err();
        assert!(matches!(err, CutoffError::Conflict { .. }));
        assert_eq!(set.active().mode_id, "aggressive");
    }

    #[test]
    fn test_list_ordered_by_threshold_desc() {
        let set = CutoffModeSet::with_defaults().unwrap();
        let ids: Vec<_> = set.list().into_iter().map(|m| m.mode.mode_id).collect();
        assert_eq!(ids, ["aggressive", "balanced", "maximum"]);
    }

    #[test]
    fn test_new_rejects_bad_sets() {
        assert_eq!(
            CutoffModeSet::new(Vec::new(), "balanced").unwrap_err(),
            CutoffError::Empty
        );

        let mut modes = default_modes();
        modes.push(modes[0].clone());
        assert!(matches!(
            CutoffModeSet::new(modes, "balanced"),
            Err(CutoffError::Duplicate(_))
        ));

        assert!(matches!(
            CutoffModeSet::new(default_modes(), "nope"),
            Err(CutoffError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_mode_threshold_validation() {
        let mut mode = default_modes().remove(0);
        assert!(mode.threshold().is_ok());
        mode.threshold = 130.0;
        assert!(mode.threshold().is_err());
    }
}
