//! Inspection settings
//!
//! Every plausibility limit the inspector applies lives in [`Thresholds`].
//! The defaults are exported as constants; hosts override them per scan,
//! typically from a JSON file, without touching the check logic.
//!
//! ```rust
//! use gedcheck::config::{InspectionOptions, Thresholds};
//!
//! let options = InspectionOptions {
//!     check_individual_places: true,
//!     thresholds: Thresholds { max_siblings_diff: 30, ..Default::default() },
//!     ..Default::default()
//! };
//! assert!(options.validate().is_ok());
//! ```

use crate::error::{GedcheckError, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest proven human lifespan, in years
pub const MAX_LIFESPAN: i32 = 122;
/// Youngest plausible age at marriage
pub const MIN_MARRIAGE_AGE: i32 = 13;
/// Youngest plausible age of a parent at a child's birth
pub const MIN_PARENT_AGE: i32 = 10;
/// Oldest plausible age of a mother at a child's birth
pub const MAX_MOTHER_AGE: i32 = 55;
/// Oldest plausible age of a father at a child's birth
pub const MAX_FATHER_AGE: i32 = 85;
/// Largest plausible birth-year gap between spouses
pub const MAX_SPOUSES_DIFF: i32 = 90;
/// Largest plausible birth-year spread between siblings
pub const MAX_SIBLINGS_DIFF: i32 = 40;

/// Plausibility limits, in years
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Ages at or above this are implausible for a living person or a spouse
    pub max_lifespan: i32,
    /// Marriage before this age is implausible
    pub min_marriage_age: i32,
    /// Parenthood before this age is implausible
    pub min_parent_age: i32,
    /// Motherhood at or above this age is implausible
    pub max_mother_age: i32,
    /// Fatherhood at or above this age is implausible
    pub max_father_age: i32,
    /// Spouse birth-year gaps above this are reported
    pub max_spouses_diff: i32,
    /// Sibling birth-year spreads above this are reported
    pub max_siblings_diff: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_lifespan: MAX_LIFESPAN,
            min_marriage_age: MIN_MARRIAGE_AGE,
            min_parent_age: MIN_PARENT_AGE,
            max_mother_age: MAX_MOTHER_AGE,
            max_father_age: MAX_FATHER_AGE,
            max_spouses_diff: MAX_SPOUSES_DIFF,
            max_siblings_diff: MAX_SIBLINGS_DIFF,
        }
    }
}

/// Options for one inspection pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionOptions {
    /// Report individuals none of whose events has a place
    pub check_individual_places: bool,
    /// Plausibility limits
    pub thresholds: Thresholds,
    /// Year living ages are computed at; `None` means the current year
    pub reference_year: Option<i32>,
}

impl InspectionOptions {
    /// Load options from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check the limits are coherent
    ///
    /// # Errors
    ///
    /// Returns [`GedcheckError::InvalidConfiguration`] naming the first bad limit.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        let invalid = |msg: String| Err(GedcheckError::InvalidConfiguration(msg));

        if t.max_lifespan <= 0 {
            return invalid(format!("max_lifespan must be positive, got {}", t.max_lifespan));
        }
        if t.min_marriage_age < 0 || t.min_marriage_age >= t.max_lifespan {
            return invalid(format!(
                "min_marriage_age {} must lie in [0, max_lifespan)",
                t.min_marriage_age
            ));
        }
        for (name, max) in [("max_mother_age", t.max_mother_age), ("max_father_age", t.max_father_age)] {
            if t.min_parent_age < 0 || max <= t.min_parent_age {
                return invalid(format!(
                    "{} {} must exceed min_parent_age {}",
                    name, max, t.min_parent_age
                ));
            }
        }
        if t.max_spouses_diff < 0 || t.max_siblings_diff < 0 {
            return invalid("age differences must not be negative".to_string());
        }
        Ok(())
    }

    /// Year living ages are computed at
    pub fn effective_reference_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}
