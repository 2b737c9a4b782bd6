//! Tunable detector parameters.
//!
//! A [`DetectorConfig`] is handed to each session at construction time and is
//! read-only afterwards, so independent sessions never share mutable state.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_HITS_TO_BEGIN: usize = 2;
pub const DEFAULT_MISSES_TO_END: usize = 3;

/// 8.0 dB
pub const DEFAULT_NORMAL_TWIST: f32 = 6.31;
/// 4.01 dB
pub const DEFAULT_REVERSE_TWIST: f32 = 2.51;
/// 8.0 dB
pub const DEFAULT_RELAX_NORMAL_TWIST: f32 = 6.31;
/// 6.0 dB
pub const DEFAULT_RELAX_REVERSE_TWIST: f32 = 3.98;

pub const DEFAULT_DIGIT_CAPACITY: usize = 128;

const TWIST_RANGE: std::ops::RangeInclusive<f32> = 1.0..=100.0;

/// Allowed energy ratios between the row and column tone of one digit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwistLimits {
    /// Row energy may exceed column energy by at most this factor.
    pub normal: f32,
    /// Column energy may exceed row energy by at most this factor.
    pub reverse: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Consecutive matching blocks needed to begin a digit.
    pub hits_to_begin: usize,
    /// Consecutive non-matching blocks needed to end a digit.
    pub misses_to_end: usize,
    pub normal_twist: f32,
    pub reverse_twist: f32,
    pub relax_normal_twist: f32,
    pub relax_reverse_twist: f32,
    /// Capacity of the default digit log.
    pub digit_capacity: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hits_to_begin: DEFAULT_HITS_TO_BEGIN,
            misses_to_end: DEFAULT_MISSES_TO_END,
            normal_twist: DEFAULT_NORMAL_TWIST,
            reverse_twist: DEFAULT_REVERSE_TWIST,
            relax_normal_twist: DEFAULT_RELAX_NORMAL_TWIST,
            relax_reverse_twist: DEFAULT_RELAX_REVERSE_TWIST,
            digit_capacity: DEFAULT_DIGIT_CAPACITY,
        }
    }
}

impl DetectorConfig {
    /// Check every parameter, reporting the first one out of range.
    pub fn validate(&self) -> Result<()> {
        if self.hits_to_begin == 0 {
            return Err(Error::invalid_config("hits_to_begin must be at least 1"));
        }
        if self.misses_to_end == 0 {
            return Err(Error::invalid_config("misses_to_end must be at least 1"));
        }
        if self.digit_capacity == 0 {
            return Err(Error::invalid_config("digit_capacity must be at least 1"));
        }

        let twists = [
            ("normal_twist", self.normal_twist),
            ("reverse_twist", self.reverse_twist),
            ("relax_normal_twist", self.relax_normal_twist),
            ("relax_reverse_twist", self.relax_reverse_twist),
        ];
        for (name, value) in twists {
            if !TWIST_RANGE.contains(&value) {
                return Err(Error::invalid_config(format!(
                    "{} must be within {:?}, got {}",
                    name, TWIST_RANGE, value
                )));
            }
        }

        Ok(())
    }

    /// Select the strict or relaxed twist pair.
    pub fn twist(&self, relax: bool) -> TwistLimits {
        if relax {
            TwistLimits {
                normal: self.relax_normal_twist,
                reverse: self.relax_reverse_twist,
            }
        } else {
            TwistLimits {
                normal: self.normal_twist,
                reverse: self.reverse_twist,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hits_to_begin, 2);
        assert_eq!(config.misses_to_end, 3);
    }

    #[test]
    fn test_twist_selection() {
        let config = DetectorConfig::default();
        assert_eq!(config.twist(false).reverse, DEFAULT_REVERSE_TWIST);
        assert_eq!(config.twist(true).reverse, DEFAULT_RELAX_REVERSE_TWIST);
        assert_eq!(config.twist(true).normal, DEFAULT_RELAX_NORMAL_TWIST);
    }

    #[test]
    fn test_rejects_zero_counts() {
        let config = DetectorConfig {
            misses_to_end: 0,
            ..DetectorConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_twist_out_of_range() {
        let config = DetectorConfig {
            relax_reverse_twist: 0.5,
            ..DetectorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("relax_reverse_twist"));
    }
}
