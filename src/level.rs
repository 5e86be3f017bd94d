//! Danger-level classification for MQ2 gas readings.
//!
//! Each of the three measured quantities (LPG, CO, smoke) is banded
//! independently against four ascending thresholds; the overall level is the
//! maximum of the three per-quantity levels. The banding reproduces the
//! deployed firmware's behavior exactly, including the exact-equality gaps
//! at the `moderate`, `danger` and `emergency` thresholds (a value sitting
//! exactly on one of those thresholds classifies as `None`). Do not "fix"
//! the boundaries without re-checking sensor calibration.

use serde::{Deserialize, Serialize};

// ---

/// Ordered severity of a gas reading. `None` never produces a case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum DangerLevel {
    None = 0,
    Low = 1,
    Moderate = 2,
    Dangerous = 3,
    Emergency = 4,
}

/// Ascending per-quantity thresholds, in ppm.
struct Bands {
    low: i64,
    moderate: i64,
    danger: i64,
    emergency: i64,
}

const LPG_BANDS: Bands = Bands {
    low: 5500,
    moderate: 6900,
    danger: 10000,
    emergency: 18000,
};

const CO_BANDS: Bands = Bands {
    low: 10,
    moderate: 24,
    danger: 50,
    emergency: 400,
};

const SMOKE_BANDS: Bands = Bands {
    low: 10,
    moderate: 24,
    danger: 50,
    emergency: 400,
};

// ---

/// Band a single quantity.
///
/// No clamping or input validation: negative and out-of-range values fall
/// through the same rules (anything below `low` is `None`).
fn band_level(value: i64, bands: &Bands) -> DangerLevel {
    // ---
    if (bands.low..bands.moderate).contains(&value) {
        DangerLevel::Low
    } else if (bands.moderate + 1..bands.danger).contains(&value) {
        DangerLevel::Moderate
    } else if (bands.danger + 1..bands.emergency).contains(&value) {
        DangerLevel::Dangerous
    } else if value > bands.emergency {
        DangerLevel::Emergency
    } else {
        DangerLevel::None
    }
}

/// Classify one MQ2 reading into an overall [`DangerLevel`].
pub fn classify(lpg: i64, co: i64, smoke: i64) -> DangerLevel {
    // ---
    let lpg_level = band_level(lpg, &LPG_BANDS);
    let co_level = band_level(co, &CO_BANDS);
    let smoke_level = band_level(smoke, &SMOKE_BANDS);

    lpg_level.max(co_level).max(smoke_level)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_all_below_low_is_none() {
        // ---
        assert_eq!(classify(0, 0, 0), DangerLevel::None);
        assert_eq!(classify(5499, 9, 9), DangerLevel::None);
        // Negative values classify by the same rules: below `low` is None.
        assert_eq!(classify(-1, -50, -3), DangerLevel::None);
    }

    #[test]
    fn test_low_threshold_is_inclusive() {
        // ---
        // LPG exactly at `low`, others zero.
        assert_eq!(classify(5500, 0, 0), DangerLevel::Low);
        assert_eq!(classify(0, 10, 0), DangerLevel::Low);
        assert_eq!(classify(0, 0, 10), DangerLevel::Low);
    }

    #[test]
    fn test_moderate_boundary_gap() {
        // ---
        // A value exactly equal to `moderate` falls into neither the low nor
        // the moderate band and classifies as None, per axis and overall.
        assert_eq!(classify(6900, 0, 0), DangerLevel::None);
        assert_eq!(classify(0, 24, 0), DangerLevel::None);
        assert_eq!(classify(0, 0, 24), DangerLevel::None);
        assert_eq!(classify(6900, 24, 24), DangerLevel::None);

        // One above the gap is squarely in the moderate band.
        assert_eq!(classify(6901, 0, 0), DangerLevel::Moderate);
        assert_eq!(classify(0, 25, 0), DangerLevel::Moderate);
    }

    #[test]
    fn test_danger_boundary_gap() {
        // ---
        assert_eq!(classify(10000, 0, 0), DangerLevel::None);
        assert_eq!(classify(10001, 0, 0), DangerLevel::Dangerous);
        assert_eq!(classify(0, 50, 0), DangerLevel::None);
        assert_eq!(classify(0, 51, 0), DangerLevel::Dangerous);
    }

    #[test]
    fn test_emergency_boundary_is_strict() {
        // ---
        assert_eq!(classify(18001, 0, 0), DangerLevel::Emergency);
        assert_eq!(classify(18000, 0, 0), DangerLevel::None);
        assert_eq!(classify(0, 401, 0), DangerLevel::Emergency);
        assert_eq!(classify(0, 400, 0), DangerLevel::None);
    }

    #[test]
    fn test_overall_is_max_of_axes() {
        // ---
        // CO emergency dominates a merely low LPG value.
        assert_eq!(classify(5600, 500, 0), DangerLevel::Emergency);
        // Smoke dangerous dominates low CO.
        assert_eq!(classify(0, 12, 60), DangerLevel::Dangerous);
    }

    #[test]
    fn test_level_ordering() {
        // ---
        assert!(DangerLevel::None < DangerLevel::Low);
        assert!(DangerLevel::Low < DangerLevel::Moderate);
        assert!(DangerLevel::Moderate < DangerLevel::Dangerous);
        assert!(DangerLevel::Dangerous < DangerLevel::Emergency);
    }

    #[test]
    fn test_level_serializes_as_lowercase_name() {
        // ---
        assert_eq!(
            serde_json::to_string(&DangerLevel::Dangerous).unwrap(),
            "\"dangerous\""
        );
        let parsed: DangerLevel = serde_json::from_str("\"emergency\"").unwrap();
        assert_eq!(parsed, DangerLevel::Emergency);
    }
}
