//! Case aggregation: decide whether a classified gas reading opens a new
//! case or extends the most recently opened one.
//!
//! The decision is a pure function of the classification, the timestamp of
//! the previous stored reading, the current clock and the aggregation
//! window, so tests can inject fixed clocks and fixtures instead of relying
//! on real time and database ordering. The route handler (`routes/mq2.rs`)
//! owns the storage side effects.

use chrono::{DateTime, Duration, Utc};

use crate::DangerLevel;

// ---

/// Default gap, in seconds, beyond which a dangerous reading starts a new
/// case instead of joining the current one.
pub const DEFAULT_CASE_WINDOW_SECS: u32 = 30;

/// Outcome of the aggregation decision for one classified reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseAction {
    /// Level is `None`: store the reading, touch no case.
    Ignore,
    /// Open a new case with the reading's classified level.
    Open,
    /// Append to the given (most recently opened) case.
    Extend(i64),
}

/// Decide what to do with a newly classified reading.
///
/// A new case is opened when the gap since the previous stored reading
/// exceeds `window`, or when there is no previous reading or no case at all.
/// Only the gap since the *last reading* matters; how long ago the current
/// case was opened does not.
pub fn decide_case(
    level: DangerLevel,
    previous_reading_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    latest_case: Option<i64>,
    window: Duration,
) -> CaseAction {
    // ---
    if level == DangerLevel::None {
        return CaseAction::Ignore;
    }

    match (previous_reading_at, latest_case) {
        (Some(prev), Some(case_id)) if now - prev <= window => CaseAction::Extend(case_id),
        _ => CaseAction::Open,
    }
}

/// Human-readable note stored on a newly opened case and pushed to
/// subscribers.
pub fn warning_note(location: &str, lpg: i64, co: i64, smoke: i64) -> String {
    // ---
    format!(
        "Warning! Gas detected! Location: {location}. \
         Gas concentration - LPG: {lpg} ppm - CO: {co} ppm - Smoke: {smoke} ppm."
    )
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn window() -> Duration {
        Duration::seconds(DEFAULT_CASE_WINDOW_SECS as i64)
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, secs).unwrap()
    }

    #[test]
    fn test_none_level_never_touches_a_case() {
        // ---
        let action = decide_case(DangerLevel::None, Some(at(0)), at(5), Some(7), window());
        assert_eq!(action, CaseAction::Ignore);
    }

    #[test]
    fn test_first_dangerous_reading_opens_a_case() {
        // ---
        // No prior reading: gap is treated as infinite.
        let action = decide_case(DangerLevel::Dangerous, None, at(0), None, window());
        assert_eq!(action, CaseAction::Open);
    }

    #[test]
    fn test_recent_reading_extends_current_case() {
        // ---
        let action = decide_case(DangerLevel::Dangerous, Some(at(0)), at(10), Some(3), window());
        assert_eq!(action, CaseAction::Extend(3));
    }

    #[test]
    fn test_gap_beyond_window_opens_a_new_case() {
        // ---
        let action = decide_case(DangerLevel::Dangerous, Some(at(0)), at(45), Some(3), window());
        assert_eq!(action, CaseAction::Open);
    }

    #[test]
    fn test_gap_exactly_at_window_still_extends() {
        // ---
        let action = decide_case(DangerLevel::Low, Some(at(0)), at(30), Some(3), window());
        assert_eq!(action, CaseAction::Extend(3));
    }

    #[test]
    fn test_recent_reading_without_a_case_opens_one() {
        // ---
        // A reading stored 5s ago but no case yet (it classified as None):
        // the dangerous reading must open a case.
        let action = decide_case(DangerLevel::Moderate, Some(at(0)), at(5), None, window());
        assert_eq!(action, CaseAction::Open);
    }

    #[test]
    fn test_higher_level_still_extends_recent_case() {
        // ---
        // The case keeps its original level; the decision is Extend even if
        // the new reading classifies higher than the case did.
        let action = decide_case(DangerLevel::Emergency, Some(at(0)), at(10), Some(9), window());
        assert_eq!(action, CaseAction::Extend(9));
    }

    #[test]
    fn test_warning_note_format() {
        // ---
        let note = warning_note("kitchen", 5600, 12, 8);
        assert_eq!(
            note,
            "Warning! Gas detected! Location: kitchen. \
             Gas concentration - LPG: 5600 ppm - CO: 12 ppm - Smoke: 8 ppm."
        );
    }
}
