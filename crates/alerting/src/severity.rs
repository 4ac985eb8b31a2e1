//! Health score to alert status classification

use crate::alert::AlertStatus;

/// Score reported by a fully healthy system
pub const PERFECT_SCORE: i64 = 100;
/// Scores above this (and below perfect) are only suspect
pub const SUSPECT_FLOOR: i64 = 75;
/// Scores above this (up to the suspect floor) warn; at or below are critical
pub const WARNING_FLOOR: i64 = 70;

/// Classify a health score into an alert status
///
/// Anything at or below the warning floor is critical, negative scores
/// included. Only scores above 100 map to `Unknown`.
pub fn classify(score: i64) -> AlertStatus {
    match score {
        PERFECT_SCORE => AlertStatus::Ok,
        s if s > SUSPECT_FLOOR && s < PERFECT_SCORE => AlertStatus::OkSuspect,
        s if s > WARNING_FLOOR && s <= SUSPECT_FLOOR => AlertStatus::Warning,
        s if s <= WARNING_FLOOR => AlertStatus::Critical,
        _ => AlertStatus::Unknown,
    }
}
