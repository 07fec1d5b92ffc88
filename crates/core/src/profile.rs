//! Inputs owned by the hosted backend: user profiles and coupon redemptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Level as stored on a profile row: either a label ("prata", "Gold") or
/// a numeric code (1..=3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LevelCode {
    Code(i64),
    Label(String),
}

impl From<&str> for LevelCode {
    fn from(label: &str) -> Self {
        LevelCode::Label(label.to_string())
    }
}

/// The slice of a marketplace profile the reward rules read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub user_type: String,
    pub level: LevelCode,
    #[serde(default)]
    pub current_points: u64,
}

/// One claimed coupon. Created by the backend's redemption transaction;
/// this crate only reads and counts them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedemptionRecord {
    pub user_id: String,
    pub coupon_id: String,
    pub redeemed_at: DateTime<Utc>,
}

/// Progress toward one monthly goal, as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyGoal {
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub current: u32,
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_code_accepts_numbers_and_labels() {
        let json = r#"{"user_id":"u-1","user_type":"common","level":2}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.level, LevelCode::Code(2));
        assert_eq!(profile.current_points, 0);

        let json = r#"{"user_id":"u-1","user_type":"common","level":"prata","current_points":120}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.level, LevelCode::Label("prata".to_string()));
        assert_eq!(profile.current_points, 120);
    }

    #[test]
    fn test_redemption_record_timestamp() {
        let json = r#"{"user_id":"u-1","coupon_id":"c-9","redeemed_at":"2026-03-31T23:59:59Z"}"#;
        let record: RedemptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.redeemed_at.to_rfc3339(), "2026-03-31T23:59:59+00:00");
    }
}
