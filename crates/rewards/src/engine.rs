//! Reward rules engine: tier lookup, coupon eligibility, level progress and
//! level evaluation over a shared, immutable tier table.

use crate::eligibility::{CouponEligibility, CouponEvaluator, MonthBoundary, QuotaStatus};
use crate::progress::ProgressView;
use crate::table::{TierDefinition, TierTable};
use chrono::{DateTime, Utc};
use recycle_core::config::RewardsConfig;
use recycle_core::error::{RewardsError, RewardsResult};
use recycle_core::profile::{MonthlyGoal, RedemptionRecord, UserProfile};
use recycle_core::tier::{Level, TierKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Where a profile's points place it, compared with its recorded level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelEvaluation {
    pub user_id: String,
    pub current: TierKey,
    pub current_points: u64,
    /// Highest level the points reach.
    pub earned_level: Level,
    /// Set only when points reach a level above the recorded one.
    pub upgrade_available: bool,
}

/// Stateless computation over caller-supplied profiles and redemption
/// history. Safe to share across tasks behind an `Arc`.
pub struct RewardsEngine {
    table: Arc<TierTable>,
    evaluator: CouponEvaluator,
}

impl RewardsEngine {
    pub fn new(config: &RewardsConfig) -> RewardsResult<Self> {
        let table = match &config.tier_table_path {
            Some(path) => TierTable::load_json(path)?,
            None => TierTable::builtin(),
        };
        let boundary = MonthBoundary::from_offset_minutes(config.month_boundary_offset_minutes)?;

        info!(
            tiers = table.len(),
            custom_table = config.tier_table_path.is_some(),
            month_offset_minutes = config.month_boundary_offset_minutes,
            "Rewards engine initialized"
        );
        Ok(Self::with_table(table, boundary))
    }

    pub fn with_table(table: TierTable, boundary: MonthBoundary) -> Self {
        let table = Arc::new(table);
        Self {
            evaluator: CouponEvaluator::new(table.clone(), boundary),
            table,
        }
    }

    pub fn table(&self) -> &TierTable {
        &self.table
    }

    pub fn evaluator(&self) -> &CouponEvaluator {
        &self.evaluator
    }

    pub fn tier_definition(&self, user_type: &str, level: &str) -> RewardsResult<&TierDefinition> {
        self.table
            .get_tier_definition(user_type, level)
            .map_err(record_failure)
    }

    pub fn monthly_limit(&self, user_type: &str, level: &str) -> RewardsResult<u32> {
        self.evaluator
            .monthly_limit(user_type, level)
            .map_err(record_failure)
    }

    /// Quota position for a caller that already counted the month's
    /// redemptions.
    pub fn quota(
        &self,
        user_type: &str,
        level: &str,
        redeemed_count: i64,
    ) -> RewardsResult<QuotaStatus> {
        let status = self
            .evaluator
            .quota(user_type, level, redeemed_count)
            .map_err(record_failure)?;
        metrics::counter!("rewards.eligibility.evaluated").increment(1);
        if !status.can_redeem {
            metrics::counter!("rewards.eligibility.denied").increment(1);
        }
        Ok(status)
    }

    pub fn eligibility(
        &self,
        profile: &UserProfile,
        redemptions: &[RedemptionRecord],
    ) -> RewardsResult<CouponEligibility> {
        self.eligibility_at(profile, redemptions, Utc::now())
    }

    pub fn eligibility_at(
        &self,
        profile: &UserProfile,
        redemptions: &[RedemptionRecord],
        now: DateTime<Utc>,
    ) -> RewardsResult<CouponEligibility> {
        let result = self
            .evaluator
            .evaluate(profile, redemptions, now)
            .map_err(record_failure)?;

        metrics::counter!("rewards.eligibility.evaluated").increment(1);
        if !result.can_redeem {
            metrics::counter!("rewards.eligibility.denied").increment(1);
        }

        debug!(
            user_id = %result.user_id,
            tier = %result.tier,
            period = %result.period,
            limit = result.monthly_limit,
            redeemed = result.redeemed_this_month,
            can_redeem = result.can_redeem,
            "Coupon eligibility evaluated"
        );
        Ok(result)
    }

    pub fn progress(
        &self,
        profile: &UserProfile,
        goals: Option<&[MonthlyGoal]>,
    ) -> RewardsResult<ProgressView> {
        let view = ProgressView::build(&self.table, profile, goals).map_err(record_failure)?;
        debug!(
            user_id = %view.user_id,
            tier = %view.tier,
            max_level = view.state.is_max_level(),
            goals = view.goals.len(),
            "Level progress computed"
        );
        Ok(view)
    }

    /// Compare the recorded level with the level the points reach. Only
    /// upgrades are reported; a profile never loses its level here.
    pub fn evaluate_level(&self, profile: &UserProfile) -> RewardsResult<LevelEvaluation> {
        let current = TierKey::from_profile(profile).map_err(record_failure)?;
        let earned_level = self
            .table
            .level_for_points(current.user_type, profile.current_points)
            .map_err(record_failure)?;
        let upgrade_available = earned_level > current.level;

        if upgrade_available {
            metrics::counter!("rewards.level.upgrade_available").increment(1);
            info!(
                user_id = %profile.user_id,
                current = %current,
                earned = %earned_level,
                points = profile.current_points,
                "Level upgrade available"
            );
        }

        Ok(LevelEvaluation {
            user_id: profile.user_id.clone(),
            current,
            current_points: profile.current_points,
            earned_level,
            upgrade_available,
        })
    }
}

fn record_failure(err: RewardsError) -> RewardsError {
    match &err {
        RewardsError::TierNotFound { user_type, level } => {
            metrics::counter!("rewards.tier.not_found").increment(1);
            debug!(user_type = %user_type, level = %level, "Tier not found");
        }
        RewardsError::InvalidArgument(msg) => {
            metrics::counter!("rewards.invalid_argument").increment(1);
            debug!(error = %msg, "Rejected rewards input");
        }
        _ => {}
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use recycle_core::profile::LevelCode;

    fn test_engine() -> RewardsEngine {
        RewardsEngine::new(&RewardsConfig::default()).unwrap()
    }

    fn test_profile(level: &str, points: u64) -> UserProfile {
        UserProfile {
            user_id: "test-user".to_string(),
            user_type: "individual_collector".to_string(),
            level: LevelCode::from(level),
            current_points: points,
        }
    }

    #[test]
    fn test_quota_status() {
        let engine = test_engine();
        let status = engine.quota("individual_collector", "gold", 5).unwrap();
        assert_eq!(
            status,
            QuotaStatus {
                monthly_limit: 20,
                remaining: 15,
                can_redeem: true,
            }
        );
    }

    #[test]
    fn test_eligibility_for_profile() {
        let engine = test_engine();
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let redemptions: Vec<_> = (1..=8)
            .map(|day| RedemptionRecord {
                user_id: "test-user".to_string(),
                coupon_id: format!("coupon-{day}"),
                redeemed_at: Utc.with_ymd_and_hms(2026, 10, day, 10, 0, 0).unwrap(),
            })
            .collect();

        let result = engine
            .eligibility_at(&test_profile("bronze", 0), &redemptions, now)
            .unwrap();
        assert_eq!(result.monthly_limit, 8);
        assert_eq!(result.remaining, 0);
        assert!(!result.can_redeem);
    }

    #[test]
    fn test_evaluate_level_upgrade() {
        let engine = test_engine();
        let eval = engine.evaluate_level(&test_profile("bronze", 1_200)).unwrap();
        assert_eq!(eval.earned_level, Level::Silver);
        assert!(eval.upgrade_available);
    }

    #[test]
    fn test_evaluate_level_never_downgrades() {
        let engine = test_engine();
        let eval = engine.evaluate_level(&test_profile("gold", 10)).unwrap();
        assert_eq!(eval.current.level, Level::Gold);
        assert_eq!(eval.earned_level, Level::Bronze);
        assert!(!eval.upgrade_available);
    }

    #[test]
    fn test_missing_table_file_fails() {
        let config = RewardsConfig {
            tier_table_path: Some("/nonexistent/tiers.json".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            RewardsEngine::new(&config),
            Err(RewardsError::Io(_))
        ));
    }

    #[test]
    fn test_bad_offset_fails() {
        let config = RewardsConfig {
            month_boundary_offset_minutes: 5_000,
            ..Default::default()
        };
        assert!(matches!(
            RewardsEngine::new(&config),
            Err(RewardsError::Config(_))
        ));
    }
}
