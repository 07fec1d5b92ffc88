//! Coupon eligibility: monthly quota per tier against the redemptions a
//! user made in the current calendar month.
//!
//! Everything here is read-only. Recording a redemption belongs to the
//! backend transaction, never to the evaluator.

use crate::table::TierTable;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use recycle_core::error::{RewardsError, RewardsResult};
use recycle_core::profile::{RedemptionRecord, UserProfile};
use recycle_core::tier::TierKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ─── Month Boundary ─────────────────────────────────────────────────────────

/// Timezone policy for calendar months. One offset is used for both the
/// clock and the redemption timestamps.
#[derive(Debug, Clone, Copy)]
pub struct MonthBoundary {
    offset: FixedOffset,
}

impl MonthBoundary {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn from_offset_minutes(minutes: i32) -> RewardsResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                RewardsError::Config(format!(
                    "month boundary offset out of range: {minutes} minutes"
                ))
            })
    }

    /// Whether `timestamp` falls in the same calendar month as `now`.
    pub fn same_month(&self, now: DateTime<Utc>, timestamp: DateTime<Utc>) -> bool {
        let now = now.with_timezone(&self.offset);
        let ts = timestamp.with_timezone(&self.offset);
        now.year() == ts.year() && now.month() == ts.month()
    }

    /// "YYYY-MM" label of the month containing `now`.
    pub fn period(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset).format("%Y-%m").to_string()
    }
}

impl Default for MonthBoundary {
    fn default() -> Self {
        Self::utc()
    }
}

// ─── Results ────────────────────────────────────────────────────────────────

/// Quota position for a tier given a known redemption count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaStatus {
    pub monthly_limit: u32,
    pub remaining: u32,
    pub can_redeem: bool,
}

impl QuotaStatus {
    fn compute(monthly_limit: u32, redeemed: u64) -> Self {
        Self {
            monthly_limit,
            remaining: remaining_for(monthly_limit, redeemed),
            can_redeem: redeemed < u64::from(monthly_limit),
        }
    }
}

/// Full eligibility picture for a profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CouponEligibility {
    pub user_id: String,
    pub tier: TierKey,
    /// Calendar month the count covers, "YYYY-MM".
    pub period: String,
    pub monthly_limit: u32,
    pub redeemed_this_month: u64,
    pub remaining: u32,
    pub can_redeem: bool,
}

// ─── Evaluator ──────────────────────────────────────────────────────────────

/// Stateless quota evaluator over a shared tier table.
#[derive(Debug, Clone)]
pub struct CouponEvaluator {
    table: Arc<TierTable>,
    boundary: MonthBoundary,
}

impl CouponEvaluator {
    pub fn new(table: Arc<TierTable>, boundary: MonthBoundary) -> Self {
        Self { table, boundary }
    }

    pub fn monthly_limit(&self, user_type: &str, level: &str) -> RewardsResult<u32> {
        Ok(self.table.get_tier_definition(user_type, level)?.monthly_coupon_limit)
    }

    pub fn monthly_limit_for(&self, key: &TierKey) -> RewardsResult<u32> {
        Ok(self.table.get(key)?.monthly_coupon_limit)
    }

    /// Count `user_id`'s redemptions in the current calendar month.
    pub fn redeemed_this_month(&self, user_id: &str, redemptions: &[RedemptionRecord]) -> u64 {
        self.redeemed_this_month_at(user_id, redemptions, Utc::now())
    }

    pub fn redeemed_this_month_at(
        &self,
        user_id: &str,
        redemptions: &[RedemptionRecord],
        now: DateTime<Utc>,
    ) -> u64 {
        redemptions
            .iter()
            .filter(|r| r.user_id == user_id && self.boundary.same_month(now, r.redeemed_at))
            .count() as u64
    }

    pub fn remaining_this_month(
        &self,
        user_type: &str,
        level: &str,
        redeemed_count: i64,
    ) -> RewardsResult<u32> {
        Ok(self.quota(user_type, level, redeemed_count)?.remaining)
    }

    pub fn can_redeem(
        &self,
        user_type: &str,
        level: &str,
        redeemed_count: i64,
    ) -> RewardsResult<bool> {
        Ok(self.quota(user_type, level, redeemed_count)?.can_redeem)
    }

    pub fn quota(
        &self,
        user_type: &str,
        level: &str,
        redeemed_count: i64,
    ) -> RewardsResult<QuotaStatus> {
        let redeemed = checked_count(redeemed_count)?;
        let limit = self.monthly_limit(user_type, level)?;
        Ok(QuotaStatus::compute(limit, redeemed))
    }

    /// Resolve the profile's tier and count its redemptions for the month
    /// containing `now`.
    pub fn evaluate(
        &self,
        profile: &UserProfile,
        redemptions: &[RedemptionRecord],
        now: DateTime<Utc>,
    ) -> RewardsResult<CouponEligibility> {
        let tier = TierKey::from_profile(profile)?;
        let limit = self.monthly_limit_for(&tier)?;
        let redeemed = self.redeemed_this_month_at(&profile.user_id, redemptions, now);
        let status = QuotaStatus::compute(limit, redeemed);

        Ok(CouponEligibility {
            user_id: profile.user_id.clone(),
            tier,
            period: self.boundary.period(now),
            monthly_limit: status.monthly_limit,
            redeemed_this_month: redeemed,
            remaining: status.remaining,
            can_redeem: status.can_redeem,
        })
    }
}

/// Reject negative counts instead of clamping them.
pub fn checked_count(redeemed_count: i64) -> RewardsResult<u64> {
    u64::try_from(redeemed_count).map_err(|_| {
        RewardsError::invalid(format!("redeemed count must be non-negative, got {redeemed_count}"))
    })
}

fn remaining_for(limit: u32, redeemed: u64) -> u32 {
    // Result never exceeds `limit`, so the narrowing is lossless.
    u64::from(limit).saturating_sub(redeemed) as u32
}
