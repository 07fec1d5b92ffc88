//! Reward rules for the recycling marketplace: tier table, monthly coupon
//! quotas and level progress. Pure computation; callers supply profiles
//! and redemption history fetched from the hosted backend.

pub mod eligibility;
pub mod engine;
pub mod progress;
pub mod table;

pub use eligibility::{CouponEligibility, CouponEvaluator, MonthBoundary, QuotaStatus};
pub use engine::{LevelEvaluation, RewardsEngine};
pub use progress::{
    goal_ratio, progress_ratio, GoalProgress, LevelState, ProgressRatio, ProgressView,
};
pub use table::{GoalTemplate, Perk, TierDefinition, TierEntry, TierTable};
