pub mod config;
pub mod error;
pub mod profile;
pub mod tier;

pub use config::{AppConfig, RewardsConfig};
pub use error::{RewardsError, RewardsResult};
pub use profile::{LevelCode, MonthlyGoal, RedemptionRecord, UserProfile};
pub use tier::{Level, TierKey, UserType};
