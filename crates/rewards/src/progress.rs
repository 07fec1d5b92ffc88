//! Level progress: points toward the next level and monthly goal gauges.

use crate::table::{Perk, TierDefinition, TierTable};
use recycle_core::error::RewardsResult;
use recycle_core::profile::{MonthlyGoal, UserProfile};
use recycle_core::tier::{Level, TierKey};
use serde::{Deserialize, Serialize};

/// Raw points ratio. A zero threshold means there is no next level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "ratio", rename_all = "snake_case")]
pub enum ProgressRatio {
    Progress(f64),
    MaxLevel,
}

pub fn progress_ratio(current_points: u64, next_level_threshold: u64) -> ProgressRatio {
    if next_level_threshold == 0 {
        return ProgressRatio::MaxLevel;
    }
    ProgressRatio::Progress((current_points as f64 / next_level_threshold as f64).clamp(0.0, 1.0))
}

/// Share of a goal completed, in `[0, 1]`. An empty goal counts as done.
pub fn goal_ratio(current: u32, total: u32) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (f64::from(current) / f64::from(total)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub description: String,
    pub icon: String,
    pub current: u32,
    pub total: u32,
    pub ratio: f64,
    pub complete: bool,
}

impl GoalProgress {
    pub fn new(
        description: impl Into<String>,
        icon: impl Into<String>,
        current: u32,
        total: u32,
    ) -> Self {
        let ratio = goal_ratio(current, total);
        Self {
            description: description.into(),
            icon: icon.into(),
            current,
            total,
            ratio,
            complete: ratio >= 1.0,
        }
    }
}

impl From<&MonthlyGoal> for GoalProgress {
    fn from(goal: &MonthlyGoal) -> Self {
        GoalProgress::new(goal.description.clone(), goal.icon.clone(), goal.current, goal.total)
    }
}

/// Display state. Max level is entered only at the terminal tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LevelState {
    Normal {
        next_level: Level,
        next_level_threshold: u64,
        points_to_next: u64,
        ratio: f64,
    },
    MaxLevel {
        maintenance_requirements: Vec<Perk>,
    },
}

impl LevelState {
    pub fn is_max_level(&self) -> bool {
        matches!(self, LevelState::MaxLevel { .. })
    }
}

/// Everything a level dashboard renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressView {
    pub user_id: String,
    pub tier: TierKey,
    pub current_points: u64,
    pub state: LevelState,
    pub goals: Vec<GoalProgress>,
    pub unlocked_benefits: Vec<Perk>,
    /// Benefits of the level above; empty at max level.
    pub next_level_benefits: Vec<Perk>,
}

impl ProgressView {
    /// Build the view for `profile`. `goals` carries backend-reported goal
    /// progress; `None` shows the tier's goal templates at zero.
    pub fn build(
        table: &TierTable,
        profile: &UserProfile,
        goals: Option<&[MonthlyGoal]>,
    ) -> RewardsResult<Self> {
        let tier = TierKey::from_profile(profile)?;
        let definition = table.get(&tier)?;
        let current_points = profile.current_points;

        let (state, next_level_benefits) = match tier.next() {
            None => (
                LevelState::MaxLevel {
                    maintenance_requirements: definition.maintenance_requirements.clone(),
                },
                Vec::new(),
            ),
            Some(next) => {
                let next_def = table.get(&next)?;
                let threshold = next_def.point_threshold;
                let ratio = match progress_ratio(current_points, threshold) {
                    ProgressRatio::Progress(r) => r,
                    ProgressRatio::MaxLevel => 1.0,
                };
                (
                    LevelState::Normal {
                        next_level: next.level,
                        next_level_threshold: threshold,
                        points_to_next: threshold.saturating_sub(current_points),
                        ratio,
                    },
                    next_def.benefits.clone(),
                )
            }
        };

        Ok(Self {
            user_id: profile.user_id.clone(),
            tier,
            current_points,
            state,
            goals: goal_progress(definition, goals),
            unlocked_benefits: definition.benefits.clone(),
            next_level_benefits,
        })
    }
}

fn goal_progress(
    definition: &TierDefinition,
    reported: Option<&[MonthlyGoal]>,
) -> Vec<GoalProgress> {
    match reported {
        Some(goals) => goals.iter().map(GoalProgress::from).collect(),
        None => definition
            .monthly_goals
            .iter()
            .map(|g| GoalProgress::new(g.description.clone(), g.icon.clone(), 0, g.target))
            .collect(),
    }
}
