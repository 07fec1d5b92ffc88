//! Tier/level table: static configuration keyed by (user type, level).
//!
//! Built once at start-up, from the built-in program or from a JSON
//! override file, and shared read-only afterwards.

use recycle_core::error::{RewardsError, RewardsResult};
use recycle_core::tier::{Level, TierKey, UserType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

// ─── Definitions ────────────────────────────────────────────────────────────

/// A line item rendered on a dashboard: benefit or maintenance condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Perk {
    pub description: String,
    pub icon: String,
}

/// A monthly goal the dashboard tracks for a tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalTemplate {
    pub description: String,
    pub icon: String,
    pub target: u32,
}

/// Everything a tier grants and requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierDefinition {
    pub monthly_coupon_limit: u32,
    /// Points needed to reach this level from the one below. Zero for bronze.
    pub point_threshold: u64,
    #[serde(default)]
    pub benefits: Vec<Perk>,
    /// Conditions to keep the terminal tier. Empty below gold.
    #[serde(default)]
    pub maintenance_requirements: Vec<Perk>,
    #[serde(default)]
    pub monthly_goals: Vec<GoalTemplate>,
}

/// One row of a tier table override file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierEntry {
    pub user_type: UserType,
    pub level: Level,
    #[serde(flatten)]
    pub definition: TierDefinition,
}

// ─── Table ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TierTable {
    tiers: BTreeMap<TierKey, TierDefinition>,
}

impl TierTable {
    /// Build a table from entries, rejecting duplicates and ladders whose
    /// limits or thresholds decrease as the level rises.
    pub fn from_entries(entries: Vec<TierEntry>) -> RewardsResult<Self> {
        let mut tiers = BTreeMap::new();
        for entry in entries {
            let key = TierKey::new(entry.user_type, entry.level);
            if tiers.insert(key, entry.definition).is_some() {
                return Err(RewardsError::Config(format!("duplicate tier entry for {key}")));
            }
        }
        let table = Self { tiers };
        table.validate()?;
        Ok(table)
    }

    /// Load an override table from a JSON array of [`TierEntry`].
    pub fn load_json(path: impl AsRef<Path>) -> RewardsResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<TierEntry> = serde_json::from_str(&raw)?;
        let table = Self::from_entries(entries)?;
        info!(path = %path.display(), tiers = table.len(), "Tier table loaded from file");
        Ok(table)
    }

    /// The reward program shipped with the marketplace.
    pub fn builtin() -> Self {
        let mut tiers = BTreeMap::new();
        for program in BUILTIN_PROGRAM {
            for (idx, level) in Level::ALL.iter().enumerate() {
                tiers.insert(
                    TierKey::new(program.user_type, *level),
                    program.definition(idx, *level),
                );
            }
        }
        Self { tiers }
    }

    pub fn validate(&self) -> RewardsResult<()> {
        for user_type in UserType::ALL {
            let mut previous: Option<(Level, &TierDefinition)> = None;
            for level in Level::ALL {
                let Some(def) = self.tiers.get(&TierKey::new(user_type, level)) else {
                    continue;
                };
                if let Some((prev_level, prev)) = previous {
                    if def.monthly_coupon_limit < prev.monthly_coupon_limit {
                        return Err(RewardsError::Config(format!(
                            "{user_type}: coupon limit drops from {prev_level} ({}) \
                             to {level} ({})",
                            prev.monthly_coupon_limit, def.monthly_coupon_limit
                        )));
                    }
                    if def.point_threshold < prev.point_threshold {
                        return Err(RewardsError::Config(format!(
                            "{user_type}: point threshold drops from {prev_level} ({}) \
                             to {level} ({})",
                            prev.point_threshold, def.point_threshold
                        )));
                    }
                }
                previous = Some((level, def));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn get(&self, key: &TierKey) -> RewardsResult<&TierDefinition> {
        self.tiers
            .get(key)
            .ok_or_else(|| RewardsError::tier_not_found(key.user_type.as_str(), key.level.as_str()))
    }

    /// Normalize raw labels and look the tier up.
    pub fn get_tier_definition(
        &self,
        user_type: &str,
        level: &str,
    ) -> RewardsResult<&TierDefinition> {
        let key = TierKey::parse(user_type, level)?;
        self.get(&key)
    }

    /// Points required for the level above `key`, or `0` at the terminal tier.
    pub fn next_level_threshold(&self, key: &TierKey) -> RewardsResult<u64> {
        match key.next() {
            Some(next) => Ok(self.get(&next)?.point_threshold),
            None => Ok(0),
        }
    }

    /// Highest defined level whose threshold `points` reaches.
    pub fn level_for_points(&self, user_type: UserType, points: u64) -> RewardsResult<Level> {
        Level::ALL
            .iter()
            .filter_map(|level| {
                self.tiers
                    .get(&TierKey::new(user_type, *level))
                    .map(|def| (*level, def))
            })
            .filter(|(_, def)| points >= def.point_threshold)
            .map(|(level, _)| level)
            .last()
            .ok_or_else(|| {
                RewardsError::tier_not_found(user_type.as_str(), format!("{points} points"))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TierKey, &TierDefinition)> {
        self.tiers.iter()
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ─── Built-in Program ───────────────────────────────────────────────────────

type Item = (&'static str, &'static str);
type Goal = (&'static str, &'static str, u32);

/// Ladder for one user type, bronze → silver → gold.
struct Program {
    user_type: UserType,
    coupon_limits: [u32; 3],
    point_thresholds: [u64; 3],
    benefits: [&'static [Item]; 3],
    /// Monthly goals for bronze and silver.
    goals: [&'static [Goal]; 2],
    /// Gold maintenance requirements, doubling as gold's monthly goals.
    maintenance: &'static [Goal],
}

impl Program {
    fn definition(&self, idx: usize, level: Level) -> TierDefinition {
        let limit = self.coupon_limits[idx];
        let mut benefits = vec![Perk {
            description: format!("Redeem up to {limit} partner coupons per month"),
            icon: "ticket".to_string(),
        }];
        benefits.extend(self.benefits[idx].iter().map(|(d, i)| perk(d, i)));

        let (goals, maintenance): (&[Goal], Vec<Perk>) = if level.is_terminal() {
            (self.maintenance, self.maintenance.iter().map(|(d, i, _)| perk(d, i)).collect())
        } else {
            (self.goals[idx], Vec::new())
        };

        TierDefinition {
            monthly_coupon_limit: limit,
            point_threshold: self.point_thresholds[idx],
            benefits,
            maintenance_requirements: maintenance,
            monthly_goals: goals
                .iter()
                .map(|(d, i, target)| GoalTemplate {
                    description: d.to_string(),
                    icon: i.to_string(),
                    target: *target,
                })
                .collect(),
        }
    }
}

fn perk(description: &str, icon: &str) -> Perk {
    Perk {
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

const COLLECTOR_BENEFITS: [&[Item]; 3] = [
    &[("Receive collection requests in your area", "map-pin")],
    &[
        ("Receive collection requests in your area", "map-pin"),
        ("Highlighted profile in collector search", "search"),
        ("Price adjustment on sorted materials", "trending-up"),
    ],
    &[
        ("Receive collection requests in your area", "map-pin"),
        ("Top placement in collector search", "award"),
        ("Best price adjustment on sorted materials", "trending-up"),
        ("Priority on recurring collection contracts", "repeat"),
    ],
];

const COLLECTOR_GOALS: [&[Goal]; 2] = [
    &[("Complete collections", "truck", 10), ("Collect kilograms of material", "scale", 100)],
    &[("Complete collections", "truck", 20), ("Collect kilograms of material", "scale", 250)],
];

const COLLECTOR_MAINTENANCE: &[Goal] = &[
    ("Complete at least 30 collections per month", "truck", 30),
    ("Collect at least 400 kg of material per month", "scale", 400),
    ("Accept at least 90% of collection requests", "check-circle", 90),
];

const BUILTIN_PROGRAM: &[Program] = &[
    Program {
        user_type: UserType::Common,
        coupon_limits: [4, 8, 12],
        point_thresholds: [0, 500, 1500],
        benefits: [
            &[("Schedule one-off collections", "calendar")],
            &[
                ("Schedule one-off collections", "calendar"),
                ("Schedule recurring collections", "repeat"),
            ],
            &[
                ("Schedule recurring collections", "repeat"),
                ("Exclusive partner discounts", "star"),
                ("Early access to new campaigns", "zap"),
            ],
        ],
        goals: [
            &[("Schedule collections", "calendar", 2), ("Recycle kilograms", "leaf", 10)],
            &[("Schedule collections", "calendar", 4), ("Recycle kilograms", "leaf", 20)],
        ],
        maintenance: &[
            ("Schedule at least 4 collections per month", "calendar", 4),
            ("Recycle at least 25 kg per month", "leaf", 25),
        ],
    },
    Program {
        user_type: UserType::IndividualCollector,
        coupon_limits: [8, 14, 20],
        point_thresholds: [0, 1000, 3000],
        benefits: COLLECTOR_BENEFITS,
        goals: COLLECTOR_GOALS,
        maintenance: COLLECTOR_MAINTENANCE,
    },
    Program {
        user_type: UserType::LinkedCollector,
        coupon_limits: [8, 14, 20],
        point_thresholds: [0, 1000, 3000],
        benefits: COLLECTOR_BENEFITS,
        goals: COLLECTOR_GOALS,
        maintenance: COLLECTOR_MAINTENANCE,
    },
    Program {
        user_type: UserType::Cooperative,
        coupon_limits: [10, 20, 30],
        point_thresholds: [0, 2000, 6000],
        benefits: [
            &[("Manage member collectors", "users")],
            &[
                ("Manage member collectors", "users"),
                ("Bulk collection scheduling", "calendar"),
                ("Price adjustment on sorted materials", "trending-up"),
            ],
            &[
                ("Manage member collectors", "users"),
                ("Featured in company partnerships", "briefcase"),
                ("Best price adjustment on sorted materials", "trending-up"),
            ],
        ],
        goals: [
            &[("Complete collections", "truck", 40), ("Active members", "users", 5)],
            &[("Complete collections", "truck", 80), ("Active members", "users", 10)],
        ],
        maintenance: &[
            ("Complete at least 120 collections per month", "truck", 120),
            ("Keep at least 15 active members", "users", 15),
        ],
    },
    Program {
        user_type: UserType::Company,
        coupon_limits: [10, 20, 30],
        point_thresholds: [0, 5000, 15000],
        benefits: [
            &[("Fleet and driver management", "truck")],
            &[
                ("Fleet and driver management", "truck"),
                ("Recurring collection contracts", "repeat"),
            ],
            &[
                ("Fleet and driver management", "truck"),
                ("Recurring collection contracts", "repeat"),
                ("Featured placement for partners", "award"),
            ],
        ],
        goals: [
            &[("Complete collections", "truck", 100), ("Tonnes collected", "scale", 5)],
            &[("Complete collections", "truck", 250), ("Tonnes collected", "scale", 12)],
        ],
        maintenance: &[
            ("Complete at least 400 collections per month", "truck", 400),
            ("Collect at least 20 tonnes per month", "scale", 20),
        ],
    },
    Program {
        user_type: UserType::Partner,
        coupon_limits: [5, 10, 15],
        point_thresholds: [0, 1000, 4000],
        benefits: [
            &[("Publish coupons to the marketplace", "tag")],
            &[
                ("Publish coupons to the marketplace", "tag"),
                ("Highlighted listing in the partner directory", "search"),
            ],
            &[
                ("Publish coupons to the marketplace", "tag"),
                ("Top listing in the partner directory", "award"),
                ("Co-branded recycling campaigns", "megaphone"),
            ],
        ],
        goals: [
            &[("Coupons claimed by users", "ticket", 20), ("Collections scheduled", "calendar", 2)],
            &[("Coupons claimed by users", "ticket", 50), ("Collections scheduled", "calendar", 4)],
        ],
        maintenance: &[
            ("Have at least 80 coupons claimed per month", "ticket", 80),
            ("Schedule at least 4 collections per month", "calendar", 4),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_tier() {
        let table = TierTable::builtin();
        assert_eq!(table.len(), UserType::ALL.len() * Level::ALL.len());
        for user_type in UserType::ALL {
            for level in Level::ALL {
                assert!(table.get(&TierKey::new(user_type, level)).is_ok());
            }
        }
    }

    #[test]
    fn test_builtin_ladders_are_monotonic() {
        let table = TierTable::builtin();
        table.validate().unwrap();
        for user_type in UserType::ALL {
            let limits: Vec<u32> = Level::ALL
                .iter()
                .map(|l| table.get(&TierKey::new(user_type, *l)).unwrap().monthly_coupon_limit)
                .collect();
            assert!(limits.windows(2).all(|w| w[0] <= w[1]), "{user_type}: {limits:?}");
        }
    }

    #[test]
    fn test_only_gold_has_maintenance() {
        let table = TierTable::builtin();
        for (key, def) in table.iter() {
            assert_eq!(
                !def.maintenance_requirements.is_empty(),
                key.level == Level::Gold,
                "{key}"
            );
        }
    }

    #[test]
    fn test_lookup_normalizes_labels() {
        let table = TierTable::builtin();
        let def = table.get_tier_definition("Comum", "bronze").unwrap();
        assert_eq!(def.monthly_coupon_limit, 4);
        let def = table.get_tier_definition("individual_collector", "ouro").unwrap();
        assert_eq!(def.monthly_coupon_limit, 20);
        assert_eq!(def.benefits[0].icon, "ticket");
    }

    #[test]
    fn test_lookup_unknown_type() {
        let table = TierTable::builtin();
        let err = table.get_tier_definition("alien", "bronze").unwrap_err();
        assert!(matches!(err, RewardsError::TierNotFound { .. }));
    }

    #[test]
    fn test_next_level_threshold() {
        let table = TierTable::builtin();
        let bronze = TierKey::new(UserType::Common, Level::Bronze);
        let gold = TierKey::new(UserType::Common, Level::Gold);
        assert_eq!(table.next_level_threshold(&bronze).unwrap(), 500);
        assert_eq!(table.next_level_threshold(&gold).unwrap(), 0);
    }

    #[test]
    fn test_level_for_points() {
        let table = TierTable::builtin();
        assert_eq!(table.level_for_points(UserType::Common, 0).unwrap(), Level::Bronze);
        assert_eq!(table.level_for_points(UserType::Common, 499).unwrap(), Level::Bronze);
        assert_eq!(table.level_for_points(UserType::Common, 500).unwrap(), Level::Silver);
        assert_eq!(table.level_for_points(UserType::Common, 90_000).unwrap(), Level::Gold);
    }

    fn entry(level: Level, limit: u32, threshold: u64) -> TierEntry {
        TierEntry {
            user_type: UserType::Partner,
            level,
            definition: TierDefinition {
                monthly_coupon_limit: limit,
                point_threshold: threshold,
                benefits: Vec::new(),
                maintenance_requirements: Vec::new(),
                monthly_goals: Vec::new(),
            },
        }
    }

    #[test]
    fn test_from_entries_rejects_decreasing_limit() {
        let err = TierTable::from_entries(vec![
            entry(Level::Bronze, 6, 0),
            entry(Level::Silver, 3, 100),
        ])
        .unwrap_err();
        assert!(matches!(err, RewardsError::Config(_)));
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let err = TierTable::from_entries(vec![
            entry(Level::Bronze, 1, 0),
            entry(Level::Bronze, 2, 0),
        ])
        .unwrap_err();
        assert!(matches!(err, RewardsError::Config(_)));
    }

    #[test]
    fn test_partial_table_reports_missing_tier() {
        let table = TierTable::from_entries(vec![entry(Level::Bronze, 2, 0)]).unwrap();
        let err = table.get_tier_definition("partner", "gold").unwrap_err();
        assert!(matches!(err, RewardsError::TierNotFound { .. }));
        let bronze = TierKey::new(UserType::Partner, Level::Bronze);
        assert!(table.next_level_threshold(&bronze).is_err());
    }

    #[test]
    fn test_entry_json_flattened() {
        let json = r#"[{
            "user_type": "partner",
            "level": "bronze",
            "monthly_coupon_limit": 3,
            "point_threshold": 0
        }]"#;
        let entries: Vec<TierEntry> = serde_json::from_str(json).unwrap();
        let table = TierTable::from_entries(entries).unwrap();
        let def = table.get_tier_definition("parceiro", "1").unwrap();
        assert_eq!(def.monthly_coupon_limit, 3);
        assert!(def.benefits.is_empty());
    }
}
