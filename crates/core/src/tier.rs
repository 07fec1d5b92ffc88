//! Tier keys for the marketplace reward program.
//!
//! A tier is the pair (user type, level). Profiles arrive from the hosted
//! backend with free-form strings (English or Portuguese labels, numeric
//! level codes, assorted casing), so every string crosses into the typed
//! world through [`TierKey::parse`] and nowhere else.

use crate::error::{RewardsError, RewardsResult};
use crate::profile::{LevelCode, UserProfile};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── User Types ─────────────────────────────────────────────────────────────

/// Marketplace roles that participate in the reward program.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// End user dropping off recyclables.
    Common,
    /// Independent collector working on their own.
    IndividualCollector,
    /// Collector attached to a cooperative or company.
    LinkedCollector,
    Cooperative,
    /// Collection company running a fleet.
    Company,
    /// Commercial partner: restaurant, store or educational institution.
    Partner,
}

impl UserType {
    pub const ALL: [UserType; 6] = [
        UserType::Common,
        UserType::IndividualCollector,
        UserType::LinkedCollector,
        UserType::Cooperative,
        UserType::Company,
        UserType::Partner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Common => "common",
            UserType::IndividualCollector => "individual_collector",
            UserType::LinkedCollector => "linked_collector",
            UserType::Cooperative => "cooperative",
            UserType::Company => "company",
            UserType::Partner => "partner",
        }
    }

    /// Resolve an already folded label. `None` means well-formed but unknown.
    fn from_folded(label: &str) -> Option<Self> {
        let user_type = match label {
            "common" | "comum" | "user" | "end_user" | "usuario" | "usuario_comum" => {
                UserType::Common
            }
            "individual_collector" | "collector" | "coletor" | "coletor_individual"
            | "catador" | "catador_individual" => UserType::IndividualCollector,
            "linked_collector" | "coletor_vinculado" | "catador_vinculado" => {
                UserType::LinkedCollector
            }
            "cooperative" | "cooperativa" | "coop" => UserType::Cooperative,
            "company" | "collection_company" | "empresa" | "empresa_coleta"
            | "empresa_de_coleta" => UserType::Company,
            "partner" | "parceiro" | "commercial_partner" | "restaurant" | "restaurante"
            | "store" | "loja" | "educational_institution" | "instituicao_ensino"
            | "instituicao_de_ensino" | "school" | "escola" => UserType::Partner,
            _ => return None,
        };
        Some(user_type)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Levels ─────────────────────────────────────────────────────────────────

/// Progression rank within a user type. Gold is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Bronze,
    Silver,
    Gold,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Bronze, Level::Silver, Level::Gold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Bronze => "bronze",
            Level::Silver => "silver",
            Level::Gold => "gold",
        }
    }

    pub fn from_code(code: i64) -> RewardsResult<Self> {
        match code {
            1 => Ok(Level::Bronze),
            2 => Ok(Level::Silver),
            3 => Ok(Level::Gold),
            c if c < 0 => Err(RewardsError::invalid(format!(
                "level code must be non-negative, got {c}"
            ))),
            _ => Err(RewardsError::tier_not_found("", code.to_string())),
        }
    }

    /// The level directly above this one, `None` for the terminal tier.
    pub fn next(&self) -> Option<Level> {
        match self {
            Level::Bronze => Some(Level::Silver),
            Level::Silver => Some(Level::Gold),
            Level::Gold => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    fn from_folded(label: &str) -> Option<Self> {
        // "level_2", "nivel_prata", "nivel_ouro"
        let label = ["level_", "nivel_", "level", "nivel"]
            .iter()
            .find_map(|prefix| label.strip_prefix(prefix))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(label);

        let level = match label {
            "bronze" | "1" => Level::Bronze,
            "silver" | "prata" | "2" => Level::Silver,
            "gold" | "ouro" | "3" => Level::Gold,
            _ => return None,
        };
        Some(level)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Tier Key ───────────────────────────────────────────────────────────────

/// Canonical lookup key for tier definitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TierKey {
    pub user_type: UserType,
    pub level: Level,
}

impl TierKey {
    pub fn new(user_type: UserType, level: Level) -> Self {
        Self { user_type, level }
    }

    /// Normalize raw user type and level labels into a key.
    ///
    /// Empty or malformed labels are `InvalidArgument`; well-formed labels
    /// that match no known role or level are `TierNotFound`. There is no
    /// fallback level.
    pub fn parse(user_type: &str, level: &str) -> RewardsResult<Self> {
        let folded_type = fold_label("user type", user_type)?;
        let folded_level = fold_label("level", level)?;

        match (
            UserType::from_folded(&folded_type),
            Level::from_folded(&folded_level),
        ) {
            (Some(user_type), Some(level)) => Ok(Self { user_type, level }),
            _ => Err(RewardsError::tier_not_found(user_type.trim(), level.trim())),
        }
    }

    /// Resolve the key for a profile whose level may be stored as a label
    /// or as a numeric code.
    pub fn from_profile(profile: &UserProfile) -> RewardsResult<Self> {
        match &profile.level {
            LevelCode::Label(label) => Self::parse(&profile.user_type, label),
            LevelCode::Code(code) => {
                let folded_type = fold_label("user type", &profile.user_type)?;
                let level = Level::from_code(*code).map_err(|e| match e {
                    RewardsError::TierNotFound { level, .. } => {
                        RewardsError::tier_not_found(profile.user_type.trim(), level)
                    }
                    other => other,
                })?;
                let user_type = UserType::from_folded(&folded_type).ok_or_else(|| {
                    RewardsError::tier_not_found(profile.user_type.trim(), code.to_string())
                })?;
                Ok(Self { user_type, level })
            }
        }
    }

    pub fn next(&self) -> Option<TierKey> {
        self.level.next().map(|level| TierKey::new(self.user_type, level))
    }

    pub fn is_terminal(&self) -> bool {
        self.level.is_terminal()
    }
}

impl fmt::Display for TierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_type, self.level)
    }
}

/// Case-fold, strip accents, and collapse separators to single underscores.
fn fold_label(field: &str, raw: &str) -> RewardsResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RewardsError::invalid(format!("{field} must not be empty")));
    }

    let mut folded = String::with_capacity(trimmed.len());
    for c in trimmed.to_lowercase().chars() {
        let c = match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            '-' | '_' => '_',
            c if c.is_whitespace() => '_',
            c if c.is_ascii_alphanumeric() => c,
            _ => {
                return Err(RewardsError::invalid(format!(
                    "{field} '{trimmed}' contains unsupported characters"
                )))
            }
        };
        if c == '_' && folded.ends_with('_') {
            continue;
        }
        folded.push(c);
    }

    // A leading or trailing separator is a sign or a stray delimiter ("-1", "--2--").
    if folded.starts_with('_') || folded.ends_with('_') {
        return Err(RewardsError::invalid(format!(
            "{field} '{trimmed}' starts or ends with a separator"
        )));
    }

    Ok(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_labels() {
        let key = TierKey::parse("individual_collector", "gold").unwrap();
        assert_eq!(key, TierKey::new(UserType::IndividualCollector, Level::Gold));
    }

    #[test]
    fn test_parse_synonyms_and_case() {
        assert_eq!(
            TierKey::parse("Cooperativa", "PRATA").unwrap(),
            TierKey::new(UserType::Cooperative, Level::Silver)
        );
        assert_eq!(
            TierKey::parse("  Coletor-Vinculado ", "Nível Ouro").unwrap(),
            TierKey::new(UserType::LinkedCollector, Level::Gold)
        );
        assert_eq!(
            TierKey::parse("restaurant", "level 2").unwrap(),
            TierKey::new(UserType::Partner, Level::Silver)
        );
    }

    #[test]
    fn test_parse_numeric_level_strings() {
        for (code, level) in [("1", Level::Bronze), ("2", Level::Silver), ("3", Level::Gold)] {
            assert_eq!(TierKey::parse("common", code).unwrap().level, level);
        }
    }

    #[test]
    fn test_unknown_user_type_is_tier_not_found() {
        let err = TierKey::parse("alien", "bronze").unwrap_err();
        assert!(matches!(
            err,
            RewardsError::TierNotFound { ref user_type, .. } if user_type == "alien"
        ));
    }

    #[test]
    fn test_unknown_level_never_defaults_to_bronze() {
        let err = TierKey::parse("common", "platinum").unwrap_err();
        assert!(matches!(err, RewardsError::TierNotFound { .. }));
        assert!(matches!(
            TierKey::parse("common", "4").unwrap_err(),
            RewardsError::TierNotFound { .. }
        ));
    }

    #[test]
    fn test_malformed_labels_are_invalid() {
        assert!(matches!(
            TierKey::parse("", "gold").unwrap_err(),
            RewardsError::InvalidArgument(_)
        ));
        assert!(matches!(
            TierKey::parse("common", "   ").unwrap_err(),
            RewardsError::InvalidArgument(_)
        ));
        assert!(matches!(
            TierKey::parse("common;drop", "gold").unwrap_err(),
            RewardsError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_signed_or_padded_level_labels_are_invalid() {
        for label in ["-1", "-3", "--2--", "+2", "2-", "_gold"] {
            assert!(
                matches!(
                    TierKey::parse("common", label).unwrap_err(),
                    RewardsError::InvalidArgument(_)
                ),
                "{label}"
            );
        }
        assert!(matches!(
            TierKey::parse("-common", "gold").unwrap_err(),
            RewardsError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_label_and_code_agree_on_negative_levels() {
        let profile = UserProfile {
            user_id: "u-1".to_string(),
            user_type: "common".to_string(),
            level: LevelCode::from("-1"),
            current_points: 0,
        };
        assert!(matches!(
            TierKey::from_profile(&profile).unwrap_err(),
            RewardsError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_from_profile_numeric_code() {
        let profile = UserProfile {
            user_id: "u-1".to_string(),
            user_type: "empresa".to_string(),
            level: LevelCode::Code(2),
            current_points: 0,
        };
        assert_eq!(
            TierKey::from_profile(&profile).unwrap(),
            TierKey::new(UserType::Company, Level::Silver)
        );
    }

    #[test]
    fn test_from_profile_bad_codes() {
        let mut profile = UserProfile {
            user_id: "u-1".to_string(),
            user_type: "common".to_string(),
            level: LevelCode::Code(-1),
            current_points: 0,
        };
        assert!(matches!(
            TierKey::from_profile(&profile).unwrap_err(),
            RewardsError::InvalidArgument(_)
        ));

        profile.level = LevelCode::Code(7);
        assert!(matches!(
            TierKey::from_profile(&profile).unwrap_err(),
            RewardsError::TierNotFound { ref user_type, ref level }
                if user_type == "common" && level == "7"
        ));
    }

    #[test]
    fn test_level_ordering_and_terminal() {
        assert!(Level::Bronze < Level::Silver && Level::Silver < Level::Gold);
        assert_eq!(Level::Silver.next(), Some(Level::Gold));
        assert!(Level::Gold.is_terminal());
        assert!(!Level::Bronze.is_terminal());
    }

    #[test]
    fn test_tier_key_serializes_snake_case() {
        let key = TierKey::new(UserType::LinkedCollector, Level::Silver);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"user_type":"linked_collector","level":"silver"}"#);
        assert_eq!(key.to_string(), "linked_collector/silver");
    }
}
