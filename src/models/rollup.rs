//! Typed rollup rows, one shape per tier.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{PlayerId, TenantId, Tier};

/// Tier-1 row: one per tenant with at least one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRollup {
    pub company: TenantId,

    /// Registered company name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Number of session rows
    pub total_games: u64,

    /// Number of distinct players
    pub total_users: u64,
}

/// Tier-2 row: one per (product, game type) pair with at least one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRollup {
    pub product: String,

    #[serde(rename = "gameType")]
    pub game_type: String,

    pub total_records: u64,

    pub total_players: u64,

    /// Sum of scores; wider than a single score so the sum is always exact
    pub total_score: u128,
}

/// Tier-3 row: one per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRanking {
    pub player_id: PlayerId,

    /// Profile display name, or the player id when no profile exists
    pub username: String,

    pub avatar: Option<String>,

    pub total_points: u128,

    pub games_played: u64,

    pub wins: u64,
}

/// Result of one aggregation, tagged by tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", content = "rows", rename_all = "snake_case")]
pub enum RollupResult {
    Companies(Vec<CompanyRollup>),
    CompanyDetail(Vec<ProductRollup>),
    PlayerRankings(Vec<PlayerRanking>),
}

impl RollupResult {
    pub fn tier(&self) -> Tier {
        match self {
            RollupResult::Companies(_) => Tier::Companies,
            RollupResult::CompanyDetail(_) => Tier::CompanyDetail,
            RollupResult::PlayerRankings(_) => Tier::PlayerRankings,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RollupResult::Companies(rows) => rows.len(),
            RollupResult::CompanyDetail(rows) => rows.len(),
            RollupResult::PlayerRankings(rows) => rows.len(),
        }
    }

    /// Zero matching rows. A valid outcome, not an error.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selectable filter chips for one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableFilters {
    pub products: BTreeSet<String>,

    #[serde(rename = "gameTypes")]
    pub game_types: BTreeSet<String>,
}

impl AvailableFilters {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.game_types.is_empty()
    }
}
