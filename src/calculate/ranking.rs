//! Positional ranks and medals for tier-3 output.
//!
//! Rows must already be in engine order; nothing here re-sorts.

use serde::Serialize;

use crate::models::PlayerRanking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a 0-based position.
    pub fn for_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(Medal::Gold),
            1 => Some(Medal::Silver),
            2 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Gold => "gold",
            Medal::Silver => "silver",
            Medal::Bronze => "bronze",
        }
    }
}

/// A tier-3 row with its presentation rank.
#[derive(Debug, Clone, Serialize)]
pub struct RankedRow<'a> {
    /// 1-based position
    pub rank: usize,
    pub medal: Option<Medal>,
    #[serde(flatten)]
    pub row: &'a PlayerRanking,
}

impl RankedRow<'_> {
    /// Medal name for the podium, plain rank number otherwise.
    pub fn label(&self) -> String {
        match self.medal {
            Some(medal) => medal.as_str().to_string(),
            None => self.rank.to_string(),
        }
    }
}

/// Attach positional ranks. Equal scores still get distinct ranks.
pub fn rank_rows(rows: &[PlayerRanking]) -> Vec<RankedRow<'_>> {
    rows.iter()
        .enumerate()
        .map(|(position, row)| RankedRow {
            rank: position + 1,
            medal: Medal::for_position(position),
            row,
        })
        .collect()
}
