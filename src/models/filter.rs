//! Tier-2 filter selections.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::GameSession;

/// User-selected restriction on the product and game-type axes.
///
/// An empty axis places no restriction on that axis. Values within an axis
/// are OR-ed; the two axes are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub products: BTreeSet<String>,

    #[serde(default, rename = "gameTypes")]
    pub game_types: BTreeSet<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.game_types.is_empty()
    }

    /// Builder method adding a product to the product axis.
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.products.insert(product.into());
        self
    }

    /// Builder method adding a game type to the game-type axis.
    pub fn with_game_type(mut self, game_type: impl Into<String>) -> Self {
        self.game_types.insert(game_type.into());
        self
    }

    /// Return a copy with `product` added, or removed if already selected.
    pub fn toggled_product(&self, product: &str) -> Self {
        let mut next = self.clone();
        if !next.products.remove(product) {
            next.products.insert(product.to_string());
        }
        next
    }

    /// Return a copy with `game_type` added, or removed if already selected.
    pub fn toggled_game_type(&self, game_type: &str) -> Self {
        let mut next = self.clone();
        if !next.game_types.remove(game_type) {
            next.game_types.insert(game_type.to_string());
        }
        next
    }

    /// Whether a fact row passes both axes.
    pub fn matches(&self, session: &GameSession) -> bool {
        (self.products.is_empty() || self.products.contains(&session.product))
            && (self.game_types.is_empty() || self.game_types.contains(&session.game_type))
    }
}
