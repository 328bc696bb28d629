//! Navigation address for the three-tier drill-down.
//!
//! A `Scope` is immutable. Every navigation step produces a new value through
//! one of the transition methods, which reject moves that would leave a tier
//! without the selections it depends on.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FilterSet, TenantId};

/// Errors raised for malformed or incomplete addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("view '{0}' requires a company")]
    MissingTenant(&'static str),

    #[error("player rankings require both a product and a gameType")]
    MissingSelection,

    #[error("{0} must not be empty")]
    Blank(&'static str),

    #[error("unknown view '{0}'")]
    UnknownView(String),

    #[error("cannot {action} from tier {tier}")]
    InvalidTransition { action: &'static str, tier: Tier },
}

/// Aggregation grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Companies,
    CompanyDetail,
    PlayerRankings,
}

impl Tier {
    /// 1-based depth in the drill-down.
    pub fn depth(&self) -> u8 {
        match self {
            Tier::Companies => 1,
            Tier::CompanyDetail => 2,
            Tier::PlayerRankings => 3,
        }
    }

    /// Name used for the `view` query parameter.
    pub fn view_name(&self) -> &'static str {
        match self {
            Tier::Companies => "companies",
            Tier::CompanyDetail => "company_detail",
            Tier::PlayerRankings => "player_rankings",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.depth())
    }
}

/// The product and game-type pair pinned at tier 3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub product: String,
    #[serde(rename = "gameType")]
    pub game_type: String,
}

impl Selection {
    pub fn new(product: impl Into<String>, game_type: impl Into<String>) -> Result<Self, ScopeError> {
        let product = product.into();
        let game_type = game_type.into();
        if product.trim().is_empty() {
            return Err(ScopeError::Blank("product"));
        }
        if game_type.trim().is_empty() {
            return Err(ScopeError::Blank("gameType"));
        }
        Ok(Self { product, game_type })
    }
}

/// Full drill-down address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Companies,
    CompanyDetail {
        tenant: TenantId,
        filters: FilterSet,
    },
    PlayerRankings {
        tenant: TenantId,
        selection: Selection,
    },
}

fn checked_tenant(tenant: TenantId) -> Result<TenantId, ScopeError> {
    if tenant.is_blank() {
        Err(ScopeError::Blank("company"))
    } else {
        Ok(tenant)
    }
}

impl Scope {
    /// Tier-2 address with explicit filters.
    pub fn company_detail(tenant: impl Into<TenantId>, filters: FilterSet) -> Result<Self, ScopeError> {
        Ok(Scope::CompanyDetail {
            tenant: checked_tenant(tenant.into())?,
            filters,
        })
    }

    /// Tier-3 address.
    pub fn player_rankings(
        tenant: impl Into<TenantId>,
        product: impl Into<String>,
        game_type: impl Into<String>,
    ) -> Result<Self, ScopeError> {
        Ok(Scope::PlayerRankings {
            tenant: checked_tenant(tenant.into())?,
            selection: Selection::new(product, game_type)?,
        })
    }

    pub fn tier(&self) -> Tier {
        match self {
            Scope::Companies => Tier::Companies,
            Scope::CompanyDetail { .. } => Tier::CompanyDetail,
            Scope::PlayerRankings { .. } => Tier::PlayerRankings,
        }
    }

    /// Selected tenant, if any.
    pub fn tenant(&self) -> Option<&TenantId> {
        match self {
            Scope::Companies => None,
            Scope::CompanyDetail { tenant, .. } | Scope::PlayerRankings { tenant, .. } => {
                Some(tenant)
            }
        }
    }

    /// Active filters. Only tier 2 carries any.
    pub fn filters(&self) -> Option<&FilterSet> {
        match self {
            Scope::CompanyDetail { filters, .. } => Some(filters),
            _ => None,
        }
    }

    /// Tier 1 → tier 2 with empty filters.
    pub fn select_company(&self, tenant: impl Into<TenantId>) -> Result<Self, ScopeError> {
        match self {
            Scope::Companies => Scope::company_detail(tenant, FilterSet::default()),
            _ => Err(self.invalid("select a company")),
        }
    }

    /// Tier 2 → tier 3. Filters are dropped from the address.
    pub fn select_row(
        &self,
        product: impl Into<String>,
        game_type: impl Into<String>,
    ) -> Result<Self, ScopeError> {
        match self {
            Scope::CompanyDetail { tenant, .. } => {
                Scope::player_rankings(tenant.clone(), product, game_type)
            }
            _ => Err(self.invalid("select a product row")),
        }
    }

    /// Tier 2 → tier 2 with `product` toggled.
    pub fn toggle_product(&self, product: &str) -> Result<Self, ScopeError> {
        self.map_filters("toggle a product filter", |f| f.toggled_product(product))
    }

    /// Tier 2 → tier 2 with `game_type` toggled.
    pub fn toggle_game_type(&self, game_type: &str) -> Result<Self, ScopeError> {
        self.map_filters("toggle a game type filter", |f| f.toggled_game_type(game_type))
    }

    /// Tier 2 → tier 2 with the filters replaced.
    pub fn with_filters(&self, filters: FilterSet) -> Result<Self, ScopeError> {
        self.map_filters("set filters", |_| filters)
    }

    /// One step up the drill-down. Filters never survive a back step.
    pub fn back(&self) -> Result<Self, ScopeError> {
        match self {
            Scope::Companies => Err(self.invalid("go back")),
            Scope::CompanyDetail { .. } => Ok(Scope::Companies),
            Scope::PlayerRankings { tenant, .. } => Ok(Scope::CompanyDetail {
                tenant: tenant.clone(),
                filters: FilterSet::default(),
            }),
        }
    }

    fn map_filters<F>(&self, action: &'static str, f: F) -> Result<Self, ScopeError>
    where
        F: FnOnce(&FilterSet) -> FilterSet,
    {
        match self {
            Scope::CompanyDetail { tenant, filters } => Ok(Scope::CompanyDetail {
                tenant: tenant.clone(),
                filters: f(filters),
            }),
            _ => Err(self.invalid(action)),
        }
    }

    fn invalid(&self, action: &'static str) -> ScopeError {
        ScopeError::InvalidTransition {
            action,
            tier: self.tier(),
        }
    }
}
