//! Rollup calculation engine.
//!
//! Computes the three drill-down grains from the session fact table:
//! - Company rollups (tier 1)
//! - Product × game-type rollups (tier 2, filterable)
//! - Player rankings (tier 3, sorted)
//!
//! plus the filter chip enumeration for a tenant. The functions in
//! [`rollup`] and [`filters`] are pure over slices of rows; the entry points
//! here only load the rows they need from a [`FactStore`].

pub mod filters;
pub mod ranking;
pub mod rollup;

use tracing::debug;

use crate::models::{AvailableFilters, RollupResult, Scope, TenantId};
use crate::storage::{FactStore, StorageError};

pub use filters::enumerate_filters;
pub use ranking::{rank_rows, Medal, RankedRow};
pub use rollup::{company_rollups, player_rankings, product_rollups, sort_rankings};

/// Compute the rollup addressed by `scope`.
pub fn aggregate(store: &dyn FactStore, scope: &Scope) -> Result<RollupResult, StorageError> {
    let result = match scope {
        Scope::Companies => {
            let sessions = store.sessions()?;
            let tenants = store.tenants()?;
            RollupResult::Companies(company_rollups(&sessions, &tenants))
        }
        Scope::CompanyDetail { tenant, filters } => {
            let sessions = store.tenant_sessions(tenant)?;
            RollupResult::CompanyDetail(product_rollups(&sessions, tenant, filters))
        }
        Scope::PlayerRankings { tenant, selection } => {
            let sessions = store.tenant_sessions(tenant)?;
            let has_rows = sessions.iter().any(|s| {
                s.product == selection.product && s.game_type == selection.game_type
            });
            let players = if has_rows { store.players()? } else { Vec::new() };
            RollupResult::PlayerRankings(player_rankings(&sessions, tenant, selection, &players))
        }
    };

    debug!(
        store = store.name(),
        tier = %scope.tier(),
        rows = result.len(),
        "Aggregated rollup"
    );
    Ok(result)
}

/// Distinct products and game types of a tenant, ignoring any active filters.
pub fn available_filters(
    store: &dyn FactStore,
    tenant: &TenantId,
) -> Result<AvailableFilters, StorageError> {
    let sessions = store.tenant_sessions(tenant)?;
    Ok(enumerate_filters(&sessions, tenant))
}
