//! Filter chip enumeration.

use crate::models::{AvailableFilters, GameSession, TenantId};

/// Distinct products and game types across every row of `tenant`.
///
/// Deliberately takes no `FilterSet`: selecting a chip changes what tier 2
/// counts, never which chips exist.
pub fn enumerate_filters(sessions: &[GameSession], tenant: &TenantId) -> AvailableFilters {
    let mut available = AvailableFilters::default();
    for s in sessions.iter().filter(|s| &s.tenant_id == tenant) {
        available.products.insert(s.product.clone());
        available.game_types.insert(s.game_type.clone());
    }
    available
}
