//! Query-surface requests and their query-string encoding.
//!
//! Both the HTTP handler and the HTTP client go through this module so the
//! two ends always agree on parameter names.

use serde::{Deserialize, Serialize};

use super::{FilterSet, Scope, ScopeError, TenantId};

pub const VIEW_COMPANIES: &str = "companies";
pub const VIEW_COMPANY_DETAIL: &str = "company_detail";
pub const VIEW_FILTERS: &str = "filters";
pub const VIEW_PLAYER_RANKINGS: &str = "player_rankings";

/// One request against the query surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewRequest {
    /// Aggregation at the grain given by the scope
    Rollup(Scope),
    /// Filter chip enumeration for a tenant
    Filters(TenantId),
}

impl ViewRequest {
    pub fn view_name(&self) -> &'static str {
        match self {
            ViewRequest::Rollup(scope) => scope.tier().view_name(),
            ViewRequest::Filters(_) => VIEW_FILTERS,
        }
    }

    /// Parse decoded query pairs. Repeated `products` / `gameTypes` keys
    /// accumulate; blank values are ignored. A missing `view` means
    /// `companies`.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, ScopeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut view: Option<String> = None;
        let mut company: Option<String> = None;
        let mut product: Option<String> = None;
        let mut game_type: Option<String> = None;
        let mut filters = FilterSet::default();

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                "view" => view = Some(value.to_string()),
                "company" => company = Some(value.to_string()),
                "product" => product = Some(value.to_string()),
                "gameType" => game_type = Some(value.to_string()),
                "products" if !value.is_empty() => {
                    filters.products.insert(value.to_string());
                }
                "gameTypes" if !value.is_empty() => {
                    filters.game_types.insert(value.to_string());
                }
                _ => {}
            }
        }

        let view = view.unwrap_or_else(|| VIEW_COMPANIES.to_string());
        let company = company.filter(|c| !c.is_empty());

        match view.as_str() {
            VIEW_COMPANIES => Ok(ViewRequest::Rollup(Scope::Companies)),
            VIEW_COMPANY_DETAIL => {
                let tenant = company.ok_or(ScopeError::MissingTenant(VIEW_COMPANY_DETAIL))?;
                Ok(ViewRequest::Rollup(Scope::company_detail(tenant, filters)?))
            }
            VIEW_FILTERS => {
                let tenant = company.ok_or(ScopeError::MissingTenant(VIEW_FILTERS))?;
                Ok(ViewRequest::Filters(TenantId::from(tenant)))
            }
            VIEW_PLAYER_RANKINGS => {
                let tenant = company.ok_or(ScopeError::MissingTenant(VIEW_PLAYER_RANKINGS))?;
                match (product, game_type) {
                    (Some(p), Some(g)) if !p.is_empty() && !g.is_empty() => {
                        Ok(ViewRequest::Rollup(Scope::player_rankings(tenant, p, g)?))
                    }
                    _ => Err(ScopeError::MissingSelection),
                }
            }
            other => Err(ScopeError::UnknownView(other.to_string())),
        }
    }

    /// Encode as query pairs, in a stable order.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("view", self.view_name().to_string())];
        match self {
            ViewRequest::Rollup(Scope::Companies) => {}
            ViewRequest::Rollup(Scope::CompanyDetail { tenant, filters }) => {
                pairs.push(("company", tenant.to_string()));
                pairs.extend(filters.products.iter().map(|p| ("products", p.clone())));
                pairs.extend(filters.game_types.iter().map(|g| ("gameTypes", g.clone())));
            }
            ViewRequest::Rollup(Scope::PlayerRankings { tenant, selection }) => {
                pairs.push(("company", tenant.to_string()));
                pairs.push(("product", selection.product.clone()));
                pairs.push(("gameType", selection.game_type.clone()));
            }
            ViewRequest::Filters(tenant) => pairs.push(("company", tenant.to_string())),
        }
        pairs
    }

    /// Parse a raw (still percent-encoded) query string.
    pub fn from_query_string(query: &str) -> Result<Self, ScopeError> {
        Self::from_query_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Encode as a percent-encoded query string.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_pairs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tier;

    #[test]
    fn test_missing_view_defaults_to_companies() {
        let req = ViewRequest::from_query_string("").unwrap();
        assert_eq!(req, ViewRequest::Rollup(Scope::Companies));
    }

    #[test]
    fn test_company_detail_collects_repeated_filters() {
        let req = ViewRequest::from_query_string(
            "view=company_detail&company=acme&products=Trivia&products=Bingo&gameTypes=quiz",
        )
        .unwrap();
        let expected = FilterSet::new()
            .with_product("Trivia")
            .with_product("Bingo")
            .with_game_type("quiz");
        assert_eq!(
            req,
            ViewRequest::Rollup(Scope::company_detail("acme", expected).unwrap())
        );
    }

    #[test]
    fn test_blank_filter_values_are_ignored() {
        let req =
            ViewRequest::from_query_string("view=company_detail&company=acme&products=&gameTypes=%20")
                .unwrap();
        match req {
            ViewRequest::Rollup(scope) => assert!(scope.filters().unwrap().is_empty()),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_company_detail_requires_company() {
        assert_eq!(
            ViewRequest::from_query_string("view=company_detail"),
            Err(ScopeError::MissingTenant(VIEW_COMPANY_DETAIL))
        );
        assert_eq!(
            ViewRequest::from_query_string("view=filters&company="),
            Err(ScopeError::MissingTenant(VIEW_FILTERS))
        );
    }

    #[test]
    fn test_player_rankings_requires_pair() {
        assert_eq!(
            ViewRequest::from_query_string("view=player_rankings&company=acme&product=Trivia"),
            Err(ScopeError::MissingSelection)
        );
        let ok = ViewRequest::from_query_string(
            "view=player_rankings&company=acme&product=Trivia&gameType=quiz",
        )
        .unwrap();
        match ok {
            ViewRequest::Rollup(scope) => assert_eq!(scope.tier(), Tier::PlayerRankings),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_unknown_view_rejected() {
        assert_eq!(
            ViewRequest::from_query_string("view=global"),
            Err(ScopeError::UnknownView("global".to_string()))
        );
    }

    #[test]
    fn test_query_string_encodes_spaces_and_parses_back() {
        let scope = Scope::player_rankings("acme co", "Word Hunt", "timed").unwrap();
        let req = ViewRequest::Rollup(scope);
        let qs = req.to_query_string();
        assert!(qs.contains("company=acme+co"));
        assert_eq!(ViewRequest::from_query_string(&qs).unwrap(), req);
    }
}
