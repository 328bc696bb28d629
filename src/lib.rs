//! # Leaderboard Engine
//!
//! Multi-tenant leaderboard with a three-tier drill-down:
//! companies, then products × game types within a company, then players
//! within one product and game type.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (sessions, scopes, filters, rollup rows)
//! - **storage**: JSONL fact files and the `FactStore` abstraction
//! - **calculate**: Rollup aggregation, filter enumeration and ranking
//! - **controller**: Drill-down state machine, query clients and the async session driver
//! - **api**: REST query surface
//! - **room**: Room-code resolution boundary
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod controller;
pub mod models;
pub mod room;
pub mod storage;

pub use models::*;

use url::Url;

/// Resolve an API path under a configured base URL, keeping any path prefix
/// the base carries (`https://host/app` + `/api/x` -> `https://host/app/api/x`).
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path.trim_start_matches('/'))
}
