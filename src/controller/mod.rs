//! Client-side drill-down controller.
//!
//! [`QueryController`] is a synchronous state machine. Navigation methods
//! move the [`Scope`] and hand back a [`Dispatch`] describing the requests the
//! caller must issue; the caller later feeds each response back with the
//! sequence number it was issued under. Only the latest ticket for each panel
//! can commit, so a slow response for an abandoned address is dropped no
//! matter when it arrives.
//!
//! [`LeaderboardSession`] drives a controller over a [`QueryClient`].

mod client;
mod session;

pub use client::*;
pub use session::*;

use serde::Serialize;
use tracing::debug;

use crate::models::{AvailableFilters, FilterSet, RollupResult, Scope, ScopeError, TenantId};

/// Monotonic request token.
pub type RequestSeq = u64;

/// An aggregation request to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupTicket {
    pub seq: RequestSeq,
    pub scope: Scope,
}

/// A filter enumeration request to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTicket {
    pub seq: RequestSeq,
    pub tenant: TenantId,
}

/// Requests produced by one transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub rollup: Option<RollupTicket>,
    pub filters: Option<FilterTicket>,
}

impl Dispatch {
    pub fn is_empty(&self) -> bool {
        self.rollup.is_none() && self.filters.is_none()
    }
}

/// What a panel should show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The query succeeded with zero rows
    Empty,
    Failed(String),
}

/// Data committed to a panel together with the address it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered<A, T> {
    pub address: A,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel<A, T> {
    pub status: LoadState,
    pub rendered: Option<Rendered<A, T>>,
}

impl<A, T> Default for Panel<A, T> {
    fn default() -> Self {
        Self {
            status: LoadState::Idle,
            rendered: None,
        }
    }
}

impl<A, T> Panel<A, T> {
    pub fn data(&self) -> Option<&T> {
        self.rendered.as_ref().map(|r| &r.data)
    }
}

pub type RollupPanel = Panel<Scope, RollupResult>;
pub type FilterPanel = Panel<TenantId, AvailableFilters>;

/// Outcome of feeding a response back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Committed,
    /// Superseded or unknown ticket; the view was not touched
    Stale,
}

/// Point-in-time copy of everything a renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub scope: Scope,
    pub rollup: RollupPanel,
    pub filters: FilterPanel,
}

#[derive(Debug, Default)]
pub struct QueryController {
    scope: Scope,
    next_seq: RequestSeq,
    rollup_inflight: Option<RollupTicket>,
    filters_inflight: Option<FilterTicket>,
    rollup: RollupPanel,
    filters: FilterPanel,
}

impl QueryController {
    /// A controller at tier 1 with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn rollup_panel(&self) -> &RollupPanel {
        &self.rollup
    }

    pub fn filter_panel(&self) -> &FilterPanel {
        &self.filters
    }

    /// True while any issued request has not been resolved.
    pub fn is_pending(&self) -> bool {
        self.rollup_inflight.is_some() || self.filters_inflight.is_some()
    }

    pub fn filters_pending(&self) -> bool {
        self.filters_inflight.is_some()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            scope: self.scope.clone(),
            rollup: self.rollup.clone(),
            filters: self.filters.clone(),
        }
    }

    /// Re-issue the queries for the current address.
    pub fn refresh(&mut self) -> Dispatch {
        let rollup = Some(self.issue_rollup());
        let filters = self.scope.tenant().cloned().map(|t| self.issue_filters(t));
        Dispatch { rollup, filters }
    }

    pub fn select_company(&mut self, tenant: impl Into<TenantId>) -> Result<Dispatch, ScopeError> {
        let next = self.scope.select_company(tenant)?;
        Ok(self.navigate(next))
    }

    pub fn select_row(
        &mut self,
        product: impl Into<String>,
        game_type: impl Into<String>,
    ) -> Result<Dispatch, ScopeError> {
        let next = self.scope.select_row(product, game_type)?;
        Ok(self.navigate(next))
    }

    pub fn toggle_product(&mut self, product: &str) -> Result<Dispatch, ScopeError> {
        let next = self.scope.toggle_product(product)?;
        Ok(self.navigate(next))
    }

    pub fn toggle_game_type(&mut self, game_type: &str) -> Result<Dispatch, ScopeError> {
        let next = self.scope.toggle_game_type(game_type)?;
        Ok(self.navigate(next))
    }

    pub fn set_filters(&mut self, filters: FilterSet) -> Result<Dispatch, ScopeError> {
        let next = self.scope.with_filters(filters)?;
        Ok(self.navigate(next))
    }

    pub fn back(&mut self) -> Result<Dispatch, ScopeError> {
        let next = self.scope.back()?;
        Ok(self.navigate(next))
    }

    /// Leave the leaderboard: back to tier 1, nothing loaded, every
    /// outstanding ticket invalidated.
    pub fn reset(&mut self) {
        let next_seq = self.next_seq;
        *self = Self::default();
        self.next_seq = next_seq;
    }

    /// Feed back the outcome of an aggregation request.
    pub fn resolve_rollup<E: std::fmt::Display>(
        &mut self,
        seq: RequestSeq,
        result: Result<RollupResult, E>,
    ) -> Resolution {
        let ticket = match self.rollup_inflight.take() {
            Some(t) if t.seq == seq && t.scope == self.scope => t,
            other => {
                self.rollup_inflight = other;
                debug!(seq, "Discarding stale rollup response");
                return Resolution::Stale;
            }
        };

        match result {
            Ok(data) if data.tier() != ticket.scope.tier() => {
                self.rollup.status = LoadState::Failed(format!(
                    "expected tier {} rows, got tier {}",
                    ticket.scope.tier(),
                    data.tier()
                ));
            }
            Ok(data) => {
                self.rollup.status = if data.is_empty() {
                    LoadState::Empty
                } else {
                    LoadState::Ready
                };
                self.rollup.rendered = Some(Rendered {
                    address: ticket.scope,
                    data,
                });
            }
            Err(e) => {
                self.rollup.status = LoadState::Failed(e.to_string());
            }
        }
        Resolution::Committed
    }

    /// Feed back the outcome of a filter enumeration request.
    pub fn resolve_filters<E: std::fmt::Display>(
        &mut self,
        seq: RequestSeq,
        result: Result<AvailableFilters, E>,
    ) -> Resolution {
        let ticket = match self.filters_inflight.take() {
            Some(t) if t.seq == seq && Some(&t.tenant) == self.scope.tenant() => t,
            other => {
                self.filters_inflight = other;
                debug!(seq, "Discarding stale filter response");
                return Resolution::Stale;
            }
        };

        match result {
            Ok(data) => {
                self.filters.status = if data.is_empty() {
                    LoadState::Empty
                } else {
                    LoadState::Ready
                };
                self.filters.rendered = Some(Rendered {
                    address: ticket.tenant,
                    data,
                });
            }
            Err(e) => {
                self.filters.status = LoadState::Failed(e.to_string());
            }
        }
        Resolution::Committed
    }

    fn navigate(&mut self, next: Scope) -> Dispatch {
        if next == self.scope {
            return Dispatch::default();
        }

        let tenant_changed = next.tenant() != self.scope.tenant();
        let same_grain = next.tier() == self.scope.tier() && !tenant_changed;
        debug!(from = ?self.scope, to = ?next, "Navigating");
        self.scope = next;

        // rows from another grain or tenant must never sit under the new address
        if !same_grain {
            self.rollup.rendered = None;
        }
        let rollup = Some(self.issue_rollup());

        let mut filters = None;
        if tenant_changed {
            self.filters_inflight = None;
            self.filters = FilterPanel::default();
            filters = self.scope.tenant().cloned().map(|t| self.issue_filters(t));
        }

        Dispatch { rollup, filters }
    }

    fn bump(&mut self) -> RequestSeq {
        self.next_seq += 1;
        self.next_seq
    }

    fn issue_rollup(&mut self) -> RollupTicket {
        let ticket = RollupTicket {
            seq: self.bump(),
            scope: self.scope.clone(),
        };
        self.rollup_inflight = Some(ticket.clone());
        self.rollup.status = LoadState::Loading;
        ticket
    }

    fn issue_filters(&mut self, tenant: TenantId) -> FilterTicket {
        let ticket = FilterTicket {
            seq: self.bump(),
            tenant,
        };
        self.filters_inflight = Some(ticket.clone());
        self.filters.status = LoadState::Loading;
        ticket
    }
}
