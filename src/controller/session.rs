//! Async driver that runs a [`QueryController`] against a [`QueryClient`].
//!
//! Each issued ticket runs on its own task. A newer ticket for the same panel
//! aborts the older task, and the controller's sequence check catches any
//! response that was already on its way back when the abort landed.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{
    Dispatch, FilterTicket, QueryClient, QueryController, Resolution, RollupTicket, ViewSnapshot,
};
use crate::models::{FilterSet, ScopeError, TenantId};

pub struct LeaderboardSession {
    client: Arc<dyn QueryClient>,
    controller: Arc<Mutex<QueryController>>,
    rollup_task: Option<JoinHandle<()>>,
    filter_task: Option<JoinHandle<()>>,
}

impl LeaderboardSession {
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self {
            client,
            controller: Arc::new(Mutex::new(QueryController::new())),
            rollup_task: None,
            filter_task: None,
        }
    }

    /// Load (or reload) the current address.
    pub async fn refresh(&mut self) {
        let (dispatch, filters_pending) = {
            let mut ctl = self.controller.lock().await;
            (ctl.refresh(), ctl.filters_pending())
        };
        self.dispatch(dispatch, filters_pending);
    }

    pub async fn select_company(&mut self, tenant: impl Into<TenantId>) -> Result<(), ScopeError> {
        let tenant = tenant.into();
        self.apply(|ctl| ctl.select_company(tenant)).await
    }

    pub async fn select_row(&mut self, product: &str, game_type: &str) -> Result<(), ScopeError> {
        self.apply(|ctl| ctl.select_row(product, game_type)).await
    }

    pub async fn toggle_product(&mut self, product: &str) -> Result<(), ScopeError> {
        self.apply(|ctl| ctl.toggle_product(product)).await
    }

    pub async fn toggle_game_type(&mut self, game_type: &str) -> Result<(), ScopeError> {
        self.apply(|ctl| ctl.toggle_game_type(game_type)).await
    }

    pub async fn set_filters(&mut self, filters: FilterSet) -> Result<(), ScopeError> {
        self.apply(|ctl| ctl.set_filters(filters)).await
    }

    pub async fn back(&mut self) -> Result<(), ScopeError> {
        self.apply(|ctl| ctl.back()).await
    }

    /// Abandon the leaderboard and everything in flight.
    pub async fn reset(&mut self) {
        abort(self.rollup_task.take());
        abort(self.filter_task.take());
        self.controller.lock().await.reset();
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.controller.lock().await.snapshot()
    }

    /// Wait for every outstanding request task to finish.
    pub async fn settle(&mut self) {
        for handle in [self.rollup_task.take(), self.filter_task.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("Request task failed: {}", e);
                }
            }
        }
    }

    /// [`settle`](Self::settle), then snapshot.
    pub async fn settled_snapshot(&mut self) -> ViewSnapshot {
        self.settle().await;
        self.snapshot().await
    }

    async fn apply<F>(&mut self, transition: F) -> Result<(), ScopeError>
    where
        F: FnOnce(&mut QueryController) -> Result<Dispatch, ScopeError>,
    {
        let (dispatch, filters_pending) = {
            let mut ctl = self.controller.lock().await;
            let dispatch = transition(&mut *ctl)?;
            (dispatch, ctl.filters_pending())
        };
        self.dispatch(dispatch, filters_pending);
        Ok(())
    }

    fn dispatch(&mut self, dispatch: Dispatch, filters_pending: bool) {
        if let Some(ticket) = dispatch.rollup {
            abort(self.rollup_task.take());
            self.rollup_task = Some(self.spawn_rollup(ticket));
        }

        match dispatch.filters {
            Some(ticket) => {
                abort(self.filter_task.take());
                self.filter_task = Some(self.spawn_filters(ticket));
            }
            // the controller dropped the enumeration ticket (left the tenant)
            None if !filters_pending => abort(self.filter_task.take()),
            None => {}
        }
    }

    fn spawn_rollup(&self, ticket: RollupTicket) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let result = client.rollup(&ticket.scope).await;
            if let Err(e) = &result {
                warn!(seq = ticket.seq, "Rollup query failed: {}", e);
            }
            let resolution = controller.lock().await.resolve_rollup(ticket.seq, result);
            if resolution == Resolution::Stale {
                debug!(seq = ticket.seq, "Rollup response superseded");
            }
        })
    }

    fn spawn_filters(&self, ticket: FilterTicket) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let result = client.available_filters(&ticket.tenant).await;
            if let Err(e) = &result {
                warn!(seq = ticket.seq, "Filter enumeration failed: {}", e);
            }
            let resolution = controller.lock().await.resolve_filters(ticket.seq, result);
            if resolution == Resolution::Stale {
                debug!(seq = ticket.seq, "Filter response superseded");
            }
        })
    }
}

impl Drop for LeaderboardSession {
    fn drop(&mut self) {
        abort(self.rollup_task.take());
        abort(self.filter_task.take());
    }
}

fn abort(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        handle.abort();
    }
}
