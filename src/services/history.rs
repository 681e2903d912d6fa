//! Read side of the lending records

use crate::{
    error::AppResult,
    models::{LoanSummary, ReturnEvent, ReturnEventSummary},
    repository::Repository,
};

#[derive(Clone)]
pub struct HistoryService {
    repository: Repository,
}

impl HistoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_loans(&self, active_only: bool) -> AppResult<Vec<LoanSummary>> {
        self.repository.loans.list(active_only).await
    }

    pub async fn list_returns(&self) -> AppResult<Vec<ReturnEventSummary>> {
        self.repository.return_events.list().await
    }

    pub async fn get_return(&self, id: i32) -> AppResult<ReturnEvent> {
        self.repository.return_events.get_by_id(id).await
    }

    /// Remove a return event's audit row; the loan it closed stays closed
    pub async fn delete_return(&self, id: i32) -> AppResult<()> {
        self.repository.return_events.delete(id).await?;
        tracing::info!(return_id = id, "Return event deleted");
        Ok(())
    }
}
