//! Business logic services

pub mod catalog;
pub mod coordinator;
pub mod history;
pub mod inventory;
pub mod loans;
pub mod members;
pub mod returns;

use std::sync::Arc;

use crate::{config::LoansConfig, repository::Repository};

use self::{
    coordinator::{TransactionCoordinator, TxBackend},
    inventory::InventoryStore,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub loans: loans::LoanLedger,
    pub returns: returns::ReturnRecorder,
    pub history: history::HistoryService,
    pub loans_config: LoansConfig,
}

impl Services {
    /// Create all services over the PostgreSQL repository
    pub fn new(repository: Repository, statement_timeout_ms: u64, loans_config: LoansConfig) -> Self {
        let backend = Arc::new(repository.tx_backend(statement_timeout_ms));
        Self::with_backend(repository, backend, loans_config)
    }

    /// Create all services with lending transactions running on `backend`
    pub fn with_backend(
        repository: Repository,
        backend: Arc<dyn TxBackend>,
        loans_config: LoansConfig,
    ) -> Self {
        let coordinator = TransactionCoordinator::new(backend);
        let ledger = loans::LoanLedger::new(coordinator.clone(), InventoryStore::new());

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            returns: returns::ReturnRecorder::new(coordinator, ledger.clone()),
            loans: ledger,
            history: history::HistoryService::new(repository),
            loans_config,
        }
    }
}
