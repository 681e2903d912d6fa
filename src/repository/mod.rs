//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod members;
#[cfg(any(test, feature = "memory-store"))]
pub mod memory;
pub mod return_events;
pub mod transaction;

use sqlx::{Pool, Postgres};

pub use transaction::PgBackend;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
    pub return_events: return_events::ReturnEventsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            return_events: return_events::ReturnEventsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Transactional backend sharing this repository's pool
    pub fn tx_backend(&self, statement_timeout_ms: u64) -> PgBackend {
        PgBackend::new(self.pool.clone(), statement_timeout_ms)
    }
}
