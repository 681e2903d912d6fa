//! Transaction coordination for lending operations.
//!
//! Every lending operation runs as one unit of work against a [`StoreTx`]:
//! the coordinator begins the transaction, hands the handle to the work, and
//! commits on success or rolls back on any error. Backends provide the
//! isolation: PostgreSQL row locks in production, a serialized in-process
//! store in tests.

use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::LendingResult,
    models::{Loan, LoanSchedule, NewLoan, NewReturnEvent, ReturnEvent},
};

/// Boxed future borrowing the transaction handle for `'a`
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Primitive reads and writes available inside an open transaction.
///
/// Writes are never visible to other transactions before `commit`.
#[async_trait]
pub trait StoreTx: Send {
    /// A member found here cannot be deleted until the transaction ends
    async fn member_exists(&mut self, member_id: i32) -> LendingResult<bool>;

    async fn book_exists(&mut self, book_id: i32) -> LendingResult<bool>;

    /// Decrement the available count only if it is positive, in one guarded
    /// write. Returns the remaining count, or `None` when no row matched.
    async fn decrement_available(&mut self, book_id: i32) -> LendingResult<Option<i32>>;

    /// Add one copy back. Returns the new count, or `None` for a missing book.
    async fn increment_available(&mut self, book_id: i32) -> LendingResult<Option<i32>>;

    async fn insert_loan(&mut self, loan: &NewLoan) -> LendingResult<Loan>;

    /// Plain read, no lock taken
    async fn find_loan(&mut self, loan_id: i32) -> LendingResult<Option<Loan>>;

    /// Read a loan and hold its row lock until the transaction ends
    async fn lock_loan(&mut self, loan_id: i32) -> LendingResult<Option<Loan>>;

    /// Flip `returned` to true. Returns false if the loan was already closed.
    async fn mark_returned(&mut self, loan_id: i32) -> LendingResult<bool>;

    async fn update_schedule(
        &mut self,
        loan_id: i32,
        schedule: &LoanSchedule,
    ) -> LendingResult<Option<Loan>>;

    async fn delete_loan(&mut self, loan_id: i32) -> LendingResult<bool>;

    async fn insert_return_event(&mut self, event: &NewReturnEvent)
        -> LendingResult<ReturnEvent>;

    async fn commit(self: Box<Self>) -> LendingResult<()>;

    async fn rollback(self: Box<Self>) -> LendingResult<()>;
}

/// Source of transactions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TxBackend: Send + Sync {
    async fn begin(&self) -> LendingResult<Box<dyn StoreTx>>;
}

/// Runs units of work atomically against a [`TxBackend`]
#[derive(Clone)]
pub struct TransactionCoordinator {
    backend: Arc<dyn TxBackend>,
}

impl TransactionCoordinator {
    pub fn new(backend: Arc<dyn TxBackend>) -> Self {
        Self { backend }
    }

    /// Execute `work` in a fresh transaction.
    ///
    /// `Ok` commits; `Err` rolls back every effect of the unit and is
    /// returned unchanged. A failed commit surfaces as a store failure.
    pub async fn run<T, F>(&self, work: F) -> LendingResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn StoreTx) -> BoxFuture<'t, LendingResult<T>> + Send,
    {
        let mut tx = self.backend.begin().await?;

        match work(tx.as_mut()).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed after {}", err);
                }
                Err(err)
            }
        }
    }
}
