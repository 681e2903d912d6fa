//! In-process transaction backend.
//!
//! Transactions hold the store-wide lock for their whole lifetime and work on
//! a private copy of the state, which is written back on commit. That gives
//! serializable isolation, so the lending invariants can be exercised under
//! real task concurrency without a database.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::{LendingError, LendingResult},
    models::{Loan, LoanSchedule, NewLoan, NewReturnEvent, ReturnEvent},
    services::coordinator::{StoreTx, TxBackend},
};

/// Write that fails with an injected store error while the fail point is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertLoan,
    MarkReturned,
    IncrementAvailable,
    InsertReturnEvent,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    books: BTreeMap<i32, i32>,
    members: BTreeSet<i32>,
    loans: BTreeMap<i32, Loan>,
    return_events: BTreeMap<i32, ReturnEvent>,
    next_id: i32,
    fail_point: Option<FailPoint>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, point: FailPoint) -> LendingResult<()> {
        if self.fail_point == Some(point) {
            return Err(LendingError::Store(sqlx::Error::Protocol(format!(
                "injected failure at {:?}",
                point
            ))));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_book(&self, available_count: i32) -> i32 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.books.insert(id, available_count);
        id
    }

    pub async fn add_member(&self) -> i32 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.members.insert(id);
        id
    }

    pub async fn available(&self, book_id: i32) -> Option<i32> {
        self.state.lock().await.books.get(&book_id).copied()
    }

    pub async fn loan(&self, loan_id: i32) -> Option<Loan> {
        self.state.lock().await.loans.get(&loan_id).cloned()
    }

    pub async fn active_loans(&self, book_id: i32) -> usize {
        self.state
            .lock()
            .await
            .loans
            .values()
            .filter(|loan| loan.book_id == book_id && loan.is_active())
            .count()
    }

    pub async fn return_events(&self) -> Vec<ReturnEvent> {
        self.state.lock().await.return_events.values().cloned().collect()
    }

    pub async fn set_fail_point(&self, point: Option<FailPoint>) {
        self.state.lock().await.fail_point = point;
    }
}

#[async_trait]
impl TxBackend for MemoryStore {
    async fn begin(&self) -> LendingResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn member_exists(&mut self, member_id: i32) -> LendingResult<bool> {
        Ok(self.working.members.contains(&member_id))
    }

    async fn book_exists(&mut self, book_id: i32) -> LendingResult<bool> {
        Ok(self.working.books.contains_key(&book_id))
    }

    async fn decrement_available(&mut self, book_id: i32) -> LendingResult<Option<i32>> {
        Ok(match self.working.books.get_mut(&book_id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Some(*count)
            }
            _ => None,
        })
    }

    async fn increment_available(&mut self, book_id: i32) -> LendingResult<Option<i32>> {
        self.working.check(FailPoint::IncrementAvailable)?;
        Ok(self.working.books.get_mut(&book_id).map(|count| {
            *count += 1;
            *count
        }))
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> LendingResult<Loan> {
        self.working.check(FailPoint::InsertLoan)?;
        let id = self.working.next_id();
        let row = Loan {
            id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            returned: false,
        };
        self.working.loans.insert(id, row.clone());
        Ok(row)
    }

    async fn find_loan(&mut self, loan_id: i32) -> LendingResult<Option<Loan>> {
        Ok(self.working.loans.get(&loan_id).cloned())
    }

    async fn lock_loan(&mut self, loan_id: i32) -> LendingResult<Option<Loan>> {
        // The whole store is already locked by this transaction
        self.find_loan(loan_id).await
    }

    async fn mark_returned(&mut self, loan_id: i32) -> LendingResult<bool> {
        self.working.check(FailPoint::MarkReturned)?;
        Ok(match self.working.loans.get_mut(&loan_id) {
            Some(loan) if loan.is_active() => {
                loan.returned = true;
                true
            }
            _ => false,
        })
    }

    async fn update_schedule(
        &mut self,
        loan_id: i32,
        schedule: &LoanSchedule,
    ) -> LendingResult<Option<Loan>> {
        Ok(self.working.loans.get_mut(&loan_id).map(|loan| {
            let (loan_date, due_date) = schedule.resolve(loan);
            loan.loan_date = loan_date;
            loan.due_date = due_date;
            loan.clone()
        }))
    }

    async fn delete_loan(&mut self, loan_id: i32) -> LendingResult<bool> {
        let removed = self.working.loans.remove(&loan_id).is_some();
        if removed {
            self.working
                .return_events
                .retain(|_, event| event.loan_id != loan_id);
        }
        Ok(removed)
    }

    async fn insert_return_event(
        &mut self,
        event: &NewReturnEvent,
    ) -> LendingResult<ReturnEvent> {
        self.working.check(FailPoint::InsertReturnEvent)?;
        let id = self.working.next_id();
        let row = ReturnEvent {
            id,
            loan_id: event.loan_id,
            return_date: event.return_date,
            notes: event.notes.clone(),
        };
        self.working.return_events.insert(id, row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> LendingResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LendingResult<()> {
        Ok(())
    }
}
