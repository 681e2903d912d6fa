//! Loan ledger: creation, closing and maintenance of loans

use crate::{
    error::{LendingError, LendingResult},
    models::{Loan, LoanSchedule, NewLoan},
    services::{
        coordinator::{StoreTx, TransactionCoordinator},
        inventory::InventoryStore,
    },
};

#[derive(Clone)]
pub struct LoanLedger {
    coordinator: TransactionCoordinator,
    inventory: InventoryStore,
}

impl LoanLedger {
    pub fn new(coordinator: TransactionCoordinator, inventory: InventoryStore) -> Self {
        Self {
            coordinator,
            inventory,
        }
    }

    /// Lend a copy of a book.
    ///
    /// The copy is taken off the shelf and the loan row written in the same
    /// transaction; if either fails, neither happens.
    pub async fn create_loan(&self, new_loan: NewLoan) -> LendingResult<Loan> {
        let inventory = self.inventory;

        let loan = self
            .coordinator
            .run(move |tx| {
                Box::pin(async move {
                    if !tx.member_exists(new_loan.user_id).await? {
                        return Err(LendingError::MemberNotFound(new_loan.user_id));
                    }
                    inventory.try_decrement(tx, new_loan.book_id).await?;
                    tx.insert_loan(&new_loan).await
                })
            })
            .await?;

        tracing::info!(
            loan_id = loan.id,
            book_id = loan.book_id,
            user_id = loan.user_id,
            "Loan created"
        );
        Ok(loan)
    }

    /// Close an active loan and put its copy back on the shelf
    pub async fn mark_returned(&self, loan_id: i32) -> LendingResult<Loan> {
        let ledger = self.clone();

        let loan = self
            .coordinator
            .run(move |tx| Box::pin(async move { ledger.close_within(tx, loan_id).await }))
            .await?;

        tracing::info!(loan_id, book_id = loan.book_id, "Loan marked returned");
        Ok(loan)
    }

    /// Active -> Closed transition, inside the caller's transaction.
    ///
    /// The loan row stays locked until the transaction ends, so at most one
    /// concurrent caller observes it active.
    pub(crate) async fn close_within(
        &self,
        tx: &mut dyn StoreTx,
        loan_id: i32,
    ) -> LendingResult<Loan> {
        let mut loan = tx
            .lock_loan(loan_id)
            .await?
            .ok_or(LendingError::LoanNotFound(loan_id))?;

        if !loan.is_active() || !tx.mark_returned(loan_id).await? {
            return Err(LendingError::AlreadyReturned(loan_id));
        }
        self.inventory.increment(tx, loan.book_id).await?;

        loan.returned = true;
        Ok(loan)
    }

    pub async fn get(&self, loan_id: i32) -> LendingResult<Loan> {
        self.coordinator
            .run(move |tx| {
                Box::pin(async move {
                    tx.find_loan(loan_id)
                        .await?
                        .ok_or(LendingError::LoanNotFound(loan_id))
                })
            })
            .await
    }

    /// Move a loan's dates. Book, member and `returned` are untouched.
    pub async fn update_schedule(
        &self,
        loan_id: i32,
        schedule: LoanSchedule,
    ) -> LendingResult<Loan> {
        self.coordinator
            .run(move |tx| {
                Box::pin(async move {
                    let current = tx
                        .lock_loan(loan_id)
                        .await?
                        .ok_or(LendingError::LoanNotFound(loan_id))?;

                    let (loan_date, due_date) = schedule.resolve(&current);
                    if due_date < loan_date {
                        return Err(LendingError::InvalidSchedule {
                            loan_date,
                            due_date,
                        });
                    }

                    tx.update_schedule(loan_id, &schedule)
                        .await?
                        .ok_or(LendingError::LoanNotFound(loan_id))
                })
            })
            .await
    }

    /// Delete a closed loan.
    ///
    /// Active loans are refused: removing one would strand its copy off the
    /// shelf for good.
    pub async fn delete(&self, loan_id: i32) -> LendingResult<()> {
        self.coordinator
            .run(move |tx| {
                Box::pin(async move {
                    let loan = tx
                        .lock_loan(loan_id)
                        .await?
                        .ok_or(LendingError::LoanNotFound(loan_id))?;
                    if loan.is_active() {
                        return Err(LendingError::LoanActive(loan_id));
                    }
                    if !tx.delete_loan(loan_id).await? {
                        return Err(LendingError::LoanNotFound(loan_id));
                    }
                    Ok(())
                })
            })
            .await?;

        tracing::info!(loan_id, "Loan deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::repository::memory::{FailPoint, MemoryStore};

    fn ledger(store: &MemoryStore) -> LoanLedger {
        LoanLedger::new(
            TransactionCoordinator::new(Arc::new(store.clone())),
            InventoryStore::new(),
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn new_loan(user_id: i32, book_id: i32) -> NewLoan {
        NewLoan {
            user_id,
            book_id,
            loan_date: date(1),
            due_date: date(22),
        }
    }

    #[tokio::test]
    async fn two_copies_serve_two_loans_then_run_out() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(2).await;
        let ledger = ledger(&store);

        ledger.create_loan(new_loan(member, book)).await.unwrap();
        ledger.create_loan(new_loan(member, book)).await.unwrap();
        assert_eq!(store.available(book).await, Some(0));

        let third = ledger.create_loan(new_loan(member, book)).await;
        assert!(matches!(third, Err(LendingError::BookUnavailable(_))));
        assert_eq!(store.available(book).await, Some(0));
        assert_eq!(store.active_loans(book).await, 2);
    }

    #[tokio::test]
    async fn created_loan_starts_active() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;

        let loan = ledger(&store).create_loan(new_loan(member, book)).await.unwrap();

        assert!(!loan.returned);
        assert_eq!(loan.book_id, book);
        assert_eq!(loan.due_date, date(22));
        assert_eq!(store.loan(loan.id).await, Some(loan));
    }

    #[tokio::test]
    async fn missing_book_writes_no_loan() {
        let store = MemoryStore::new();
        let member = store.add_member().await;

        let result = ledger(&store).create_loan(new_loan(member, 999)).await;

        assert!(matches!(result, Err(LendingError::BookNotFound(999))));
        assert_eq!(store.active_loans(999).await, 0);
    }

    #[tokio::test]
    async fn missing_member_leaves_inventory_untouched() {
        let store = MemoryStore::new();
        let book = store.add_book(1).await;

        let result = ledger(&store).create_loan(new_loan(999, book)).await;

        assert!(matches!(result, Err(LendingError::MemberNotFound(999))));
        assert_eq!(store.available(book).await, Some(1));
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_decrement() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        store.set_fail_point(Some(FailPoint::InsertLoan)).await;

        let result = ledger(&store).create_loan(new_loan(member, book)).await;

        assert_eq!(
            result.unwrap_err().kind(),
            crate::error::ErrorKind::StoreFailure
        );
        assert_eq!(store.available(book).await, Some(1));
        assert_eq!(store.active_loans(book).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_loans_on_last_copy_have_one_winner() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);

        let first = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.create_loan(new_loan(member, book)).await }
        });
        let second = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.create_loan(new_loan(member, book)).await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(LendingError::BookUnavailable(_)))));
        assert_eq!(store.available(book).await, Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_loans_never_overdraw_inventory() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(5).await;
        let ledger = ledger(&store);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.create_loan(new_loan(member, book)).await })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => granted += 1,
                Err(err) => assert!(matches!(err, LendingError::BookUnavailable(_))),
            }
        }

        assert_eq!(granted, 5);
        assert_eq!(store.available(book).await, Some(0));
        assert_eq!(store.active_loans(book).await, 5);
    }

    #[tokio::test]
    async fn mark_returned_restores_copy() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);
        let loan = ledger.create_loan(new_loan(member, book)).await.unwrap();
        assert_eq!(store.available(book).await, Some(0));

        let closed = ledger.mark_returned(loan.id).await.unwrap();

        assert!(closed.returned);
        assert_eq!(store.available(book).await, Some(1));
        assert!(store.loan(loan.id).await.unwrap().returned);
    }

    #[tokio::test]
    async fn second_mark_returned_has_no_effect() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);
        let loan = ledger.create_loan(new_loan(member, book)).await.unwrap();
        ledger.mark_returned(loan.id).await.unwrap();

        let again = ledger.mark_returned(loan.id).await;

        assert!(matches!(again, Err(LendingError::AlreadyReturned(id)) if id == loan.id));
        assert_eq!(store.available(book).await, Some(1));
    }

    #[tokio::test]
    async fn mark_returned_on_unknown_loan() {
        let store = MemoryStore::new();

        let result = ledger(&store).mark_returned(42).await;

        assert!(matches!(result, Err(LendingError::LoanNotFound(42))));
    }

    #[tokio::test]
    async fn failed_increment_keeps_loan_active() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);
        let loan = ledger.create_loan(new_loan(member, book)).await.unwrap();
        store.set_fail_point(Some(FailPoint::IncrementAvailable)).await;

        assert!(ledger.mark_returned(loan.id).await.is_err());

        assert!(!store.loan(loan.id).await.unwrap().returned);
        assert_eq!(store.available(book).await, Some(0));
    }

    #[tokio::test]
    async fn failed_close_write_keeps_copy_out() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);
        let loan = ledger.create_loan(new_loan(member, book)).await.unwrap();
        store.set_fail_point(Some(FailPoint::MarkReturned)).await;

        let result = ledger.mark_returned(loan.id).await;

        assert_eq!(
            result.unwrap_err().kind(),
            crate::error::ErrorKind::StoreFailure
        );
        assert!(!store.loan(loan.id).await.unwrap().returned);
        assert_eq!(store.available(book).await, Some(0));

        store.set_fail_point(None).await;
        ledger.mark_returned(loan.id).await.unwrap();
        assert_eq!(store.available(book).await, Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_returns_close_loan_once() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);
        let loan_id = ledger.create_loan(new_loan(member, book)).await.unwrap().id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.mark_returned(loan_id).await })
            })
            .collect();

        let mut closed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => closed += 1,
                Err(err) => assert!(matches!(err, LendingError::AlreadyReturned(_))),
            }
        }

        assert_eq!(closed, 1);
        assert_eq!(store.available(book).await, Some(1));
    }

    #[tokio::test]
    async fn count_plus_active_loans_is_conserved() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(3).await;
        let ledger = ledger(&store);

        let total = |available: Option<i32>, active: usize| available.unwrap() + active as i32;
        assert_eq!(total(store.available(book).await, store.active_loans(book).await), 3);

        let a = ledger.create_loan(new_loan(member, book)).await.unwrap();
        let b = ledger.create_loan(new_loan(member, book)).await.unwrap();
        ledger.mark_returned(a.id).await.unwrap();
        let _ = ledger.mark_returned(a.id).await;
        ledger
            .update_schedule(
                b.id,
                LoanSchedule {
                    loan_date: None,
                    due_date: Some(date(28)),
                },
            )
            .await
            .unwrap();

        assert_eq!(total(store.available(book).await, store.active_loans(book).await), 3);
    }

    #[tokio::test]
    async fn schedule_update_rejects_inverted_dates() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);
        let loan = ledger.create_loan(new_loan(member, book)).await.unwrap();

        let result = ledger
            .update_schedule(
                loan.id,
                LoanSchedule {
                    loan_date: Some(date(25)),
                    due_date: None,
                },
            )
            .await;

        assert!(matches!(result, Err(LendingError::InvalidSchedule { .. })));
        assert_eq!(store.loan(loan.id).await.unwrap().loan_date, date(1));
    }

    #[tokio::test]
    async fn active_loan_cannot_be_deleted() {
        let store = MemoryStore::new();
        let member = store.add_member().await;
        let book = store.add_book(1).await;
        let ledger = ledger(&store);
        let loan = ledger.create_loan(new_loan(member, book)).await.unwrap();

        let refused = ledger.delete(loan.id).await;
        assert!(matches!(refused, Err(LendingError::LoanActive(_))));
        assert!(store.loan(loan.id).await.is_some());

        ledger.mark_returned(loan.id).await.unwrap();
        ledger.delete(loan.id).await.unwrap();
        assert!(store.loan(loan.id).await.is_none());
        assert_eq!(store.available(book).await, Some(1));
    }
}
