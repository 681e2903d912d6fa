//! PostgreSQL transaction backend for lending operations.
//!
//! Transactions run at READ COMMITTED. Inventory changes are single guarded
//! `UPDATE ... RETURNING` statements, which take the book row lock and
//! re-check their predicate after waiting on a concurrent writer. Loan
//! transitions read the loan with `FOR UPDATE` first, so concurrent closes
//! of one loan queue on its row.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::LendingResult,
    models::{Loan, LoanSchedule, NewLoan, NewReturnEvent, ReturnEvent},
    services::coordinator::{StoreTx, TxBackend},
};

#[derive(Clone)]
pub struct PgBackend {
    pool: Pool<Postgres>,
    statement_timeout_ms: u64,
}

impl PgBackend {
    pub fn new(pool: Pool<Postgres>, statement_timeout_ms: u64) -> Self {
        Self {
            pool,
            statement_timeout_ms,
        }
    }
}

#[async_trait]
impl TxBackend for PgBackend {
    async fn begin(&self) -> LendingResult<Box<dyn StoreTx>> {
        let mut tx = self.pool.begin().await?;

        // Scoped to this transaction only
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(format!("{}ms", self.statement_timeout_ms))
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgStoreTx { tx }))
    }
}

pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn member_exists(&mut self, member_id: i32) -> LendingResult<bool> {
        // Key-share lock: the member cannot be deleted before the loan row lands
        let found: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM members WHERE id = $1 FOR KEY SHARE")
                .bind(member_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(found.is_some())
    }

    async fn book_exists(&mut self, book_id: i32) -> LendingResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(exists)
    }

    async fn decrement_available(&mut self, book_id: i32) -> LendingResult<Option<i32>> {
        let remaining = sqlx::query_scalar(
            r#"
            UPDATE books SET available_count = available_count - 1
            WHERE id = $1 AND available_count > 0
            RETURNING available_count
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(remaining)
    }

    async fn increment_available(&mut self, book_id: i32) -> LendingResult<Option<i32>> {
        let count = sqlx::query_scalar(
            "UPDATE books SET available_count = available_count + 1 WHERE id = $1 RETURNING available_count",
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> LendingResult<Loan> {
        let row = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, loan_date, due_date, returned)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_loan(&mut self, loan_id: i32) -> LendingResult<Option<Loan>> {
        let row = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn lock_loan(&mut self, loan_id: i32) -> LendingResult<Option<Loan>> {
        let row = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn mark_returned(&mut self, loan_id: i32) -> LendingResult<bool> {
        let result =
            sqlx::query("UPDATE loans SET returned = TRUE WHERE id = $1 AND returned = FALSE")
                .bind(loan_id)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_schedule(
        &mut self,
        loan_id: i32,
        schedule: &LoanSchedule,
    ) -> LendingResult<Option<Loan>> {
        let row = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET loan_date = COALESCE($2, loan_date),
                due_date = COALESCE($3, due_date)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(schedule.loan_date)
        .bind(schedule.due_date)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_loan(&mut self, loan_id: i32) -> LendingResult<bool> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(loan_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_return_event(
        &mut self,
        event: &NewReturnEvent,
    ) -> LendingResult<ReturnEvent> {
        let row = sqlx::query_as::<_, ReturnEvent>(
            r#"
            INSERT INTO return_events (loan_id, return_date, notes)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(event.loan_id)
        .bind(event.return_date)
        .bind(&event.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> LendingResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LendingResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
