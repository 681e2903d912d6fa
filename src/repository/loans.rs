//! Loans repository for list views.
//!
//! Writes to `loans` go through the transactional backend in
//! [`super::transaction`]; this module only reads.

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::loan::LoanSummary};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List loans, newest first, with member and book names
    pub async fn list(&self, active_only: bool) -> AppResult<Vec<LoanSummary>> {
        let rows = sqlx::query_as::<_, LoanSummary>(
            r#"
            SELECT l.id, l.user_id, l.book_id, l.loan_date, l.due_date, l.returned,
                   m.name AS member_name, b.title AS book_title,
                   (NOT l.returned AND l.due_date < CURRENT_DATE) AS is_overdue
            FROM loans l
            LEFT JOIN members m ON l.user_id = m.id
            LEFT JOIN books b ON l.book_id = b.id
            WHERE ($1 = FALSE OR l.returned = FALSE)
            ORDER BY l.id DESC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active loans held by a member
    pub async fn list_for_member(&self, user_id: i32) -> AppResult<Vec<LoanSummary>> {
        let rows = sqlx::query_as::<_, LoanSummary>(
            r#"
            SELECT l.id, l.user_id, l.book_id, l.loan_date, l.due_date, l.returned,
                   m.name AS member_name, b.title AS book_title,
                   (l.due_date < CURRENT_DATE) AS is_overdue
            FROM loans l
            LEFT JOIN members m ON l.user_id = m.id
            LEFT JOIN books b ON l.book_id = b.id
            WHERE l.user_id = $1 AND l.returned = FALSE
            ORDER BY l.due_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
