//! Return events repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::return_event::{ReturnEvent, ReturnEventSummary},
};

#[derive(Clone)]
pub struct ReturnEventsRepository {
    pool: Pool<Postgres>,
}

impl ReturnEventsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List return events, newest first, with member and book names
    pub async fn list(&self) -> AppResult<Vec<ReturnEventSummary>> {
        let rows = sqlx::query_as::<_, ReturnEventSummary>(
            r#"
            SELECT r.id, r.loan_id, r.return_date, r.notes,
                   m.name AS member_name, b.title AS book_title
            FROM return_events r
            JOIN loans l ON r.loan_id = l.id
            LEFT JOIN members m ON l.user_id = m.id
            LEFT JOIN books b ON l.book_id = b.id
            ORDER BY r.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ReturnEvent> {
        sqlx::query_as::<_, ReturnEvent>("SELECT * FROM return_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Return event with id {} not found", id)))
    }

    /// Delete the audit row only. The loan stays closed and inventory is not touched.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM return_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Return event with id {} not found", id)));
        }
        Ok(())
    }
}
