//! Available-copy accounting

use crate::{
    error::{LendingError, LendingResult},
    services::coordinator::StoreTx,
};

/// Guarded changes to a book's available-copy count.
///
/// Both operations run inside the caller's transaction, so the count moves
/// together with the loan row that justifies it.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryStore;

impl InventoryStore {
    pub fn new() -> Self {
        Self
    }

    /// Take one copy off the shelf. Returns the remaining count.
    pub async fn try_decrement(&self, tx: &mut dyn StoreTx, book_id: i32) -> LendingResult<i32> {
        let Some(remaining) = tx.decrement_available(book_id).await? else {
            // The guarded write matched nothing: tell a missing book from an empty shelf
            return Err(if tx.book_exists(book_id).await? {
                LendingError::BookUnavailable(book_id)
            } else {
                LendingError::BookNotFound(book_id)
            });
        };

        tracing::debug!(book_id, remaining, "Copy checked out");
        Ok(remaining)
    }

    /// Put one copy back on the shelf. Returns the new count.
    pub async fn increment(&self, tx: &mut dyn StoreTx, book_id: i32) -> LendingResult<i32> {
        let available = tx
            .increment_available(book_id)
            .await?
            .ok_or(LendingError::BookNotFound(book_id))?;

        tracing::debug!(book_id, available, "Copy checked in");
        Ok(available)
    }
}
