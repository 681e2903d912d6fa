//! Formal return events

use crate::{
    error::LendingResult,
    models::{NewReturnEvent, ReturnEvent},
    services::{coordinator::TransactionCoordinator, loans::LoanLedger},
};

/// Records a return event and closes its loan as one unit
#[derive(Clone)]
pub struct ReturnRecorder {
    coordinator: TransactionCoordinator,
    ledger: LoanLedger,
}

impl ReturnRecorder {
    pub fn new(coordinator: TransactionCoordinator, ledger: LoanLedger) -> Self {
        Self {
            coordinator,
            ledger,
        }
    }

    /// Close an active loan and persist its return event.
    ///
    /// Fails with `LoanNotFound` or `AlreadyReturned` without writing anything.
    pub async fn record_return(&self, event: NewReturnEvent) -> LendingResult<ReturnEvent> {
        let ledger = self.ledger.clone();

        let (event, book_id) = self
            .coordinator
            .run(move |tx| {
                Box::pin(async move {
                    let loan = ledger.close_within(tx, event.loan_id).await?;
                    let recorded = tx.insert_return_event(&event).await?;
                    Ok((recorded, loan.book_id))
                })
            })
            .await?;

        tracing::info!(
            return_id = event.id,
            loan_id = event.loan_id,
            book_id,
            "Return recorded"
        );
        Ok(event)
    }
}
