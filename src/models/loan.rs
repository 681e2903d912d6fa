//! Loan model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Set once, when the loan is closed
    pub returned: bool,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        !self.returned
    }
}

/// Loan row joined with the names shown in list views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub loan: Loan,
    pub member_name: Option<String>,
    pub book_title: Option<String>,
    pub is_overdue: bool,
}

/// Input of a loan creation, with dates already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub user_id: i32,
    pub book_id: i32,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Partial change of a loan's dates
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoanSchedule {
    pub loan_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl LoanSchedule {
    /// Dates the loan would carry once this schedule is applied
    pub fn resolve(&self, loan: &Loan) -> (NaiveDate, NaiveDate) {
        (
            self.loan_date.unwrap_or(loan.loan_date),
            self.due_date.unwrap_or(loan.due_date),
        )
    }
}
