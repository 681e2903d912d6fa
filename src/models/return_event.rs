//! Return event model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Formal record of a closed loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReturnEvent {
    pub id: i32,
    pub loan_id: i32,
    pub return_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReturnEventSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: ReturnEvent,
    pub member_name: Option<String>,
    pub book_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReturnEvent {
    pub loan_id: i32,
    pub return_date: NaiveDate,
    pub notes: Option<String>,
}
