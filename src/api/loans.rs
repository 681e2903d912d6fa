//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanSchedule, LoanSummary, NewLoan},
};

/// Create loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_loan_dates"))]
pub struct CreateLoanRequest {
    /// Borrowing member ID
    #[serde(alias = "id_usuario")]
    pub user_id: i32,
    /// Book ID
    #[serde(alias = "id_libro")]
    pub book_id: i32,
    /// Start of the loan (default: today)
    #[serde(alias = "fecha_prestamo")]
    pub loan_date: Option<NaiveDate>,
    /// Due date (default: loan date plus the configured duration)
    #[serde(alias = "fecha_devolucion")]
    pub due_date: Option<NaiveDate>,
}

fn validate_loan_dates(request: &CreateLoanRequest) -> Result<(), ValidationError> {
    match (request.loan_date, request.due_date) {
        (Some(start), Some(due)) if due < start => {
            Err(ValidationError::new("due_date_before_loan_date"))
        }
        _ => Ok(()),
    }
}

impl CreateLoanRequest {
    /// Fill in default dates
    fn into_new_loan(self, today: NaiveDate, default_duration_days: i64) -> AppResult<NewLoan> {
        let loan_date = self.loan_date.unwrap_or(today);
        let due_date = match self.due_date {
            Some(due_date) => due_date,
            None => Duration::try_days(default_duration_days)
                .and_then(|duration| loan_date.checked_add_signed(duration))
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "no due date can be derived from loan_date {}",
                        loan_date
                    ))
                })?,
        };

        if due_date < loan_date {
            return Err(AppError::Validation(format!(
                "due_date {} precedes loan_date {}",
                due_date, loan_date
            )));
        }

        Ok(NewLoan {
            user_id: self.user_id,
            book_id: self.book_id,
            loan_date,
            due_date,
        })
    }
}

/// Loan list filter
#[derive(Debug, Deserialize, IntoParams)]
pub struct LoanListQuery {
    /// Only loans not yet returned
    pub active: Option<bool>,
}

/// Return response with the closed loan
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// Closed loan
    pub loan: Loan,
}

/// List loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanListQuery),
    responses(
        (status = 200, description = "Loans, newest first", body = Vec<LoanSummary>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanListQuery>,
) -> AppResult<Json<Vec<LoanSummary>>> {
    let loans = state
        .services
        .history
        .list_loans(query.active.unwrap_or(false))
        .await?;
    Ok(Json(loans))
}

/// Create a new loan (borrow a copy of a book)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Invalid request or no copy available"),
        (status = 404, description = "Member or book not found")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    request.validate()?;

    let new_loan = request.into_new_loan(
        Utc::now().date_naive(),
        state.services.loans_config.default_duration_days,
    )?;
    let loan = state.services.loans.create_loan(new_loan).await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get(loan_id).await?;
    Ok(Json(loan))
}

/// Change a loan's dates
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = LoanSchedule,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 400, description = "Due date before loan date"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn update_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
    Json(schedule): Json<LoanSchedule>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.update_schedule(loan_id, schedule).await?;
    Ok(Json(loan))
}

/// Delete a returned loan
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is still active")
    )
)]
pub async fn delete_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.loans.delete(loan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a loan returned
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan returned", body = ReturnResponse),
        (status = 400, description = "Already returned"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let loan = state.services.loans.mark_returned(loan_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
    }))
}
