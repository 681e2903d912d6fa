//! Return event endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::return_event::{NewReturnEvent, ReturnEvent, ReturnEventSummary},
};

/// Record return request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordReturnRequest {
    /// Loan being closed
    #[serde(rename = "id_prestamo", alias = "loan_id")]
    pub loan_id: i32,
    /// Date the copy came back (default: today)
    #[serde(rename = "fecha_entrega", alias = "return_date")]
    pub return_date: Option<NaiveDate>,
    /// Condition notes
    #[serde(rename = "observaciones", alias = "notes")]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// List return events
#[utoipa::path(
    get,
    path = "/returns",
    tag = "returns",
    responses(
        (status = 200, description = "Return events, newest first", body = Vec<ReturnEventSummary>)
    )
)]
pub async fn list_returns(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<ReturnEventSummary>>> {
    let events = state.services.history.list_returns().await?;
    Ok(Json(events))
}

/// Record a return: closes the loan and stores the event
#[utoipa::path(
    post,
    path = "/returns",
    tag = "returns",
    request_body = RecordReturnRequest,
    responses(
        (status = 201, description = "Return recorded", body = ReturnEvent),
        (status = 400, description = "Loan already returned"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn record_return(
    State(state): State<crate::AppState>,
    Json(request): Json<RecordReturnRequest>,
) -> AppResult<(StatusCode, Json<ReturnEvent>)> {
    request.validate()?;

    let event = state
        .services
        .returns
        .record_return(NewReturnEvent {
            loan_id: request.loan_id,
            return_date: request.return_date.unwrap_or_else(|| Utc::now().date_naive()),
            notes: request.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// Get a return event
#[utoipa::path(
    get,
    path = "/returns/{id}",
    tag = "returns",
    params(("id" = i32, Path, description = "Return event ID")),
    responses(
        (status = 200, description = "Return event", body = ReturnEvent),
        (status = 404, description = "Return event not found")
    )
)]
pub async fn get_return(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ReturnEvent>> {
    let event = state.services.history.get_return(id).await?;
    Ok(Json(event))
}

/// Delete a return event (the loan stays returned)
#[utoipa::path(
    delete,
    path = "/returns/{id}",
    tag = "returns",
    params(("id" = i32, Path, description = "Return event ID")),
    responses(
        (status = 204, description = "Return event deleted"),
        (status = 404, description = "Return event not found")
    )
)]
pub async fn delete_return(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.history.delete_return(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
