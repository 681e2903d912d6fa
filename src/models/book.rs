//! Book (catalog record) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub publisher: String,
    /// Publication year, when known
    pub year: Option<i32>,
    pub genre: String,
    pub isbn: String,
    /// Copies currently on the shelf. Only lending operations change it.
    pub available_count: i32,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[validate(range(min = 0, max = 9999))]
    pub year: Option<i32>,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub isbn: String,
    /// Initial number of copies on the shelf
    #[validate(range(min = 0, message = "available_count must not be negative"))]
    pub available_count: i32,
}

/// Update book request.
///
/// The copy count is deliberately absent: it moves only through loans and returns.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 0, max = 9999))]
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub isbn: Option<String>,
}
