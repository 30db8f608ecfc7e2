// src/models/category.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'categories' table, with the number of questions attached.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i64,

    /// Unique display name (e.g., "Web Development").
    pub name: String,

    /// URL-safe identifier derived from the name when the row is created.
    pub slug: String,

    pub description: String,

    /// Computed; not a column.
    pub question_count: i64,

    pub created_at: DateTime<Utc>,
}

/// DTO for creating or updating a category. The slug is always derived.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
}
