use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Person response model (author, advisor, or both)
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Person {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub orcid: Option<String>,
    pub affiliation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    /// Display name in "First Last" form.
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// Request model for creating a new person
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePerson {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub orcid: Option<String>,
    pub affiliation: Option<String>,
}

/// Request model for updating a person
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub orcid: Option<String>,
    pub affiliation: Option<String>,
}

/// Request body for merging a duplicate person into this one
#[derive(Debug, Deserialize, ToSchema)]
pub struct MergeRequest {
    /// The duplicate person to be consumed and deleted
    pub source_id: Uuid,
}
