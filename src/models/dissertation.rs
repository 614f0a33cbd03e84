use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Degree awarded for a dissertation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
pub enum Degree {
    PhD,
    Master,
    Bachelor,
    Other,
}

impl Degree {
    pub fn as_str(&self) -> &'static str {
        match self {
            Degree::PhD => "PhD",
            Degree::Master => "Master",
            Degree::Bachelor => "Bachelor",
            Degree::Other => "Other",
        }
    }
}

/// Dissertation response model
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Dissertation {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub promoter_id: Uuid,
    pub supervisor_id: Option<Uuid>,
    pub degree: Degree,
    pub start_date: Option<NaiveDate>,
    pub defense_date: Option<NaiveDate>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub url: Option<String>,
    pub keywords: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dissertation {
    /// Keywords are stored comma-separated; expose them as a list.
    pub fn keywords_list(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Request model for creating a dissertation
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDissertation {
    pub title: String,
    pub author_id: Uuid,
    pub promoter_id: Uuid,
    pub supervisor_id: Option<Uuid>,
    /// Co-promoter person ids, in no particular order
    pub copromoter_ids: Option<Vec<Uuid>>,
    pub degree: Option<Degree>,
    pub start_date: Option<NaiveDate>,
    pub defense_date: Option<NaiveDate>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub url: Option<String>,
    pub keywords: Option<String>,
    pub notes: Option<String>,
}

/// Request model for updating a dissertation
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDissertation {
    pub title: Option<String>,
    pub author_id: Option<Uuid>,
    pub promoter_id: Option<Uuid>,
    pub supervisor_id: Option<Uuid>,
    pub copromoter_ids: Option<Vec<Uuid>>,
    pub degree: Option<Degree>,
    pub start_date: Option<NaiveDate>,
    pub defense_date: Option<NaiveDate>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub url: Option<String>,
    pub keywords: Option<String>,
    pub notes: Option<String>,
}
