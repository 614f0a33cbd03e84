use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Author contribution type on a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Contribution {
    Normal,
    First,
    CoFirst,
    Last,
    CoLast,
    Corresponding,
}

impl Contribution {
    /// Human-readable label for list/detail views. Empty for `Normal`.
    pub fn label(&self) -> &'static str {
        match self {
            Contribution::Normal => "",
            Contribution::First => "first author",
            Contribution::CoFirst => "co-first author",
            Contribution::Last => "last author",
            Contribution::CoLast => "co-last author",
            Contribution::Corresponding => "corresponding author",
        }
    }
}

/// Publication response model
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Publication {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub conference: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub publication_year: Option<i64>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub arxiv_id: Option<String>,
    pub isbn: Option<String>,
    pub url: Option<String>,
    pub keywords: Option<String>,
    pub research_field: Option<String>,
    pub citation_count: i64,
    pub impact_factor: Option<f64>,
    pub notes: Option<String>,
    pub corresponding_author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Publication {
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

/// Request model for creating a publication
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePublication {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub conference: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub publication_year: Option<i64>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub arxiv_id: Option<String>,
    pub isbn: Option<String>,
    pub url: Option<String>,
    pub keywords: Option<String>,
    pub research_field: Option<String>,
    pub citation_count: Option<i64>,
    pub impact_factor: Option<f64>,
    pub notes: Option<String>,
    pub corresponding_author_id: Option<Uuid>,
}

/// Request model for updating a publication
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePublication {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub conference: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub publication_year: Option<i64>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub arxiv_id: Option<String>,
    pub isbn: Option<String>,
    pub url: Option<String>,
    pub keywords: Option<String>,
    pub research_field: Option<String>,
    pub citation_count: Option<i64>,
    pub impact_factor: Option<f64>,
    pub notes: Option<String>,
    pub corresponding_author_id: Option<Uuid>,
}

/// Ordered link between a person and a publication
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct AuthorOrder {
    pub id: Uuid,
    pub publication_id: Uuid,
    pub person_id: Uuid,
    pub position: i64,
    pub contribution: Contribution,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for adding an author to a publication
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAuthorOrder {
    pub publication_id: Uuid,
    pub person_id: Uuid,
    pub position: i64,
    pub contribution: Option<Contribution>,
}

/// Request model for updating an author order entry
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAuthorOrder {
    pub position: Option<i64>,
    pub contribution: Option<Contribution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_split_and_trim() {
        let p = Publication {
            id: Uuid::new_v4(),
            title: "t".into(),
            abstract_text: None,
            journal: None,
            conference: None,
            volume: None,
            issue: None,
            pages: None,
            publication_date: None,
            publication_year: None,
            doi: None,
            pmid: None,
            arxiv_id: None,
            isbn: None,
            url: None,
            keywords: Some(" genomics,  CRISPR ,, sequencing".into()),
            research_field: None,
            citation_count: 0,
            impact_factor: None,
            notes: None,
            corresponding_author_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(p.keywords_list(), vec!["genomics", "CRISPR", "sequencing"]);
    }

    #[test]
    fn contribution_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Contribution::CoFirst).unwrap(),
            "\"co-first\""
        );
        assert_eq!(
            serde_json::to_string(&Contribution::Corresponding).unwrap(),
            "\"corresponding\""
        );
    }
}
