//! ORCID works parsing.
//!
//! The public ORCID API (`https://pub.orcid.org/v3.0`) lists a researcher's
//! works as `group`s of `work-summary` entries; the summary has titles and
//! external ids but no contributor list, which only the full work record
//! (`/{orcid}/work/{put-code}`) carries. Nearly every field is wrapped in a
//! `{"value": ...}` envelope, and any level may be null.

use serde_json::Value;

use super::{WorkAuthor, WorkRecord};
use crate::utils::{normalize_doi, normalize_orcid, split_credit_name};

/// Public ORCID API base.
pub const API_BASE: &str = "https://pub.orcid.org/v3.0";

/// Flatten a works listing into its `work-summary` entries (first summary
/// per group), paired with the `put-code` needed to fetch contributors.
pub fn work_summaries(listing: &Value) -> Vec<&Value> {
    listing["group"]
        .as_array()
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| g["work-summary"].as_array()?.first())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse one `work-summary` into a [`WorkRecord`] (without authors — those
/// come from the full record via [`parse_contributors`]).
///
/// Returns `None` when the deeply nested title value is missing.
pub fn parse_work_summary(summary: &Value) -> Option<WorkRecord> {
    let title = summary["title"]["title"]["value"]
        .as_str()?
        .trim()
        .to_string();
    if title.is_empty() {
        return None;
    }

    let (publication_year, publication_date) = parse_publication_date(&summary["publication-date"]);

    Some(WorkRecord {
        doi: external_doi(summary),
        pmid: None,
        title,
        abstract_text: None,
        journal: summary["journal-title"]["value"].as_str().map(String::from),
        volume: None,
        issue: None,
        pages: None,
        url: summary["url"]["value"].as_str().map(String::from),
        publication_year,
        publication_date,
        notes: summary["type"].as_str().map(|t| format!("Type: {t}")),
        authors: Vec::new(),
    })
}

/// The `put-code` identifying a summary within the researcher's record.
pub fn put_code(summary: &Value) -> Option<i64> {
    summary["put-code"].as_i64()
}

/// Contributors from a full work record, in listed order.
///
/// Entries without a credit name are dropped. The credit name splits on its
/// last whitespace into given/family; a contributor ORCID iD is kept for
/// person matching, and `contributor-role == "corresponding"` marks the
/// corresponding author.
pub fn parse_contributors(work_detail: &Value) -> Vec<WorkAuthor> {
    work_detail["contributors"]["contributor"]
        .as_array()
        .map(|contributors| {
            contributors
                .iter()
                .filter_map(|c| {
                    let credit_name = c["credit-name"]["value"].as_str()?.trim();
                    if credit_name.is_empty() {
                        return None;
                    }
                    let (first_name, last_name) = split_credit_name(credit_name);
                    Some(WorkAuthor {
                        first_name,
                        last_name,
                        affiliation: None,
                        orcid: c["contributor-orcid"]["path"]
                            .as_str()
                            .and_then(normalize_orcid),
                        corresponding: c["contributor-attributes"]["contributor-role"].as_str()
                            == Some("corresponding"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The first DOI in the summary's `external-ids`.
fn external_doi(summary: &Value) -> Option<String> {
    summary["external-ids"]["external-id"]
        .as_array()?
        .iter()
        .find(|ext| ext["external-id-type"].as_str() == Some("doi"))
        .and_then(|ext| ext["external-id-value"].as_str())
        .and_then(normalize_doi)
}

/// ORCID publication dates wrap each component in a value envelope and may
/// provide only the year; missing month/day default to 1.
fn parse_publication_date(date: &Value) -> (Option<i64>, Option<chrono::NaiveDate>) {
    let year = match date["year"]["value"].as_str().and_then(|y| y.parse::<i64>().ok()) {
        Some(year) => year,
        None => return (None, None),
    };
    let month = date["month"]["value"]
        .as_str()
        .and_then(|m| m.parse::<u32>().ok())
        .unwrap_or(1);
    let day = date["day"]["value"]
        .as_str()
        .and_then(|d| d.parse::<u32>().ok())
        .unwrap_or(1);
    (
        Some(year),
        chrono::NaiveDate::from_ymd_opt(year as i32, month, day),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_summary() -> Value {
        json!({
            "put-code": 12345,
            "title": { "title": { "value": "Deep Work on Shallow Data" } },
            "journal-title": { "value": "Data Letters" },
            "type": "journal-article",
            "url": { "value": "https://example.org/paper" },
            "publication-date": {
                "year": { "value": "2022" },
                "month": { "value": "11" }
            },
            "external-ids": {
                "external-id": [
                    { "external-id-type": "issn", "external-id-value": "1234-5678" },
                    { "external-id-type": "doi", "external-id-value": "10.5555/DW.1" }
                ]
            }
        })
    }

    #[test]
    fn parses_summary() {
        let record = parse_work_summary(&sample_summary()).unwrap();
        assert_eq!(record.title, "Deep Work on Shallow Data");
        assert_eq!(record.journal.as_deref(), Some("Data Letters"));
        assert_eq!(record.doi.as_deref(), Some("10.5555/dw.1"));
        assert_eq!(record.publication_year, Some(2022));
        assert_eq!(
            record.publication_date,
            chrono::NaiveDate::from_ymd_opt(2022, 11, 1)
        );
        assert_eq!(record.notes.as_deref(), Some("Type: journal-article"));
        assert!(record.authors.is_empty());
    }

    #[test]
    fn missing_title_skipped() {
        assert!(parse_work_summary(&json!({})).is_none());
        assert!(parse_work_summary(&json!({ "title": null })).is_none());
        assert!(parse_work_summary(&json!({ "title": { "title": {} } })).is_none());
    }

    #[test]
    fn year_only_date() {
        let summary = json!({
            "title": { "title": { "value": "T" } },
            "publication-date": { "year": { "value": "2019" } }
        });
        let record = parse_work_summary(&summary).unwrap();
        assert_eq!(record.publication_year, Some(2019));
        assert_eq!(
            record.publication_date,
            chrono::NaiveDate::from_ymd_opt(2019, 1, 1)
        );
    }

    #[test]
    fn summaries_flatten_groups() {
        let listing = json!({
            "group": [
                { "work-summary": [sample_summary()] },
                { "work-summary": [] },
                { "other": true }
            ]
        });
        assert_eq!(work_summaries(&listing).len(), 1);
        assert_eq!(put_code(work_summaries(&listing)[0]), Some(12345));
    }

    #[test]
    fn contributors_parse_names_and_roles() {
        let detail = json!({
            "contributors": {
                "contributor": [
                    {
                        "credit-name": { "value": "Rosalind E. Franklin" },
                        "contributor-orcid": { "path": "0000-0002-1825-0097" },
                        "contributor-attributes": { "contributor-role": "corresponding" }
                    },
                    { "credit-name": { "value": "Watson" } },
                    { "credit-name": null }
                ]
            }
        });

        let authors = parse_contributors(&detail);
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].first_name, "Rosalind E.");
        assert_eq!(authors[0].last_name, "Franklin");
        assert_eq!(authors[0].orcid.as_deref(), Some("0000-0002-1825-0097"));
        assert!(authors[0].corresponding);
        assert_eq!(authors[1].first_name, "");
        assert_eq!(authors[1].last_name, "Watson");
        assert!(!authors[1].corresponding);
    }
}
