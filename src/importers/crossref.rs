//! Crossref work parsing.
//!
//! Crossref returns works as loosely structured JSON keyed by DOI
//! (`https://api.crossref.org/works/{doi}`, or `/works?query.author=` for
//! searches). Fields of interest frequently arrive as one-element arrays,
//! dates as `date-parts` triples with trailing parts missing, abstracts as
//! JATS XML snippets.

use chrono::NaiveDate;
use serde_json::Value;

use super::{WorkAuthor, WorkRecord};
use crate::utils::{normalize_doi, normalize_orcid};

/// Crossref REST API base for works.
pub const API_BASE: &str = "https://api.crossref.org/works";

/// Parse one Crossref work object (the `message` of a DOI lookup, or one
/// entry of `message.items` for a search) into a [`WorkRecord`].
///
/// Returns `None` when the work has no title — such records are useless
/// downstream and are counted as skips by callers.
pub fn parse_work(work: &Value) -> Option<WorkRecord> {
    let title = first_in_array(work, "title")?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let (publication_year, publication_date) = parse_date_parts(
        work.get("published-print")
            .or_else(|| work.get("published-online"))
            .unwrap_or(&Value::Null),
    );

    Some(WorkRecord {
        doi: work["DOI"].as_str().and_then(normalize_doi),
        pmid: None,
        title,
        abstract_text: work["abstract"].as_str().map(strip_jats),
        journal: first_in_array(work, "container-title").map(String::from),
        volume: work["volume"].as_str().map(String::from),
        issue: work["issue"].as_str().map(String::from),
        pages: work["page"].as_str().map(String::from),
        url: work["URL"].as_str().map(String::from),
        publication_year,
        publication_date,
        notes: None,
        authors: parse_authors(work),
    })
}

/// Authors from the `author` array. Entries without a family name are
/// dropped (Crossref uses them for consortia and similar non-person
/// contributors).
fn parse_authors(work: &Value) -> Vec<WorkAuthor> {
    let institutions = institution_map(work);

    work["author"]
        .as_array()
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| {
                    let family = a["family"].as_str().unwrap_or("").trim();
                    if family.is_empty() {
                        return None;
                    }
                    Some(WorkAuthor {
                        first_name: a["given"].as_str().unwrap_or("").trim().to_string(),
                        last_name: family.to_string(),
                        affiliation: author_affiliation(a, &institutions),
                        orcid: a["ORCID"].as_str().and_then(normalize_orcid),
                        corresponding: a["sequence"].as_str() == Some("first")
                            || a.get("corresponding-author-id").is_some(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Some works list affiliations indirectly: the author entry references an
/// institution id resolved through the work-level `institution` array.
fn institution_map(work: &Value) -> Vec<(String, String)> {
    work["institution"]
        .as_array()
        .map(|insts| {
            insts
                .iter()
                .filter_map(|inst| {
                    Some((
                        inst["id"].as_str()?.to_string(),
                        inst["name"].as_str()?.to_string(),
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn author_affiliation(author: &Value, institutions: &[(String, String)]) -> Option<String> {
    let first = author["affiliation"].as_array()?.first()?;
    if let Some(name) = first["name"].as_str() {
        return Some(name.to_string());
    }
    let id = first["id"].as_str()?;
    institutions
        .iter()
        .find(|(inst_id, _)| inst_id == id)
        .map(|(_, name)| name.clone())
}

/// `date-parts` is `[[year, month?, day?]]`. The year alone is kept when
/// the full triple is missing or does not form a valid date.
pub fn parse_date_parts(published: &Value) -> (Option<i64>, Option<NaiveDate>) {
    let parts = match published["date-parts"]
        .as_array()
        .and_then(|dp| dp.first())
        .and_then(|dp| dp.as_array())
    {
        Some(parts) => parts,
        None => return (None, None),
    };

    let year = parts.first().and_then(|y| y.as_i64());
    let date = year.and_then(|y| {
        if parts.len() < 3 {
            return None;
        }
        let month = parts.get(1)?.as_i64()? as u32;
        let day = parts.get(2)?.as_i64()? as u32;
        NaiveDate::from_ymd_opt(y as i32, month, day)
    });
    (year, date)
}

/// Crossref abstracts are JATS XML snippets; strip the common tags.
pub fn strip_jats(raw: &str) -> String {
    raw.replace("<jats:p>", "")
        .replace("</jats:p>", "\n")
        .replace("<jats:title>", "")
        .replace("</jats:title>", "\n")
        .replace("<jats:italic>", "")
        .replace("</jats:italic>", "")
        .replace("<jats:bold>", "")
        .replace("</jats:bold>", "")
        .replace("<jats:sup>", "")
        .replace("</jats:sup>", "")
        .replace("<jats:sub>", "")
        .replace("</jats:sub>", "")
        .trim()
        .to_string()
}

fn first_in_array<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value[key].as_array()?.first()?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_work() {
        let work = json!({
            "DOI": "10.1000/TEST",
            "title": ["A Study of Things"],
            "abstract": "<jats:p>We study <jats:italic>things</jats:italic>.</jats:p>",
            "container-title": ["Journal of Things"],
            "volume": "12",
            "issue": "3",
            "page": "100-110",
            "URL": "https://doi.org/10.1000/test",
            "published-print": { "date-parts": [[2023, 4, 15]] },
            "author": [
                { "given": "Ada", "family": "Lovelace", "sequence": "first",
                  "affiliation": [{ "name": "Analytical Engine Institute" }],
                  "ORCID": "https://orcid.org/0000-0002-1825-0097" },
                { "given": "Charles", "family": "Babbage", "sequence": "additional",
                  "affiliation": [] }
            ]
        });

        let record = parse_work(&work).unwrap();
        assert_eq!(record.doi.as_deref(), Some("10.1000/test"));
        assert_eq!(record.title, "A Study of Things");
        assert_eq!(record.abstract_text.as_deref(), Some("We study things."));
        assert_eq!(record.journal.as_deref(), Some("Journal of Things"));
        assert_eq!(record.pages.as_deref(), Some("100-110"));
        assert_eq!(record.publication_year, Some(2023));
        assert_eq!(
            record.publication_date,
            NaiveDate::from_ymd_opt(2023, 4, 15)
        );

        assert_eq!(record.authors.len(), 2);
        assert_eq!(record.authors[0].last_name, "Lovelace");
        assert!(record.authors[0].corresponding);
        assert_eq!(
            record.authors[0].orcid.as_deref(),
            Some("0000-0002-1825-0097")
        );
        assert_eq!(
            record.authors[0].affiliation.as_deref(),
            Some("Analytical Engine Institute")
        );
        assert!(!record.authors[1].corresponding);
        assert_eq!(record.authors[1].affiliation, None);
    }

    #[test]
    fn missing_title_is_none() {
        assert!(parse_work(&json!({ "DOI": "10.1/x" })).is_none());
        assert!(parse_work(&json!({ "title": [] })).is_none());
        assert!(parse_work(&json!({ "title": [""] })).is_none());
    }

    #[test]
    fn year_only_date() {
        let (year, date) = parse_date_parts(&json!({ "date-parts": [[2020]] }));
        assert_eq!(year, Some(2020));
        assert_eq!(date, None);
    }

    #[test]
    fn invalid_full_date_keeps_year() {
        let (year, date) = parse_date_parts(&json!({ "date-parts": [[2020, 13, 40]] }));
        assert_eq!(year, Some(2020));
        assert_eq!(date, None);
    }

    #[test]
    fn published_online_fallback() {
        let work = json!({
            "title": ["Online Only"],
            "published-online": { "date-parts": [[2021, 1, 2]] }
        });
        let record = parse_work(&work).unwrap();
        assert_eq!(record.publication_year, Some(2021));
        assert_eq!(record.publication_date, NaiveDate::from_ymd_opt(2021, 1, 2));
    }

    #[test]
    fn authors_without_family_name_dropped() {
        let work = json!({
            "title": ["T"],
            "author": [
                { "name": "The Things Consortium" },
                { "given": "Grace", "family": "Hopper" }
            ]
        });
        let record = parse_work(&work).unwrap();
        assert_eq!(record.authors.len(), 1);
        assert_eq!(record.authors[0].last_name, "Hopper");
    }

    #[test]
    fn institution_reference_resolves() {
        let work = json!({
            "title": ["T"],
            "institution": [{ "id": "inst-1", "name": "Ref Institute" }],
            "author": [
                { "given": "A", "family": "B", "affiliation": [{ "id": "inst-1" }] }
            ]
        });
        let record = parse_work(&work).unwrap();
        assert_eq!(
            record.authors[0].affiliation.as_deref(),
            Some("Ref Institute")
        );
    }
}
