//! PubMed E-utilities parsing.
//!
//! Two-step flow: `esearch.fcgi` turns an author query into a PMID list,
//! `esummary.fcgi` (JSON mode) returns summaries for those PMIDs. Summary
//! author names come as "Family Initials" ("Curie M"), dates as free-form
//! strings with a leading year ("2021 Mar 4").

use serde_json::Value;

use super::{WorkAuthor, WorkRecord};
use crate::utils::normalize_doi;

/// E-utilities endpoints.
pub const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
pub const ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

/// PMIDs from an esearch JSON response.
pub fn parse_esearch_ids(response: &Value) -> Vec<String> {
    response["esearchresult"]["idlist"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the summary for one PMID out of an esummary JSON response
/// (`result` is keyed by PMID, plus a `uids` bookkeeping array).
///
/// Returns `None` when the entry is missing or has no title.
pub fn parse_esummary(response: &Value, pmid: &str) -> Option<WorkRecord> {
    let doc = &response["result"][pmid];
    let title = doc["title"].as_str()?.trim().trim_end_matches('.').to_string();
    if title.is_empty() {
        return None;
    }

    Some(WorkRecord {
        doi: article_doi(doc),
        pmid: Some(pmid.to_string()),
        title,
        abstract_text: None,
        journal: doc["fulljournalname"].as_str().map(String::from),
        volume: non_empty(doc["volume"].as_str()),
        issue: non_empty(doc["issue"].as_str()),
        pages: non_empty(doc["pages"].as_str()),
        url: None,
        publication_year: parse_pubdate_year(doc["pubdate"].as_str().unwrap_or("")),
        publication_date: None,
        notes: None,
        authors: parse_authors(doc),
    })
}

/// The DOI out of the `articleids` list, when PubMed knows it.
fn article_doi(doc: &Value) -> Option<String> {
    doc["articleids"]
        .as_array()?
        .iter()
        .find(|aid| aid["idtype"].as_str() == Some("doi"))
        .and_then(|aid| aid["value"].as_str())
        .and_then(normalize_doi)
}

/// `pubdate` is "YYYY", "YYYY Mon", "YYYY Mon D", or occasionally a season.
/// Only the leading year is reliable.
fn parse_pubdate_year(pubdate: &str) -> Option<i64> {
    pubdate.split_whitespace().next()?.parse::<i64>().ok()
}

/// Summary authors: `name` is "Family Initials" — the final token is the
/// initials block, everything before it the family name.
fn parse_authors(doc: &Value) -> Vec<WorkAuthor> {
    doc["authors"]
        .as_array()
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| {
                    let name = a["name"].as_str()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let (family, initials) = match name.rsplit_once(' ') {
                        Some((family, initials)) => (family.to_string(), initials.to_string()),
                        None => (name.to_string(), String::new()),
                    };
                    Some(WorkAuthor {
                        first_name: initials,
                        last_name: family,
                        affiliation: None,
                        orcid: None,
                        corresponding: false,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn esearch_ids_extracted() {
        let response = json!({
            "esearchresult": { "count": "2", "idlist": ["38012345", "37999999"] }
        });
        assert_eq!(parse_esearch_ids(&response), vec!["38012345", "37999999"]);
        assert!(parse_esearch_ids(&json!({})).is_empty());
    }

    #[test]
    fn esummary_parses_record() {
        let response = json!({
            "result": {
                "uids": ["38012345"],
                "38012345": {
                    "uid": "38012345",
                    "title": "Gut microbiome dynamics in early life.",
                    "fulljournalname": "Nature Microbiology",
                    "pubdate": "2023 Nov 2",
                    "volume": "8",
                    "issue": "11",
                    "pages": "2001-2012",
                    "authors": [
                        { "name": "van der Berg J", "authtype": "Author" },
                        { "name": "Okafor CN", "authtype": "Author" }
                    ],
                    "articleids": [
                        { "idtype": "pubmed", "value": "38012345" },
                        { "idtype": "doi", "value": "10.1038/s41564-023-0001" }
                    ]
                }
            }
        });

        let record = parse_esummary(&response, "38012345").unwrap();
        assert_eq!(record.title, "Gut microbiome dynamics in early life");
        assert_eq!(record.pmid.as_deref(), Some("38012345"));
        assert_eq!(record.doi.as_deref(), Some("10.1038/s41564-023-0001"));
        assert_eq!(record.journal.as_deref(), Some("Nature Microbiology"));
        assert_eq!(record.publication_year, Some(2023));
        assert_eq!(record.pages.as_deref(), Some("2001-2012"));

        assert_eq!(record.authors.len(), 2);
        assert_eq!(record.authors[0].last_name, "van der Berg");
        assert_eq!(record.authors[0].first_name, "J");
        assert_eq!(record.authors[1].last_name, "Okafor");
        assert_eq!(record.authors[1].first_name, "CN");
    }

    #[test]
    fn missing_pmid_entry_is_none() {
        let response = json!({ "result": { "uids": [] } });
        assert!(parse_esummary(&response, "123").is_none());
    }

    #[test]
    fn season_pubdate_has_no_year_token() {
        assert_eq!(parse_pubdate_year("2020 Spring"), Some(2020));
        assert_eq!(parse_pubdate_year("Winter 2020"), None);
        assert_eq!(parse_pubdate_year(""), None);
    }
}
