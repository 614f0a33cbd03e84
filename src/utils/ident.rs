//! Persistent-identifier hygiene: DOIs and ORCID iDs.
//!
//! Sources hand these back in several shapes (bare, `doi:` prefixed, full
//! resolver URLs). Everything is stored in one canonical form so dedup
//! lookups are a plain equality match.

/// Canonicalize a DOI: strip resolver/`doi:` prefixes, trim, lowercase.
///
/// Returns `None` when the remainder does not look like a DOI (must start
/// with a `10.` registrant prefix and contain a suffix).
///
/// # Examples
///
/// ```
/// use scholardb::utils::normalize_doi;
///
/// assert_eq!(normalize_doi("https://doi.org/10.1000/XYZ"), Some("10.1000/xyz".into()));
/// assert_eq!(normalize_doi("doi:10.1038/nphys1170"), Some("10.1038/nphys1170".into()));
/// assert_eq!(normalize_doi("not-a-doi"), None);
/// ```
pub fn normalize_doi(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ] {
        if let Some(rest) = strip_prefix_ignore_case(s, prefix) {
            s = rest;
            break;
        }
    }
    let s = s.trim();
    if !s.starts_with("10.") || !s.contains('/') {
        return None;
    }
    Some(s.to_lowercase())
}

/// Canonicalize an ORCID iD: strip the `orcid.org` URL prefix and validate
/// the `dddd-dddd-dddd-dddX` shape including the ISO 7064 mod 11-2 check
/// digit. Returns the bare 19-character id.
///
/// # Examples
///
/// ```
/// use scholardb::utils::normalize_orcid;
///
/// assert_eq!(
///     normalize_orcid("https://orcid.org/0000-0002-1825-0097"),
///     Some("0000-0002-1825-0097".into())
/// );
/// assert_eq!(normalize_orcid("0000-0002-1825-0098"), None); // bad check digit
/// ```
pub fn normalize_orcid(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    for prefix in ["https://orcid.org/", "http://orcid.org/"] {
        if let Some(rest) = strip_prefix_ignore_case(s, prefix) {
            s = rest;
            break;
        }
    }
    let s = s.trim_end_matches('/').to_uppercase();

    let groups: Vec<&str> = s.split('-').collect();
    if groups.len() != 4 || groups.iter().any(|g| g.len() != 4) {
        return None;
    }
    let digits: String = groups.concat();
    if !digits.is_ascii() {
        return None;
    }
    let (base, check) = digits.split_at(15);
    if !base.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    if orcid_check_digit(base)? != check.chars().next()? {
        return None;
    }
    Some(s)
}

/// ISO 7064 mod 11-2 check digit over the 15 base digits.
fn orcid_check_digit(base: &str) -> Option<char> {
    let mut total: u32 = 0;
    for c in base.chars() {
        total = (total + c.to_digit(10)?) * 2;
    }
    let result = (12 - total % 11) % 11;
    Some(if result == 10 {
        'X'
    } else {
        char::from_digit(result, 10)?
    })
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doi_prefixes_stripped() {
        for raw in [
            "10.1103/PhysRevLett.116.061102",
            "doi:10.1103/PhysRevLett.116.061102",
            "https://doi.org/10.1103/PhysRevLett.116.061102",
            "HTTPS://DOI.ORG/10.1103/PhysRevLett.116.061102",
            "  http://dx.doi.org/10.1103/PhysRevLett.116.061102  ",
        ] {
            assert_eq!(
                normalize_doi(raw).as_deref(),
                Some("10.1103/physrevlett.116.061102"),
                "failed for {raw:?}"
            );
        }
    }

    #[test]
    fn doi_rejects_garbage() {
        assert_eq!(normalize_doi(""), None);
        assert_eq!(normalize_doi("10.1000"), None);
        assert_eq!(normalize_doi("11.1000/x"), None);
        assert_eq!(normalize_doi("https://example.com/paper.pdf"), None);
    }

    #[test]
    fn orcid_valid_ids() {
        // Well-known sample ids published by ORCID
        assert_eq!(
            normalize_orcid("0000-0002-1825-0097").as_deref(),
            Some("0000-0002-1825-0097")
        );
        assert_eq!(
            normalize_orcid("https://orcid.org/0000-0001-5109-3700").as_deref(),
            Some("0000-0001-5109-3700")
        );
        // X check digit
        assert_eq!(
            normalize_orcid("0000-0002-1694-233X").as_deref(),
            Some("0000-0002-1694-233X")
        );
        assert_eq!(
            normalize_orcid("0000-0002-1694-233x").as_deref(),
            Some("0000-0002-1694-233X")
        );
    }

    #[test]
    fn orcid_invalid_ids() {
        assert_eq!(normalize_orcid("0000-0002-1825-0098"), None);
        assert_eq!(normalize_orcid("0000-0002-1825"), None);
        assert_eq!(normalize_orcid("0000-0002-1825-00977"), None);
        assert_eq!(normalize_orcid("abcd-0002-1825-0097"), None);
    }
}
