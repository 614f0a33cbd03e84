//! Name normalization for matching people across metadata sources.
//!
//! External APIs disagree on accents, casing, and punctuation for the same
//! person. Matching and duplicate detection run on a folded form: NFD
//! decomposition with combining marks removed, lowercased, whitespace
//! collapsed.

use unicode_normalization::UnicodeNormalization;

/// Normalize a single name for matching.
///
/// # Examples
///
/// ```
/// use scholardb::utils::normalize_name;
///
/// assert_eq!(normalize_name("José García"), "jose garcia");
/// assert_eq!(normalize_name("Müller"), "muller");
/// assert_eq!(normalize_name("  Van   der Berg "), "van der berg");
/// ```
pub fn normalize_name(name: &str) -> String {
    fold_special_letters(name)
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Matching key for a person: normalized `last first`.
///
/// Last name leads so keys sort the way person listings do.
pub fn person_key(first_name: &str, last_name: &str) -> String {
    format!("{} {}", normalize_name(last_name), normalize_name(first_name))
        .trim()
        .to_string()
}

/// Normalize and additionally drop punctuation, so "O'Brien" matches
/// "OBrien" and "Jean-Pierre" matches "Jean Pierre".
pub fn normalize_name_loose(name: &str) -> String {
    normalize_name(name)
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Similarity between two full names in [0.0, 1.0].
///
/// 1.0 for an exact normalized match, 0.95 for a loose (punctuation-free)
/// match, otherwise the Jaccard index over normalized words. Used to rank
/// duplicate-person candidates.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize_name(a);
    let norm_b = normalize_name(b);
    if norm_a == norm_b {
        return 1.0;
    }
    if normalize_name_loose(a) == normalize_name_loose(b) {
        return 0.95;
    }

    let words_a: std::collections::HashSet<&str> = norm_a.split_whitespace().collect();
    let words_b: std::collections::HashSet<&str> = norm_b.split_whitespace().collect();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

/// Split a credit name ("Jane Q. Doe") into (first_name, last_name).
///
/// The last whitespace-separated token is the family name, everything
/// before it the given name. A single token becomes the family name —
/// mononyms are filed under last name.
pub fn split_credit_name(credit_name: &str) -> (String, String) {
    let trimmed = credit_name.trim();
    match trimmed.rsplit_once(char::is_whitespace) {
        Some((given, family)) => (
            given.split_whitespace().collect::<Vec<_>>().join(" "),
            family.to_string(),
        ),
        None => (String::new(), trimmed.to_string()),
    }
}

/// Letters that are distinct characters rather than accented forms, so NFD
/// leaves them alone and they need explicit folding.
fn fold_special_letters(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'Ł' => 'L',
            'ł' => 'l',
            'Ø' => 'O',
            'ø' => 'o',
            'Æ' => 'A',
            'æ' => 'a',
            'Å' => 'A',
            'å' => 'a',
            'ß' => 's',
            'Ð' => 'D',
            'ð' => 'd',
            'Þ' => 'T',
            'þ' => 't',
            'Đ' => 'D',
            'đ' => 'd',
            'İ' => 'I',
            'ı' => 'i',
            'Ğ' => 'G',
            'ğ' => 'g',
            'Ş' => 'S',
            'ş' => 's',
            _ => c,
        })
        .collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_fold() {
        assert_eq!(normalize_name("Schrödinger"), "schrodinger");
        assert_eq!(normalize_name("Nguyễn"), "nguyen");
        assert_eq!(normalize_name("Łukasz"), "lukasz");
        assert_eq!(normalize_name("Björk"), "bjork");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize_name("  Anna \t Maria  "), "anna maria");
    }

    #[test]
    fn person_key_is_last_first() {
        assert_eq!(person_key("José", "García"), "garcia jose");
        assert_eq!(person_key("", "Curie"), "curie");
    }

    #[test]
    fn loose_drops_punctuation() {
        assert_eq!(normalize_name_loose("O'Brien"), "obrien");
        assert_eq!(normalize_name_loose("Jean-Pierre"), "jeanpierre");
    }

    #[test]
    fn similarity_ranks_variants() {
        assert!(name_similarity("José García", "Jose Garcia") > 0.99);
        assert!(name_similarity("Jean-Pierre Roy", "Jean Pierre Roy") > 0.9);
        let partial = name_similarity("Alice Smith", "Bob Smith");
        assert!(partial > 0.2 && partial < 0.7);
        assert!(name_similarity("Wei Chen", "Maria Rossi") < 0.1);
    }

    #[test]
    fn credit_name_splits_on_last_token() {
        assert_eq!(
            split_credit_name("Jane Q. Doe"),
            ("Jane Q.".to_string(), "Doe".to_string())
        );
        assert_eq!(split_credit_name("Plato"), (String::new(), "Plato".to_string()));
        assert_eq!(
            split_credit_name("  Ludwig van Beethoven "),
            ("Ludwig van".to_string(), "Beethoven".to_string())
        );
    }
}
