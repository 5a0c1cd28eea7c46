//! Version ordering with the same rules as PHP's `version_compare()`.

use std::cmp::Ordering;

/// Compare two (normalized) version strings.
///
/// Versions are split into numeric and textual segments. Textual segments
/// rank as `dev < alpha < beta < RC < # < pl`, where `#` stands for any number.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts_a = canonicalize(a);
    let parts_b = canonicalize(b);

    let mut i = 0;
    while i < parts_a.len() && i < parts_b.len() {
        let ordering = compare_parts(&parts_a[i], &parts_b[i]);
        if ordering != Ordering::Equal {
            return ordering;
        }
        i += 1;
    }

    if let Some(rest) = parts_a.get(i) {
        return if is_numeric(rest) {
            Ordering::Greater
        } else {
            special_form_rank(rest).cmp(&NUMBER_RANK)
        };
    }

    if let Some(rest) = parts_b.get(i) {
        return if is_numeric(rest) {
            Ordering::Less
        } else {
            NUMBER_RANK.cmp(&special_form_rank(rest))
        };
    }

    Ordering::Equal
}

/// Evaluate `a <operator> b`.
///
/// Accepts the PHP operator spellings (`<`, `lt`, `<=`, `le`, `>`, `gt`,
/// `>=`, `ge`, `==`, `=`, `eq`, `!=`, `<>`, `ne`). Unknown operators are false.
pub fn php_version_compare(a: &str, b: &str, operator: &str) -> bool {
    let ordering = compare_versions(a, b);
    match operator {
        "<" | "lt" => ordering == Ordering::Less,
        "<=" | "le" => ordering != Ordering::Greater,
        ">" | "gt" => ordering == Ordering::Greater,
        ">=" | "ge" => ordering != Ordering::Less,
        "==" | "=" | "eq" => ordering == Ordering::Equal,
        "!=" | "<>" | "ne" => ordering != Ordering::Equal,
        _ => false,
    }
}

const NUMBER_RANK: i8 = 4;

fn canonicalize(version: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut last: Option<char> = None;

    for c in version.chars() {
        if c.is_ascii_alphanumeric() {
            let boundary = match last {
                Some(prev) if prev.is_ascii_alphanumeric() => {
                    prev.is_ascii_digit() != c.is_ascii_digit()
                }
                _ => false,
            };
            if boundary && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            current.push(c);
        } else if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        last = Some(c);
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn is_numeric(part: &str) -> bool {
    part.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn compare_parts(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            let na: u64 = a.parse().unwrap_or(u64::MAX);
            let nb: u64 = b.parse().unwrap_or(u64::MAX);
            na.cmp(&nb)
        }
        (false, false) => special_form_rank(a).cmp(&special_form_rank(b)),
        (true, false) => NUMBER_RANK.cmp(&special_form_rank(b)),
        (false, true) => special_form_rank(a).cmp(&NUMBER_RANK),
    }
}

fn special_form_rank(part: &str) -> i8 {
    const FORMS: [(&str, i8); 10] = [
        ("dev", 0),
        ("alpha", 1),
        ("a", 1),
        ("beta", 2),
        ("b", 2),
        ("RC", 3),
        ("rc", 3),
        ("#", 4),
        ("pl", 5),
        ("p", 5),
    ];

    FORMS
        .iter()
        .find(|(form, _)| part.starts_with(form))
        .map(|(_, rank)| *rank)
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(compare_versions("1.0.0.0", "1.0.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.0.0.0", "1.9.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.10.0.0", "1.9.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn test_stability_suffixes() {
        assert_eq!(compare_versions("1.0.0.0-dev", "1.0.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0.0.0-alpha1", "1.0.0.0-beta1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.0.0-RC1", "1.0.0.0-beta3"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0.0-patch1", "1.0.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0.0-beta2", "1.0.0.0-beta10"), Ordering::Less);
    }

    #[test]
    fn test_branch_alias_ordering() {
        assert_eq!(compare_versions("9999999-dev", "5.4.0.0"), Ordering::Greater);
        assert_eq!(
            compare_versions("1.0.9999999.9999999-dev", "1.0.5.0"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_operators() {
        assert!(php_version_compare("1.0", "1.0", "=="));
        assert!(php_version_compare("1.0", "2.0", "<"));
        assert!(php_version_compare("2.0", "2.0", ">="));
        assert!(php_version_compare("2.0", "1.0", "!="));
        assert!(!php_version_compare("2.0", "1.0", "??"));
    }
}
