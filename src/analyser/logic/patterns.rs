//! Named string patterns detected in text columns.

use regex::Regex;
use std::sync::LazyLock;

pub struct NamedPattern {
    pub name: &'static str,
    regex: LazyLock<Option<Regex>>,
}

impl NamedPattern {
    pub fn is_match(&self, value: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|re| re.is_match(value.trim()))
    }
}

macro_rules! pattern {
    ($name:literal, $re:literal) => {
        NamedPattern {
            name: $name,
            regex: LazyLock::new(|| Regex::new($re).ok()),
        }
    };
}

/// Evaluated in this order; a column may match several.
pub static PATTERNS: [NamedPattern; 6] = [
    pattern!("email", r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$"),
    pattern!("url", r"^(?i)(https?|ftp)://[^\s/$.?#][^\s]*$"),
    pattern!(
        "phone",
        r"^\+?\d{0,3}[\s.-]?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}$"
    ),
    pattern!(
        "uuid",
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    ),
    pattern!(
        "ipv4",
        r"^((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)$"
    ),
    pattern!(
        "postal_code",
        r"^(\d{5}(-\d{4})?|[A-Za-z]\d[A-Za-z] ?\d[A-Za-z]\d|[A-Za-z]{1,2}\d[A-Za-z\d]? ?\d[A-Za-z]{2})$"
    ),
];

/// Names of every pattern matched by at least `threshold` of the values.
/// `values` holds the column's non-missing cells.
pub fn detect_patterns(values: &[&str], threshold: f64) -> Vec<String> {
    if values.is_empty() {
        return Vec::new();
    }

    let total = values.len() as f64;
    PATTERNS
        .iter()
        .filter(|p| {
            let hits = values.iter().filter(|v| p.is_match(v)).count();
            hits as f64 / total >= threshold
        })
        .map(|p| p.name.to_owned())
        .collect()
}
