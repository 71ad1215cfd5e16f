//! Column-name handling: standardized names, name tokens, and the semantic
//! cluster label derived from them.

use super::types::InferredType;

pub fn sanitize_column_name(name: &str) -> String {
    // Split camelCase before lowercasing so "customerId" -> "customer_id"
    let mut spaced = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.trim().chars() {
        if c.is_uppercase() && prev_lower {
            spaced.push('_');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        spaced.push(c);
    }

    let clean: String = spaced
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    // Collapse multiple underscores
    let mut result = String::new();
    let mut last_was_underscore = false;
    for c in clean.chars() {
        if c == '_' {
            if !last_was_underscore {
                result.push(c);
                last_was_underscore = true;
            }
        } else {
            result.push(c);
            last_was_underscore = false;
        }
    }

    let result = result.trim_matches('_');
    if result.is_empty() {
        "col".to_owned()
    } else {
        result.to_owned()
    }
}

pub fn name_tokens(name: &str) -> Vec<String> {
    sanitize_column_name(name)
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Role keywords, checked in order against a column's name tokens.
const ROLE_KEYWORDS: &[(&str, &[&str])] = &[
    ("identifier", &["id", "uuid", "guid", "key", "code", "sku", "ref"]),
    (
        "temporal",
        &[
            "date", "time", "timestamp", "created", "updated", "dob", "birthday", "year",
            "month", "day",
        ],
    ),
    ("contact", &["email", "mail", "phone", "tel", "mobile", "fax", "url", "website"]),
    (
        "location",
        &[
            "address", "addr", "street", "city", "state", "zip", "postal", "postcode",
            "country", "region", "lat", "lon", "latitude", "longitude",
        ],
    ),
    ("person_name", &["name", "first", "last", "surname", "fullname", "firstname", "lastname"]),
    (
        "measure",
        &[
            "amount", "price", "cost", "total", "salary", "revenue", "qty", "quantity",
            "count", "score", "age", "weight", "height", "rate", "balance",
        ],
    ),
    ("flag", &["is", "has", "flag", "active", "enabled"]),
    ("category", &["type", "status", "category", "kind", "class", "group", "department"]),
];

/// Label columns by shared detected pattern first, then by name role, then by
/// inferred type.
pub fn cluster_label(name: &str, inferred: InferredType, patterns: &[String]) -> String {
    if let Some(pattern) = patterns.first() {
        return match pattern.as_str() {
            "email" | "phone" | "url" => "contact".to_owned(),
            "uuid" => "identifier".to_owned(),
            "postal_code" | "ipv4" => "location".to_owned(),
            other => other.to_owned(),
        };
    }

    let tokens = name_tokens(name);
    if let Some((label, _)) = ROLE_KEYWORDS
        .iter()
        .find(|(_, words)| tokens.iter().any(|t| words.contains(&t.as_str())))
    {
        return (*label).to_owned();
    }

    match inferred {
        InferredType::Date => "temporal",
        InferredType::Boolean => "flag",
        InferredType::Integer | InferredType::Float => "measure",
        InferredType::String => "text",
    }
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_column_name() {
        assert_eq!(sanitize_column_name("  First Name "), "first_name");
        assert_eq!(sanitize_column_name("customerId"), "customer_id");
        assert_eq!(sanitize_column_name("__total__$$"), "total");
        assert_eq!(sanitize_column_name("!!!"), "col");
    }

    #[test]
    fn test_cluster_label_prefers_patterns() {
        let patterns = vec!["email".to_owned()];
        assert_eq!(cluster_label("notes", InferredType::String, &patterns), "contact");
    }

    #[test]
    fn test_cluster_label_from_name_role() {
        assert_eq!(cluster_label("customer_id", InferredType::Integer, &[]), "identifier");
        assert_eq!(cluster_label("orderId", InferredType::Integer, &[]), "identifier");
        assert_eq!(cluster_label("created_at", InferredType::String, &[]), "temporal");
        assert_eq!(cluster_label("Last Name", InferredType::String, &[]), "person_name");
        assert_eq!(cluster_label("unit_price", InferredType::Float, &[]), "measure");
    }

    #[test]
    fn test_cluster_label_falls_back_to_type() {
        assert_eq!(cluster_label("x", InferredType::Float, &[]), "measure");
        assert_eq!(cluster_label("notes", InferredType::String, &[]), "text");
        assert_eq!(cluster_label("shipped", InferredType::Boolean, &[]), "flag");
    }
}
