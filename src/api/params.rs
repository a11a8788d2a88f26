//! Lenient parsing of list query parameters. A value that does not parse is
//! treated as if it had not been sent.

use crate::db::PageRequest;

pub fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

pub fn parse_i64(value: Option<&str>) -> Option<i64> {
    value?.trim().parse().ok()
}

pub fn parse_f64(value: Option<&str>) -> Option<f64> {
    value?.trim().parse().ok().filter(|v: &f64| v.is_finite())
}

/// Empty strings count as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn page_request(page: Option<&str>, per_page: Option<&str>) -> PageRequest {
    PageRequest::new(parse_i64(page), parse_i64(per_page))
}
