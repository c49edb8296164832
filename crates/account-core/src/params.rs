//! Query-string parameter parsing for redirect URIs

use std::collections::HashMap;

use url::form_urlencoded;

/// Parse `name=value&...` pairs into a map.
///
/// Names and values are percent-decoded and a leading `?` is ignored. Pairs
/// without a name are skipped; later duplicates win. Returns `None` when the
/// string holds no pair at all.
pub fn parameters_from_query_string(query: &str) -> Option<HashMap<String, String>> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let parameters: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if parameters.is_empty() {
        None
    } else {
        Some(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_grant_redirect() {
        let params = parameters_from_query_string("code=a1b2c3&state=xyz%20123").unwrap();
        assert_eq!(params.get("code").map(String::as_str), Some("a1b2c3"));
        assert_eq!(params.get("state").map(String::as_str), Some("xyz 123"));
    }

    #[test]
    fn test_leading_question_mark() {
        let params = parameters_from_query_string("?error=access_denied").unwrap();
        assert_eq!(params.get("error").map(String::as_str), Some("access_denied"));
    }

    #[test]
    fn test_empty_query() {
        assert!(parameters_from_query_string("").is_none());
        assert!(parameters_from_query_string("?").is_none());
        assert!(parameters_from_query_string("=orphan").is_none());
    }

    #[test]
    fn test_missing_value() {
        let params = parameters_from_query_string("flag&code=1").unwrap();
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.len(), 2);
    }
}
