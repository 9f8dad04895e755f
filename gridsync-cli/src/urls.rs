//! Endpoint URLs of the grid service.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

lazy_static! {
    // One `<url>; rel="next"` element of an RFC 8288 Link header.
    static ref NEXT_LINK_REGEX: Regex =
        Regex::new(r#"<([^>]*)>\s*;[^,]*?\brel\s*=\s*"?next"?"#).unwrap();
}

/// `{base}/v1/views/{view_id}/records`, used for both fetching and creating records.
pub fn records_url(base_url: &str, view_id: &str) -> String {
    format!(
        "{}/v1/views/{}/records",
        base_url.trim_end_matches('/'),
        view_id
    )
}

/// Query parameters selecting columns and the first page.
pub fn records_query(column_ids: &[&str], limit: usize, offset: usize) -> Vec<(String, String)> {
    let mut query = Vec::new();
    if !column_ids.is_empty() {
        query.push(("columnIds".to_string(), column_ids.join(",")));
    }
    query.push((
        "page".to_string(),
        json!({"limit": limit, "offset": offset}).to_string(),
    ));
    query
}

/// Extracts the `rel="next"` target from a `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    NEXT_LINK_REGEX
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_url() {
        assert_eq!(
            records_url("https://api.gridly.com/", "abc"),
            "https://api.gridly.com/v1/views/abc/records"
        );
    }

    #[test]
    fn test_records_query() {
        let query = records_query(&["col_en", "col_fr"], 1500, 0);
        assert_eq!(
            query,
            vec![
                ("columnIds".to_string(), "col_en,col_fr".to_string()),
                ("page".to_string(), r#"{"limit":1500,"offset":0}"#.to_string()),
            ]
        );
        assert_eq!(records_query(&[], 10, 20).len(), 1);
    }

    #[test]
    fn test_next_link() {
        let header = r#"<https://x/records?page=%7B%22offset%22%3A100%7D>; rel="next", <https://x/records?last>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://x/records?page=%7B%22offset%22%3A100%7D")
        );
    }

    #[test]
    fn test_next_link_not_first() {
        let header = r#"<https://x/prev>; rel="prev", <https://x/next>; rel=next"#;
        assert_eq!(next_link(header).as_deref(), Some("https://x/next"));
    }

    #[test]
    fn test_no_next_link() {
        assert_eq!(next_link(r#"<https://x/last>; rel="last""#), None);
        assert_eq!(next_link(""), None);
    }
}
