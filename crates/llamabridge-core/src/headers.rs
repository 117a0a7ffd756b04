use http::{HeaderName, HeaderValue};

/// Ordered multi-map; duplicates are kept in arrival order.
pub type Headers = Vec<(HeaderName, HeaderValue)>;

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.as_str().eq_ignore_ascii_case(name))
        .and_then(|(_, v)| v.to_str().ok())
}
