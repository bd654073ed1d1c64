//! Outbound URL construction.
//!
//! `{endpoint}/api/{path}` with a forced trailing slash, then a
//! method-dependent query string.

use axum::http::Method;

/// How the inbound query string is carried to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPolicy {
    /// Keep the inbound query and add `format=json`.
    ForceJson,
    /// Keep the inbound query verbatim.
    Preserve,
}

impl QueryPolicy {
    /// POST keeps its query untouched; every other method asks for JSON.
    pub fn for_method(method: &Method) -> Self {
        if method == Method::POST {
            QueryPolicy::Preserve
        } else {
            QueryPolicy::ForceJson
        }
    }

    fn apply(self, query: Option<&str>) -> String {
        let query = query.filter(|q| !q.is_empty());
        match (self, query) {
            (QueryPolicy::ForceJson, Some(q)) => format!("?{}&format=json", q),
            (QueryPolicy::ForceJson, None) => "?format=json".to_string(),
            (QueryPolicy::Preserve, Some(q)) => format!("?{}", q),
            (QueryPolicy::Preserve, None) => String::new(),
        }
    }
}

/// Every supported method is forwarded with a trailing slash.
pub fn requires_trailing_slash(_method: &Method) -> bool {
    true
}

/// Build the fully qualified backend URL.
///
/// `endpoint` carries no trailing slash; `path` is the raw (still
/// percent-encoded) remainder after `/api/`; `query` excludes the `?`.
pub fn resolve_target(endpoint: &str, path: &str, query: Option<&str>, method: &Method) -> String {
    let mut target = format!("{}/api/{}", endpoint, path);

    if requires_trailing_slash(method) && !target.ends_with('/') {
        target.push('/');
    }

    target.push_str(&QueryPolicy::for_method(method).apply(query));
    target
}
