//! CSRF token value type.

use std::fmt;

/// Cookie name the backend uses for its CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the backend reads the CSRF token from.
pub const CSRF_HEADER: &str = "x-csrftoken";

/// A freshly issued anti-forgery token.
///
/// Valid for exactly one outbound call and never stored.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Wrap an issued value. Blank values, and values that cannot travel in
    /// both a header and a cookie pair, are not tokens.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let usable = !value.is_empty()
            && value.bytes().all(|b| b.is_ascii_graphic() && b != b';' && b != b',');
        usable.then_some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of debug output.
impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(..)")
    }
}
