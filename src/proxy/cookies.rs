//! `Cookie` request-header parsing and rewriting.
//!
//! A [`CookieHeader`] keeps each `name=value` pair exactly as received, in
//! order and byte for byte, so values outside ASCII survive the relay. Names
//! compare case-insensitively. Serialization joins pairs with `"; "` and drops
//! empty segments.
//!
//! Duplicate names: [`CookieHeader::get`] returns the first pair with a
//! non-empty value; [`CookieHeader::set`] rewrites the first pair and drops
//! the rest, so a name set through it appears exactly once.

use std::borrow::Cow;
use std::fmt;

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

use crate::csrf::{CsrfToken, CSRF_COOKIE};

/// Cookie name carrying the backend session.
pub const SESSION_COOKIE: &str = "sessionid";

/// Header the session identifier is mirrored into for the backend.
pub const SESSION_HEADER: &str = "x-session-token";

/// Ordered view over a `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieHeader {
    pairs: Vec<Vec<u8>>,
}

impl CookieHeader {
    pub fn parse(raw: impl AsRef<[u8]>) -> Self {
        let pairs = raw
            .as_ref()
            .split(|&b| b == b';')
            .map(<[u8]>::trim_ascii)
            .filter(|pair| !pair.is_empty())
            .map(<[u8]>::to_vec)
            .collect();
        Self { pairs }
    }

    /// Collect every `Cookie` line of a request. HTTP/2 clients may split
    /// cookies across several header lines.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = headers
            .get_all(COOKIE)
            .iter()
            .flat_map(|line| Self::parse(line.as_bytes()).pairs)
            .collect();
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Names in header order. Non-UTF-8 bytes are shown lossily.
    pub fn names(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.pairs
            .iter()
            .map(|pair| String::from_utf8_lossy(split_pair(pair).0))
    }

    /// First non-empty value for `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.pairs
            .iter()
            .map(|pair| split_pair(pair))
            .filter(|(n, _)| n.eq_ignore_ascii_case(name.as_bytes()))
            .filter_map(|(_, value)| value)
            .find(|value| !value.is_empty())
    }

    /// Number of pairs named `name`.
    pub fn count(&self, name: &str) -> usize {
        self.pairs
            .iter()
            .filter(|pair| split_pair(pair).0.eq_ignore_ascii_case(name.as_bytes()))
            .count()
    }

    /// Set `name` to `value`, keeping its position if already present and
    /// appending otherwise.
    pub fn set(&mut self, name: &str, value: &str) {
        let replacement = format!("{}={}", name, value).into_bytes();
        let mut replaced = false;

        self.pairs.retain_mut(|pair| {
            if !split_pair(pair).0.eq_ignore_ascii_case(name.as_bytes()) {
                return true;
            }
            if replaced {
                return false;
            }
            *pair = replacement.clone();
            replaced = true;
            true
        });

        if !replaced {
            self.pairs.push(replacement);
        }
    }

    /// Serialized header bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pairs.join(&b"; "[..])
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_bytes(&self.to_bytes())
    }
}

impl fmt::Display for CookieHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

fn split_pair(pair: &[u8]) -> (&[u8], Option<&[u8]>) {
    match pair.iter().position(|&b| b == b'=') {
        Some(at) => (pair[..at].trim_ascii(), Some(pair[at + 1..].trim_ascii())),
        None => (pair.trim_ascii(), None),
    }
}

/// Opaque backend session identifier taken from the `sessionid` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(Vec<u8>);

impl SessionId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Inbound cookies rewritten for the outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedCookies {
    pub cookie: CookieHeader,
    pub session: Option<SessionId>,
}

/// Put the fresh token into the inbound cookies and pull out the session.
pub fn merge_cookies(inbound: &CookieHeader, token: &CsrfToken) -> MergedCookies {
    let mut cookie = inbound.clone();
    cookie.set(CSRF_COOKIE, token.as_str());

    MergedCookies {
        cookie,
        session: extract_session(inbound),
    }
}

pub fn extract_session(cookies: &CookieHeader) -> Option<SessionId> {
    cookies
        .get(SESSION_COOKIE)
        .map(|value| SessionId(value.to_vec()))
}
