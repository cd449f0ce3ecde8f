// File: src/request_context.rs
// Purpose: Request context with query params, headers, cookies and raw body

use axum::body::Bytes;
use axum::http::{request::Parts, HeaderMap, Method};
use std::collections::HashMap;

/// Request context passed as the first argument to every handler
#[derive(Clone)]
pub struct RequestContext {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: Method,

    /// Percent-decoded request path, as matched by the router
    pub path: String,

    /// Query parameters from URL (?key=value), percent-decoded
    pub query: QueryParams,

    /// Request headers
    pub headers: HeaderMap,

    /// Parsed cookies
    pub cookies: HashMap<String, String>,

    /// Unparsed request body
    pub body: Bytes,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl RequestContext {
    /// Create a new request context
    pub fn new(method: Method, path: String, query: QueryParams, headers: HeaderMap, body: Bytes) -> Self {
        let cookies = Self::parse_cookies(&headers);

        Self {
            method,
            path,
            query,
            headers,
            cookies,
            body,
        }
    }

    /// Build from the head of an incoming request and its collected body
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self::new(
            parts.method.clone(),
            decode_path(parts.uri.path()),
            QueryParams::parse(parts.uri.query()),
            parts.headers.clone(),
            body,
        )
    }

    /// Bare context for a method and path, with no headers or body
    ///
    /// Unknown method strings fall back to GET.
    pub fn for_path(method: &str, path: &str) -> Self {
        let method = Method::from_bytes(method.as_bytes()).unwrap_or(Method::GET);
        Self::new(
            method,
            path.to_string(),
            QueryParams::default(),
            HeaderMap::new(),
            Bytes::new(),
        )
    }

    /// Parse cookies from Cookie header
    fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
        let mut cookies = HashMap::new();

        for cookie_header in headers.get_all("cookie") {
            if let Ok(cookie_str) = cookie_header.to_str() {
                for cookie in cookie_str.split(';') {
                    let cookie = cookie.trim();
                    if let Some((key, value)) = cookie.split_once('=') {
                        cookies.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        cookies
    }

    /// Get a cookie value
    pub fn get_cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    /// Get a header value
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Check if request accepts JSON
    pub fn accepts_json(&self) -> bool {
        self.get_header("accept")
            .map(|accept| accept.contains("json"))
            .unwrap_or(false)
    }

    /// Body as UTF-8 text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Body parsed as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Query parameters from URL
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Create from HashMap
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Parse a raw query string (`a=1&b=two%20words`)
    ///
    /// `+` decodes to a space. Pairs whose encoding is invalid UTF-8 are kept
    /// undecoded; a key without `=` maps to an empty value. Later duplicates win.
    pub fn parse(query: Option<&str>) -> Self {
        let params = query
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();

        Self { params }
    }

    /// Get a query parameter value
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a query parameter as a specific type
    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.params.get(key)?.parse().ok()
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get all parameter names
    pub fn keys(&self) -> Vec<&String> {
        self.params.keys().collect()
    }

    /// Get as HashMap
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.params
    }
}

/// Percent-decodes a request path, leaving `%2F` encoded
///
/// An encoded slash stays encoded so it cannot split a segment. Pieces that
/// do not decode to UTF-8 are kept as they arrived.
pub fn decode_path(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(at) = find_encoded_slash(rest) {
        decoded.push_str(&decode_piece(&rest[..at]));
        decoded.push_str(&rest[at..at + 3]);
        rest = &rest[at + 3..];
    }
    decoded.push_str(&decode_piece(rest));
    decoded
}

fn find_encoded_slash(s: &str) -> Option<usize> {
    s.as_bytes()
        .windows(3)
        .position(|w| w[0] == b'%' && w[1] == b'2' && w[2].eq_ignore_ascii_case(&b'f'))
}

fn decode_piece(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
