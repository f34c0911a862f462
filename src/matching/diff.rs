//! Rule-by-rule comparison of observed vs expected requests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

use crate::model::RequestSpec;

use super::template;

/// What the listener actually saw for one inbound call.
#[derive(Debug, Clone)]
pub struct ObservedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub path_params: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The first rule an observed request violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Method { expected: String, got: String },
    MissingPathParam { template: String, name: String },
    Path { expected: String, got: String },
    Body { expected: String, got: String },
    Headers { expected: String, got: String },
    Query { expected: String, got: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Method { expected, got } => {
                write!(f, "expected method: {expected}, got: {got}")
            }
            Mismatch::MissingPathParam { template, name } => write!(
                f,
                "incomparable url path: template '{template}' needs parameter '{name}' the request does not provide"
            ),
            Mismatch::Path { expected, got } => {
                write!(f, "expected url path: '{expected}', got: '{got}'")
            }
            Mismatch::Body { expected, got } => {
                write!(f, "expected body: '{expected}', got: '{got}'")
            }
            Mismatch::Headers { expected, got } => {
                write!(f, "expected headers present: {expected}, got: {got}")
            }
            Mismatch::Query { expected, got } => {
                write!(f, "expected query params: '{expected}', got: '{got}'")
            }
        }
    }
}

/// Compare `observed` against `expected`, stopping at the first failing rule.
///
/// Rule precedence: method, path, body, headers, query. `None` means match.
pub fn diff(expected: &RequestSpec, observed: &ObservedRequest) -> Option<Mismatch> {
    if !expected
        .method()
        .as_str()
        .eq_ignore_ascii_case(observed.method.as_str())
    {
        return Some(Mismatch::Method {
            expected: expected.method().as_str().to_ascii_uppercase(),
            got: observed.method.as_str().to_ascii_uppercase(),
        });
    }

    let expected_path = match template::substitute(expected.path(), &observed.path_params) {
        Ok(path) => path,
        Err(name) => {
            return Some(Mismatch::MissingPathParam {
                template: expected.path().to_string(),
                name,
            })
        }
    };
    if expected_path != observed.path {
        return Some(Mismatch::Path {
            expected: expected_path,
            got: observed.path.clone(),
        });
    }

    if !expected.body_bytes().is_empty() && expected.body_bytes() != &observed.body {
        return Some(Mismatch::Body {
            expected: String::from_utf8_lossy(expected.body_bytes()).into_owned(),
            got: String::from_utf8_lossy(&observed.body).into_owned(),
        });
    }

    for (name, value) in expected.headers() {
        let present = observed
            .headers
            .get_all(name.to_ascii_lowercase().as_str())
            .iter()
            .any(|observed_value| observed_value.as_bytes() == value.as_bytes());
        if !present {
            return Some(Mismatch::Headers {
                expected: render_pairs(expected.headers()),
                got: render_header_map(&observed.headers),
            });
        }
    }

    if !expected.query_pairs().is_empty() {
        let want = multimap(expected.query_pairs().iter().cloned());
        let got = multimap(parse_query(observed.query.as_deref().unwrap_or("")));
        if want != got {
            return Some(Mismatch::Query {
                expected: render_pairs(expected.query_pairs()),
                got: observed.query.clone().unwrap_or_default(),
            });
        }
    }

    None
}

fn parse_query(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
}

fn multimap(pairs: impl Iterator<Item = (String, String)>) -> BTreeMap<String, BTreeSet<String>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, value) in pairs {
        map.entry(key).or_default().insert(value);
    }
    map
}

fn render_pairs(pairs: &[(String, String)]) -> String {
    let rendered: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    format!("{{{}}}", rendered.join(", "))
}

fn render_header_map(headers: &HeaderMap) -> String {
    let rendered: Vec<String> = headers
        .iter()
        .map(|(key, value)| format!("{key}: {}", String::from_utf8_lossy(value.as_bytes())))
        .collect();
    format!("{{{}}}", rendered.join(", "))
}
