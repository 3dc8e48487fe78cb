//! HTTP request and response types described as plain data.
//!
//! # Design
//! The request builders in `nixzd` and `isac` produce `HttpRequest` values
//! without touching the network; `transport` is the only module that performs
//! I/O. Every gateway operation is a POST, so the method is implicit.

use serde_json::{Map, Value};

/// Ordered parameter mapping with unique keys.
///
/// Absent values are kept so that JSON bodies can carry them as `null`;
/// form bodies drop them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(&'static str, Option<String>)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value for the same key.
    pub fn insert(&mut self, key: &'static str, value: impl Into<String>) -> &mut Self {
        self.insert_opt(key, Some(value.into()))
    }

    pub fn insert_opt(&mut self, key: &'static str, value: Option<String>) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key/value pairs for a form-encoded body. Absent values are skipped.
    pub fn form_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (*k, v)))
    }

    /// JSON object for a structured body. Absent values become `null`.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| {
                let value = v.clone().map(Value::String).unwrap_or(Value::Null);
                (k.to_string(), value)
            })
            .collect();
        Value::Object(map)
    }
}

/// How the request payload is encoded. Exactly one per call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    Form(Params),
    Json(Params),
    /// Sent verbatim; its media type travels in the request headers.
    Raw(Vec<u8>),
}

impl Body {
    pub fn kind(&self) -> &'static str {
        match self {
            Body::Empty => "empty",
            Body::Form(_) => "form",
            Body::Json(_) => "json",
            Body::Raw(_) => "raw",
        }
    }

    /// The parameter mapping, for form and JSON bodies.
    pub fn params(&self) -> Option<&Params> {
        match self {
            Body::Form(params) | Body::Json(params) => Some(params),
            Body::Empty | Body::Raw(_) => None,
        }
    }
}

/// A gateway request described as plain data.
///
/// Built by the `NixzdClient` / `IsacClient` `build_*` methods and consumed
/// exactly once by `Transport::call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
    /// Status codes that mean "nothing to report" for this operation.
    pub accept_empty: Vec<u16>,
}

impl HttpRequest {
    pub fn post(url: String, body: Body) -> Self {
        Self {
            url,
            headers: Vec::new(),
            body,
            accept_empty: Vec::new(),
        }
    }

    /// Add a header, replacing any earlier value of the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn accepts_empty(&self, status: u16) -> bool {
        self.accept_empty.contains(&status)
    }
}

/// A gateway response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Map a response whose status was not in the accepted-empty set.
    ///
    /// Any 4xx/5xx status is an error; the body is kept for the diagnostic.
    pub fn into_envelope(self) -> Result<Envelope, crate::ClientError> {
        if self.status >= 400 {
            return Err(crate::ClientError::Status {
                status: self.status,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            });
        }
        Ok(Envelope::Body(self.body))
    }
}

/// Outcome of a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Body(Vec<u8>),
    /// The server answered with an accepted-empty status code.
    Empty,
}

impl Envelope {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Envelope::Body(bytes) => Some(bytes),
            Envelope::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;

    #[test]
    fn insert_replaces_existing_key() {
        let mut params = Params::new();
        params.insert("rc", "1").insert("lastname", "Novak").insert("rc", "2");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("rc"), Some("2"));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["rc", "lastname"]);
    }

    #[test]
    fn form_pairs_skip_absent_values() {
        let mut params = Params::new();
        params.insert("period", "01.01.2024 - 31.01.2024");
        params.insert_opt("status", None);
        params.insert_opt("username", Some("Jan Novak".to_string()));
        let pairs: Vec<_> = params.form_pairs().collect();
        assert_eq!(
            pairs,
            vec![
                ("period", "01.01.2024 - 31.01.2024"),
                ("username", "Jan Novak")
            ]
        );
        assert!(params.contains_key("status"));
    }

    #[test]
    fn json_body_keeps_absent_values_as_null() {
        let mut params = Params::new();
        params.insert("rc", "7001011234").insert_opt("to", None);
        assert_eq!(
            params.to_json(),
            serde_json::json!({"rc": "7001011234", "to": null})
        );
    }

    #[test]
    fn json_body_preserves_insertion_order() {
        let mut params = Params::new();
        params.insert("zeta", "1").insert("alpha", "2");
        let text = serde_json::to_string(&params.to_json()).unwrap();
        assert_eq!(text, r#"{"zeta":"1","alpha":"2"}"#);
    }

    #[test]
    fn accepted_empty_membership() {
        let mut req = HttpRequest::post("http://localhost/x".to_string(), Body::Empty);
        assert!(!req.accepts_empty(404));
        req.accept_empty = vec![404];
        assert!(req.accepts_empty(404));
        assert!(!req.accepts_empty(500));
    }

    #[test]
    fn header_overrides_replace_earlier_values() {
        let req = HttpRequest::post("http://localhost/x".to_string(), Body::Raw(b"x".to_vec()))
            .with_header("Content-Type", "text/plain")
            .with_header("content-type", "application/xml");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/xml".to_string())]
        );
    }

    #[test]
    fn success_status_yields_body() {
        let response = HttpResponse {
            status: 200,
            body: b"{}".to_vec(),
        };
        assert_eq!(
            response.into_envelope().unwrap(),
            Envelope::Body(b"{}".to_vec())
        );
    }

    #[test]
    fn error_status_is_reported_with_body() {
        let response = HttpResponse {
            status: 500,
            body: b"internal error".to_vec(),
        };
        let err = response.into_envelope().unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { status: 500, ref body } if body == "internal error"
        ));
    }

    #[test]
    fn not_found_is_an_error_unless_accepted() {
        let response = HttpResponse {
            status: 404,
            body: Vec::new(),
        };
        assert!(matches!(
            response.into_envelope(),
            Err(ClientError::Status { status: 404, .. })
        ));
    }
}
