use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use bookwind_core::prelude::ParseError;
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Everything a check can see about a response.
///
/// The body is kept as opaque bytes. Structured access goes through [ResponseDescriptor::json],
/// which fails with a [ParseError] rather than guessing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub body: Bytes,
    /// Header names are stored lowercase. A header received more than once keeps every value,
    /// joined with `", "` in the order received.
    pub headers: HashMap<String, String>,
    /// Wall-clock time from sending the request until the body was fully read.
    pub elapsed: Duration,
}

impl ResponseDescriptor {
    pub fn new(
        status: u16,
        headers: impl IntoIterator<Item = (String, String)>,
        body: impl Into<Bytes>,
        elapsed: Duration,
    ) -> Self {
        let mut merged = HashMap::<String, String>::new();
        for (name, value) in headers {
            merged
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.clone());
        }

        Self {
            status,
            body: body.into(),
            headers: merged,
            elapsed,
        }
    }

    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Look up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ParseError::new(format!(
                "status {} body is not the expected JSON: {}",
                self.status, e
            ))
        })
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_micros() as f64 / 1000.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn response(status: u16, body: &'static str) -> ResponseDescriptor {
        ResponseDescriptor::new(
            status,
            [
                ("Content-Type".to_string(), "application/json".to_string()),
                ("ETag".to_string(), "\"abc\"".to_string()),
            ],
            body,
            Duration::from_millis(12),
        )
    }

    #[test]
    fn headers_are_case_insensitive() {
        let res = response(200, "{}");

        assert_eq!(Some("application/json"), res.header("content-type"));
        assert_eq!(Some("\"abc\""), res.header("Etag"));
        assert!(res.has_header("ETAG"));
        assert!(!res.has_header("Last-Modified"));
    }

    #[test]
    fn repeated_headers_keep_every_value() {
        let res = ResponseDescriptor::new(
            200,
            [
                ("Set-Cookie".to_string(), "session=1".to_string()),
                ("set-cookie".to_string(), "theme=dark".to_string()),
                ("ETag".to_string(), "\"abc\"".to_string()),
            ],
            "",
            Duration::ZERO,
        );

        assert_eq!(Some("session=1, theme=dark"), res.header("Set-Cookie"));
        assert_eq!(Some("\"abc\""), res.header("etag"));
    }

    #[test]
    fn status_classes() {
        assert!(response(200, "").is_success());
        assert!(response(204, "").is_success());
        assert!(!response(404, "").is_success());
        assert!(response(404, "").is_not_found());
    }

    #[test]
    fn json_parse_failure_is_reported() {
        let res = response(200, "<html>oops</html>");
        let parsed = res.json::<serde_json::Value>();

        let err = parsed.unwrap_err();
        assert!(err.to_string().contains("status 200"));
    }

    #[test]
    fn json_parses_structured_body() {
        let res = response(200, r#"[{"isbn":"9782826012092"}]"#);
        let parsed: serde_json::Value = res.json().unwrap();

        assert_eq!("9782826012092", parsed[0]["isbn"]);
        assert_eq!(12.0, res.elapsed_ms());
    }
}
