use bookwind_core::prelude::ParseError;
use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;

/// A single request to send to the system under test.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Bytes>,
    /// Per-request headers. These win over the client defaults, compared case-insensitively.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, ParseError> {
        let body = serde_json::to_vec(value).map_err(|e| ParseError::new(e.to_string()))?;
        Ok(self.with_body(body))
    }
}
