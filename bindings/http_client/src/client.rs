use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bookwind_core::prelude::TransportError;
use bookwind_instruments::{OperationRecord, Reporter};
use reqwest::{Client, Method, Url};
use serde::Serialize;

use crate::request::HttpRequest;
use crate::response::ResponseDescriptor;

const CONTENT_TYPE: &str = "Content-Type";
const JSON: &str = "application/json";

/// HTTP client that records the timing of every request with the run's [Reporter].
///
/// Exactly one attempt is made per request. Any response, whatever its status, is returned as a
/// [ResponseDescriptor]. Only a failure to get a response at all is an error.
#[derive(Debug, Clone)]
pub struct HttpClientInstrumented {
    client: Client,
    reporter: Arc<Reporter>,
    default_headers: Vec<(String, String)>,
    timeout: Duration,
}

impl HttpClientInstrumented {
    /// Create a client with a per-request `timeout` and headers sent with every request.
    ///
    /// `Content-Type: application/json` is added to the defaults unless `default_headers` already
    /// sets a content type.
    pub fn new(
        reporter: Arc<Reporter>,
        timeout: Duration,
        default_headers: Vec<(String, String)>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("bookwind/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            reporter,
            default_headers: merge_headers(&[(CONTENT_TYPE.to_string(), JSON.to_string())], &default_headers),
            timeout,
        })
    }

    pub async fn get(&self, url: &str) -> Result<ResponseDescriptor, TransportError> {
        self.execute(HttpRequest::get(url)).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<ResponseDescriptor, TransportError> {
        let request = HttpRequest::post(url)
            .with_json_body(payload)
            .map_err(|e| TransportError::Other {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        self.execute(request).await
    }

    pub async fn execute(&self, request: HttpRequest) -> Result<ResponseDescriptor, TransportError> {
        let url = Url::parse(&request.url).map_err(|e| TransportError::InvalidUrl {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let mut record = OperationRecord::new(operation_id(&request.method, &url));
        let result = self.send(&request, url).await;

        let elapsed = record.finish(result.as_ref().ok().map(|(status, ..)| *status));
        self.reporter.add_operation(record);

        let (status, headers, body) = result?;
        log::debug!(
            "{} {} -> {} in {}ms",
            request.method,
            request.url,
            status,
            elapsed.as_millis()
        );

        Ok(ResponseDescriptor::new(status, headers, body, elapsed))
    }

    async fn send(
        &self,
        request: &HttpRequest,
        url: Url,
    ) -> Result<(u16, Vec<(String, String)>, bytes::Bytes), TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .timeout(self.timeout);

        for (name, value) in merge_headers(&self.default_headers, &request.headers) {
            builder = builder.header(name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_error(e, &request.url))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect::<Vec<_>>();

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_error(e, &request.url))?;

        Ok((status, headers, body))
    }

    fn map_error(&self, error: reqwest::Error, url: &str) -> TransportError {
        let url = url.to_string();
        if error.is_timeout() {
            return TransportError::Timeout {
                url,
                timeout_ms: self.timeout.as_millis() as u64,
            };
        }

        if error.is_connect() {
            return TransportError::Connect {
                url,
                message: error.to_string(),
            };
        }

        TransportError::Other {
            url,
            message: error.to_string(),
        }
    }
}

/// Name used to group requests in the latency report, for example `GET /api/books?genre=Fiction`.
fn operation_id(method: &Method, url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{} {}?{}", method, url.path(), query),
        None => format!("{} {}", method, url.path()),
    }
}

/// Layer `overrides` over `base`. Header names are compared case-insensitively and an override
/// replaces the base value in place.
fn merge_headers(base: &[(String, String)], overrides: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged = base.to_vec();
    for (name, value) in overrides {
        match merged
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => *entry = (name.clone(), value.clone()),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}
