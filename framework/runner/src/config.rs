use std::fmt::{Display, Formatter};
use std::time::Duration;

use bookwind_core::prelude::ConfigurationError;
use url::Url;

/// Per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between scenarios used when none is configured.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// The named deployments of the library API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetEnvironment {
    #[default]
    Dev,
    Staging,
    Prod,
}

impl TargetEnvironment {
    /// Look up an environment by name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dev" => Some(Self::Dev),
            "staging" => Some(Self::Staging),
            "prod" => Some(Self::Prod),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Dev => "http://localhost:8084/api",
            Self::Staging => "http://localhost:8085/api",
            Self::Prod => "http://localhost:8086/api",
        }
    }
}

impl Display for TargetEnvironment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Limits the run is judged against once every scenario has finished.
///
/// Suites against a service whose data is unknown use lenient values here, because many checks
/// legitimately fail with 404s on an empty deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub max_p95_latency_ms: u64,
    /// Highest tolerated `failed checks / total checks`.
    pub max_error_rate: f64,
    /// Highest tolerated fraction of requests ending with a status of 400 or above, or no
    /// response. Not evaluated when `None`.
    pub max_http_failure_rate: Option<f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_p95_latency_ms: 2000,
            max_error_rate: 0.1,
            max_http_failure_rate: Some(0.1),
        }
    }
}

impl Thresholds {
    pub const fn new(max_p95_latency_ms: u64, max_error_rate: f64) -> Self {
        Self {
            max_p95_latency_ms,
            max_error_rate,
            max_http_failure_rate: None,
        }
    }

    pub const fn with_max_http_failure_rate(mut self, rate: f64) -> Self {
        self.max_http_failure_rate = Some(rate);
        self
    }
}

/// Raw configuration input. Every field is optional and falls back to a default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub environment: Option<String>,
    pub headers: Vec<(String, String)>,
    pub max_p95_latency_ms: Option<u64>,
    pub max_error_rate: Option<f64>,
    pub max_http_failure_rate: Option<f64>,
    pub request_timeout: Option<Duration>,
    pub pacing: Option<Duration>,
}

/// The immutable configuration of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    base_url: String,
    environment: TargetEnvironment,
    headers: Vec<(String, String)>,
    thresholds: Thresholds,
    request_timeout: Duration,
    pacing: Duration,
}

impl RunConfig {
    /// Derive the run configuration from `overrides`, using `defaults` for any threshold that is
    /// not overridden.
    ///
    /// The base URL is taken from, in order: an explicit base URL, the named environment, then
    /// [TargetEnvironment::Dev]. An unknown environment name is not an error, it falls back to the
    /// default. This reads nothing but its arguments.
    pub fn resolve(
        overrides: &ConfigOverrides,
        defaults: Thresholds,
    ) -> Result<Self, ConfigurationError> {
        let environment = match overrides.environment.as_deref() {
            Some(name) => TargetEnvironment::from_name(name).unwrap_or_else(|| {
                log::warn!(
                    "Unknown environment [{}], falling back to [{}]",
                    name,
                    TargetEnvironment::default()
                );
                TargetEnvironment::default()
            }),
            None => TargetEnvironment::default(),
        };

        let base_url = match overrides.base_url.as_deref() {
            Some(base_url) => validate_base_url(base_url)?,
            None => environment.base_url().to_string(),
        };

        if let Some((name, _)) = overrides.headers.iter().find(|(name, _)| name.trim().is_empty()) {
            return Err(ConfigurationError::new(format!(
                "header name must not be empty, got [{}]",
                name
            )));
        }

        let thresholds = Thresholds {
            max_p95_latency_ms: overrides
                .max_p95_latency_ms
                .unwrap_or(defaults.max_p95_latency_ms),
            max_error_rate: validate_rate(
                "max error rate",
                overrides.max_error_rate.unwrap_or(defaults.max_error_rate),
            )?,
            max_http_failure_rate: overrides
                .max_http_failure_rate
                .or(defaults.max_http_failure_rate)
                .map(|rate| validate_rate("max HTTP failure rate", rate))
                .transpose()?,
        };

        let request_timeout = overrides.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(ConfigurationError::new("request timeout must be greater than zero"));
        }

        Ok(Self {
            base_url,
            environment,
            headers: overrides.headers.clone(),
            thresholds,
            request_timeout,
            pacing: overrides.pacing.unwrap_or(DEFAULT_PACING),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> TargetEnvironment {
        self.environment
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Join `path` onto the base URL, keeping any path prefix such as `/api`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Like [RunConfig::url], with form-encoded query parameters.
    pub fn url_with_query(&self, path: &str, query: &[(&str, &str)]) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();

        format!("{}?{}", self.url(path), query)
    }
}

fn validate_base_url(base_url: &str) -> Result<String, ConfigurationError> {
    let parsed = Url::parse(base_url).map_err(|e| {
        ConfigurationError::new(format!("base URL [{}] is not a valid URL: {}", base_url, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigurationError::new(format!(
            "base URL [{}] must use http or https",
            base_url
        )));
    }

    Ok(base_url.trim_end_matches('/').to_string())
}

fn validate_rate(name: &str, rate: f64) -> Result<f64, ConfigurationError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigurationError::new(format!(
            "{} must be between 0 and 1, got {}",
            name, rate
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_overrides_resolves_to_dev() {
        let config = RunConfig::resolve(&ConfigOverrides::default(), Thresholds::default()).unwrap();

        assert_eq!("http://localhost:8084/api", config.base_url());
        assert_eq!(TargetEnvironment::Dev, config.environment());
        assert_eq!(DEFAULT_REQUEST_TIMEOUT, config.request_timeout());
        assert_eq!(DEFAULT_PACING, config.pacing());
        assert_eq!(&Thresholds::default(), config.thresholds());
    }

    #[test]
    fn named_environment_selects_base_url() {
        let overrides = ConfigOverrides {
            environment: Some("Staging".to_string()),
            ..Default::default()
        };
        let config = RunConfig::resolve(&overrides, Thresholds::default()).unwrap();

        assert_eq!("http://localhost:8085/api", config.base_url());
        assert_eq!(TargetEnvironment::Staging, config.environment());
    }

    #[test]
    fn explicit_base_url_wins_over_environment() {
        let overrides = ConfigOverrides {
            base_url: Some("http://books.internal:9000/api/".to_string()),
            environment: Some("prod".to_string()),
            ..Default::default()
        };
        let config = RunConfig::resolve(&overrides, Thresholds::default()).unwrap();

        assert_eq!("http://books.internal:9000/api", config.base_url());
    }

    #[test]
    fn unknown_environment_falls_back_to_dev() {
        let overrides = ConfigOverrides {
            environment: Some("qa".to_string()),
            ..Default::default()
        };
        let config = RunConfig::resolve(&overrides, Thresholds::default()).unwrap();

        assert_eq!("http://localhost:8084/api", config.base_url());
        assert_eq!(TargetEnvironment::Dev, config.environment());
    }

    #[test]
    fn malformed_base_url_is_a_configuration_error() {
        for bad in ["localhost:8084/api", "not a url", "ftp://localhost/api"] {
            let overrides = ConfigOverrides {
                base_url: Some(bad.to_string()),
                ..Default::default()
            };
            assert!(
                RunConfig::resolve(&overrides, Thresholds::default()).is_err(),
                "expected [{bad}] to be rejected"
            );
        }
    }

    #[test]
    fn rates_must_be_fractions() {
        for rate in [-0.1, 1.5, f64::NAN] {
            let overrides = ConfigOverrides {
                max_error_rate: Some(rate),
                ..Default::default()
            };
            assert!(RunConfig::resolve(&overrides, Thresholds::default()).is_err());

            let overrides = ConfigOverrides {
                max_http_failure_rate: Some(rate),
                ..Default::default()
            };
            assert!(RunConfig::resolve(&overrides, Thresholds::default()).is_err());
        }
    }

    #[test]
    fn zero_timeout_and_empty_header_are_rejected() {
        let overrides = ConfigOverrides {
            request_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(RunConfig::resolve(&overrides, Thresholds::default()).is_err());

        let overrides = ConfigOverrides {
            headers: vec![(" ".to_string(), "x".to_string())],
            ..Default::default()
        };
        assert!(RunConfig::resolve(&overrides, Thresholds::default()).is_err());
    }

    #[test]
    fn overrides_replace_suite_defaults() {
        let defaults = Thresholds::new(3000, 0.5).with_max_http_failure_rate(0.5);
        let overrides = ConfigOverrides {
            max_error_rate: Some(0.2),
            ..Default::default()
        };
        let config = RunConfig::resolve(&overrides, defaults).unwrap();

        assert_eq!(
            &Thresholds {
                max_p95_latency_ms: 3000,
                max_error_rate: 0.2,
                max_http_failure_rate: Some(0.5),
            },
            config.thresholds()
        );
    }

    #[test]
    fn urls_keep_the_api_prefix() {
        let config = RunConfig::resolve(&ConfigOverrides::default(), Thresholds::default()).unwrap();

        assert_eq!("http://localhost:8084/api/books/top5", config.url("/books/top5"));
        assert_eq!("http://localhost:8084/api/authors/1", config.url("authors/1"));
        assert_eq!(
            "http://localhost:8084/api/books?title=Test+Book",
            config.url_with_query("/books", &[("title", "Test Book")])
        );
    }
}
