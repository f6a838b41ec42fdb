//! HTTP implementation of the existence check.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::cascade::ChoicesPage;
use crate::checker::CheckOutcome;
use crate::checker::ExistenceChecker;
use crate::error::CheckError;

/// Runs existence checks and autocomplete lookups over HTTP.
///
/// This client is cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use training_lib::HttpChecker;
///
/// let checker = HttpChecker::new("http://localhost:8000")?
///     .with_timeout(Duration::from_secs(5));
///
/// let outcome = checker
///     .check("/validators/check-username/", &[("username".into(), "alice".into())])
///     .await?;
/// ```
#[derive(Clone)]
pub struct HttpChecker {
    inner: Arc<HttpCheckerInner>,
}

struct HttpCheckerInner {
    base_url: Url,
    http_client: Client,
    timeout: Option<Duration>,
}

impl HttpChecker {
    /// Creates a checker that resolves endpoint paths against `base_url`.
    pub fn new(base_url: &str) -> Result<Self, CheckError> {
        let base_url = Url::parse(base_url).map_err(|e| CheckError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            inner: Arc::new(HttpCheckerInner {
                base_url,
                http_client: Client::new(),
                timeout: None,
            }),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(HttpCheckerInner {
                base_url: self.inner.base_url.clone(),
                http_client: self.inner.http_client.clone(),
                timeout: Some(timeout),
            }),
        }
    }

    /// Builds the full request URL for an endpoint and its parameters.
    pub fn endpoint_url(&self, endpoint: &str, params: &[(String, String)]) -> Result<Url, CheckError> {
        let mut url = self
            .inner
            .base_url
            .join(endpoint)
            .map_err(|e| CheckError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Fetches one page of autocomplete choices for a dependent select.
    pub async fn choices(&self, endpoint: &str, params: &[(String, String)]) -> Result<ChoicesPage, CheckError> {
        self.get_json(endpoint, params).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(String, String)]) -> Result<T, CheckError> {
        let url = self.endpoint_url(endpoint, params)?;
        log::debug!("GET {}", url);

        let mut request = self.inner.http_client.get(url);
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(CheckError::http(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| CheckError::parse_with_body(e.to_string(), body))
    }

    fn map_send_error(&self, error: reqwest::Error) -> CheckError {
        match self.inner.timeout {
            Some(timeout) if error.is_timeout() => CheckError::Timeout(timeout),
            _ => CheckError::Network(error),
        }
    }
}

#[async_trait]
impl ExistenceChecker for HttpChecker {
    async fn check(&self, endpoint: &str, params: &[(String, String)]) -> Result<CheckOutcome, CheckError> {
        let body: serde_json::Value = self.get_json(endpoint, params).await?;
        Ok(CheckOutcome::from_json(&body))
    }
}

impl std::fmt::Debug for HttpChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChecker")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}
