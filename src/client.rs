//! HTTP client for the filings API with bounded retry.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FilingsError, Result};
use crate::location::{QueryState, PAGE_PARAM, SEARCH_PARAM};
use crate::models::{CompaniesPage, CompanyFilings};

const USER_AGENT: &str = concat!("filings/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Extra attempts after the first one fails with a retryable error.
    pub retries: u32,
    /// Delay before the first retry; doubles for each further retry.
    pub retry_delay: Duration,
    pub timeout: Duration,
}

/// Anything that can answer the two read-only queries the dashboard issues.
#[async_trait]
pub trait FilingsSource: Send + Sync {
    async fn list_companies(&self, state: &QueryState) -> Result<CompaniesPage>;
    async fn company_filings(&self, id: &str) -> Result<CompanyFilings>;
}

#[derive(Debug, Clone)]
pub struct FilingsClient {
    http: reqwest::Client,
    base_url: Url,
    retries: u32,
    retry_delay: Duration,
}

/// Make sure relative joins land under the base path instead of replacing
/// its last segment.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    Ok(url)
}

impl FilingsClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            retries: config.retries,
            retry_delay: config.retry_delay,
        })
    }

    pub fn companies_url(&self, state: &QueryState) -> Result<Url> {
        let mut url = self.base_url.join("companies")?;
        url.query_pairs_mut()
            .append_pair(PAGE_PARAM, &state.page.to_string())
            .append_pair(SEARCH_PARAM, &state.search);
        Ok(url)
    }

    pub fn company_url(&self, id: &str) -> Result<Url> {
        let mut url = self.base_url.join("companies/")?;
        url.path_segments_mut()
            .map_err(|_| FilingsError::Other(format!("cannot build a path under {}", self.base_url)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        with_retry(self.retries, self.retry_delay, || self.fetch_once(&url)).await
    }

    async fn fetch_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FilingsError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        decode_body(&body)
    }
}

#[async_trait]
impl FilingsSource for FilingsClient {
    async fn list_companies(&self, state: &QueryState) -> Result<CompaniesPage> {
        let url = self.companies_url(state)?;
        self.get_json(url).await
    }

    async fn company_filings(&self, id: &str) -> Result<CompanyFilings> {
        let url = self.company_url(id)?;
        self.get_json(url).await
    }
}

fn error_field(value: &serde_json::Value) -> Option<String> {
    match value.get("error")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The `error` field of a JSON object body, if there is one.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    error_field(&value)
}

/// Decode a successful body. A body carrying `error` is an application
/// error even though the status said otherwise.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(message) = error_field(&value) {
        return Err(FilingsError::Application(message));
    }
    Ok(serde_json::from_value(value)?)
}

/// Run `op` until it succeeds, fails with a non-retryable error, or
/// `retries` extra attempts have been spent.
pub async fn with_retry<T, F, Fut>(retries: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < retries => {
                let wait = delay.saturating_mul(2u32.saturating_pow(attempt));
                attempt += 1;
                warn!(attempt, retries, error = %e, "request failed, retrying in {wait:?}");
                sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}
