use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::AppConfig;
use crate::errors::EtlError;
use crate::models::{Customer, Order, Product};
use crate::retry::{with_retry, RetryConfig};

/// Typed client for the remote data endpoints.
///
/// Every call runs under a bounded-retry policy: transport failures and
/// server-side errors (5xx, 429) are retried with exponential backoff and
/// jitter, other 4xx and body-decode failures surface immediately.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    retry: RetryConfig,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, EtlError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, EtlError> {
        let retry = RetryConfig {
            max_attempts: cfg.api_max_retries,
            initial_delay: Duration::from_millis(cfg.api_retry_initial_delay_ms),
            max_delay: Duration::from_millis(cfg.api_retry_max_delay_ms),
            backoff_factor: 2.0,
        };
        Self::new(
            &cfg.api_url,
            Duration::from_secs(cfg.api_timeout_secs),
            retry,
        )
    }

    /// Fetches the full customer collection.
    #[instrument(skip(self))]
    pub async fn fetch_customers(&self) -> Result<Vec<Customer>, EtlError> {
        self.get_collection("customers", &[]).await
    }

    /// Fetches the full product collection.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Vec<Product>, EtlError> {
        self.get_collection("products", &[]).await
    }

    /// Fetches the orders for one partition date; filtering happens
    /// server-side via the `order_date` query parameter.
    #[instrument(skip(self), fields(date = %date))]
    pub async fn fetch_orders(&self, date: NaiveDate) -> Result<Vec<Order>, EtlError> {
        let date = date.format("%Y-%m-%d").to_string();
        self.get_collection("orders", &[("order_date", date.as_str())])
            .await
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, EtlError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let records = with_retry(&self.retry, |e: &EtlError| e.is_retryable(), || {
            self.get_once(&url, query)
        })
        .await?;
        debug!(endpoint, records = records.len(), "collection fetched");
        Ok(records)
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, EtlError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::ExternalApi {
                status,
                endpoint: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}
