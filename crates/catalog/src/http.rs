use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use tripwise_core::{BudgetSubmission, RawRecord};

use crate::error::CatalogError;
use crate::{extract_record_list, CatalogProvider, SubmissionReceipt, BUDGETS_ENDPOINT};

pub const DEFAULT_BASE_URL: &str = "https://insidethekingdom.online/api";

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            connect_timeout: Duration::from_secs(6),
            timeout: Duration::from_secs(20),
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = env::var("TRIPWISE_PROVIDER_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.base_url);
        let token = env::var("TRIPWISE_PROVIDER_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let timeout = env::var("TRIPWISE_PROVIDER_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            base_url,
            token,
            connect_timeout: defaults.connect_timeout,
            timeout,
        }
    }
}

#[derive(Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = config.token.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("provider token is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .context("failed to build provider HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_matches('/'))
    }
}

impl CatalogProvider for HttpCatalog {
    #[instrument(skip(self))]
    async fn fetch_endpoint(&self, endpoint: &str) -> Result<Vec<RawRecord>, CatalogError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|source| CatalogError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
                body: None,
            });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|error| CatalogError::Decode {
                endpoint: endpoint.to_string(),
                message: error.to_string(),
            })?;

        let records = extract_record_list(endpoint, payload)?;
        debug!(endpoint, records = records.len(), "provider list fetched");
        Ok(records)
    }

    #[instrument(skip(self, submission), fields(to_city_id = submission.to_city_id))]
    async fn create_budget(
        &self,
        submission: &BudgetSubmission,
    ) -> Result<SubmissionReceipt, CatalogError> {
        let response = self
            .client
            .post(self.url(BUDGETS_ENDPOINT))
            .json(submission)
            .send()
            .await
            .map_err(|source| CatalogError::Transport {
                endpoint: BUDGETS_ENDPOINT.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| CatalogError::Transport {
                endpoint: BUDGETS_ENDPOINT.to_string(),
                source,
            })?;

        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(CatalogError::Status {
                endpoint: BUDGETS_ENDPOINT.to_string(),
                status: status.as_u16(),
                body: Some(text),
            });
        }

        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        Ok(SubmissionReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_url_and_endpoint() {
        let catalog = HttpCatalog::new(CatalogConfig {
            base_url: "https://example.test/api/".to_string(),
            token: Some("secret".to_string()),
            ..CatalogConfig::default()
        })
        .unwrap();

        assert_eq!(catalog.base_url(), "https://example.test/api");
        assert_eq!(catalog.url("/hotels/"), "https://example.test/api/hotels");
    }

    #[test]
    fn rejects_token_with_newline() {
        let result = HttpCatalog::new(CatalogConfig {
            token: Some("bad\ntoken".to_string()),
            ..CatalogConfig::default()
        });
        assert!(result.is_err());
    }
}
