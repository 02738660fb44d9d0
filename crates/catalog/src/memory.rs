use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tripwise_core::{BudgetSubmission, RawRecord};

use crate::error::CatalogError;
use crate::{extract_record_list, CatalogProvider, SubmissionReceipt, BUDGETS_ENDPOINT, LIST_ENDPOINTS};

/// Serves fixed record lists and keeps every submitted budget in memory.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    endpoints: Arc<RwLock<HashMap<String, Vec<RawRecord>>>>,
    failing: Arc<RwLock<HashMap<String, u16>>>,
    submissions: Arc<RwLock<Vec<BudgetSubmission>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(self, endpoint: &str, records: Vec<RawRecord>) -> Self {
        self.endpoints.write().insert(endpoint.to_string(), records);
        self
    }

    /// Makes every call to `endpoint` fail with `status`.
    pub fn with_failure(self, endpoint: &str, status: u16) -> Self {
        self.failing.write().insert(endpoint.to_string(), status);
        self
    }

    /// Loads `<endpoint>.json` for each known list endpoint found in `dir`.
    pub fn from_fixture_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let catalog = Self::new();

        for endpoint in LIST_ENDPOINTS {
            let path = dir.join(format!("{endpoint}.json"));
            if !path.exists() {
                continue;
            }

            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed reading fixture {}", path.display()))?;
            let payload: Value = serde_json::from_str(&raw)
                .with_context(|| format!("fixture {} is not valid JSON", path.display()))?;
            let records = extract_record_list(endpoint, payload)
                .with_context(|| format!("fixture {} has no record list", path.display()))?;

            catalog.endpoints.write().insert(endpoint.to_string(), records);
        }

        Ok(catalog)
    }

    pub fn submissions(&self) -> Vec<BudgetSubmission> {
        self.submissions.read().clone()
    }

    fn check_failure(&self, endpoint: &str) -> Result<(), CatalogError> {
        match self.failing.read().get(endpoint) {
            Some(status) => Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status: *status,
                body: None,
            }),
            None => Ok(()),
        }
    }
}

impl CatalogProvider for MemoryCatalog {
    async fn fetch_endpoint(&self, endpoint: &str) -> Result<Vec<RawRecord>, CatalogError> {
        self.check_failure(endpoint)?;
        Ok(self
            .endpoints
            .read()
            .get(endpoint)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_budget(
        &self,
        submission: &BudgetSubmission,
    ) -> Result<SubmissionReceipt, CatalogError> {
        self.check_failure(BUDGETS_ENDPOINT)?;

        let mut submissions = self.submissions.write();
        submissions.push(submission.clone());
        Ok(SubmissionReceipt {
            status: 201,
            body: json!({ "id": submissions.len(), "name": submission.name }),
        })
    }
}
