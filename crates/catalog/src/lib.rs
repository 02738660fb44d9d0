mod error;
mod http;
mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tripwise_core::{BudgetSubmission, Category, RawRecord};

pub use error::CatalogError;
pub use http::{CatalogConfig, HttpCatalog};
pub use memory::MemoryCatalog;

pub const CITIES_ENDPOINT: &str = "cities";
pub const BUDGETS_ENDPOINT: &str = "budgets";

/// Endpoints that can be read raw through the catalog.
pub const LIST_ENDPOINTS: [&str; 5] = ["activities", "hotels", "plains", "restaurants", CITIES_ENDPOINT];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub body: Value,
}

pub trait CatalogProvider: Send + Sync {
    async fn fetch_endpoint(&self, endpoint: &str) -> Result<Vec<RawRecord>, CatalogError>;

    async fn create_budget(
        &self,
        submission: &BudgetSubmission,
    ) -> Result<SubmissionReceipt, CatalogError>;

    async fn fetch_records(&self, category: Category) -> Result<Vec<RawRecord>, CatalogError> {
        self.fetch_endpoint(category.endpoint()).await
    }

    async fn fetch_cities(&self) -> Result<Vec<RawRecord>, CatalogError> {
        self.fetch_endpoint(CITIES_ENDPOINT).await
    }
}

/// Pulls the record list out of a provider response: a bare list, or an
/// object wrapping the list under `data` or `items`.
pub fn extract_record_list(endpoint: &str, payload: Value) -> Result<Vec<RawRecord>, CatalogError> {
    let list = match payload {
        Value::Array(list) => list,
        Value::Object(mut object) => match (object.remove("data"), object.remove("items")) {
            (Some(Value::Array(list)), _) => list,
            (_, Some(Value::Array(list))) => list,
            _ => {
                return Err(CatalogError::UnexpectedShape {
                    endpoint: endpoint.to_string(),
                })
            }
        },
        _ => {
            return Err(CatalogError::UnexpectedShape {
                endpoint: endpoint.to_string(),
            })
        }
    };

    Ok(list
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect())
}

#[derive(Clone)]
pub enum Catalog {
    Http(HttpCatalog),
    Memory(MemoryCatalog),
}

impl Catalog {
    pub fn http(config: CatalogConfig) -> anyhow::Result<Self> {
        Ok(Self::Http(HttpCatalog::new(config)?))
    }

    pub fn memory(catalog: MemoryCatalog) -> Self {
        Self::Memory(catalog)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Catalog::Http(_) => "http",
            Catalog::Memory(_) => "memory",
        }
    }
}

impl CatalogProvider for Catalog {
    async fn fetch_endpoint(&self, endpoint: &str) -> Result<Vec<RawRecord>, CatalogError> {
        match self {
            Catalog::Http(catalog) => catalog.fetch_endpoint(endpoint).await,
            Catalog::Memory(catalog) => catalog.fetch_endpoint(endpoint).await,
        }
    }

    async fn create_budget(
        &self,
        submission: &BudgetSubmission,
    ) -> Result<SubmissionReceipt, CatalogError> {
        match self {
            Catalog::Http(catalog) => catalog.create_budget(submission).await,
            Catalog::Memory(catalog) => catalog.create_budget(submission).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_list_data_and_items_shapes() {
        let bare = extract_record_list("hotels", json!([{ "id": 1 }, 5, { "id": 2 }])).unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped = extract_record_list("hotels", json!({ "data": [{ "id": 1 }] })).unwrap();
        assert_eq!(wrapped.len(), 1);

        let items = extract_record_list("hotels", json!({ "data": null, "items": [{}, {}] })).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn rejects_other_shapes() {
        let error = extract_record_list("plains", json!({ "message": "ok" })).unwrap_err();
        assert!(matches!(error, CatalogError::UnexpectedShape { endpoint } if endpoint == "plains"));
        assert!(extract_record_list("plains", json!("nope")).is_err());
    }
}
