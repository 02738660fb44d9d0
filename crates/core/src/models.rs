use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PlanError;

/// One record exactly as the provider returned it.
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hotels,
    Food,
    Activities,
    Transport,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Hotels, Self::Food, Self::Activities, Self::Transport];

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Hotels => "hotels",
            Self::Food => "food",
            Self::Activities => "activities",
            Self::Transport => "transport",
        }
    }

    /// Path segment the provider serves this category under.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Hotels => "hotels",
            Self::Food => "restaurants",
            Self::Activities => "activities",
            Self::Transport => "plains",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hotels => "hotels",
            Self::Food => "restaurants",
            Self::Activities => "activities",
            Self::Transport => "transport/flights",
        }
    }

    pub fn submission_tag(self) -> &'static str {
        match self {
            Self::Hotels => "hotel",
            Self::Food => "restaurant",
            Self::Activities => "activities",
            Self::Transport => "plane",
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Self::Hotels => "night",
            Self::Food => "meal day",
            Self::Activities => "activity",
            Self::Transport => "round trip",
        }
    }

    pub fn default_description(self) -> &'static str {
        match self {
            Self::Hotels => "Hotel budget",
            Self::Food => "Restaurant budget",
            Self::Activities => "Activities budget",
            Self::Transport => "Transport budget",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    #[serde(rename = "id")]
    pub identifier: Option<i64>,
    pub name: String,
    pub price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub location: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "raw")]
    pub source_payload: RawRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetPercentages {
    pub hotels: f64,
    pub food: f64,
    pub activities: f64,
    pub transport: f64,
}

impl Default for BudgetPercentages {
    fn default() -> Self {
        Self {
            hotels: 0.4,
            food: 0.25,
            activities: 0.2,
            transport: 0.15,
        }
    }
}

impl BudgetPercentages {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Hotels => self.hotels,
            Category::Food => self.food,
            Category::Activities => self.activities,
            Category::Transport => self.transport,
        }
    }

    pub fn total(&self) -> f64 {
        self.hotels + self.food + self.activities + self.transport
    }

    /// Parses `hotels,food,activities,transport` ratios, e.g. `0.4,0.25,0.2,0.15`.
    pub fn parse_list(value: &str) -> Option<Self> {
        let parts = value
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;

        match parts.as_slice() {
            [hotels, food, activities, transport] => Some(Self {
                hotels: *hotels,
                food: *food,
                activities: *activities,
                transport: *transport,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudgets {
    pub hotels: f64,
    pub food: f64,
    pub activities: f64,
    pub transport: f64,
}

impl CategoryBudgets {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Hotels => self.hotels,
            Category::Food => self.food,
            Category::Activities => self.activities,
            Category::Transport => self.transport,
        }
    }

    pub fn total(&self) -> f64 {
        self.hotels + self.food + self.activities + self.transport
    }

    pub fn as_map(&self) -> BTreeMap<String, f64> {
        Category::ALL
            .iter()
            .map(|category| (category.as_code().to_string(), self.get(*category)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub per_person_total: f64,
    pub per_person_per_day: f64,
    pub budgets_per_day: CategoryBudgets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub budget_per_day: f64,
    pub suggested_items: Vec<NormalizedItem>,
    pub within_budget: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlanResult {
    pub per_person_total: f64,
    pub per_person_per_day: f64,
    pub budgets_per_day: BTreeMap<String, f64>,
    pub hotels: CategorySuggestion,
    pub food: CategorySuggestion,
    pub activities: CategorySuggestion,
    pub transport: CategorySuggestion,
}

impl TripPlanResult {
    pub fn suggestion(&self, category: Category) -> &CategorySuggestion {
        match category {
            Category::Hotels => &self.hotels,
            Category::Food => &self.food,
            Category::Activities => &self.activities,
            Category::Transport => &self.transport,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub total_budget: f64,
    pub people_count: u32,
    pub days: u32,
    pub destination: String,
    #[serde(default)]
    pub city_id: Option<i64>,
    #[serde(default)]
    pub percentages: Option<BudgetPercentages>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub from_city_id: Option<i64>,
    #[serde(default)]
    pub to_city_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl TripRequest {
    pub fn new(total_budget: f64, people_count: u32, days: u32, destination: &str) -> Self {
        Self {
            total_budget,
            people_count,
            days,
            destination: destination.to_string(),
            city_id: None,
            percentages: None,
            name: None,
            address: None,
            from_city_id: None,
            to_city_id: None,
            user_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.total_budget.is_finite() || self.total_budget <= 0.0 {
            return Err(PlanError::InvalidRequest(
                "total_budget must be greater than zero".to_string(),
            ));
        }
        if self.people_count == 0 {
            return Err(PlanError::InvalidRequest(
                "people_count must be greater than zero".to_string(),
            ));
        }
        if self.days == 0 {
            return Err(PlanError::InvalidRequest(
                "days must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn percentages_or_default(&self) -> BudgetPercentages {
        self.percentages.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
}

impl City {
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        let id = record.get("id").and_then(Value::as_i64)?;
        let name = record.get("name").and_then(Value::as_str)?;
        Some(Self {
            id,
            name: name.to_string(),
        })
    }

    pub fn roster(records: &[RawRecord]) -> Vec<Self> {
        records.iter().filter_map(Self::from_record).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLineItem {
    pub type_id: i64,
    pub amount: f64,
    pub types: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSubEntry {
    #[serde(rename = "type")]
    pub category_tag: String,
    #[serde(rename = "presentaige")]
    pub percentage: i64,
    pub description: String,
    pub items: Vec<BudgetLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSubmission {
    pub name: String,
    pub address: String,
    pub teams_number: u32,
    pub days: u32,
    pub amount: String,
    pub from_city_id: i64,
    pub to_city_id: i64,
    pub user_id: i64,
    pub budget_sub: Vec<BudgetSubEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_default_when_fields_missing() {
        let parsed: BudgetPercentages = serde_json::from_str(r#"{"hotels": 0.5}"#).unwrap();
        assert_eq!(parsed.hotels, 0.5);
        assert_eq!(parsed.food, 0.25);
        assert_eq!(parsed.transport, 0.15);
    }

    #[test]
    fn parses_percentage_list() {
        let parsed = BudgetPercentages::parse_list("0.5, 0.2,0.2,0.1").unwrap();
        assert_eq!(parsed.hotels, 0.5);
        assert_eq!(parsed.transport, 0.1);
        assert!(BudgetPercentages::parse_list("0.5,0.5").is_none());
        assert!(BudgetPercentages::parse_list("a,b,c,d").is_none());
    }

    #[test]
    fn rejects_zero_people() {
        let mut request = TripRequest::new(1000.0, 2, 3, "Riyadh");
        assert!(request.validate().is_ok());
        request.people_count = 0;
        assert!(matches!(
            request.validate(),
            Err(PlanError::InvalidRequest(_))
        ));
    }

    #[test]
    fn city_roster_skips_malformed_entries() {
        let records: Vec<RawRecord> = serde_json::from_value(serde_json::json!([
            { "id": 1, "name": "Riyadh" },
            { "id": "2", "name": "Jeddah" },
            { "id": 3 },
            { "id": 4, "name": "Abha" }
        ]))
        .unwrap();

        let roster = City::roster(&records);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[1].name, "Abha");
    }

    #[test]
    fn normalized_item_uses_wire_names() {
        let item = NormalizedItem {
            identifier: Some(7),
            name: "Hilton".to_string(),
            price: 10.0,
            min_price: 10.0,
            max_price: 10.0,
            location: None,
            url: None,
            source_payload: RawRecord::new(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["id"], 7);
        assert!(value.get("raw").is_some());
    }
}
