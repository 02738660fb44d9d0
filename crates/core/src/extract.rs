//! Best-effort field extraction from provider records of unknown shape.
//!
//! Every field is looked up through an ordered list of candidate keys; the
//! first candidate that yields a usable value wins. Only the price is
//! required, the other fields fall back to defaults or `None`.

use serde_json::Value;

use crate::models::RawRecord;

pub const PRICE_KEYS: [&str; 6] = [
    "price",
    "price_per_night",
    "min_price",
    "max_price",
    "amount",
    "cost",
];

pub const PRICE_RANGE_KEY: &str = "price_range";

pub const PRICE_RANGE_KEYS: [&str; 7] = ["min", "from", "start", "low", "price", "amount", "minimum"];

pub const RANGE_MIN_KEYS: [&str; 2] = ["min", "from"];

pub const RANGE_MAX_KEYS: [&str; 2] = ["max", "to"];

pub const SUB_ITEMS_KEY: &str = "foods";

pub const NAME_KEYS: [&str; 4] = ["name", "title", "hotel_name", "activity_name"];

pub const LOCATION_KEYS: [&str; 7] = [
    "city",
    "city_name",
    "region",
    "location",
    "destination",
    "area",
    "address",
];

pub const NESTED_LOCATION_KEYS: [&str; 4] = ["name", "city", "region", "address"];

pub const URL_KEYS: [&str; 4] = ["url", "link", "website", "booking_url"];

pub const ID_KEY: &str = "id";

pub const UNKNOWN_NAME: &str = "Unknown";

/// Where a derived price was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Direct(&'static str),
    Range(&'static str),
    SubItems,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub price: f64,
    pub price_source: PriceSource,
    pub min_price: f64,
    pub max_price: f64,
    pub name: String,
    pub location: Option<String>,
    pub url: Option<String>,
    pub identifier: Option<i64>,
}

/// Runs every field extractor over `record`. Returns `None` when no price can
/// be derived, which makes the record unusable.
pub fn extract_fields(record: &RawRecord) -> Option<ExtractedFields> {
    let (price, price_source) = extract_price(record)?;
    let (min_price, max_price) = extract_price_range(record, price);

    Some(ExtractedFields {
        price,
        price_source,
        min_price,
        max_price,
        name: extract_name(record),
        location: extract_location(record),
        url: extract_url(record),
        identifier: extract_identifier(record),
    })
}

/// Accepts finite numbers and numeric strings (thousands commas allowed).
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let cleaned = text.replace(',', "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };

    number.is_finite().then_some(number)
}

pub fn extract_price(record: &RawRecord) -> Option<(f64, PriceSource)> {
    if let Some((key, price)) = first_number(record, &PRICE_KEYS) {
        return Some((price, PriceSource::Direct(key)));
    }

    if let Some(Value::Object(range)) = record.get(PRICE_RANGE_KEY) {
        if let Some((key, price)) = first_number(range, &PRICE_RANGE_KEYS) {
            return Some((price, PriceSource::Range(key)));
        }
    }

    sub_items(record)
        .filter_map(|entry| extract_price(entry).map(|(price, _)| price))
        .reduce(f64::min)
        .map(|price| (price, PriceSource::SubItems))
}

pub fn extract_price_range(record: &RawRecord, price: f64) -> (f64, f64) {
    let Some(Value::Object(range)) = record.get(PRICE_RANGE_KEY) else {
        return (price, price);
    };

    let min_price = first_number(range, &RANGE_MIN_KEYS).map_or(price, |(_, value)| value);
    let max_price = first_number(range, &RANGE_MAX_KEYS).map_or(price, |(_, value)| value);
    (min_price, max_price)
}

pub fn extract_name(record: &RawRecord) -> String {
    NAME_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(display_text))
        .or_else(|| nested_city_name(record))
        .or_else(|| record.get("address").and_then(display_text))
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

pub fn extract_location(record: &RawRecord) -> Option<String> {
    LOCATION_KEYS
        .iter()
        .find_map(|key| match record.get(*key)? {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Object(nested) => NESTED_LOCATION_KEYS
                .iter()
                .find_map(|sub_key| non_empty_str(nested.get(*sub_key)?)),
            _ => None,
        })
        .or_else(|| nested_city_name(record))
}

pub fn extract_url(record: &RawRecord) -> Option<String> {
    URL_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(display_text))
}

pub fn extract_identifier(record: &RawRecord) -> Option<i64> {
    match record.get(ID_KEY)? {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn first_number(
    map: &RawRecord,
    keys: &[&'static str],
) -> Option<(&'static str, f64)> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(coerce_number).map(|value| (*key, value)))
}

fn sub_items(record: &RawRecord) -> impl Iterator<Item = &RawRecord> {
    let entries: &[Value] = match record.get(SUB_ITEMS_KEY) {
        Some(Value::Object(wrapper)) => match wrapper.get("data") {
            Some(Value::Array(entries)) => entries,
            _ => &[],
        },
        Some(Value::Array(entries)) => entries,
        _ => &[],
    };

    entries.iter().filter_map(Value::as_object)
}

fn nested_city_name(record: &RawRecord) -> Option<String> {
    match record.get("city")? {
        Value::Object(city) => non_empty_str(city.get("name")?),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// Renders scalar values that carry content: non-empty strings and non-zero numbers.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        _ => None,
    }
}
