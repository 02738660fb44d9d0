use serde::Serialize;

use crate::extract::{extract_fields, ExtractedFields};
use crate::models::{NormalizedItem, RawRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NoPrice,
    DestinationMismatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub received: usize,
    pub kept: usize,
    pub dropped_no_price: usize,
    pub dropped_destination: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.dropped_no_price + self.dropped_destination
    }

    fn record(&mut self, outcome: Result<(), DropReason>) {
        self.received += 1;
        match outcome {
            Ok(()) => self.kept += 1,
            Err(DropReason::NoPrice) => self.dropped_no_price += 1,
            Err(DropReason::DestinationMismatch) => self.dropped_destination += 1,
        }
    }
}

/// Normalizes one raw record, or says why it was dropped.
pub fn normalize_record(record: &RawRecord, destination: &str) -> Result<NormalizedItem, DropReason> {
    let fields = extract_fields(record).ok_or(DropReason::NoPrice)?;

    if let Some(location) = fields.location.as_deref() {
        if !matches_destination(location, destination) {
            return Err(DropReason::DestinationMismatch);
        }
    }

    Ok(into_item(fields, record))
}

/// Locations that do not mention the destination are excluded. An empty
/// destination matches everything.
pub fn matches_destination(location: &str, destination: &str) -> bool {
    let needle = destination.trim().to_lowercase();
    location.to_lowercase().contains(&needle)
}

pub fn normalize_with_report(
    records: &[RawRecord],
    destination: &str,
) -> (Vec<NormalizedItem>, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let mut items = Vec::with_capacity(records.len());

    for record in records {
        let outcome = normalize_record(record, destination);
        report.record(outcome.as_ref().map(|_| ()).map_err(|reason| *reason));
        if let Ok(item) = outcome {
            items.push(item);
        }
    }

    // sort_by is stable, so equal prices keep input order
    items.sort_by(|a, b| a.price.total_cmp(&b.price));
    (items, report)
}

pub fn normalize_records(records: &[RawRecord], destination: &str) -> Vec<NormalizedItem> {
    normalize_with_report(records, destination).0
}

fn into_item(fields: ExtractedFields, record: &RawRecord) -> NormalizedItem {
    NormalizedItem {
        identifier: fields.identifier,
        name: fields.name,
        price: fields.price,
        min_price: fields.min_price,
        max_price: fields.max_price,
        location: fields.location,
        url: fields.url,
        source_payload: record.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn records(value: Value) -> Vec<RawRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn destination_filter_cases() {
        let input = records(json!([
            { "id": 1, "price": 300, "location": "Jeddah, Saudi Arabia" },
            { "id": 2, "price": 200, "location": "Riyadh" },
            { "id": 3, "price": 100 }
        ]));

        let (items, report) = normalize_with_report(&input, "  jeddah ");
        let ids = items.iter().map(|item| item.identifier).collect::<Vec<_>>();
        assert_eq!(ids, vec![Some(3), Some(1)]);
        assert_eq!(report.dropped_destination, 1);

        let items = normalize_records(&input, "Jeddah");
        assert!(items.iter().all(|item| item.identifier != Some(2)));
    }

    #[test]
    fn counts_unusable_records() {
        let input = records(json!([
            { "name": "no price at all" },
            { "name": "bad price", "price": "n/a" },
            { "name": "ok", "price": "12" }
        ]));

        let (items, report) = normalize_with_report(&input, "anywhere");
        assert_eq!(items.len(), 1);
        assert_eq!(report.received, 3);
        assert_eq!(report.dropped_no_price, 2);
        assert_eq!(report.dropped(), 2);
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn keeps_raw_payload_and_defaults() {
        let input = records(json!([{ "title": "Camel ride", "cost": 75, "extra": [1, 2] }]));
        let items = normalize_records(&input, "AlUla");
        assert_eq!(items[0].name, "Camel ride");
        assert_eq!(items[0].identifier, None);
        assert_eq!(items[0].source_payload["extra"], json!([1, 2]));
    }

    #[test]
    fn equal_prices_keep_input_order() {
        let input = records(json!([
            { "id": 10, "price": 50 },
            { "id": 11, "price": 20 },
            { "id": 12, "price": 50 }
        ]));
        let ids = normalize_records(&input, "x")
            .iter()
            .map(|item| item.identifier.unwrap())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![11, 10, 12]);
    }

    proptest! {
        #[test]
        fn output_is_sorted_by_price(
            prices in prop::collection::vec(prop::option::of(-1000.0f64..100_000.0), 0..40)
        ) {
            let input = prices
                .iter()
                .map(|price| {
                    let mut record = RawRecord::new();
                    if let Some(price) = price {
                        record.insert("price".to_string(), json!(price));
                    }
                    record
                })
                .collect::<Vec<_>>();

            let (items, report) = normalize_with_report(&input, "riyadh");
            prop_assert!(items.windows(2).all(|pair| pair[0].price <= pair[1].price));
            prop_assert_eq!(report.kept, items.len());
            prop_assert_eq!(report.dropped_no_price, prices.iter().filter(|p| p.is_none()).count());
        }
    }
}
