use crate::error::PlanError;
use crate::models::{
    BudgetLineItem, BudgetPercentages, BudgetSubEntry, BudgetSubmission, Category,
    CategorySuggestion, City, TripPlanResult, TripRequest,
};

pub const DEFAULT_ADDRESS: &str = "123 Budget St";

/// Sub-entries are emitted in this order.
const SUBMISSION_ORDER: [Category; 4] = [
    Category::Food,
    Category::Hotels,
    Category::Activities,
    Category::Transport,
];

/// Exact, case-insensitive name lookup against the provider's city roster.
pub fn resolve_city_id(roster: &[City], name: &str) -> Option<i64> {
    let wanted = name.trim().to_lowercase();
    roster
        .iter()
        .find(|city| city.name.trim().to_lowercase() == wanted)
        .map(|city| city.id)
}

/// Whole percent, truncated toward zero.
pub fn whole_percent(ratio: f64) -> i64 {
    (ratio * 100.0) as i64
}

pub fn build_sub_entry(
    category: Category,
    suggestion: &CategorySuggestion,
    percentages: &BudgetPercentages,
) -> Option<BudgetSubEntry> {
    let items = suggestion
        .suggested_items
        .iter()
        .filter_map(|item| {
            item.identifier.map(|type_id| BudgetLineItem {
                type_id,
                amount: item.price,
                types: category.unit_label().to_string(),
            })
        })
        .collect::<Vec<_>>();

    if items.is_empty() {
        return None;
    }

    Some(BudgetSubEntry {
        category_tag: category.submission_tag().to_string(),
        percentage: whole_percent(percentages.get(category)),
        description: suggestion
            .message
            .clone()
            .unwrap_or_else(|| category.default_description().to_string()),
        items,
    })
}

/// Maps a finished plan into the provider's budget payload.
///
/// `resolved_destination_id` is the destination id already known to the
/// caller (the request's `city_id` or an earlier name lookup); `roster` is
/// consulted last, by the request's destination name.
pub fn build_submission(
    request: &TripRequest,
    plan: &TripPlanResult,
    resolved_destination_id: Option<i64>,
    roster: &[City],
) -> Result<BudgetSubmission, PlanError> {
    let to_city_id = request
        .to_city_id
        .or(resolved_destination_id)
        .or_else(|| resolve_city_id(roster, &request.destination))
        .ok_or_else(|| PlanError::UnresolvedDestination {
            destination: request.destination.clone(),
        })?;

    let from_city_id = request
        .from_city_id
        .ok_or(PlanError::MissingRequiredIdentifier("from_city_id"))?;
    let user_id = request
        .user_id
        .ok_or(PlanError::MissingRequiredIdentifier("user_id"))?;

    let percentages = request.percentages_or_default();
    let budget_sub = SUBMISSION_ORDER
        .iter()
        .filter_map(|category| build_sub_entry(*category, plan.suggestion(*category), &percentages))
        .collect();

    Ok(BudgetSubmission {
        name: request
            .name
            .clone()
            .unwrap_or_else(|| format!("Trip Budget - {}", request.destination)),
        address: request
            .address
            .clone()
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
        teams_number: request.people_count,
        days: request.days,
        amount: format!("{:.2}", request.total_budget),
        from_city_id,
        to_city_id,
        user_id,
        budget_sub,
    })
}
