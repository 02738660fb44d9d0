use crate::models::{CategorySuggestion, NormalizedItem};

pub const MAX_SUGGESTIONS: usize = 3;

/// Picks what to show for one category. Up to three affordable items when any
/// fit; otherwise the single cheapest item so the caller can still show what
/// the category would cost.
pub fn select_category(items: &[NormalizedItem], budget: f64, label: &str) -> CategorySuggestion {
    if items.is_empty() {
        return CategorySuggestion {
            budget_per_day: budget,
            suggested_items: Vec::new(),
            within_budget: false,
            message: Some(format!(
                "No options available for {label} in this destination."
            )),
        };
    }

    let mut affordable = items
        .iter()
        .filter(|item| item.price <= budget)
        .collect::<Vec<_>>();
    affordable.sort_by(|a, b| a.price.total_cmp(&b.price));

    if !affordable.is_empty() {
        return CategorySuggestion {
            budget_per_day: budget,
            suggested_items: affordable
                .into_iter()
                .take(MAX_SUGGESTIONS)
                .cloned()
                .collect(),
            within_budget: true,
            message: None,
        };
    }

    let cheapest = items
        .iter()
        .min_by(|a, b| a.price.total_cmp(&b.price))
        .cloned();

    CategorySuggestion {
        budget_per_day: budget,
        suggested_items: cheapest.into_iter().collect(),
        within_budget: false,
        message: Some(format!(
            "The cheapest option for {label} costs more than this category's daily budget; \
             raise the total budget or reduce the trip length or number of people."
        )),
    }
}
