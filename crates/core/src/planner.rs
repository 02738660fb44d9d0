use serde::Serialize;

use crate::budget::allocate_budget;
use crate::error::PlanError;
use crate::models::{Category, RawRecord, TripPlanResult, TripRequest};
use crate::normalize::{normalize_with_report, NormalizeReport};
use crate::select::select_category;

/// Raw provider records for the four categories of one request.
#[derive(Debug, Clone, Default)]
pub struct CategoryFeeds {
    pub hotels: Vec<RawRecord>,
    pub food: Vec<RawRecord>,
    pub activities: Vec<RawRecord>,
    pub transport: Vec<RawRecord>,
}

impl CategoryFeeds {
    pub fn get(&self, category: Category) -> &[RawRecord] {
        match category {
            Category::Hotels => &self.hotels,
            Category::Food => &self.food,
            Category::Activities => &self.activities,
            Category::Transport => &self.transport,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanDiagnostics {
    pub hotels: NormalizeReport,
    pub food: NormalizeReport,
    pub activities: NormalizeReport,
    pub transport: NormalizeReport,
}

impl PlanDiagnostics {
    pub fn get(&self, category: Category) -> &NormalizeReport {
        match category {
            Category::Hotels => &self.hotels,
            Category::Food => &self.food,
            Category::Activities => &self.activities,
            Category::Transport => &self.transport,
        }
    }

    pub fn total_kept(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).kept).sum()
    }

    pub fn total_dropped(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).dropped()).sum()
    }
}

/// Validates and allocates the budget before touching any records, then
/// normalizes and selects each category against its daily budget.
pub fn build_trip_plan(
    request: &TripRequest,
    destination: &str,
    feeds: &CategoryFeeds,
) -> Result<(TripPlanResult, PlanDiagnostics), PlanError> {
    request.validate()?;
    let allocation = allocate_budget(
        request.total_budget,
        request.people_count,
        request.days,
        request.percentages.as_ref(),
    )?;

    let mut diagnostics = PlanDiagnostics::default();
    let select = |category: Category, report: &mut NormalizeReport| {
        let (items, normalize_report) = normalize_with_report(feeds.get(category), destination);
        *report = normalize_report;
        select_category(
            &items,
            allocation.budgets_per_day.get(category),
            category.label(),
        )
    };

    let hotels = select(Category::Hotels, &mut diagnostics.hotels);
    let food = select(Category::Food, &mut diagnostics.food);
    let activities = select(Category::Activities, &mut diagnostics.activities);
    let transport = select(Category::Transport, &mut diagnostics.transport);

    let plan = TripPlanResult {
        per_person_total: allocation.per_person_total,
        per_person_per_day: allocation.per_person_per_day,
        budgets_per_day: allocation.budgets_per_day.as_map(),
        hotels,
        food,
        activities,
        transport,
    };

    Ok((plan, diagnostics))
}
