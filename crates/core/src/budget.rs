use crate::error::PlanError;
use crate::models::{BudgetAllocation, BudgetPercentages, Category, CategoryBudgets};

pub const PERCENTAGE_TOLERANCE: f64 = 1e-6;

/// Each ratio must lie in `[0, 1]` and the four must sum to 1.0. NaN fails
/// both checks.
pub fn validate_percentages(percentages: &BudgetPercentages) -> Result<(), PlanError> {
    for category in Category::ALL {
        let ratio = percentages.get(category);
        if !(0.0..=1.0).contains(&ratio) {
            return Err(PlanError::InvalidConfiguration(format!(
                "{} ratio must be between 0 and 1, got {ratio}",
                category.as_code()
            )));
        }
    }

    let total = percentages.total();
    if total.is_nan() || (total - 1.0).abs() > PERCENTAGE_TOLERANCE {
        return Err(PlanError::InvalidConfiguration(format!(
            "ratios must sum to 1.0 (hotels + food + activities + transport), got {total}"
        )));
    }
    Ok(())
}

/// Splits `total_budget` per person, per day, then per category.
pub fn allocate_budget(
    total_budget: f64,
    people_count: u32,
    days: u32,
    percentages: Option<&BudgetPercentages>,
) -> Result<BudgetAllocation, PlanError> {
    let percentages = percentages.copied().unwrap_or_default();
    validate_percentages(&percentages)?;

    let per_person_total = total_budget / f64::from(people_count);
    let per_person_per_day = per_person_total / f64::from(days);

    Ok(BudgetAllocation {
        per_person_total,
        per_person_per_day,
        budgets_per_day: CategoryBudgets {
            hotels: per_person_per_day * percentages.hotels,
            food: per_person_per_day * percentages.food,
            activities: per_person_per_day * percentages.activities,
            transport: per_person_per_day * percentages.transport,
        },
    })
}
