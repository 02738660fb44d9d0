pub mod budget;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod planner;
pub mod select;
pub mod submission;

pub use budget::{allocate_budget, validate_percentages};
pub use error::PlanError;
pub use extract::{extract_fields, ExtractedFields, PriceSource};
pub use models::*;
pub use normalize::{normalize_records, normalize_with_report, DropReason, NormalizeReport};
pub use planner::{build_trip_plan, CategoryFeeds, PlanDiagnostics};
pub use select::select_category;
pub use submission::{build_submission, resolve_city_id};
