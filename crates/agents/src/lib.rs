use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use tripwise_catalog::{CatalogError, CatalogProvider, SubmissionReceipt};
use tripwise_core::{
    build_submission, build_trip_plan, resolve_city_id, validate_percentages, Category,
    CategoryFeeds, City, PlanDiagnostics, PlanError, RawRecord, TripPlanResult, TripRequest,
};
use tripwise_observability::PlannerMetrics;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Skipped { reason: String },
    Sent { receipt: SubmissionReceipt },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub plan: TripPlanResult,
    pub destination: String,
    pub diagnostics: PlanDiagnostics,
    pub submission: SubmissionOutcome,
}

pub struct TripPlannerAgent<P>
where
    P: CatalogProvider,
{
    catalog: Arc<P>,
    metrics: Arc<PlannerMetrics>,
}

impl<P> TripPlannerAgent<P>
where
    P: CatalogProvider,
{
    pub fn new(catalog: Arc<P>, metrics: Arc<PlannerMetrics>) -> Self {
        Self { catalog, metrics }
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    /// Computes the plan, then tries to persist it. Persistence problems are
    /// reported in the outcome and never fail the plan.
    #[instrument(skip(self, request), fields(destination = %request.destination))]
    pub async fn plan_trip(&self, request: TripRequest) -> Result<PlanOutcome, PlannerError> {
        let started = Instant::now();
        self.metrics.inc_plan();

        let result = self.compute_plan(&request).await;
        self.metrics.observe_latency(started.elapsed());

        let (plan, destination, diagnostics, roster) = match result {
            Ok(computed) => computed,
            Err(error) => {
                self.metrics.inc_plan_failed();
                warn!(error = %error, "trip plan failed");
                return Err(error);
            }
        };

        let submission = self.submit_plan(&request, &plan, &destination, roster).await;

        info!(
            destination = %destination,
            kept = diagnostics.total_kept(),
            dropped = diagnostics.total_dropped(),
            submission = ?submission,
            "trip plan computed"
        );

        Ok(PlanOutcome {
            plan,
            destination,
            diagnostics,
            submission,
        })
    }

    pub async fn raw_endpoint(&self, endpoint: &str) -> Result<Vec<RawRecord>, CatalogError> {
        self.catalog.fetch_endpoint(endpoint).await
    }

    async fn compute_plan(
        &self,
        request: &TripRequest,
    ) -> Result<(TripPlanResult, String, PlanDiagnostics, Option<Vec<City>>), PlannerError> {
        request.validate()?;
        validate_percentages(&request.percentages_or_default())?;

        let (destination, roster) = match request.city_id {
            Some(city_id) => {
                let roster = City::roster(&self.catalog.fetch_cities().await?);
                let city = roster
                    .iter()
                    .find(|city| city.id == city_id)
                    .ok_or(PlanError::UnknownCity(city_id))?;
                let name = city.name.trim();
                let destination = if name.is_empty() {
                    request.destination.clone()
                } else {
                    name.to_string()
                };
                (destination, Some(roster))
            }
            None => (request.destination.clone(), None),
        };

        let (hotels, food, activities, transport) = tokio::try_join!(
            self.fetch_feed(Category::Hotels),
            self.fetch_feed(Category::Food),
            self.fetch_feed(Category::Activities),
            self.fetch_feed(Category::Transport),
        )?;
        let feeds = CategoryFeeds {
            hotels,
            food,
            activities,
            transport,
        };

        let (plan, diagnostics) = build_trip_plan(request, &destination, &feeds)?;

        self.metrics
            .add_records(diagnostics.total_kept(), diagnostics.total_dropped());
        for category in Category::ALL {
            let suggestion = plan.suggestion(category);
            if !suggestion.within_budget && !suggestion.suggested_items.is_empty() {
                self.metrics.inc_fallback();
            }
        }

        Ok((plan, destination, diagnostics, roster))
    }

    /// A feed whose response has an unexpected shape counts as empty.
    async fn fetch_feed(&self, category: Category) -> Result<Vec<RawRecord>, CatalogError> {
        match self.catalog.fetch_records(category).await {
            Err(CatalogError::UnexpectedShape { endpoint }) => {
                warn!(endpoint = %endpoint, "unexpected feed shape, treating as empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn submit_plan(
        &self,
        request: &TripRequest,
        plan: &TripPlanResult,
        destination: &str,
        roster: Option<Vec<City>>,
    ) -> SubmissionOutcome {
        if request.from_city_id.is_none() || request.user_id.is_none() {
            self.metrics.inc_submission_skipped();
            return SubmissionOutcome::Skipped {
                reason: "from_city_id and user_id are required to submit a budget".to_string(),
            };
        }

        match self.send_submission(request, plan, destination, roster).await {
            Ok(receipt) => {
                self.metrics.inc_submission_sent();
                SubmissionOutcome::Sent { receipt }
            }
            Err(error) => {
                self.metrics.inc_submission_failed();
                warn!(error = %error, "budget submission failed; returning plan only");
                SubmissionOutcome::Failed {
                    error: error.to_string(),
                }
            }
        }
    }

    async fn send_submission(
        &self,
        request: &TripRequest,
        plan: &TripPlanResult,
        destination: &str,
        roster: Option<Vec<City>>,
    ) -> Result<SubmissionReceipt, PlannerError> {
        let roster = match roster {
            Some(roster) => roster,
            None if request.to_city_id.is_some() => Vec::new(),
            None => City::roster(&self.catalog.fetch_cities().await?),
        };

        let resolved = request
            .city_id
            .or_else(|| resolve_city_id(&roster, destination));
        let submission = build_submission(request, plan, resolved, &roster)?;

        Ok(self.catalog.create_budget(&submission).await?)
    }
}
