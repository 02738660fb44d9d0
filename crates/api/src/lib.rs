mod config;
mod rate_limit;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, Path, Query, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use tripwise_agents::{PlannerError, SubmissionOutcome, TripPlannerAgent};
use tripwise_catalog::{Catalog, CatalogError, LIST_ENDPOINTS};
use tripwise_core::{PlanError, TripRequest};
use tripwise_observability::{MetricsSnapshot, PlannerMetrics};

pub use crate::config::ApiConfig;
pub use crate::rate_limit::IpRateLimiter;

const DEFAULT_PREVIEW_LIMIT: usize = 3;
const SUBMISSION_HEADER: &str = "x-budget-submission";

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<TripPlannerAgent<Catalog>>,
    pub metrics: Arc<PlannerMetrics>,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    catalog: &'static str,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    limit: Option<usize>,
}

/// Builds the router against the live provider described by `config`.
pub fn build_app(config: &ApiConfig) -> Result<Router> {
    let catalog = Catalog::http(config.catalog.clone())
        .context("failed to initialize provider catalog")?;
    Ok(build_app_with_catalog(catalog, config))
}

pub fn build_app_with_catalog(catalog: Catalog, config: &ApiConfig) -> Router {
    let metrics = PlannerMetrics::shared();
    let agent = Arc::new(TripPlannerAgent::new(Arc::new(catalog), metrics.clone()));

    let state = ApiState {
        agent,
        metrics,
        limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        allowed_origins: Arc::new(config.allowed_origins.clone()),
    };

    build_router(state, config.body_limit_bytes)
}

pub fn build_router(state: ApiState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/plan-trip", post(plan_trip))
        .route("/external/:endpoint", get(external_list))
        .route("/external-preview", get(external_preview))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        catalog: state.agent.catalog().kind(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn plan_trip(
    State(state): State<ApiState>,
    Json(input): Json<TripRequest>,
) -> Response {
    match state.agent.plan_trip(input).await {
        Ok(outcome) => {
            let mut response = (StatusCode::OK, Json(outcome.plan)).into_response();
            response.headers_mut().insert(
                header::HeaderName::from_static(SUBMISSION_HEADER),
                HeaderValue::from_static(submission_status(&outcome.submission)),
            );
            response
        }
        Err(error) => planner_error_response(error),
    }
}

async fn external_list(State(state): State<ApiState>, Path(endpoint): Path<String>) -> Response {
    if !LIST_ENDPOINTS.contains(&endpoint.as_str()) {
        return error_response(
            StatusCode::NOT_FOUND,
            "unknown_endpoint",
            format!("no provider list named {endpoint:?}"),
        );
    }

    match state.agent.raw_endpoint(&endpoint).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => catalog_error_response(error),
    }
}

async fn external_preview(
    State(state): State<ApiState>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_PREVIEW_LIMIT);
    let fetched = tokio::try_join!(
        state.agent.raw_endpoint("activities"),
        state.agent.raw_endpoint("hotels"),
        state.agent.raw_endpoint("plains"),
    );

    match fetched {
        Ok((mut activities, mut hotels, mut plains)) => {
            activities.truncate(limit);
            hotels.truncate(limit);
            plains.truncate(limit);
            (
                StatusCode::OK,
                Json(json!({
                    "activities_sample": activities,
                    "hotels_sample": hotels,
                    "plains_sample": plains,
                })),
            )
                .into_response()
        }
        Err(error) => catalog_error_response(error),
    }
}

fn submission_status(outcome: &SubmissionOutcome) -> &'static str {
    match outcome {
        SubmissionOutcome::Skipped { .. } => "skipped",
        SubmissionOutcome::Sent { .. } => "sent",
        SubmissionOutcome::Failed { .. } => "failed",
    }
}

fn planner_error_response(error: PlannerError) -> Response {
    match error {
        PlannerError::Plan(error) => {
            let code = match &error {
                PlanError::InvalidConfiguration(_) => "invalid_configuration",
                PlanError::InvalidRequest(_) => "invalid_request",
                PlanError::UnknownCity(_) => "unknown_city",
                other if other.is_submission_error() => "submission_failed",
                _ => "plan_trip_failed",
            };
            error_response(StatusCode::BAD_REQUEST, code, error.to_string())
        }
        PlannerError::Catalog(error) => catalog_error_response(error),
    }
}

fn catalog_error_response(error: CatalogError) -> Response {
    warn!(endpoint = error.endpoint(), error = %error, "provider request failed");
    error_response(StatusCode::BAD_GATEWAY, "provider_error", error.to_string())
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:5500")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        warn!(ip = %ip, "rate limit exceeded");
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many requests from this IP. wait and retry.".to_string(),
        );
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ip_uses_first_forwarded_address() {
        let request = Request::builder()
            .header("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_ip(&request), "203.0.113.7");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(request_ip(&bare), "local");
    }

    #[test]
    fn plan_errors_map_to_bad_request() {
        let response = planner_error_response(PlannerError::Plan(PlanError::UnknownCity(7)));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = planner_error_response(PlannerError::Catalog(CatalogError::UnexpectedShape {
            endpoint: "hotels".to_string(),
        }));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
