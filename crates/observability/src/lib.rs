use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct PlannerMetrics {
    plans_total: AtomicU64,
    plans_failed_total: AtomicU64,
    records_kept_total: AtomicU64,
    records_dropped_total: AtomicU64,
    over_budget_fallback_total: AtomicU64,
    submissions_sent_total: AtomicU64,
    submissions_failed_total: AtomicU64,
    submissions_skipped_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub plans_total: u64,
    pub plans_failed_total: u64,
    pub records_kept_total: u64,
    pub records_dropped_total: u64,
    pub over_budget_fallback_total: u64,
    pub submissions_sent_total: u64,
    pub submissions_failed_total: u64,
    pub submissions_skipped_total: u64,
    pub avg_latency_millis: f64,
}

impl PlannerMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_plan(&self) {
        self.plans_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_plan_failed(&self) {
        self.plans_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records(&self, kept: usize, dropped: usize) {
        self.records_kept_total
            .fetch_add(kept as u64, Ordering::Relaxed);
        self.records_dropped_total
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn inc_fallback(&self) {
        self.over_budget_fallback_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_submission_sent(&self) {
        self.submissions_sent_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_submission_failed(&self) {
        self.submissions_failed_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_submission_skipped(&self) {
        self.submissions_skipped_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let plans = self.plans_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            plans_total: plans,
            plans_failed_total: self.plans_failed_total.load(Ordering::Relaxed),
            records_kept_total: self.records_kept_total.load(Ordering::Relaxed),
            records_dropped_total: self.records_dropped_total.load(Ordering::Relaxed),
            over_budget_fallback_total: self.over_budget_fallback_total.load(Ordering::Relaxed),
            submissions_sent_total: self.submissions_sent_total.load(Ordering::Relaxed),
            submissions_failed_total: self.submissions_failed_total.load(Ordering::Relaxed),
            submissions_skipped_total: self.submissions_skipped_total.load(Ordering::Relaxed),
            avg_latency_millis: if plans == 0 {
                0.0
            } else {
                latency as f64 / plans as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,tripwise_agents=info,tripwise_catalog=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_over_plans() {
        let metrics = PlannerMetrics::default();
        assert_eq!(metrics.snapshot().avg_latency_millis, 0.0);

        metrics.inc_plan();
        metrics.inc_plan();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(10));
        metrics.add_records(5, 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.plans_total, 2);
        assert_eq!(snapshot.avg_latency_millis, 20.0);
        assert_eq!(snapshot.records_dropped_total, 2);
    }
}
