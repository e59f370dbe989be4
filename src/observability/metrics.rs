use std::time::Duration;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub truck_assignments_total: IntCounterVec,
    pub truck_assignment_latency_seconds: HistogramVec,
    pub scorecard_events_purged_total: IntCounter,
    pub request_timeouts_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let truck_assignments_total = IntCounterVec::new(
            Opts::new(
                "truck_assignments_total",
                "Truck assignment changes by kind and outcome",
            ),
            &["kind", "outcome"],
        )
        .expect("valid truck_assignments_total metric");

        let truck_assignment_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "truck_assignment_latency_seconds",
                "Latency of truck assignment changes in seconds",
            ),
            &["outcome"],
        )
        .expect("valid truck_assignment_latency_seconds metric");

        let scorecard_events_purged_total = IntCounter::new(
            "scorecard_events_purged_total",
            "Scorecard events removed by filtered bulk delete",
        )
        .expect("valid scorecard_events_purged_total metric");

        let request_timeouts_total = IntCounter::new(
            "request_timeouts_total",
            "Requests that exceeded the request deadline",
        )
        .expect("valid request_timeouts_total metric");

        registry
            .register(Box::new(truck_assignments_total.clone()))
            .expect("register truck_assignments_total");
        registry
            .register(Box::new(truck_assignment_latency_seconds.clone()))
            .expect("register truck_assignment_latency_seconds");
        registry
            .register(Box::new(scorecard_events_purged_total.clone()))
            .expect("register scorecard_events_purged_total");
        registry
            .register(Box::new(request_timeouts_total.clone()))
            .expect("register request_timeouts_total");

        Self {
            registry,
            truck_assignments_total,
            truck_assignment_latency_seconds,
            scorecard_events_purged_total,
            request_timeouts_total,
        }
    }

    pub fn observe_assignment(&self, kind: &str, succeeded: bool, elapsed: Duration) {
        let outcome = if succeeded { "success" } else { "error" };
        self.truck_assignment_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());
        self.truck_assignments_total
            .with_label_values(&[kind, outcome])
            .inc();
    }

    /// Every registered family in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Metrics;

    #[test]
    fn assignment_observations_are_labelled() {
        let metrics = Metrics::new();
        metrics.observe_assignment("assign", true, Duration::from_millis(3));
        metrics.observe_assignment("unassign", false, Duration::from_millis(1));

        assert_eq!(
            metrics
                .truck_assignments_total
                .with_label_values(&["assign", "success"])
                .get(),
            1
        );

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"truck_assignments_total{kind="unassign",outcome="error"} 1"#));
        assert!(text.contains("truck_assignment_latency_seconds_bucket"));
    }

    #[test]
    fn render_lists_idle_counters() {
        let metrics = Metrics::new();
        metrics.request_timeouts_total.inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("request_timeouts_total 1"));
        assert!(text.contains("scorecard_events_purged_total 0"));
    }
}
