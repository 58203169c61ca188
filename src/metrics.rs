use std::time::Duration;

use prometheus::{histogram_opts, opts, Histogram, IntCounterVec, Registry};

use crate::controllers::handler::Outcome;
use crate::Error;

#[derive(Clone)]
pub struct Metrics {
    pub events: IntCounterVec,
    pub failures: IntCounterVec,
    pub handle_duration: Histogram,
}

impl Default for Metrics {
    fn default() -> Self {
        let handle_duration = Histogram::with_opts(
            histogram_opts!(
                "registrar_handle_duration_seconds",
                "The duration of handling a created secret in seconds"
            )
            .buckets(vec![0.01, 0.1, 0.25, 0.5, 1., 5., 15.]),
        )
        .expect("valid histogram options");
        let events = IntCounterVec::new(
            opts!("registrar_events_total", "created secrets handled"),
            &["outcome"],
        )
        .expect("valid counter options");
        let failures = IntCounterVec::new(
            opts!("registrar_failures_total", "created secrets dropped on error"),
            &["error"],
        )
        .expect("valid counter options");
        Metrics {
            events,
            failures,
            handle_duration,
        }
    }
}

impl Metrics {
    /// Register metrics with a registry
    pub fn register(self, registry: &Registry) -> Result<Self, prometheus::Error> {
        registry.register(Box::new(self.handle_duration.clone()))?;
        registry.register(Box::new(self.events.clone()))?;
        registry.register(Box::new(self.failures.clone()))?;
        Ok(self)
    }

    pub fn handled(&self, outcome: &Outcome, duration: Duration) {
        self.events
            .with_label_values(&[outcome.metric_label()])
            .inc();
        self.handle_duration.observe(duration.as_secs_f64());
    }

    pub fn handle_failure(&self, error: &Error, duration: Duration) {
        self.events.with_label_values(&["failed"]).inc();
        self.failures
            .with_label_values(&[error.metric_label()])
            .inc();
        self.handle_duration.observe(duration.as_secs_f64());
    }
}
