//! Request counters exposed in Prometheus text format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// How a verify or settle request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// A validation gate or the chain refused the payment.
    Rejected,
    /// The request could not be evaluated (bad body, chain unreachable).
    Error,
}

#[derive(Debug, Default)]
struct EndpointCounters {
    requests: AtomicU64,
    rejections: AtomicU64,
    errors: AtomicU64,
}

impl EndpointCounters {
    fn record(&self, outcome: Outcome) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Outcome::Success => {}
            Outcome::Rejected => {
                self.rejections.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Simple atomic counters for Prometheus metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    verify: EndpointCounters,
    settle: EndpointCounters,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_verify(&self, outcome: Outcome) {
        self.verify.record(outcome);
    }

    pub fn record_settle(&self, outcome: Outcome) {
        self.settle.record(outcome);
    }

    /// Renders all counters in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut body = String::new();
        for (endpoint, counters) in [("verify", &self.verify), ("settle", &self.settle)] {
            for (name, help, counter) in [
                ("requests", "requests received", &counters.requests),
                ("rejections", "payments rejected", &counters.rejections),
                ("errors", "requests that could not be evaluated", &counters.errors),
            ] {
                let value = counter.load(Ordering::Relaxed);
                let _ = write!(
                    body,
                    "# HELP {endpoint}_{name}_total Total number of {endpoint} {help}.\n\
                     # TYPE {endpoint}_{name}_total counter\n\
                     {endpoint}_{name}_total {value}\n"
                );
            }
        }
        body
    }
}
