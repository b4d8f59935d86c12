use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use rds_exporter_core::error::Result;
use rds_exporter_core::model::{MetricDescriptor, Observation};
use tracing::info;

use crate::collector::{Collector, MetricOutcome};
use crate::exposition;

/// Everything one scrape cycle produced.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub observations: Vec<Observation>,
    pub outcomes: Vec<MetricOutcome>,
    pub elapsed: Duration,
}

impl ScrapeReport {
    pub fn failed_metrics(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// Bridges the collector to the scrape protocol: static descriptors plus one
/// collection cycle per `observe`.
#[derive(Clone)]
pub struct Exporter {
    collector: Collector,
}

impl Exporter {
    pub fn new(collector: Collector) -> Self {
        Self { collector }
    }

    pub fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        self.collector.catalog().descriptors()
    }

    pub async fn observe(&self) -> ScrapeReport {
        let started = Instant::now();
        let mut outcomes: Vec<MetricOutcome> = self.collector.collect_outcomes().collect().await;

        let mut observations = Vec::new();
        for outcome in &mut outcomes {
            observations.append(&mut outcome.observations);
        }

        let report = ScrapeReport {
            observations,
            outcomes,
            elapsed: started.elapsed(),
        };
        info!(
            metrics = report.outcomes.len(),
            failed = report.failed_metrics(),
            samples = report.observations.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "scrape cycle finished"
        );
        report
    }

    /// Runs one cycle and renders it as a text exposition document.
    pub async fn scrape(&self) -> Result<String> {
        let report = self.observe().await;
        exposition::render(&self.describe(), &report)
    }
}
