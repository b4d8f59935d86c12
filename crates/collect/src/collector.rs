use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, Stream, StreamExt};
use rds_exporter_cms::MetricFetcher;
use rds_exporter_core::catalog::MetricCatalog;
use rds_exporter_core::decode::decode_datapoints;
use rds_exporter_core::error::{ExporterError, Result};
use rds_exporter_core::model::{DataPoint, MetricDescriptor, Observation};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct CollectorConfig {
    pub concurrency: usize,
    pub fetch_deadline: Option<Duration>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fetch_deadline: None,
        }
    }
}

/// Result of collecting one catalog metric within a cycle.
#[derive(Debug)]
pub struct MetricOutcome {
    pub descriptor: Arc<MetricDescriptor>,
    pub observations: Vec<Observation>,
    pub dropped: usize,
    pub error: Option<ExporterError>,
    pub elapsed: Duration,
}

impl MetricOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives one fetch/decode pass over the catalog per call.
#[derive(Clone)]
pub struct Collector {
    catalog: Arc<MetricCatalog>,
    fetcher: Arc<dyn MetricFetcher>,
    cfg: CollectorConfig,
}

impl Collector {
    pub fn new(
        catalog: Arc<MetricCatalog>,
        fetcher: Arc<dyn MetricFetcher>,
        cfg: CollectorConfig,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            cfg: CollectorConfig {
                concurrency: cfg.concurrency.max(1),
                ..cfg
            },
        }
    }

    pub fn catalog(&self) -> &Arc<MetricCatalog> {
        &self.catalog
    }

    /// Lazily collects every catalog metric. Outcomes arrive in completion
    /// order; nothing is fetched until the stream is polled.
    pub fn collect_outcomes(&self) -> impl Stream<Item = MetricOutcome> + Send + '_ {
        stream::iter(self.catalog.descriptors())
            .map(move |descriptor| self.collect_metric(descriptor))
            .buffer_unordered(self.cfg.concurrency)
    }

    /// Observations of one cycle; failed metrics contribute nothing.
    pub fn collect(&self) -> impl Stream<Item = Observation> + Send + '_ {
        self.collect_outcomes()
            .flat_map(|outcome| stream::iter(outcome.observations))
    }

    async fn collect_metric(&self, descriptor: Arc<MetricDescriptor>) -> MetricOutcome {
        let started = Instant::now();
        let points = self
            .fetch(descriptor.name())
            .await
            .and_then(|payload| decode_datapoints(payload.as_bytes()));

        match points {
            Ok(points) => {
                let (observations, dropped) = observe_points(&descriptor, points);
                debug!(
                    metric = %descriptor.name(),
                    points = observations.len(),
                    dropped,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "metric collected"
                );
                MetricOutcome {
                    descriptor,
                    observations,
                    dropped,
                    error: None,
                    elapsed: started.elapsed(),
                }
            }
            Err(err) => {
                warn!(
                    metric = %descriptor.name(),
                    kind = err.kind(),
                    error = %err,
                    "metric skipped for this cycle"
                );
                MetricOutcome {
                    descriptor,
                    observations: Vec::new(),
                    dropped: 0,
                    error: Some(err),
                    elapsed: started.elapsed(),
                }
            }
        }
    }

    async fn fetch(&self, metric_name: &str) -> Result<String> {
        let Some(deadline) = self.cfg.fetch_deadline else {
            return self.fetcher.fetch(metric_name).await;
        };
        match tokio::time::timeout(deadline, self.fetcher.fetch(metric_name)).await {
            Ok(res) => res,
            Err(_) => Err(ExporterError::Transport(format!(
                "fetch did not finish within {}ms",
                deadline.as_millis()
            ))),
        }
    }
}

/// One observation per point carrying an instance id; the rest are dropped.
fn observe_points(
    descriptor: &Arc<MetricDescriptor>,
    points: Vec<DataPoint>,
) -> (Vec<Observation>, usize) {
    let mut observations = Vec::with_capacity(points.len());
    let mut dropped = 0;
    for point in points {
        let Some(instance) = point.instance_label() else {
            dropped += 1;
            debug!(
                metric = %descriptor.name(),
                observed_at = ?point.observed_at(),
                "dropping data point without instance id"
            );
            continue;
        };
        match Observation::new(descriptor.clone(), point.average, vec![instance.to_string()]) {
            Ok(obs) => observations.push(obs),
            Err(err) => {
                dropped += 1;
                debug!(metric = %descriptor.name(), error = %err, "dropping data point");
            }
        }
    }
    (observations, dropped)
}
