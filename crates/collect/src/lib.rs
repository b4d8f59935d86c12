pub mod collector;
pub mod exposition;
pub mod registry;

pub use collector::{Collector, CollectorConfig, MetricOutcome};
pub use registry::{Exporter, ScrapeReport};
