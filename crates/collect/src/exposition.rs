//! Prometheus text exposition of a scrape cycle.
//!
//! Every described metric is registered in a fresh registry per scrape, so the
//! output only ever contains families the catalog announced. Collection
//! outcomes are exported alongside as `aliyun_rds_exporter_*` gauges.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use rds_exporter_core::catalog::{NAMESPACE, SUBSYSTEM};
use rds_exporter_core::error::{ExporterError, Result};
use rds_exporter_core::model::MetricDescriptor;
use rds_exporter_core::model::descriptor::build_fq_name;

use crate::registry::ScrapeReport;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const OUTCOME_SUBSYSTEM: &str = "exporter";

pub fn render(descriptors: &[Arc<MetricDescriptor>], report: &ScrapeReport) -> Result<String> {
    let registry = Registry::new();

    let mut families: HashMap<&str, (&Arc<MetricDescriptor>, GaugeVec)> = HashMap::new();
    for desc in descriptors {
        let labels: Vec<&str> = desc.label_names().iter().map(String::as_str).collect();
        let gauge = GaugeVec::new(Opts::new(desc.fq_name(), desc.help()), &labels)
            .map_err(encode_err)?;
        registry
            .register(Box::new(gauge.clone()))
            .map_err(encode_err)?;
        families.insert(desc.name(), (desc, gauge));
    }

    // distinct label sets per metric; repeats overwrite the same series
    let mut series: HashMap<&str, HashSet<&[String]>> = HashMap::new();
    for obs in &report.observations {
        let Some((desc, gauge)) = families.get(obs.descriptor().name()) else {
            tracing::error!(
                metric = %obs.descriptor().name(),
                "observation for undescribed metric"
            );
            continue;
        };
        if ***desc != **obs.descriptor() {
            tracing::error!(
                metric = %obs.descriptor().name(),
                "observation descriptor differs from described one"
            );
            continue;
        }
        let values: Vec<&str> = obs.label_values().iter().map(String::as_str).collect();
        gauge
            .get_metric_with_label_values(&values)
            .map_err(encode_err)?
            .set(obs.value());
        series
            .entry(desc.name())
            .or_default()
            .insert(obs.label_values());
    }

    register_outcomes(&registry, report, &series)?;

    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buf)
        .map_err(encode_err)?;
    String::from_utf8(buf)
        .map_err(|e| ExporterError::Encode(format!("exposition is not utf-8: {e}")))
}

fn register_outcomes(
    registry: &Registry,
    report: &ScrapeReport,
    series: &HashMap<&str, HashSet<&[String]>>,
) -> Result<()> {
    let success = outcome_vec(
        registry,
        "collect_success",
        "Whether the last collection of the metric succeeded (1) or failed (0).",
    )?;
    let datapoints = outcome_vec(
        registry,
        "collect_datapoints",
        "Distinct series exported for the metric in the last collection.",
    )?;
    let dropped = outcome_vec(
        registry,
        "collect_dropped",
        "Data points dropped for lacking an instance id in the last collection.",
    )?;
    let duration = outcome_vec(
        registry,
        "collect_duration_seconds",
        "Time spent fetching and decoding the metric in the last collection.",
    )?;

    for outcome in &report.outcomes {
        let metric = [outcome.descriptor.name()];
        let ok = outcome.is_success();
        let emitted = series
            .get(outcome.descriptor.name())
            .map_or(0, HashSet::len);

        set(&success, &metric, if ok { 1.0 } else { 0.0 })?;
        set(&datapoints, &metric, emitted as f64)?;
        set(&dropped, &metric, outcome.dropped as f64)?;
        set(&duration, &metric, outcome.elapsed.as_secs_f64())?;
    }

    let scrape = Gauge::with_opts(Opts::new(
        outcome_name("scrape_duration_seconds"),
        "Time spent on the whole collection cycle.",
    ))
    .map_err(encode_err)?;
    scrape.set(report.elapsed.as_secs_f64());
    registry.register(Box::new(scrape)).map_err(encode_err)?;
    Ok(())
}

fn outcome_vec(registry: &Registry, name: &str, help: &str) -> Result<GaugeVec> {
    let gauge =
        GaugeVec::new(Opts::new(outcome_name(name), help), &["metric"]).map_err(encode_err)?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(encode_err)?;
    Ok(gauge)
}

fn set(gauge: &GaugeVec, labels: &[&str], value: f64) -> Result<()> {
    gauge
        .get_metric_with_label_values(labels)
        .map_err(encode_err)?
        .set(value);
    Ok(())
}

fn outcome_name(name: &str) -> String {
    build_fq_name(&[NAMESPACE, SUBSYSTEM, OUTCOME_SUBSYSTEM], name)
}

fn encode_err(e: prometheus::Error) -> ExporterError {
    ExporterError::Encode(e.to_string())
}
