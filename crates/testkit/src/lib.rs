use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rds_exporter_cms::MetricFetcher;
use rds_exporter_core::error::{ExporterError, Result};

/// `Datapoints` payload with one record per `(instance, average)` pair.
pub fn datapoints_json(points: &[(&str, f64)]) -> String {
    let records: Vec<_> = points
        .iter()
        .enumerate()
        .map(|(i, (instance, average))| {
            serde_json::json!({
                "timestamp": 1_700_000_000_000_i64 + i as i64 * 60_000,
                "userId": "1234567890",
                "instanceId": instance,
                "Average": average,
                "Maximum": average * 2.0,
                "Minimum": average / 2.0,
                "Sum": average * 3.0,
            })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}

#[derive(Debug, Clone)]
pub enum Reply {
    Payload(String),
    Transport,
    Api,
    Delayed(Duration, String),
}

/// Fetcher answering from a per-metric script and counting calls.
/// Metrics without a script answer with an empty array.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    replies: HashMap<String, Reply>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, metric: &str, reply: Reply) -> Self {
        self.replies.insert(metric.to_string(), reply);
        self
    }

    pub fn payload(self, metric: &str, payload: impl Into<String>) -> Self {
        self.reply(metric, Reply::Payload(payload.into()))
    }

    pub fn calls(&self, metric: &str) -> usize {
        self.calls
            .lock()
            .map(|c| c.get(metric).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|c| c.values().sum()).unwrap_or(0)
    }
}

#[async_trait]
impl MetricFetcher for ScriptedFetcher {
    async fn fetch(&self, metric_name: &str) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(metric_name.to_string()).or_default() += 1;
        }

        match self.replies.get(metric_name).cloned() {
            None => Ok("[]".to_string()),
            Some(Reply::Payload(p)) => Ok(p),
            Some(Reply::Transport) => Err(ExporterError::Transport(format!(
                "scripted transport failure for {metric_name}"
            ))),
            Some(Reply::Api) => Err(ExporterError::Api(format!(
                "scripted throttling for {metric_name}"
            ))),
            Some(Reply::Delayed(delay, p)) => {
                tokio::time::sleep(delay).await;
                Ok(p)
            }
        }
    }
}
