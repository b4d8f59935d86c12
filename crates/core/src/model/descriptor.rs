use serde::Serialize;

/// Exposed shape of one catalog metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    name: String,
    fq_name: String,
    help: String,
    label_names: Vec<String>,
}

impl MetricDescriptor {
    pub fn new(prefix: &[&str], name: &str, help: &str, label_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            fq_name: build_fq_name(prefix, name),
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Metric name as known to the monitoring API, e.g. `CpuUsage`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exposition name, e.g. `aliyun_rds_CpuUsage`.
    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }
}

pub fn build_fq_name(prefix: &[&str], name: &str) -> String {
    prefix
        .iter()
        .copied()
        .chain(std::iter::once(name))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
