use std::sync::Arc;

use crate::error::{ExporterError, Result};
use crate::model::descriptor::MetricDescriptor;

/// One gauge sample ready for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    descriptor: Arc<MetricDescriptor>,
    value: f64,
    label_values: Vec<String>,
}

impl Observation {
    /// Fails when the label values do not match the descriptor's label schema.
    pub fn new(
        descriptor: Arc<MetricDescriptor>,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<Self> {
        if label_values.len() != descriptor.label_names().len() {
            return Err(ExporterError::Schema(format!(
                "{} expects {} label values, got {}",
                descriptor.name(),
                descriptor.label_names().len(),
                label_values.len()
            )));
        }
        Ok(Self {
            descriptor,
            value,
            label_values,
        })
    }

    pub fn descriptor(&self) -> &Arc<MetricDescriptor> {
        &self.descriptor
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu() -> Arc<MetricDescriptor> {
        Arc::new(MetricDescriptor::new(
            &["aliyun", "rds"],
            "CpuUsage",
            "cpu",
            &["id"],
        ))
    }

    #[test]
    fn accepts_matching_labels() {
        let obs = Observation::new(cpu(), 42.5, vec!["rds-1".into()]).unwrap();
        assert_eq!(obs.descriptor().name(), "CpuUsage");
        assert_eq!(obs.value(), 42.5);
        assert_eq!(obs.label_values(), ["rds-1".to_string()]);
    }

    #[test]
    fn rejects_label_arity_mismatch() {
        let err = Observation::new(cpu(), 1.0, vec![]).unwrap_err();
        assert!(matches!(err, ExporterError::Schema(_)));
        assert!(Observation::new(cpu(), 1.0, vec!["a".into(), "b".into()]).is_err());
    }
}
