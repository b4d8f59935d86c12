use std::collections::HashMap;
use std::sync::Arc;

use crate::model::MetricDescriptor;

pub const NAMESPACE: &str = "aliyun";
pub const SUBSYSTEM: &str = "rds";
pub const INSTANCE_LABEL: &str = "id";

const INSTANCE_LABELS: &[&str] = &[INSTANCE_LABEL];

const RDS_METRICS: &[(&str, &str)] = &[
    ("ConnectionUsage", "Connection usage of the instance (percent)."),
    ("CpuUsage", "CPU usage of the instance (percent)."),
    ("DiskUsage", "Disk usage of the instance (percent)."),
    ("IOPSUsage", "IOPS usage of the instance (percent)."),
    ("MemoryUsage", "Memory usage of the instance (percent)."),
    ("MySQL_ActiveSessions", "Active MySQL sessions."),
    ("MySQL_ComDelete", "MySQL DELETE statements per second."),
    ("MySQL_ComInsert", "MySQL INSERT statements per second."),
    ("MySQL_ComInsertSelect", "MySQL INSERT ... SELECT statements per second."),
    ("MySQL_ComReplace", "MySQL REPLACE statements per second."),
    ("MySQL_ComReplaceSelect", "MySQL REPLACE ... SELECT statements per second."),
    ("MySQL_ComSelect", "MySQL SELECT statements per second."),
    ("MySQL_ComUpdate", "MySQL UPDATE statements per second."),
    ("MySQL_QPS", "MySQL queries per second."),
    ("MySQL_TPS", "MySQL transactions per second."),
    ("MySQL_NetworkInNew", "MySQL inbound network traffic (bits per second)."),
    ("MySQL_NetworkOutNew", "MySQL outbound network traffic (bits per second)."),
    ("MySQL_IbufDirtyRatio", "InnoDB buffer pool dirty page ratio (percent)."),
    ("MySQL_IbufUseRatio", "InnoDB buffer pool utilization (percent)."),
    ("MySQL_InnoDBDataRead", "InnoDB data read (KB per second)."),
    ("MySQL_InnoDBDataWritten", "InnoDB data written (KB per second)."),
    ("MySQL_TempDiskTableCreates", "MySQL temporary disk tables created per second."),
    ("MySQL_InnoDBRowUpdate", "InnoDB rows updated per second."),
    ("MySQL_InnoDBRowInsert", "InnoDB rows inserted per second."),
    ("MySQL_InnoDBRowDelete", "InnoDB rows deleted per second."),
    ("MySQL_InnoDBRowRead", "InnoDB rows read per second."),
    ("MySQL_InnoDBLogFsync", "InnoDB log fsync calls per second."),
    ("MySQL_InnoDBLogWrites", "InnoDB physical log writes per second."),
    ("MySQL_InnoDBLogWriteRequests", "InnoDB log write requests per second."),
];

/// Fixed set of exported metrics, keyed by API metric name.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    by_name: HashMap<String, Arc<MetricDescriptor>>,
}

impl MetricCatalog {
    /// The RDS dashboard metrics exported under `aliyun_rds_*`.
    pub fn rds() -> Self {
        Self::from_entries(
            RDS_METRICS
                .iter()
                .map(|(name, help)| (*name, *help, INSTANCE_LABELS)),
        )
    }

    /// Later entries with a duplicate name replace earlier ones.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a [&'a str])>,
    {
        let by_name = entries
            .into_iter()
            .map(|(name, help, labels)| {
                let desc = MetricDescriptor::new(&[NAMESPACE, SUBSYSTEM], name, help, labels);
                (name.to_string(), Arc::new(desc))
            })
            .collect();
        Self { by_name }
    }

    /// All descriptors, sorted by metric name.
    pub fn descriptors(&self) -> Vec<Arc<MetricDescriptor>> {
        let mut out: Vec<_> = self.by_name.values().cloned().collect();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MetricDescriptor>> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn rds_catalog_has_one_descriptor_per_name() {
        let catalog = MetricCatalog::rds();
        let descriptors = catalog.descriptors();
        assert_eq!(descriptors.len(), RDS_METRICS.len());
        assert_eq!(descriptors.len(), 29);

        let names: HashSet<_> = descriptors.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names.len(), descriptors.len());
        for (name, _) in RDS_METRICS {
            assert!(names.contains(*name), "missing {name}");
        }
    }

    #[test]
    fn every_descriptor_is_labelled_by_instance_id() {
        for desc in MetricCatalog::rds().descriptors() {
            assert_eq!(desc.label_names(), ["id".to_string()]);
            assert_eq!(desc.fq_name(), format!("aliyun_rds_{}", desc.name()));
            assert!(!desc.help().is_empty());
        }
    }

    #[test]
    fn descriptors_are_sorted_by_name() {
        let names: Vec<_> = MetricCatalog::rds()
            .descriptors()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn lookup_returns_shared_descriptor() {
        let catalog = MetricCatalog::rds();
        let a = catalog.get("CpuUsage").unwrap();
        let b = catalog
            .descriptors()
            .into_iter()
            .find(|d| d.name() == "CpuUsage")
            .unwrap();
        assert!(Arc::ptr_eq(a, &b));
        assert!(catalog.get("NotAMetric").is_none());
    }
}
