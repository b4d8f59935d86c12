use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::time::datetime_from_millis;

/// One statistic sample for one instance, as reported by `DescribeMetricLast`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: i64,
    pub instance_id: String,
    pub average: f64,
    pub maximum: f64,
    pub minimum: f64,
    pub sum: f64,
    pub device: Option<String>,
    pub state: Option<String>,
    pub user_id: Option<String>,
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub diskname: Option<String>,
}

impl DataPoint {
    /// The instance id to label with, or `None` when it is missing or blank.
    /// A non-blank id is passed through untouched.
    pub fn instance_label(&self) -> Option<&str> {
        if self.instance_id.trim().is_empty() {
            None
        } else {
            Some(&self.instance_id)
        }
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        datetime_from_millis(self.timestamp)
    }
}
