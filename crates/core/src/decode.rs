use serde_json::{Map, Value};

use crate::error::{ExporterError, Result};
use crate::model::DataPoint;

/// Decodes a `Datapoints` payload: a JSON array of per-instance statistic objects.
///
/// Fields that are absent or of an unexpected type fall back to empty/zero. The
/// payload is accepted or rejected as a whole; a blank payload means no points.
pub fn decode_datapoints(raw: &[u8]) -> Result<Vec<DataPoint>> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let records: Vec<Map<String, Value>> = serde_json::from_slice(raw)
        .map_err(|e| ExporterError::Decode(format!("datapoints are not an array of objects: {e}")))?;

    Ok(records.iter().map(decode_point).collect())
}

fn decode_point(record: &Map<String, Value>) -> DataPoint {
    DataPoint {
        timestamp: int_field(record, "timestamp"),
        instance_id: str_field(record, "instanceId").unwrap_or_default(),
        average: float_field(record, "Average"),
        maximum: float_field(record, "Maximum"),
        minimum: float_field(record, "Minimum"),
        sum: float_field(record, "Sum"),
        device: str_field(record, "device"),
        state: str_field(record, "state"),
        user_id: str_field(record, "userId"),
        hostname: str_field(record, "hostname"),
        ip: str_field(record, "IP"),
        diskname: str_field(record, "diskname"),
    }
}

fn str_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

fn float_field(record: &Map<String, Value>, key: &str) -> f64 {
    match record.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        _ => 0.0,
    }
}

fn int_field(record: &Map<String, Value>, key: &str) -> i64 {
    match record.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        _ => 0,
    }
}
