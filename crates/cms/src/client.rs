use std::fmt;
use std::time::Duration;

use chrono::Utc;
use rds_exporter_core::config::Config;
use rds_exporter_core::error::{ExporterError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::signature::{
    SIGNATURE_METHOD, SIGNATURE_VERSION, canonical_query, percent_encode, sign, string_to_sign,
};

pub const API_VERSION: &str = "2019-01-01";

#[derive(Clone)]
pub struct Credentials {
    pub region_id: String,
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("region_id", &self.region_id)
            .field("access_key_id", &"<redacted>")
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            region_id: cfg.region_id.clone(),
            access_key_id: cfg.access_key_id.clone(),
            access_key_secret: cfg.access_key_secret.clone(),
        }
    }
}

/// Signed RPC client for the CloudMonitor API. Cheap to clone; clones share
/// one connection pool.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: Client,
    endpoint: String,
    credentials: Credentials,
}

/// Successful `DescribeMetricLast` answer.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLast {
    pub request_id: Option<String>,
    pub period: Option<String>,
    pub datapoints: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RpcResponse {
    request_id: Option<String>,
    code: Option<Value>,
    message: Option<String>,
    success: Option<bool>,
    period: Option<Value>,
    datapoints: Option<String>,
}

impl CmsClient {
    pub fn new(endpoint: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExporterError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.endpoint(),
            Credentials::from_config(cfg),
            cfg.request_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Latest statistics of `metric_name` for every instance in `namespace`.
    pub async fn describe_metric_last(
        &self,
        namespace: &str,
        metric_name: &str,
    ) -> Result<MetricLast> {
        let params = vec![
            ("Namespace".to_string(), namespace.to_string()),
            ("MetricName".to_string(), metric_name.to_string()),
        ];
        let response = self.call("DescribeMetricLast", params).await?;
        Ok(MetricLast {
            request_id: response.request_id,
            period: response.period.as_ref().map(value_to_string),
            datapoints: response.datapoints.unwrap_or_default(),
        })
    }

    async fn call(&self, action: &str, params: Vec<(String, String)>) -> Result<RpcResponse> {
        let url = self.signed_url(action, params)?;
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ExporterError::Transport(format!("{action} request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ExporterError::Transport(format!("{action} body read failed: {e}")))?;

        let parsed = serde_json::from_str::<RpcResponse>(&body);
        if !status.is_success() {
            let detail = match &parsed {
                Ok(r) => describe_error(r),
                Err(_) => truncate(&body, 200),
            };
            return Err(ExporterError::Api(format!(
                "{action} returned {status}: {detail}"
            )));
        }

        let parsed = parsed.map_err(|e| {
            ExporterError::Decode(format!("{action} response is not valid JSON: {e}"))
        })?;
        if parsed.success == Some(false) || !code_is_ok(parsed.code.as_ref()) {
            return Err(ExporterError::Api(format!(
                "{action} failed: {}",
                describe_error(&parsed)
            )));
        }
        Ok(parsed)
    }

    fn signed_url(&self, action: &str, mut params: Vec<(String, String)>) -> Result<String> {
        params.extend([
            ("Action".to_string(), action.to_string()),
            ("Version".to_string(), API_VERSION.to_string()),
            ("Format".to_string(), "JSON".to_string()),
            ("RegionId".to_string(), self.credentials.region_id.clone()),
            (
                "AccessKeyId".to_string(),
                self.credentials.access_key_id.clone(),
            ),
            ("SignatureMethod".to_string(), SIGNATURE_METHOD.to_string()),
            ("SignatureVersion".to_string(), SIGNATURE_VERSION.to_string()),
            (
                "SignatureNonce".to_string(),
                uuid::Uuid::new_v4().to_string(),
            ),
            (
                "Timestamp".to_string(),
                Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ),
        ]);

        let query = canonical_query(&params);
        let signature = sign(
            &self.credentials.access_key_secret,
            &string_to_sign("GET", &query),
        )?;
        Ok(format!(
            "{}/?{query}&Signature={}",
            self.endpoint,
            percent_encode(&signature)
        ))
    }
}

fn code_is_ok(code: Option<&Value>) -> bool {
    match code {
        None | Some(Value::Null) => true,
        Some(v) => value_to_string(v) == "200",
    }
}

fn describe_error(resp: &RpcResponse) -> String {
    let code = resp
        .code
        .as_ref()
        .map(value_to_string)
        .unwrap_or_else(|| "unknown".to_string());
    let message = resp.message.as_deref().unwrap_or("");
    match &resp.request_id {
        Some(id) => format!("code={code} message={message} request_id={id}"),
        None => format!("code={code} message={message}"),
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
