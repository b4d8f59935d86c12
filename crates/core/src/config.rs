use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ExporterError, Result};
use crate::time::parse_duration_str;

#[derive(Clone, PartialEq)]
pub struct Config {
    pub listen_addr: String,
    pub metrics_path: String,
    pub region_id: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub cms_endpoint: Option<String>,
    pub namespace: String,
    pub request_timeout: Duration,
    pub fetch_deadline: Option<Duration>,
    pub fetch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8024".to_string(),
            metrics_path: "/metrics".to_string(),
            region_id: "cn-hangzhou".to_string(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            cms_endpoint: None,
            namespace: "acs_rds_dashboard".to_string(),
            request_timeout: Duration::from_secs(10),
            fetch_deadline: None,
            fetch_concurrency: 4,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("metrics_path", &self.metrics_path)
            .field("region_id", &self.region_id)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("access_key_secret", &redact(&self.access_key_secret))
            .field("cms_endpoint", &self.cms_endpoint)
            .field("namespace", &self.namespace)
            .field("request_timeout", &self.request_timeout)
            .field("fetch_deadline", &self.fetch_deadline)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    /// The CMS endpoint, derived from the region unless set explicitly.
    pub fn endpoint(&self) -> String {
        match &self.cms_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://metrics.{}.aliyuncs.com", self.region_id),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.access_key_id.trim().is_empty() || self.access_key_secret.trim().is_empty() {
            return Err(ExporterError::Config(
                "access key id and secret are required (ALIYUN_ACCESS_KEY_ID / ALIYUN_ACCESS_KEY_SECRET)"
                    .to_string(),
            ));
        }
        if self.region_id.trim().is_empty() {
            return Err(ExporterError::Config("region id cannot be empty".to_string()));
        }
        if !self.metrics_path.starts_with('/') {
            return Err(ExporterError::Config(format!(
                "metrics path must start with '/' (value={})",
                self.metrics_path
            )));
        }
        // the router would read these as captures or wildcards
        if self.metrics_path.contains([':', '*', '{', '}']) {
            return Err(ExporterError::Config(format!(
                "metrics path cannot contain ':', '*', '{{' or '}}' (value={})",
                self.metrics_path
            )));
        }
        if self.fetch_concurrency == 0 {
            return Err(ExporterError::Config(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
    region_id: Option<String>,
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    cms_endpoint: Option<String>,
    namespace: Option<String>,
    request_timeout: Option<String>,
    fetch_deadline: Option<String>,
    fetch_concurrency: Option<usize>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("RDS_EXPORTER_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("rds-exporter/config.toml")
}

fn load_file_overrides(path: &Path) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| ExporterError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| ExporterError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    let fetch_concurrency = match env::var("RDS_EXPORTER_FETCH_CONCURRENCY") {
        Ok(v) => Some(v.parse::<usize>().map_err(|e| {
            ExporterError::Config(format!(
                "bad RDS_EXPORTER_FETCH_CONCURRENCY in environment: {e}"
            ))
        })?),
        Err(_) => None,
    };

    Ok(ConfigOverrides {
        listen_addr: env::var("RDS_EXPORTER_LISTEN_ADDR").ok(),
        metrics_path: env::var("RDS_EXPORTER_METRICS_PATH").ok(),
        region_id: env::var("ALIYUN_REGION_ID").ok(),
        access_key_id: env::var("ALIYUN_ACCESS_KEY_ID").ok(),
        access_key_secret: env::var("ALIYUN_ACCESS_KEY_SECRET").ok(),
        cms_endpoint: env::var("RDS_EXPORTER_CMS_ENDPOINT").ok(),
        namespace: env::var("RDS_EXPORTER_NAMESPACE").ok(),
        request_timeout: env::var("RDS_EXPORTER_REQUEST_TIMEOUT").ok(),
        fetch_deadline: env::var("RDS_EXPORTER_FETCH_DEADLINE").ok(),
        fetch_concurrency,
    })
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.listen_addr {
        cfg.listen_addr = v;
    }
    if let Some(v) = overrides.metrics_path {
        cfg.metrics_path = v;
    }
    if let Some(v) = overrides.region_id {
        cfg.region_id = v;
    }
    if let Some(v) = overrides.access_key_id {
        cfg.access_key_id = v;
    }
    if let Some(v) = overrides.access_key_secret {
        cfg.access_key_secret = v;
    }
    if let Some(v) = overrides.cms_endpoint {
        cfg.cms_endpoint = Some(v);
    }
    if let Some(v) = overrides.namespace {
        cfg.namespace = v;
    }
    if let Some(v) = overrides.request_timeout {
        cfg.request_timeout = parse_duration_str(&v).map_err(|e| {
            ExporterError::Config(format!("bad request_timeout in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.fetch_deadline {
        cfg.fetch_deadline = parse_optional_duration(&v).map_err(|e| {
            ExporterError::Config(format!("bad fetch_deadline in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.fetch_concurrency {
        cfg.fetch_concurrency = v;
    }
    Ok(())
}

/// `off`, `none` and `0` disable the deadline.
fn parse_optional_duration(raw: &str) -> Result<Option<Duration>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "off" | "none" | "0" => Ok(None),
        other => parse_duration_str(other).map(Some),
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}
