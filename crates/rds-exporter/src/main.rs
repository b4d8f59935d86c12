mod server;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rds_exporter_cms::{CmsClient, CmsFetcher};
use rds_exporter_collect::{Collector, CollectorConfig, Exporter};
use rds_exporter_core::catalog::MetricCatalog;
use rds_exporter_core::config::Config;

use crate::telemetry::{LogFormat, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "rds-exporter")]
#[command(about = "Expose Alibaba Cloud RDS metrics from CloudMonitor to Prometheus")]
#[command(version)]
struct Cli {
    #[arg(long = "telemetry.address", help = "Address on which to expose metrics")]
    listen_address: Option<String>,

    #[arg(long = "telemetry.endpoint", help = "Path under which to expose metrics")]
    metrics_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(LogFormat::from_env());

    let mut cfg = Config::load().context("load configuration")?;
    if let Some(v) = cli.listen_address {
        cfg.listen_addr = v;
    }
    if let Some(v) = cli.metrics_endpoint {
        cfg.metrics_path = v;
    }
    cfg.validate()?;

    let addr = parse_listen_addr(&cfg.listen_addr)?;
    let client = CmsClient::from_config(&cfg)?;
    tracing::info!(
        endpoint = %client.endpoint(),
        region = %cfg.region_id,
        namespace = %cfg.namespace,
        path = %cfg.metrics_path,
        concurrency = cfg.fetch_concurrency,
        "starting rds-exporter"
    );

    let catalog = Arc::new(MetricCatalog::rds());
    let fetcher = Arc::new(CmsFetcher::new(client, cfg.namespace.clone()));
    let collector = Collector::new(
        catalog,
        fetcher,
        CollectorConfig {
            concurrency: cfg.fetch_concurrency,
            fetch_deadline: cfg.fetch_deadline,
        },
    );
    let router = server::router(Exporter::new(collector), &cfg.metrics_path);

    server::run_server(addr, router).await
}

/// Accepts `host:port` as well as the bare `:port` form, which binds all interfaces.
fn parse_listen_addr(raw: &str) -> anyhow::Result<SocketAddr> {
    let normalized = match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => raw.to_string(),
    };
    normalized
        .parse()
        .with_context(|| format!("invalid listen address: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_listen_addr_variants() {
        assert_eq!(
            parse_listen_addr(":8024").unwrap(),
            "0.0.0.0:8024".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_listen_addr("127.0.0.1:9100").unwrap(),
            "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_addr("localhost").is_err());
    }

    #[test]
    fn cli_accepts_dotted_flags() {
        let cli = Cli::try_parse_from([
            "rds-exporter",
            "--telemetry.address",
            ":9000",
            "--telemetry.endpoint",
            "/rds",
        ])
        .unwrap();
        assert_eq!(cli.listen_address.as_deref(), Some(":9000"));
        assert_eq!(cli.metrics_endpoint.as_deref(), Some("/rds"));
    }
}
