use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serial_test::serial;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INHERITED_ENV: &[&str] = &[
    "RDS_EXPORTER_LISTEN_ADDR",
    "RDS_EXPORTER_METRICS_PATH",
    "ALIYUN_REGION_ID",
    "ALIYUN_ACCESS_KEY_ID",
    "ALIYUN_ACCESS_KEY_SECRET",
    "RDS_EXPORTER_NAMESPACE",
    "RDS_EXPORTER_REQUEST_TIMEOUT",
    "RDS_EXPORTER_FETCH_DEADLINE",
    "RDS_EXPORTER_FETCH_CONCURRENCY",
];

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_rds-exporter")
}

fn exporter_command(temp: &Path, cms_endpoint: &str) -> Command {
    let mut cmd = Command::new(bin());
    for key in INHERITED_ENV {
        cmd.env_remove(key);
    }
    cmd.env("RDS_EXPORTER_CONFIG", temp.join("missing.toml"))
        .env("RDS_EXPORTER_CMS_ENDPOINT", cms_endpoint)
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

fn spawn_exporter(temp: &Path, cms_endpoint: &str, path: &str) -> (Child, u16) {
    let port = free_port();
    let child = exporter_command(temp, cms_endpoint)
        .env("ALIYUN_ACCESS_KEY_ID", "e2e-id")
        .env("ALIYUN_ACCESS_KEY_SECRET", "e2e-secret")
        .arg("--telemetry.address")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--telemetry.endpoint")
        .arg(path)
        .spawn()
        .unwrap();
    (child, port)
}

fn rpc_body(datapoints: &str) -> serde_json::Value {
    serde_json::json!({
        "RequestId": "e2e",
        "Code": "200",
        "Success": true,
        "Period": "60",
        "Datapoints": datapoints,
    })
}

async fn fake_cms() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Action", "DescribeMetricLast"))
        .and(query_param("MetricName", "CpuUsage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rpc_body(
            r#"[{"timestamp":1700000000000,"instanceId":"rm-e2e","Average":31.5},{"timestamp":1700000000000,"instanceId":"","Average":9}]"#,
        )))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("MetricName", "DiskUsage"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "RequestId": "e2e",
            "Code": "InternalError",
            "Message": "backend unavailable",
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rpc_body("[]")))
        .with_priority(10)
        .mount(&server)
        .await;
    server
}

async fn wait_http_ready(port: u16, child: &mut Child) {
    let client = reqwest::Client::new();
    let mut ready = false;
    for _ in 0..100 {
        assert!(child.try_wait().unwrap().is_none(), "rds-exporter exited early");
        if client
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .is_ok()
        {
            ready = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(ready, "metrics listener not ready");
}

#[tokio::test]
#[serial]
async fn e2e_scrape_exports_cms_datapoints() {
    let temp = tempfile::tempdir().unwrap();
    let cms = fake_cms().await;
    let (mut child, port) = spawn_exporter(temp.path(), &cms.uri(), "/metrics");

    wait_http_ready(port, &mut child).await;

    let resp = reqwest::get(format!("http://127.0.0.1:{port}/metrics"))
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain; version=0.0.4"));

    let body = resp.text().await.unwrap();
    assert!(body.contains("# TYPE aliyun_rds_CpuUsage gauge"));
    assert!(body.contains("aliyun_rds_CpuUsage{id=\"rm-e2e\"} 31.5"));
    assert!(!body.contains("aliyun_rds_DiskUsage{"));
    assert!(body.contains("aliyun_rds_exporter_collect_success{metric=\"DiskUsage\"} 0"));
    assert!(body.contains("aliyun_rds_exporter_collect_success{metric=\"CpuUsage\"} 1"));
    assert!(body.contains("aliyun_rds_exporter_collect_dropped{metric=\"CpuUsage\"} 1"));

    let requests = cms.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| {
        r.url
            .query_pairs()
            .any(|(k, v)| k == "AccessKeyId" && v == "e2e-id")
    }));
    assert!(requests.iter().all(|r| r.url.query_pairs().any(|(k, _)| k == "Signature")));

    let _ = child.kill();
    let _ = child.wait();
}

#[tokio::test]
#[serial]
async fn e2e_each_scrape_queries_cms_again() {
    let temp = tempfile::tempdir().unwrap();
    let cms = fake_cms().await;
    let (mut child, port) = spawn_exporter(temp.path(), &cms.uri(), "/rds");

    wait_http_ready(port, &mut child).await;

    let landing = reqwest::get(format!("http://127.0.0.1:{port}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(landing.contains("href=\"/rds\""));

    for _ in 0..2 {
        let resp = reqwest::get(format!("http://127.0.0.1:{port}/rds"))
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    let cpu_calls = cms
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| {
            r.url
                .query_pairs()
                .any(|(k, v)| k == "MetricName" && v == "CpuUsage")
        })
        .count();
    assert_eq!(cpu_calls, 2);

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
#[serial]
fn e2e_missing_credentials_fail_startup() {
    let temp = tempfile::tempdir().unwrap();
    let output = exporter_command(temp.path(), "http://127.0.0.1:1")
        .arg("--telemetry.address")
        .arg(format!("127.0.0.1:{}", free_port()))
        .output()
        .unwrap();
    assert!(!output.status.success());
}
