use async_trait::async_trait;
use rds_exporter_core::error::Result;

use crate::client::CmsClient;

/// Source of raw `Datapoints` payloads, one call per metric name.
#[async_trait]
pub trait MetricFetcher: Send + Sync {
    async fn fetch(&self, metric_name: &str) -> Result<String>;
}

/// Fetches the latest window of a metric from CloudMonitor.
#[derive(Debug, Clone)]
pub struct CmsFetcher {
    client: CmsClient,
    namespace: String,
}

impl CmsFetcher {
    pub fn new(client: CmsClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl MetricFetcher for CmsFetcher {
    async fn fetch(&self, metric_name: &str) -> Result<String> {
        let last = self
            .client
            .describe_metric_last(&self.namespace, metric_name)
            .await?;
        tracing::trace!(
            metric = %metric_name,
            request_id = ?last.request_id,
            period = ?last.period,
            bytes = last.datapoints.len(),
            "describe metric last answered"
        );
        Ok(last.datapoints)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::Credentials;

    #[tokio::test]
    async fn fetch_scopes_query_to_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("Namespace", "acs_rds_dashboard"))
            .and(query_param("MetricName", "MemoryUsage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Code": "200",
                "Success": true,
                "Datapoints": "[]"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = CmsClient::new(
            &server.uri(),
            Credentials {
                region_id: "cn-hangzhou".into(),
                access_key_id: "id".into(),
                access_key_secret: "secret".into(),
            },
            Duration::from_secs(5),
        )
        .unwrap();
        let fetcher = CmsFetcher::new(client, "acs_rds_dashboard");

        assert_eq!(fetcher.fetch("MemoryUsage").await.unwrap(), "[]");
        // no caching: every call reaches the API
        assert_eq!(fetcher.fetch("MemoryUsage").await.unwrap(), "[]");
    }
}
