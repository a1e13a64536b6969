// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the analytics backend.
//!
//! A fetch succeeds only when the backend answers 2xx with a JSON object that
//! has no top-level `error` key. Missing fields inside a successful object
//! decode to zero or empty defaults.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use ledgerdesk_config::BackendConfig;
use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::metrics::{
    ClosedOpportunity, ClosedOpportunityList, DashboardMetrics, DataSource, OverdueInvoice,
    OverdueInvoiceList,
};
use ledgerdesk_core::traits::{Adapter, MetricsBackend};

/// Longest slice of an error body carried into a fetch error.
const MAX_ERROR_BODY: usize = 200;

/// reqwest-backed [`MetricsBackend`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    dashboard_path: String,
    overdue_path: String,
    opportunities_path: String,
}

fn fetch_error(source: DataSource, message: impl Into<String>) -> LedgerdeskError {
    LedgerdeskError::Fetch {
        source_name: source.to_string(),
        message: message.into(),
        source: None,
    }
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, LedgerdeskError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LedgerdeskError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dashboard_path: config.dashboard_path.clone(),
            overdue_path: config.overdue_path.clone(),
            opportunities_path: config.opportunities_path.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, source: DataSource) -> String {
        let path = match source {
            DataSource::DashboardMetrics => &self.dashboard_path,
            DataSource::OverdueInvoices => &self.overdue_path,
            DataSource::ClosedOpportunities => &self.opportunities_path,
        };
        format!("{}{path}", self.base_url)
    }

    async fn fetch<T: DeserializeOwned>(&self, source: DataSource) -> Result<T, LedgerdeskError> {
        let url = self.url_for(source);
        let response = self.client.get(&url).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                format!("request failed: {e}")
            };
            LedgerdeskError::Fetch {
                source_name: source.to_string(),
                message,
                source: Some(Box::new(e)),
            }
        })?;

        let status = response.status();
        debug!(%source, %status, "backend response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
            return Err(fetch_error(source, format!("HTTP {status}: {body}")));
        }

        let body: Value = response.json().await.map_err(|e| LedgerdeskError::Fetch {
            source_name: source.to_string(),
            message: format!("invalid JSON body: {e}"),
            source: Some(Box::new(e)),
        })?;
        decode_body(source, body)
    }
}

/// Apply the success rules to an already parsed 2xx body.
pub fn decode_body<T: DeserializeOwned>(
    source: DataSource,
    body: Value,
) -> Result<T, LedgerdeskError> {
    let Value::Object(map) = body else {
        return Err(fetch_error(source, "response is not a JSON object"));
    };
    if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(fetch_error(source, format!("backend error: {message}")));
    }
    serde_json::from_value(Value::Object(map))
        .map_err(|e| fetch_error(source, format!("unexpected response shape: {e}")))
}

impl Adapter for BackendClient {
    fn name(&self) -> &str {
        "http-backend"
    }
}

#[async_trait]
impl MetricsBackend for BackendClient {
    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, LedgerdeskError> {
        self.fetch(DataSource::DashboardMetrics).await
    }

    async fn overdue_invoices(&self) -> Result<Vec<OverdueInvoice>, LedgerdeskError> {
        let list: OverdueInvoiceList = self.fetch(DataSource::OverdueInvoices).await?;
        Ok(list.invoices)
    }

    async fn closed_opportunities(&self) -> Result<Vec<ClosedOpportunity>, LedgerdeskError> {
        let list: ClosedOpportunityList = self.fetch(DataSource::ClosedOpportunities).await?;
        Ok(list.opportunities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        let config = BackendConfig {
            base_url: format!("{}/", server.uri()),
            ..BackendConfig::default()
        };
        BackendClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn dashboard_metrics_decode_with_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard-metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "today_revenue": 1520.75,
                "invoice_stats": {
                    "pending": {"count": 3, "amount": 300.0},
                    "success": {"count": 1}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let metrics = client_for(&server).dashboard_metrics().await.unwrap();
        assert_eq!(metrics.today_revenue, 1520.75);
        assert_eq!(metrics.invoice_stats.pending.count, 3);
        assert_eq!(metrics.invoice_stats.success.amount, 0.0);
        assert_eq!(metrics.invoice_stats.overdue.count, 0);
    }

    #[tokio::test]
    async fn overdue_list_is_unwrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/overdue-recurring-invoices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invoices": [
                    {"invoice_id": "INV-1", "created_at": "2026-08-01", "overdue_days": 45},
                    {"invoice_id": "INV-2", "created_at": "2026-09-01", "overdue_days": 14}
                ]
            })))
            .mount(&server)
            .await;

        let invoices = client_for(&server).overdue_invoices().await.unwrap();
        let ids: Vec<&str> = invoices.iter().map(|i| i.invoice_id.as_str()).collect();
        assert_eq!(ids, vec!["INV-1", "INV-2"]);
        assert_eq!(invoices[0].overdue_days, 45);
    }

    #[tokio::test]
    async fn missing_list_key_is_an_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/closed-opportunities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert!(client_for(&server).closed_opportunities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard-metrics"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).dashboard_metrics().await.unwrap_err();
        match err {
            LedgerdeskError::Fetch {
                source_name,
                message,
                ..
            } => {
                assert_eq!(source_name, "dashboard_metrics");
                assert!(message.contains("503"), "got: {message}");
                assert!(message.contains("maintenance"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_body_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/closed-opportunities"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "salesforce unavailable"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).closed_opportunities().await.unwrap_err();
        assert!(err.to_string().contains("salesforce unavailable"));
    }

    #[tokio::test]
    async fn non_object_body_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/overdue-recurring-invoices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;

        let err = client_for(&server).overdue_invoices().await.unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[tokio::test]
    async fn invalid_json_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard-metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).dashboard_metrics().await.unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[tokio::test]
    async fn configured_paths_are_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/invoices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"today_revenue": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let config = BackendConfig {
            base_url: server.uri(),
            dashboard_path: "/api/dashboard/invoices".into(),
            ..BackendConfig::default()
        };
        let metrics = BackendClient::new(&config)
            .unwrap()
            .dashboard_metrics()
            .await
            .unwrap();
        assert_eq!(metrics.today_revenue, 5.0);
    }

    #[test]
    fn wrong_field_types_are_a_shape_error() {
        let err = decode_body::<DashboardMetrics>(
            DataSource::DashboardMetrics,
            json!({"today_revenue": "lots"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unexpected response shape"));
    }

    #[test]
    fn null_fields_in_every_source_decode_as_defaults() {
        let metrics = decode_body::<DashboardMetrics>(
            DataSource::DashboardMetrics,
            json!({"today_revenue": null, "invoice_stats": {"overdue": {"count": 2, "amount": null}}}),
        )
        .unwrap();
        assert_eq!(metrics.today_revenue, 0.0);
        assert_eq!(metrics.invoice_stats.overdue.count, 2);

        let overdue = decode_body::<OverdueInvoiceList>(
            DataSource::OverdueInvoices,
            json!({"invoices": [{"invoice_id": "INV-3", "created_at": null, "overdue_days": 40}]}),
        )
        .unwrap();
        assert_eq!(overdue.invoices[0].created_at, "");
        assert_eq!(overdue.invoices[0].overdue_days, 40);

        let opportunities = decode_body::<ClosedOpportunityList>(
            DataSource::ClosedOpportunities,
            json!({"opportunities": null}),
        )
        .unwrap();
        assert!(opportunities.opportunities.is_empty());
    }

    #[test]
    fn null_error_key_is_not_a_failure() {
        let overdue = decode_body::<OverdueInvoiceList>(
            DataSource::OverdueInvoices,
            json!({"error": null, "invoices": []}),
        )
        .unwrap();
        assert!(overdue.invoices.is_empty());
    }
}
