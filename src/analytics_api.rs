use crate::client::Client;
use crate::errors::ContractError;
use crate::http::common::Endpoint;
use crate::request::ApiRequest;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::Value;

/// Optional reporting window for [`Client::dashboard_analytics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    fn apply(&self, request: ApiRequest) -> ApiRequest {
        let format = |t: DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        request
            .with_query_opt("startDate", self.start.map(format))
            .with_query_opt("endDate", self.end.map(format))
    }
}

impl Client {
    /// Aggregate figures for the dashboard, optionally limited to `range`.
    pub async fn dashboard_analytics(&self, range: &DateRange) -> Result<Value, ContractError> {
        let request =
            range.apply(ApiRequest::for_endpoint(Method::GET, &Endpoint::DashboardAnalytics)?);
        self.send_json(request).await
    }

    pub async fn contract_analytics(&self, contract_id: &str) -> Result<Value, ContractError> {
        self.send_json(ApiRequest::for_endpoint(
            Method::GET,
            &Endpoint::ContractAnalytics { id: contract_id },
        )?)
        .await
    }
}
