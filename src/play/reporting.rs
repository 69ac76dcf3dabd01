//! Play Developer Reporting API (v1beta1).
//!
//! Metric-set queries are `POST ...:query` calls but never change state, so
//! they bypass dry-run interception.

use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use serde_json::{Value, json};

use crate::{Res, play::PlayClient};

/// Reporting dates are interpreted in the Play Console's reporting time zone.
const REPORTING_TIME_ZONE: &str = "America/Los_Angeles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalsMetric {
    Crash,
    Anr,
}

impl VitalsMetric {
    pub fn metric_set(self) -> &'static str {
        match self {
            VitalsMetric::Crash => "crashRateMetricSet",
            VitalsMetric::Anr => "anrRateMetricSet",
        }
    }

    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            VitalsMetric::Crash => &["crashRate", "userPerceivedCrashRate", "distinctUsers"],
            VitalsMetric::Anr => &["anrRate", "userPerceivedAnrRate", "distinctUsers"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct VitalsQuery {
    pub metric: VitalsMetric,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub dimensions: Vec<String>,
    pub page_size: Option<u32>,
}

fn date_time(date: NaiveDate) -> Value {
    json!({
        "year": date.year(),
        "month": date.month(),
        "day": date.day(),
        "timeZone": { "id": REPORTING_TIME_ZONE },
    })
}

impl VitalsQuery {
    pub fn body(&self, page_token: Option<String>) -> Value {
        let mut body = json!({
            "timelineSpec": {
                "aggregationPeriod": "DAILY",
                "startTime": date_time(self.from),
                "endTime": date_time(self.to),
            },
            "metrics": self.metric.metrics(),
        });
        if !self.dimensions.is_empty() {
            body["dimensions"] = json!(self.dimensions);
        }
        if let Some(size) = self.page_size {
            body["pageSize"] = json!(size);
        }
        if let Some(token) = page_token {
            body["pageToken"] = json!(token);
        }
        body
    }
}

impl PlayClient {
    pub async fn query_vitals(&self, package: &str, query: &VitalsQuery, page_token: Option<String>) -> Res<Value> {
        let url = self.reporting_url(&format!(
            "apps/{}/{}:query",
            package,
            query.metric.metric_set()
        ));
        self.send_json_always(Method::POST, &url, Some(query.body(page_token)))
            .await
    }

    pub async fn query_all_vitals(&self, package: &str, query: &VitalsQuery) -> Res<Value> {
        super::collect_pages("rows", |token| self.query_vitals(package, query, token)).await
    }

    pub async fn list_anomalies(
        &self,
        package: &str,
        filter: Option<&str>,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Res<Value> {
        let mut query = Vec::new();
        if let Some(filter) = filter {
            query.push(("filter", filter.to_string()));
        }
        if let Some(size) = page_size {
            query.push(("pageSize", size.to_string()));
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let url = self.reporting_url(&format!("apps/{package}/anomalies"));
        self.get(&url, &query).await
    }

    pub async fn list_all_anomalies(&self, package: &str, filter: Option<&str>, page_size: Option<u32>) -> Res<Value> {
        super::collect_pages("anomalies", |token| {
            self.list_anomalies(package, filter, page_size, token)
        })
        .await
    }
}
