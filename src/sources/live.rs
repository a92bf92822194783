use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::core::error::DashError;
use crate::core::types::{
    AdvancedAnalytics, DashboardSummary, DriftStatus, PasswordCheck, RawIncident,
    ThreatDistribution, TrendSeries,
};
use crate::sources::DashboardSource;

pub const SUMMARY_PATH: &str = "/api/dashboard/summary";
pub const LIVE_INCIDENTS_PATH: &str = "/api/incidents/live";
pub const TRENDS_PATH: &str = "/api/analytics/trends";
pub const DISTRIBUTION_PATH: &str = "/api/analytics/threat-distribution";
pub const ADVANCED_PATH: &str = "/api/analytics/advanced";
pub const DRIFT_PATH: &str = "/api/ml/drift-status";
pub const PASSWORD_CHECK_PATH: &str = "/api/security/password-check";

/// Reads the CyberNow REST backend.
pub struct LiveSource {
    client: Client,
    base: Url,
}

impl LiveSource {
    pub fn new(cfg: &AppConfig) -> Result<Self, DashError> {
        let base = Url::parse(cfg.base_url.trim())
            .map_err(|e| DashError::Config(format!("invalid base_url {}: {}", cfg.base_url, e)))?;
        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(DashError::from)?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DashError> {
        self.base
            .join(path)
            .map_err(|e| DashError::Config(format!("bad endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DashError> {
        let url = self.endpoint(path)?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DashError::Http {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl DashboardSource for LiveSource {
    fn name(&self) -> &'static str {
        "live"
    }

    fn is_demo(&self) -> bool {
        false
    }

    async fn summary(&self) -> Result<DashboardSummary, DashError> {
        self.get_json(SUMMARY_PATH).await
    }

    async fn live_incidents(&self) -> Result<Vec<RawIncident>, DashError> {
        let items: Vec<Value> = self.get_json(LIVE_INCIDENTS_PATH).await?;
        Ok(RawIncident::from_feed(&items))
    }

    async fn trends(&self) -> Result<TrendSeries, DashError> {
        self.get_json(TRENDS_PATH).await
    }

    async fn threat_distribution(&self) -> Result<ThreatDistribution, DashError> {
        self.get_json(DISTRIBUTION_PATH).await
    }

    async fn advanced(&self) -> Result<AdvancedAnalytics, DashError> {
        self.get_json(ADVANCED_PATH).await
    }

    async fn drift_status(&self) -> Result<DriftStatus, DashError> {
        self.get_json(DRIFT_PATH).await
    }

    async fn check_password(&self, password: &str) -> Result<PasswordCheck, DashError> {
        let url = self.endpoint(PASSWORD_CHECK_PATH)?;
        let resp = self
            .client
            .post(url)
            .json(&json!({ "password": password }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DashError::Http {
                status: status.as_u16(),
                endpoint: PASSWORD_CHECK_PATH.to_string(),
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
