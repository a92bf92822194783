//! Incident sources: the live REST backend or canned demo data.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AppConfig, SourceMode};
use crate::core::error::DashError;
use crate::core::types::{
    AdvancedAnalytics, DashboardSummary, DriftStatus, PasswordCheck, RawIncident,
    ThreatDistribution, TrendSeries,
};

pub mod demo;
pub mod live;
pub mod rate_limiter;

pub use demo::DemoSource;
pub use live::LiveSource;

/// Everything the dashboard reads. Each call maps to one endpoint and fails independently.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_demo(&self) -> bool;

    async fn summary(&self) -> Result<DashboardSummary, DashError>;
    async fn live_incidents(&self) -> Result<Vec<RawIncident>, DashError>;
    async fn trends(&self) -> Result<TrendSeries, DashError>;
    async fn threat_distribution(&self) -> Result<ThreatDistribution, DashError>;
    async fn advanced(&self) -> Result<AdvancedAnalytics, DashError>;
    async fn drift_status(&self) -> Result<DriftStatus, DashError>;
    async fn check_password(&self, password: &str) -> Result<PasswordCheck, DashError>;
}

/// Pick the source strategy once, from config.
pub fn build_source(cfg: &AppConfig) -> Result<Arc<dyn DashboardSource>, DashError> {
    match cfg.resolved_source() {
        SourceMode::Demo => {
            tracing::info!("using demo incident source");
            Ok(Arc::new(DemoSource::new()))
        }
        _ => {
            tracing::info!(base_url = %cfg.base_url, "using live incident source");
            Ok(Arc::new(LiveSource::new(cfg)?))
        }
    }
}
