use async_trait::async_trait;

use crate::core::error::DashError;
use crate::core::time::now_utc;
use crate::core::types::{
    AdvancedAnalytics, DashboardSummary, DistributionEntry, DriftStatus, PasswordCheck,
    RawIncident, ThreatDistribution, TrendSeries,
};
use crate::sources::DashboardSource;

/// Canned data for running without a backend.
#[derive(Debug, Clone, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        Self
    }
}

fn demo_incident(title: &str, summary: &str, priority: &str, sector: &str) -> RawIncident {
    RawIncident {
        title: Some(title.to_string()),
        summary: Some(summary.to_string()),
        priority: Some(priority.to_string()),
        sector: Some(sector.to_string()),
        timestamp: Some(now_utc().to_rfc3339()),
        url: Some("#".to_string()),
        ..RawIncident::default()
    }
}

#[async_trait]
impl DashboardSource for DemoSource {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn is_demo(&self) -> bool {
        true
    }

    async fn summary(&self) -> Result<DashboardSummary, DashError> {
        Ok(DashboardSummary {
            total_threats_today: 12,
            threats_mitigated: 7,
            critical_incidents: Some(3),
            affected_sectors: Some(5),
        })
    }

    async fn live_incidents(&self) -> Result<Vec<RawIncident>, DashError> {
        Ok(vec![
            demo_incident(
                "Ransomware attack targets financial sector",
                "Simulated incident for demo purposes",
                "CRITICAL",
                "Finance",
            ),
            demo_incident(
                "Phishing campaign impersonates government emails",
                "Credential harvesting detected",
                "HIGH",
                "Government",
            ),
            demo_incident(
                "Malware found in npm package",
                "Supply-chain compromise",
                "MEDIUM",
                "Technology",
            ),
        ])
    }

    async fn trends(&self) -> Result<TrendSeries, DashError> {
        let today = now_utc().date_naive();
        let labels = (0..7i64)
            .rev()
            .map(|back| (today - chrono::Duration::days(back)).to_string())
            .collect();
        Ok(TrendSeries {
            labels,
            detected: vec![8.0, 11.0, 9.0, 14.0, 10.0, 13.0, 12.0],
            mitigated: vec![5.0, 7.0, 6.0, 9.0, 8.0, 8.0, 7.0],
        })
    }

    async fn threat_distribution(&self) -> Result<ThreatDistribution, DashError> {
        let entry = |label: &str, value: f64| DistributionEntry {
            label: Some(label.to_string()),
            value,
        };
        Ok(ThreatDistribution::Entries(vec![
            entry("Ransomware", 4.0),
            entry("Phishing", 3.0),
            entry("Malware", 3.0),
            entry("Vulnerability", 2.0),
        ]))
    }

    async fn advanced(&self) -> Result<AdvancedAnalytics, DashError> {
        Ok(AdvancedAnalytics {
            ml_accuracy: 0.87,
            anomalies_detected: 2,
        })
    }

    async fn drift_status(&self) -> Result<DriftStatus, DashError> {
        Ok(DriftStatus {
            model_version: Some("demo".to_string()),
            drift_detected: false,
            drift_score: Some(0.04),
            timestamp: None,
        })
    }

    async fn check_password(&self, _password: &str) -> Result<PasswordCheck, DashError> {
        Err(DashError::Unsupported(
            "password check needs the live backend".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate;

    #[tokio::test]
    async fn demo_feed_matches_demo_view() {
        let source = DemoSource::new();
        let feed = source.live_incidents().await.unwrap();
        let result = aggregate(&feed);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.critical_count, 2);
        let labels: Vec<&str> = result.sector_counts.iter().map(|(s, _)| s).collect();
        assert_eq!(labels, vec!["Finance", "Government", "Technology"]);
    }

    #[tokio::test]
    async fn demo_trend_covers_a_week() {
        let trend = DemoSource::new().trends().await.unwrap();
        assert_eq!(trend.labels.len(), 7);
        assert_eq!(trend.detected.len(), 7);
        assert_eq!(trend.mitigated.len(), 7);
    }

    #[tokio::test]
    async fn demo_password_check_is_unsupported() {
        let err = DemoSource::new().check_password("hunter2").await.unwrap_err();
        assert!(matches!(err, DashError::Unsupported(_)));
    }
}
