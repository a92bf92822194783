use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CountPolicy;
use crate::core::engine::{CycleOutcome, FeedSection, SectionError};
use crate::core::types::{AdvancedAnalytics, ChartSeries, DashboardSummary, DriftStatus, TrendSeries};

/// The four top cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub total: u64,
    pub critical: u64,
    pub sectors: u64,
    pub mitigated: u64,
}

/// Latest good value of every dashboard section.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    pub demo: bool,
    pub summary: Option<DashboardSummary>,
    pub feed: Option<FeedSection>,
    pub trends: Option<TrendSeries>,
    pub distribution: Option<ChartSeries>,
    pub advanced: Option<AdvancedAnalytics>,
    pub drift: Option<DriftStatus>,
    pub last_updated: Option<DateTime<Utc>>,
    pub cycles: u64,
    pub last_errors: Vec<SectionError>,
}

impl DashboardSnapshot {
    pub fn new(demo: bool) -> Self {
        Self {
            demo,
            ..Self::default()
        }
    }

    /// Sections present in the outcome replace the old ones; failed sections stay stale.
    pub fn apply(&mut self, outcome: CycleOutcome) {
        fn replace<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        replace(&mut self.summary, outcome.summary);
        replace(&mut self.feed, outcome.feed);
        replace(&mut self.trends, outcome.trends);
        replace(&mut self.distribution, outcome.distribution);
        replace(&mut self.advanced, outcome.advanced);
        replace(&mut self.drift, outcome.drift);
        self.last_updated = Some(outcome.started_at);
        self.last_errors = outcome.errors;
        self.cycles += 1;
    }

    pub fn counters(&self, policy: CountPolicy) -> Counters {
        let (total, mitigated) = self
            .summary
            .as_ref()
            .map(|s| (s.total_threats_today, s.threats_mitigated))
            .unwrap_or_default();
        let (client_critical, client_sectors) = self
            .feed
            .as_ref()
            .map(|f| (f.aggregate.critical_count, f.aggregate.distinct_sector_count))
            .unwrap_or_default();

        let (critical, sectors) = match policy {
            CountPolicy::Client => (client_critical, client_sectors),
            CountPolicy::Backend => {
                let backend = self.summary.as_ref();
                (
                    backend
                        .and_then(|s| s.critical_incidents)
                        .unwrap_or(client_critical),
                    backend
                        .and_then(|s| s.affected_sectors)
                        .unwrap_or(client_sectors),
                )
            }
        };

        Counters {
            total,
            critical,
            sectors,
            mitigated,
        }
    }

    pub fn banner_text(&self, policy: CountPolicy) -> Option<String> {
        let critical = self.counters(policy).critical;
        if critical == 0 {
            return None;
        }
        let suffix = if self.demo {
            "(Demo Mode)"
        } else {
            "in live feed"
        };
        Some(format!(
            "{} HIGH / CRITICAL incidents detected {}",
            critical, suffix
        ))
    }
}
