use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::AppConfig,
    core::{
        error::DashError,
        time::now_utc,
        types::{
            AdvancedAnalytics, AggregateResult, ChartSeries, DashboardSummary, DriftStatus,
            FeedItem, PasswordCheck, TrendSeries,
        },
    },
    pipeline::{aggregate_feed, build_feed, series},
    sources::{rate_limiter::RefreshGuard, DashboardSource},
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Summary,
    Feed,
    Trends,
    Distribution,
    Advanced,
    Drift,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Summary => "summary",
            Section::Feed => "live feed",
            Section::Trends => "trends",
            Section::Distribution => "threat distribution",
            Section::Advanced => "advanced analytics",
            Section::Drift => "drift status",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionError {
    pub section: Section,
    pub message: String,
}

/// Live feed after normalization and aggregation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedSection {
    pub items: Vec<FeedItem>,
    pub aggregate: AggregateResult,
    pub sector_series: ChartSeries,
}

impl FeedSection {
    pub fn from_items(items: Vec<FeedItem>) -> Self {
        let aggregate = aggregate_feed(&items);
        let sector_series = series::sector_series(&aggregate);
        Self {
            items,
            aggregate,
            sector_series,
        }
    }
}

/// Result of one refresh cycle. `None` sections failed and keep their previous value.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub started_at: DateTime<Utc>,
    pub summary: Option<DashboardSummary>,
    pub feed: Option<FeedSection>,
    pub trends: Option<TrendSeries>,
    pub distribution: Option<ChartSeries>,
    pub advanced: Option<AdvancedAnalytics>,
    pub drift: Option<DriftStatus>,
    pub errors: Vec<SectionError>,
}

impl CycleOutcome {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Releases the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Engine {
    source: Arc<dyn DashboardSource>,
    pub config: AppConfig,
    in_flight: AtomicBool,
    guard: Mutex<RefreshGuard>,
}

impl Engine {
    pub fn new(config: AppConfig, source: Arc<dyn DashboardSource>) -> Self {
        let min_interval = Duration::from_millis(config.min_refresh_interval_ms);
        Self {
            source,
            config,
            in_flight: AtomicBool::new(false),
            guard: Mutex::new(RefreshGuard::new(min_interval)),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn is_demo(&self) -> bool {
        self.source.is_demo()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh skipped: previous cycle still in flight");
            return None;
        }
        let flight = InFlight(&self.in_flight);
        let allowed = match self.guard.lock() {
            Ok(mut guard) => guard.allow(),
            Err(_) => true,
        };
        if !allowed {
            tracing::debug!("refresh skipped: minimum interval not elapsed");
            return None;
        }
        Some(flight)
    }

    /// One fetch-normalize-aggregate pass. Returns `None` when the cycle was skipped.
    pub async fn run_cycle(&self) -> Option<CycleOutcome> {
        let _flight = self.begin()?;
        let started_at = now_utc();
        let source = self.source.as_ref();

        let (summary, feed, trends, distribution, advanced, drift) = tokio::join!(
            source.summary(),
            source.live_incidents(),
            source.trends(),
            source.threat_distribution(),
            source.advanced(),
            source.drift_status(),
        );

        let mut errors = Vec::new();
        let summary = record(Section::Summary, summary, &mut errors);
        let feed = record(Section::Feed, feed, &mut errors)
            .map(|raws| FeedSection::from_items(build_feed(&raws)));
        let trends = record(Section::Trends, trends, &mut errors);
        let distribution =
            record(Section::Distribution, distribution, &mut errors).map(series::distribution_series);
        let advanced = record(Section::Advanced, advanced, &mut errors);
        let drift = record(Section::Drift, drift, &mut errors);

        if let Some(feed) = &feed {
            tracing::info!(
                source = self.source.name(),
                incidents = feed.aggregate.total_count,
                critical = feed.aggregate.critical_count,
                sectors = feed.aggregate.distinct_sector_count,
                failed_sections = errors.len(),
                "refresh cycle complete"
            );
        } else {
            tracing::info!(
                source = self.source.name(),
                failed_sections = errors.len(),
                "refresh cycle complete without live feed"
            );
        }

        Some(CycleOutcome {
            started_at,
            summary,
            feed,
            trends,
            distribution,
            advanced,
            drift,
            errors,
        })
    }

    /// `Ok(None)` for blank input: nothing is sent.
    pub async fn check_password(&self, password: &str) -> Result<Option<PasswordCheck>, DashError> {
        let password = password.trim();
        if password.is_empty() {
            return Ok(None);
        }
        self.source.check_password(password).await.map(Some)
    }
}

fn record<T>(section: Section, result: Result<T, DashError>, errors: &mut Vec<SectionError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            if err.is_transport() {
                tracing::warn!(%section, error = %err, "section refresh failed; keeping previous data");
            } else {
                tracing::error!(%section, error = %err, "section refresh failed; keeping previous data");
            }
            errors.push(SectionError {
                section,
                message: err.to_string(),
            });
            None
        }
    }
}

/// User-facing text for a password check result.
pub fn password_result_text(result: &Result<Option<PasswordCheck>, DashError>) -> String {
    match result {
        Ok(Some(check)) => check.message(),
        Ok(None) => "Please enter a password".to_string(),
        Err(DashError::Unsupported(msg)) => msg.clone(),
        Err(_) => "Network error".to_string(),
    }
}
