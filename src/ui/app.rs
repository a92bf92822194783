use std::time::{Duration, Instant};

use chrono::Local;

use crate::config::{AppConfig, CountPolicy};
use crate::core::engine::{password_result_text, CycleOutcome};
use crate::core::error::DashError;
use crate::core::snapshot::{Counters, DashboardSnapshot};
use crate::core::types::{ChartSeries, PasswordCheck, TrendSeries};
use crate::ui::animation::CounterAnimation;
use crate::ui::charts::ChartPanel;

const MAX_LOGS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Password,
}

#[derive(Debug, Clone, Copy)]
struct AnimatedCounters {
    total: CounterAnimation,
    critical: CounterAnimation,
    sectors: CounterAnimation,
    mitigated: CounterAnimation,
}

impl AnimatedCounters {
    fn new(duration: Duration, now: Instant) -> Self {
        let zero = CounterAnimation::new(0, 0, duration, now);
        Self {
            total: zero,
            critical: zero,
            sectors: zero,
            mitigated: zero,
        }
    }

    fn retarget(&mut self, target: Counters, now: Instant) {
        for (anim, value) in [
            (&mut self.total, target.total),
            (&mut self.critical, target.critical),
            (&mut self.sectors, target.sectors),
            (&mut self.mitigated, target.mitigated),
        ] {
            anim.retarget(i64::try_from(value).unwrap_or(i64::MAX), now);
        }
    }

    fn at(&self, now: Instant) -> Counters {
        let clamp = |a: &CounterAnimation| a.value_at(now).max(0) as u64;
        Counters {
            total: clamp(&self.total),
            critical: clamp(&self.critical),
            sectors: clamp(&self.sectors),
            mitigated: clamp(&self.mitigated),
        }
    }
}

pub struct DashboardApp {
    pub snapshot: DashboardSnapshot,
    pub policy: CountPolicy,
    pub source_name: &'static str,
    pub sector_chart: ChartPanel<ChartSeries>,
    pub distribution_chart: ChartPanel<ChartSeries>,
    pub trend_chart: ChartPanel<TrendSeries>,
    pub logs: Vec<String>,
    pub refreshing: bool,
    pub feed_offset: usize,
    pub feed_limit: usize,
    pub input_mode: InputMode,
    pub password_input: String,
    pub password_result: Option<String>,
    pub checking_password: bool,
    pub tick: usize,
    counters: AnimatedCounters,
}

impl DashboardApp {
    pub fn new(cfg: &AppConfig, demo: bool, source_name: &'static str) -> Self {
        let now = Instant::now();
        let mode = if demo { "DEMO" } else { "LIVE" };
        Self {
            snapshot: DashboardSnapshot::new(demo),
            policy: cfg.count_policy_for(demo),
            source_name,
            sector_chart: ChartPanel::new(" 🏢 AFFECTED SECTORS "),
            distribution_chart: ChartPanel::new(" 🧬 THREAT DISTRIBUTION "),
            trend_chart: ChartPanel::new(" 📈 THREAT TRENDS "),
            logs: vec![
                "[SYSTEM] CYBERNOW DASHBOARD BOOT".to_string(),
                format!("[SYSTEM] RUNNING IN {} MODE", mode),
            ],
            refreshing: false,
            feed_offset: 0,
            feed_limit: cfg.feed_limit.max(1),
            input_mode: InputMode::Normal,
            password_input: String::new(),
            password_result: None,
            checking_password: false,
            tick: 0,
            counters: AnimatedCounters::new(Duration::from_millis(cfg.animation_ms), now),
        }
    }

    pub fn is_demo(&self) -> bool {
        self.snapshot.demo
    }

    pub fn start_refresh(&mut self) {
        self.refreshing = true;
    }

    /// Merge a finished cycle and remount the charts whose data changed.
    pub fn apply_outcome(&mut self, outcome: CycleOutcome, now: Instant) {
        self.refreshing = false;
        let at = outcome.started_at;
        let feed_updated = outcome.feed.is_some();
        let trends_updated = outcome.trends.is_some();
        let distribution_updated = outcome.distribution.is_some();
        for err in &outcome.errors {
            self.log(format!("⚠️ {} unavailable: {}", err.section, err.message));
        }
        self.snapshot.apply(outcome);

        if feed_updated {
            match self.snapshot.feed.as_ref().map(|f| &f.sector_series) {
                Some(series) if !series.is_empty() => self.sector_chart.mount(series.clone(), at),
                _ => self.sector_chart.destroy(),
            }
            self.clamp_feed_offset();
        }
        if trends_updated {
            if let Some(trend) = &self.snapshot.trends {
                self.trend_chart.mount(trend.clone(), at);
            }
        }
        if distribution_updated {
            match &self.snapshot.distribution {
                Some(series) if !series.is_empty() => {
                    self.distribution_chart.mount(series.clone(), at)
                }
                _ => self.distribution_chart.destroy(),
            }
        }

        let target = self.snapshot.counters(self.policy);
        self.counters.retarget(target, now);
        self.log(format!(
            "✅ refresh #{}: {} incidents, {} critical",
            self.snapshot.cycles, target.total, target.critical
        ));
    }

    pub fn refresh_skipped(&mut self, reason: &str) {
        self.refreshing = false;
        self.log(format!("⏳ refresh skipped ({})", reason));
    }

    pub fn refresh_failed(&mut self, err: &str) {
        self.refreshing = false;
        self.log(format!("⚠️ refresh failed: {}", err));
    }

    pub fn displayed_counters(&self, now: Instant) -> Counters {
        self.counters.at(now)
    }

    pub fn banner(&self) -> Option<String> {
        self.snapshot.banner_text(self.policy)
    }

    pub fn feed_len(&self) -> usize {
        self.snapshot
            .feed
            .as_ref()
            .map(|f| f.items.len().min(self.feed_limit))
            .unwrap_or(0)
    }

    pub fn scroll_down(&mut self) {
        if self.feed_offset + 1 < self.feed_len() {
            self.feed_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.feed_offset = self.feed_offset.saturating_sub(1);
    }

    fn clamp_feed_offset(&mut self) {
        let len = self.feed_len();
        if self.feed_offset >= len {
            self.feed_offset = len.saturating_sub(1);
        }
    }

    pub fn enter_password_mode(&mut self) {
        self.input_mode = InputMode::Password;
        self.password_input.clear();
    }

    pub fn cancel_password_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.password_input.clear();
    }

    /// Takes the typed password. `None` when blank: the result text is set right away.
    pub fn submit_password(&mut self) -> Option<String> {
        self.input_mode = InputMode::Normal;
        let password = std::mem::take(&mut self.password_input);
        if password.trim().is_empty() {
            self.password_result = Some(password_result_text(&Ok(None)));
            return None;
        }
        self.checking_password = true;
        self.password_result = Some("Checking...".to_string());
        Some(password)
    }

    pub fn complete_password_check(&mut self, result: Result<Option<PasswordCheck>, DashError>) {
        self.checking_password = false;
        if let Err(err) = &result {
            self.log(format!("⚠️ password check failed: {}", err));
        }
        self.password_result = Some(password_result_text(&result));
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.logs
            .push(format!("[{}] {}", Local::now().format("%H:%M:%S"), msg.into()));
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }
}
