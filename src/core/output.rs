use std::fs;
use std::io::Write;
use std::path::Path;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;

use crate::config::CountPolicy;
use crate::core::error::DashError;
use crate::core::snapshot::{Counters, DashboardSnapshot};
use crate::core::time::now_utc;
use crate::core::types::{FeedItem, OutputFormat};

#[derive(Serialize)]
struct SnapshotReport<'a> {
    generated_at: String,
    mode: &'static str,
    count_policy: CountPolicy,
    counters: Counters,
    banner: Option<String>,
    #[serde(flatten)]
    snapshot: &'a DashboardSnapshot,
}

pub fn render_snapshot(
    snapshot: &DashboardSnapshot,
    format: OutputFormat,
    policy: CountPolicy,
) -> Result<String, DashError> {
    match format {
        OutputFormat::Json => render_json(snapshot, policy),
        OutputFormat::Markdown => Ok(render_markdown(snapshot, policy)),
        OutputFormat::Html => Ok(render_feed_html(
            snapshot
                .feed
                .as_ref()
                .map(|f| f.items.as_slice())
                .unwrap_or_default(),
        )),
    }
}

/// Write to `path`, or stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<(), DashError> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, content)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn render_json(snapshot: &DashboardSnapshot, policy: CountPolicy) -> Result<String, DashError> {
    let report = SnapshotReport {
        generated_at: now_utc().to_rfc3339(),
        mode: if snapshot.demo { "demo" } else { "live" },
        count_policy: policy,
        counters: snapshot.counters(policy),
        banner: snapshot.banner_text(policy),
        snapshot,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_markdown(snapshot: &DashboardSnapshot, policy: CountPolicy) -> String {
    let counters = snapshot.counters(policy);
    let mut out = String::new();
    out.push_str("# CyberNow Dashboard\n\n");
    out.push_str(&format!("Generated: {}\n", now_utc().to_rfc3339()));
    out.push_str(&format!(
        "Mode: {}\n\n",
        if snapshot.demo { "demo" } else { "live" }
    ));
    if let Some(banner) = snapshot.banner_text(policy) {
        out.push_str(&format!("> **{}**\n\n", banner));
    }

    out.push_str("| Threats today | Critical | Sectors | Mitigated |\n");
    out.push_str("|---------------|----------|---------|-----------|\n");
    out.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        counters.total, counters.critical, counters.sectors, counters.mitigated
    ));

    out.push_str("## Affected sectors\n\n");
    match snapshot.feed.as_ref().filter(|f| !f.sector_series.is_empty()) {
        Some(feed) => {
            for (label, value) in feed
                .sector_series
                .labels
                .iter()
                .zip(feed.sector_series.values.iter())
            {
                out.push_str(&format!("- {}: {}\n", label, value));
            }
        }
        None => out.push_str("_no incidents_\n"),
    }

    out.push_str("\n## Live feed\n\n");
    match snapshot.feed.as_ref().filter(|f| !f.items.is_empty()) {
        Some(feed) => {
            for item in &feed.items {
                let inc = &item.incident;
                out.push_str(&format!(
                    "- **{}** [{}] {}{}\n",
                    inc.title,
                    inc.priority,
                    item.resolved_sector,
                    inc.timestamp
                        .map(|t| format!(" @ {}", t.to_rfc3339()))
                        .unwrap_or_default()
                ));
                if !inc.summary.is_empty() {
                    out.push_str(&format!("  - {}\n", inc.summary));
                }
            }
        }
        None => out.push_str("_feed empty or unavailable_\n"),
    }

    if let Some(trend) = &snapshot.trends {
        out.push_str("\n## Threat trends\n\n");
        out.push_str("| Day | Detected | Mitigated |\n|-----|----------|-----------|\n");
        for (i, label) in trend.labels.iter().enumerate() {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                label,
                trend.detected.get(i).copied().unwrap_or_default(),
                trend.mitigated.get(i).copied().unwrap_or_default()
            ));
        }
    }

    if let Some(adv) = &snapshot.advanced {
        out.push_str(&format!(
            "\n## Analytics\n\n- ML accuracy: {:.1}%\n- Anomalies (7d): {}\n",
            adv.accuracy_ratio() * 100.0,
            adv.anomalies_detected
        ));
    }

    if !snapshot.last_errors.is_empty() {
        out.push_str("\n## Stale sections\n\n");
        for err in &snapshot.last_errors {
            out.push_str(&format!("- {}: {}\n", err.section, err.message));
        }
    }
    out
}

/// Feed fragment with every feed-controlled string escaped.
pub fn render_feed_html(items: &[FeedItem]) -> String {
    let mut out = String::new();
    for item in items {
        let inc = &item.incident;
        let priority = inc.priority.as_str();
        out.push_str(&format!(
            "<a class=\"news-item\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">\n",
            encode_double_quoted_attribute(&safe_href(&inc.url))
        ));
        let ts = inc.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default();
        out.push_str(&format!("  <div class=\"timestamp\">{}</div>\n", ts));
        out.push_str(&format!("  <strong>{}</strong>\n", encode_text(&inc.title)));
        out.push_str(&format!(
            "  <span class=\"severity {}\">{}</span>\n",
            priority.to_lowercase(),
            priority
        ));
        out.push_str(&format!(
            "  <span class=\"sector\">{}</span>\n",
            encode_text(&item.resolved_sector)
        ));
        out.push_str(&format!("  <div>{}</div>\n", encode_text(&inc.summary)));
        out.push_str("</a>\n");
    }
    out
}

/// Only http(s) links survive; anything else becomes the placeholder.
pub fn safe_href(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed.to_string(),
        _ => "#".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{CycleOutcome, FeedSection};
    use crate::core::types::RawIncident;
    use crate::pipeline::build_feed;

    fn feed_of(raws: Vec<RawIncident>) -> Vec<FeedItem> {
        build_feed(&raws)
    }

    #[test]
    fn html_escapes_feed_text() {
        let items = feed_of(vec![RawIncident {
            title: Some("<script>alert(1)</script>".into()),
            summary: Some("a & b".into()),
            sector: Some("<b>IT</b>".into()),
            url: Some("javascript:alert(1)".into()),
            priority: Some("high".into()),
            ..RawIncident::default()
        }]);
        let html = render_feed_html(&items);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("&lt;b&gt;IT&lt;/b&gt;"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("<span class=\"severity high\">HIGH</span>"));
    }

    #[test]
    fn href_quotes_are_escaped() {
        assert_eq!(safe_href("https://example.org/a"), "https://example.org/a");
        assert_eq!(safe_href("#"), "#");
        assert_eq!(safe_href("data:text/html,hi"), "#");
        let items = feed_of(vec![RawIncident {
            url: Some("https://example.org/?q=\"x\"".into()),
            ..RawIncident::default()
        }]);
        let html = render_feed_html(&items);
        assert!(!html.contains("q=\"x\""));
    }

    #[test]
    fn json_report_carries_counters() {
        let mut snap = DashboardSnapshot::new(true);
        snap.apply(CycleOutcome {
            started_at: now_utc(),
            summary: None,
            feed: Some(FeedSection::from_items(feed_of(vec![RawIncident {
                title: Some("Ministry phishing".into()),
                priority: Some("critical".into()),
                ..RawIncident::default()
            }]))),
            trends: None,
            distribution: None,
            advanced: None,
            drift: None,
            errors: vec![],
        });
        let json = render_snapshot(&snap, OutputFormat::Json, CountPolicy::Client).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "demo");
        assert_eq!(value["counters"]["critical"], 1);
        assert_eq!(value["feed"]["aggregate"]["sector_counts"]["Government"], 1);
        assert_eq!(
            value["banner"],
            "1 HIGH / CRITICAL incidents detected (Demo Mode)"
        );
    }

    #[test]
    fn markdown_lists_sectors_and_feed() {
        let mut snap = DashboardSnapshot::new(false);
        snap.apply(CycleOutcome {
            started_at: now_utc(),
            summary: None,
            feed: Some(FeedSection::from_items(feed_of(vec![RawIncident {
                title: Some("Routine patch".into()),
                sector: Some("IT".into()),
                ..RawIncident::default()
            }]))),
            trends: None,
            distribution: None,
            advanced: None,
            drift: None,
            errors: vec![],
        });
        let md = render_snapshot(&snap, OutputFormat::Markdown, CountPolicy::Client).unwrap();
        assert!(md.contains("- IT: 1"));
        assert!(md.contains("- **Routine patch** [LOW] IT"));
    }
}
