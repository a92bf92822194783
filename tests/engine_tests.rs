use std::sync::Arc;

use cybernow::config::{AppConfig, CountPolicy, SourceMode};
use cybernow::core::engine::{password_result_text, Engine, Section};
use cybernow::core::error::DashError;
use cybernow::core::output::render_snapshot;
use cybernow::core::snapshot::{Counters, DashboardSnapshot};
use cybernow::core::types::OutputFormat;
use cybernow::sources::{build_source, live::*, DashboardSource};
use httpmock::prelude::*;
use serde_json::json;

fn live_config(server: &MockServer) -> AppConfig {
    AppConfig {
        base_url: server.base_url(),
        timeout_ms: 2000,
        min_refresh_interval_ms: 0,
        user_agent: "cybernow-test".to_string(),
        source: SourceMode::Live,
        ..AppConfig::default()
    }
}

fn live_engine(server: &MockServer) -> Engine {
    let cfg = live_config(server);
    let source = build_source(&cfg).unwrap();
    assert!(!source.is_demo());
    Engine::new(cfg, source)
}

async fn mock_ok(server: &MockServer, path: &str, body: serde_json::Value) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200).json_body(body);
        })
        .await;
}

async fn mock_all_but_feed(server: &MockServer) {
    mock_ok(
        server,
        TRENDS_PATH,
        json!({
            "labels": ["Mon", "Tue", "Wed"],
            "datasets": [
                {"label": "Detected", "values": [4, 9, 6]},
                {"label": "Mitigated", "values": [3, 7, 6]}
            ]
        }),
    )
    .await;
    mock_ok(
        server,
        DISTRIBUTION_PATH,
        json!([{"category": "Phishing", "count": 12}, {"label": "Malware", "value": 5}]),
    )
    .await;
    mock_ok(
        server,
        ADVANCED_PATH,
        json!({"ml_accuracy": 0.91, "anomalies_detected": 4}),
    )
    .await;
    mock_ok(
        server,
        DRIFT_PATH,
        json!({"model_version": "v3", "drift_detected": false, "drift_score": 0.02}),
    )
    .await;
}

#[tokio::test]
async fn live_cycle_reads_every_section() {
    let server = MockServer::start_async().await;
    let summary = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SUMMARY_PATH)
                .header("user-agent", "cybernow-test");
            then.status(200).json_body(json!({
                "total_threats_today": 30,
                "threats_mitigated": 21,
                "critical_incidents": 9
            }));
        })
        .await;
    mock_ok(
        &server,
        LIVE_INCIDENTS_PATH,
        json!([
            {
                "title": "Ransomware hits regional hospital",
                "priority": "critical",
                "timestamp": "2024-05-01T10:00:00Z",
                "url": "https://news.example.org/1"
            },
            {"title": "Phishing wave", "priority": "HIGH", "sector": "Finance"},
            {"title": "Patch Tuesday", "priority": "low", "sector": "  "},
            {"title": 42, "priority": "urgent"}
        ]),
    )
    .await;
    mock_all_but_feed(&server).await;

    let engine = live_engine(&server);
    let outcome = engine.run_cycle().await.unwrap();
    summary.assert_async().await;
    assert!(outcome.is_complete(), "errors: {:?}", outcome.errors);

    let feed = outcome.feed.as_ref().unwrap();
    assert_eq!(feed.aggregate.total_count, 4);
    assert_eq!(feed.aggregate.critical_count, 2);
    assert_eq!(feed.aggregate.distinct_sector_count, 3);
    assert_eq!(feed.sector_series.labels, vec!["Healthcare", "Finance", "Other"]);
    assert_eq!(feed.sector_series.values, vec![1.0, 1.0, 2.0]);
    assert_eq!(feed.items[3].incident.title, "42");

    let trends = outcome.trends.as_ref().unwrap();
    assert_eq!(trends.detected, vec![4.0, 9.0, 6.0]);
    assert_eq!(trends.mitigated, vec![3.0, 7.0, 6.0]);
    let dist = outcome.distribution.as_ref().unwrap();
    assert_eq!(dist.labels, vec!["Phishing", "Malware"]);
    assert_eq!(dist.values, vec![12.0, 5.0]);

    let mut snapshot = DashboardSnapshot::new(false);
    snapshot.apply(outcome);
    assert_eq!(snapshot.counters(CountPolicy::Client).critical, 2);
    assert_eq!(snapshot.counters(CountPolicy::Backend).critical, 9);
    assert_eq!(snapshot.counters(CountPolicy::Backend).sectors, 3);
    assert_eq!(
        snapshot.banner_text(CountPolicy::Client).as_deref(),
        Some("2 HIGH / CRITICAL incidents detected in live feed")
    );
}

#[tokio::test]
async fn failed_section_leaves_previous_value() {
    let server = MockServer::start_async().await;
    mock_ok(&server, SUMMARY_PATH, json!({"total_threats_today": 3, "threats_mitigated": 1})).await;
    mock_ok(&server, LIVE_INCIDENTS_PATH, json!([])).await;
    mock_all_but_feed(&server).await;
    let engine = live_engine(&server);

    let mut snapshot = DashboardSnapshot::new(false);
    snapshot.apply(engine.run_cycle().await.unwrap());
    let first_trends = snapshot.trends.clone().unwrap();

    server.reset_async().await;
    mock_ok(&server, SUMMARY_PATH, json!({"total_threats_today": 5, "threats_mitigated": 2})).await;
    mock_ok(&server, LIVE_INCIDENTS_PATH, json!([])).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(TRENDS_PATH);
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DISTRIBUTION_PATH);
            then.status(200).body("{not json");
        })
        .await;

    let outcome = engine.run_cycle().await.unwrap();
    let failed: Vec<Section> = outcome.errors.iter().map(|e| e.section).collect();
    assert!(failed.contains(&Section::Trends));
    assert!(failed.contains(&Section::Distribution));
    assert!(failed.contains(&Section::Advanced));
    assert!(!failed.contains(&Section::Summary));

    snapshot.apply(outcome);
    assert_eq!(snapshot.summary.as_ref().unwrap().total_threats_today, 5);
    assert_eq!(snapshot.trends.as_ref(), Some(&first_trends));
    assert!(snapshot.distribution.is_some());
    assert_eq!(snapshot.cycles, 2);
    assert_eq!(snapshot.banner_text(CountPolicy::Client), None);
}

#[tokio::test]
async fn non_array_feed_is_a_decode_error() {
    let server = MockServer::start_async().await;
    mock_ok(&server, LIVE_INCIDENTS_PATH, json!({"items": []})).await;
    let source = LiveSource::new(&live_config(&server)).unwrap();
    let err = source.live_incidents().await.unwrap_err();
    assert!(matches!(err, DashError::Decode(_)), "got {:?}", err);
    let err = source.summary().await.unwrap_err();
    assert!(
        matches!(err, DashError::Http { status: 404, .. }),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn password_check_posts_json() {
    let server = MockServer::start_async().await;
    let check = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(PASSWORD_CHECK_PATH)
                .json_body(json!({"password": "hunter2"}));
            then.status(200).json_body(json!({"pwned": true, "count": 42}));
        })
        .await;
    let engine = live_engine(&server);

    let result = engine.check_password("hunter2").await;
    check.assert_async().await;
    assert_eq!(password_result_text(&result), "⚠ Found 42 times in breaches");

    let blank = engine.check_password("").await;
    assert_eq!(password_result_text(&blank), "Please enter a password");
    check.assert_hits_async(1).await;
}

#[tokio::test]
async fn password_check_failure_reads_as_network_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PASSWORD_CHECK_PATH);
            then.status(503);
        })
        .await;
    let engine = live_engine(&server);
    let result = engine.check_password("hunter2").await;
    assert!(result.is_err());
    assert_eq!(password_result_text(&result), "Network error");
}

#[tokio::test]
async fn demo_source_runs_without_a_server() {
    let cfg = AppConfig {
        base_url: "https://cybernow.github.io/dashboard".to_string(),
        min_refresh_interval_ms: 0,
        ..AppConfig::default()
    };
    let source = build_source(&cfg).unwrap();
    assert!(source.is_demo());
    let engine = Arc::new(Engine::new(cfg, source));

    let outcome = engine.run_cycle().await.unwrap();
    assert!(outcome.is_complete());
    let mut snapshot = DashboardSnapshot::new(engine.is_demo());
    snapshot.apply(outcome);
    let banner = snapshot.banner_text(CountPolicy::Client).unwrap();
    assert!(banner.ends_with("(Demo Mode)"));

    let text = password_result_text(&engine.check_password("hunter2").await);
    assert!(!text.is_empty());
    assert_ne!(text, "Network error");
}

#[tokio::test]
async fn html_snapshot_escapes_live_feed() {
    let server = MockServer::start_async().await;
    mock_ok(&server, SUMMARY_PATH, json!({})).await;
    mock_ok(
        &server,
        LIVE_INCIDENTS_PATH,
        json!([{
            "title": "<img src=x onerror=alert(1)>",
            "summary": "\"quoted\" & more",
            "url": "javascript:alert(document.cookie)",
            "priority": "medium"
        }]),
    )
    .await;
    let engine = live_engine(&server);
    let mut snapshot = DashboardSnapshot::new(false);
    snapshot.apply(engine.run_cycle().await.unwrap());

    let html = render_snapshot(&snapshot, OutputFormat::Html, CountPolicy::Client).unwrap();
    assert!(!html.contains("<img"));
    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(html.contains("href=\"#\""));
    assert!(!html.contains("javascript:"));
}

#[tokio::test]
async fn demo_cards_use_summary_counts_by_default() {
    let cfg = AppConfig {
        source: SourceMode::Demo,
        min_refresh_interval_ms: 0,
        ..AppConfig::default()
    };
    let policy = cfg.count_policy_for(true);
    assert_eq!(policy, CountPolicy::Backend);
    let engine = Engine::new(cfg.clone(), build_source(&cfg).unwrap());

    let mut snapshot = DashboardSnapshot::new(true);
    snapshot.apply(engine.run_cycle().await.unwrap());
    assert_eq!(
        snapshot.counters(policy),
        Counters {
            total: 12,
            critical: 3,
            sectors: 5,
            mitigated: 7
        }
    );
}
