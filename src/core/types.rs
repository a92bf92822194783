use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Incident record as delivered by the live feed. Every field is optional and untrusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIncident {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "externalId")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RawIncident {
    /// Lenient conversion from an arbitrary feed element.
    ///
    /// Scalars of the wrong type are stringified, nested values count as absent, and a
    /// non-object element yields an empty record so the item still reaches aggregation.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let field = |name: &str| obj.get(name).and_then(scalar_text);
        Self {
            title: field("title"),
            summary: field("summary"),
            description: field("description"),
            priority: field("priority"),
            sector: field("sector"),
            timestamp: field("timestamp"),
            url: field("url"),
            external_id: field("external_id").or_else(|| field("externalId")),
            id: field("id"),
            status: field("status"),
        }
    }

    pub fn from_feed(values: &[Value]) -> Vec<Self> {
        values.iter().map(Self::from_value).collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ordinal urgency, LOW < MEDIUM < HIGH < CRITICAL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Exact level names, any case. Padding is not stripped: `" high "` is not a level.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            "CRITICAL" => Some(Priority::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }

    /// HIGH and CRITICAL both count toward the critical counter and banner.
    pub fn is_critical(&self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedIncident {
    pub title: String,
    pub summary: String,
    pub priority: Priority,
    /// `None` means the sector has to be inferred from the text.
    pub sector: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub url: String,
    pub external_id: Option<String>,
    pub status: Option<String>,
}

/// A normalized incident with its sector settled, as shown in the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub incident: NormalizedIncident,
    pub resolved_sector: String,
    pub sector_inferred: bool,
}

/// Sector name → incident count, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorCounts {
    entries: Vec<(String, u64)>,
}

impl SectorCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, sector: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == sector) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((sector.to_string(), 1)),
        }
    }

    pub fn get(&self, sector: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(name, _)| name == sector)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

impl Serialize for SectorCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, count) in &self.entries {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub total_count: u64,
    pub critical_count: u64,
    pub sector_counts: SectorCounts,
    pub distinct_sector_count: u64,
}

/// `GET /api/dashboard/summary`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_threats_today: u64,
    #[serde(default)]
    pub threats_mitigated: u64,
    #[serde(default)]
    pub critical_incidents: Option<u64>,
    #[serde(default)]
    pub affected_sectors: Option<u64>,
}

/// Labels plus one numeric value per label, ready for a bar chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TrendDataset {
    #[serde(default)]
    values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TrendWire {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    datasets: Vec<TrendDataset>,
}

/// `GET /api/analytics/trends`, dataset 0 is "Detected" and dataset 1 "Mitigated".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TrendWire")]
pub struct TrendSeries {
    pub labels: Vec<String>,
    pub detected: Vec<f64>,
    pub mitigated: Vec<f64>,
}

impl From<TrendWire> for TrendSeries {
    fn from(wire: TrendWire) -> Self {
        let mut datasets = wire.datasets.into_iter();
        let detected = datasets.next().map(|d| d.values).unwrap_or_default();
        let mitigated = datasets.next().map(|d| d.values).unwrap_or_default();
        Self {
            labels: wire.labels,
            detected,
            mitigated,
        }
    }
}

/// One distribution bar. Read leniently: `label` or `category`, `value` or `count`, with the
/// first spelling winning when an element carries both.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "Value")]
pub struct DistributionEntry {
    pub label: Option<String>,
    pub value: f64,
}

impl From<Value> for DistributionEntry {
    fn from(value: Value) -> Self {
        let field = |name: &str| value.get(name);
        let label = field("label")
            .and_then(scalar_text)
            .or_else(|| field("category").and_then(scalar_text));
        let number = |v: &Value| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let amount = field("value")
            .and_then(number)
            .or_else(|| field("count").and_then(number))
            .filter(|n| n.is_finite())
            .unwrap_or_default();
        Self {
            label,
            value: amount,
        }
    }
}

/// `GET /api/analytics/threat-distribution` comes in two shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ThreatDistribution {
    Entries(Vec<DistributionEntry>),
    Columns {
        #[serde(default)]
        labels: Vec<String>,
        #[serde(default)]
        values: Vec<f64>,
    },
}

/// `GET /api/analytics/advanced`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedAnalytics {
    #[serde(default)]
    pub ml_accuracy: f64,
    #[serde(default)]
    pub anomalies_detected: u64,
}

impl AdvancedAnalytics {
    pub fn accuracy_ratio(&self) -> f64 {
        if self.ml_accuracy.is_finite() {
            self.ml_accuracy.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// `GET /api/ml/drift-status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftStatus {
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub drift_detected: bool,
    #[serde(default)]
    pub drift_score: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// `POST /api/security/password-check`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCheck {
    #[serde(default)]
    pub pwned: bool,
    #[serde(default)]
    pub count: u64,
}

impl PasswordCheck {
    pub fn message(&self) -> String {
        if self.pwned {
            format!("⚠ Found {} times in breaches", self.count)
        } else {
            "✅ Password not found in known breaches".to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Html,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_incident_tolerates_wrong_types() {
        let raw = RawIncident::from_value(&json!({
            "title": 42,
            "priority": null,
            "sector": ["nested"],
            "id": 7,
            "externalId": "ext-1"
        }));
        assert_eq!(raw.title.as_deref(), Some("42"));
        assert_eq!(raw.priority, None);
        assert_eq!(raw.sector, None);
        assert_eq!(raw.id.as_deref(), Some("7"));
        assert_eq!(raw.external_id.as_deref(), Some("ext-1"));
    }

    #[test]
    fn non_object_feed_item_is_kept_as_empty_record() {
        let feed = vec![json!("garbage"), json!({"title": "ok"})];
        let raws = RawIncident::from_feed(&feed);
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[0], RawIncident::default());
    }

    #[test]
    fn sector_counts_serialize_in_first_seen_order() {
        let mut counts = SectorCounts::new();
        counts.increment("Telecom");
        counts.increment("Finance");
        counts.increment("Telecom");
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"Telecom":2,"Finance":1}"#);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn trend_series_reads_dataset_positions() {
        let trend: TrendSeries = serde_json::from_value(json!({
            "labels": ["2024-05-01", "2024-05-02"],
            "datasets": [
                {"label": "Detected", "values": [4, 6]},
                {"label": "Mitigated", "values": [1, 3]}
            ]
        }))
        .unwrap();
        assert_eq!(trend.detected, vec![4.0, 6.0]);
        assert_eq!(trend.mitigated, vec![1.0, 3.0]);

        let empty: TrendSeries = serde_json::from_value(json!({"labels": ["a"]})).unwrap();
        assert!(empty.detected.is_empty());
        assert!(empty.mitigated.is_empty());
    }

    #[test]
    fn distribution_entry_with_both_spellings_still_decodes() {
        let dist: ThreatDistribution = serde_json::from_value(json!([
            {"label": "Phishing", "category": "phishing", "value": 4, "count": 9},
            {"category": "Malware", "count": "3"},
            {"label": ["nested"], "value": "n/a"}
        ]))
        .unwrap();
        let ThreatDistribution::Entries(entries) = dist else {
            panic!("expected list shape");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].label.as_deref(), Some("Phishing"));
        assert_eq!(entries[0].value, 4.0);
        assert_eq!(entries[1].label.as_deref(), Some("Malware"));
        assert_eq!(entries[1].value, 3.0);
        assert_eq!(entries[2].label, None);
        assert_eq!(entries[2].value, 0.0);

        let columns: ThreatDistribution =
            serde_json::from_value(json!({"labels": ["a"], "values": [1]})).unwrap();
        assert!(matches!(columns, ThreatDistribution::Columns { .. }));
    }

    #[test]
    fn password_check_message() {
        let hit = PasswordCheck { pwned: true, count: 3 };
        assert_eq!(hit.message(), "⚠ Found 3 times in breaches");
        assert_eq!(
            PasswordCheck::default().message(),
            "✅ Password not found in known breaches"
        );
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::High < Priority::Critical);
        assert!(Priority::High.is_critical());
        assert!(!Priority::Medium.is_critical());
    }
}
