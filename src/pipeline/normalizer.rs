use crate::core::time::parse_timestamp;
use crate::core::types::{NormalizedIncident, Priority, RawIncident};

pub const UNTITLED: &str = "Untitled Incident";
pub const URL_PLACEHOLDER: &str = "#";

/// Sector values the feed uses when it does not actually know the sector.
const PLACEHOLDER_SECTORS: [&str; 2] = ["unknown", "general"];

/// Normalize one raw feed record. Never fails: every field has a default.
pub fn normalize(raw: &RawIncident) -> NormalizedIncident {
    let title = trimmed(raw.title.as_deref()).unwrap_or_else(|| UNTITLED.to_string());
    let summary = trimmed(raw.summary.as_deref())
        .or_else(|| trimmed(raw.description.as_deref()))
        .unwrap_or_default();
    let priority = raw
        .priority
        .as_deref()
        .and_then(Priority::parse)
        .unwrap_or_default();

    NormalizedIncident {
        title,
        summary,
        priority,
        sector: explicit_sector(raw.sector.as_deref()),
        timestamp: raw.timestamp.as_deref().and_then(parse_timestamp),
        url: trimmed(raw.url.as_deref()).unwrap_or_else(|| URL_PLACEHOLDER.to_string()),
        external_id: trimmed(raw.external_id.as_deref()).or_else(|| trimmed(raw.id.as_deref())),
        status: trimmed(raw.status.as_deref()),
    }
}

/// Trimmed sector label, or `None` when empty or a placeholder.
pub fn explicit_sector(value: Option<&str>) -> Option<String> {
    let sector = trimmed(value)?;
    let lowered = sector.to_lowercase();
    if PLACEHOLDER_SECTORS.contains(&lowered.as_str()) {
        return None;
    }
    Some(sector)
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
