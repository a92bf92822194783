use crate::core::types::{AggregateResult, FeedItem, NormalizedIncident, RawIncident, SectorCounts};
use crate::pipeline::classifier::infer_sector;
use crate::pipeline::normalizer::normalize;

/// Explicit sector if the feed supplied one, keyword inference otherwise.
pub fn resolve_sector(incident: &NormalizedIncident) -> String {
    match &incident.sector {
        Some(sector) => sector.clone(),
        None => infer_sector(&incident.title, &incident.summary).to_string(),
    }
}

/// Fold raw records into counts. Every record is counted exactly once.
pub fn aggregate(raws: &[RawIncident]) -> AggregateResult {
    let normalized: Vec<NormalizedIncident> = raws.iter().map(normalize).collect();
    aggregate_normalized(&normalized)
}

pub fn aggregate_normalized(incidents: &[NormalizedIncident]) -> AggregateResult {
    fold(incidents.iter().map(|i| (i, resolve_sector(i))))
}

/// Same fold over feed items whose sectors are already resolved.
pub fn aggregate_feed(feed: &[FeedItem]) -> AggregateResult {
    fold(feed.iter().map(|item| (&item.incident, item.resolved_sector.clone())))
}

fn fold<'a>(items: impl Iterator<Item = (&'a NormalizedIncident, String)>) -> AggregateResult {
    let mut sector_counts = SectorCounts::new();
    let mut total_count = 0u64;
    let mut critical_count = 0u64;

    for (incident, sector) in items {
        total_count += 1;
        if incident.priority.is_critical() {
            critical_count += 1;
        }
        sector_counts.increment(&sector);
    }

    let distinct_sector_count = sector_counts.len() as u64;
    AggregateResult {
        total_count,
        critical_count,
        sector_counts,
        distinct_sector_count,
    }
}

/// Normalize a feed and settle each item's sector for display.
pub fn build_feed(raws: &[RawIncident]) -> Vec<FeedItem> {
    raws.iter()
        .map(|raw| {
            let incident = normalize(raw);
            let sector_inferred = incident.sector.is_none();
            let resolved_sector = resolve_sector(&incident);
            FeedItem {
                incident,
                resolved_sector,
                sector_inferred,
            }
        })
        .collect()
}
