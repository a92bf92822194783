use crate::core::types::{AggregateResult, ChartSeries, ThreatDistribution, TrendSeries};

const UNKNOWN_LABEL: &str = "Unknown";

/// Sector counts as a bar series, labels in first-seen order.
pub fn sector_series(result: &AggregateResult) -> ChartSeries {
    let (labels, values) = result
        .sector_counts
        .iter()
        .map(|(name, count)| (name.to_string(), count as f64))
        .unzip();
    ChartSeries { labels, values }
}

/// Both distribution wire shapes become one series. Column lengths are truncated to match.
pub fn distribution_series(dist: ThreatDistribution) -> ChartSeries {
    match dist {
        ThreatDistribution::Entries(entries) => {
            let (labels, values) = entries
                .into_iter()
                .map(|e| {
                    let label = e
                        .label
                        .map(|l| l.trim().to_string())
                        .filter(|l| !l.is_empty())
                        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
                    (label, e.value)
                })
                .unzip();
            ChartSeries { labels, values }
        }
        ThreatDistribution::Columns { mut labels, mut values } => {
            let len = labels.len().min(values.len());
            labels.truncate(len);
            values.truncate(len);
            ChartSeries { labels, values }
        }
    }
}

impl TrendSeries {
    pub fn detected_points(&self) -> Vec<(f64, f64)> {
        indexed(&self.detected)
    }

    pub fn mitigated_points(&self) -> Vec<(f64, f64)> {
        indexed(&self.mitigated)
    }

    pub fn max_value(&self) -> f64 {
        self.detected
            .iter()
            .chain(self.mitigated.iter())
            .copied()
            .fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.detected.is_empty() && self.mitigated.is_empty()
    }
}

fn indexed(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect()
}
