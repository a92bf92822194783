//! Keyword-based sector inference for incidents without an explicit sector.

pub const FALLBACK_SECTOR: &str = "Other";

/// Ordered keyword groups. The first group with any matching keyword wins, so the order is
/// part of the contract ("bank hospital" is Finance, not Healthcare).
pub const SECTOR_KEYWORDS: &[(&str, &[&str])] = &[
    ("Finance", &["bank", "finance"]),
    ("Healthcare", &["hospital", "health"]),
    ("Education", &["university", "college", "education"]),
    ("Government", &["government", "ministry"]),
    ("Cloud", &["cloud", "aws", "azure", "gcp"]),
    ("Telecom", &["telecom", "network"]),
];

/// Plain substring matching on the lowercased `title + " " + summary`.
pub fn infer_sector(title: &str, summary: &str) -> &'static str {
    let text = format!("{} {}", title, summary).to_lowercase();
    SECTOR_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(label, _)| *label)
        .unwrap_or(FALLBACK_SECTOR)
}
