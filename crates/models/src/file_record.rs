use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CATEGORIES: [&str; 9] = [
    "Educational", "Religious", "Medical", "Literature",
    "Science", "Technology", "History", "Philosophy", "Other",
];

pub const DEFAULT_CATEGORY: &str = "Other";

/// Metadata of an uploaded document, keyed by its stored filename.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub original_name: String,
    pub upload_date: DateTime<Utc>,
    pub size_bytes: u64,
    #[serde(default)]
    pub download_count: u64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub uploaded_by: String,
    pub owner_id: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl FileRecord {
    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.size_bytes)
    }
}

/// Megabytes rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Known category, or `Other`.
pub fn normalize_category(raw: &str) -> &'static str {
    let raw = raw.trim();
    CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(raw))
        .copied()
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Split a comma separated tag list, trimming and dropping empties and duplicates.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
    }
    tags
}
