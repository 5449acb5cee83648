//! Storage usage accounting.

use serde::{Deserialize, Serialize};

/// Size of one stored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageItem {
    /// Logical key (namespace stripped).
    pub key: String,
    /// UTF-8 byte length of the stored value.
    pub size: usize,
    pub size_formatted: String,
}

/// Usage of the current session's keys. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub total: usize,
    pub total_formatted: String,
    pub item_count: usize,
    /// Sorted by size, largest first.
    pub items: Vec<UsageItem>,
}

impl StorageUsage {
    /// Builds a usage record from `(logical key, value)` pairs.
    pub fn from_items<'a>(entries: impl IntoIterator<Item = (String, &'a str)>) -> Self {
        let mut items: Vec<UsageItem> = entries
            .into_iter()
            .map(|(key, value)| {
                let size = value.len();
                UsageItem {
                    key,
                    size,
                    size_formatted: format_bytes(size),
                }
            })
            .collect();

        // Stable: equal sizes keep enumeration order.
        items.sort_by(|a, b| b.size.cmp(&a.size));

        let total = items.iter().map(|item| item.size).sum();
        Self {
            total,
            total_formatted: format_bytes(total),
            item_count: items.len(),
            items,
        }
    }
}

/// Formats a byte count as `"1.5 KB"`, dropping trailing zeros.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
