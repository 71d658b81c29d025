//! Common types shared across models: pagination and flexible query flags.

use serde::{Deserialize, Deserializer, Serialize};

/// Paginated list envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of matching rows, across all pages
    pub count: i64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: i64, results: Vec<T>) -> Self {
        Self { count, results }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// A resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    /// Build a window from a 1-based page number and an already-resolved page size
    pub fn new(page: Option<i64>, limit: i64) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        Self {
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

/// Query parameters shared by paginated endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Accept `1`/`0`/`true`/`false` (any case) for boolean query flags; absent means false
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "invalid boolean flag: {}",
                v
            ))),
        },
    }
}
