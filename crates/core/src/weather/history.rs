// Per-location weather history, one JSON document per location

use super::report::WeatherReport;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A report plus the moment it was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub report: WeatherReport,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// RFC 3339, or an offset-less ISO-8601 date-time taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// On-disk document: `{"location": ..., "entries": [...]}`, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFile {
    pub location: String,
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

/// Filesystem-backed history that keeps the newest `limit` entries per location
pub struct WeatherHistory {
    base_path: PathBuf,
    limit: usize,
    // Serializes read-modify-write cycles on the history files
    write_lock: Mutex<()>,
}

impl WeatherHistory {
    pub fn new(base_path: PathBuf, limit: usize) -> Self {
        Self {
            base_path,
            limit: limit.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// e.g. "New York" -> `<base>/new_york_history.json`
    pub fn history_path(&self, location: &str) -> PathBuf {
        let stem: String = location
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}_history.json", stem))
    }

    /// Append a report, trimming the file to the newest `limit` entries.
    /// An unreadable file is moved aside and a fresh history started.
    pub async fn record(&self, report: &WeatherReport, timestamp: DateTime<Utc>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .context("Failed to create weather history directory")?;

        let path = self.history_path(&report.location);
        let existing = match self.read(&path).await {
            Ok(history) => history,
            Err(e) => {
                let aside = path.with_extension(format!("json.corrupt-{}", timestamp.timestamp_millis()));
                tracing::warn!(
                    "Unreadable weather history {} ({:#}), moving it to {}",
                    path.display(),
                    e,
                    aside.display()
                );
                tokio::fs::rename(&path, &aside)
                    .await
                    .context("Failed to move unreadable weather history aside")?;
                None
            }
        };

        let mut history = existing.unwrap_or_else(|| HistoryFile {
            location: report.location.clone(),
            entries: Vec::new(),
        });

        history.entries.push(HistoryEntry {
            report: report.clone(),
            timestamp,
        });

        if history.entries.len() > self.limit {
            let excess = history.entries.len() - self.limit;
            history.entries.drain(..excess);
        }

        let json = serde_json::to_string_pretty(&history)
            .context("Failed to serialize weather history")?;

        // Replace atomically so a crash never leaves a truncated file behind
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, json)
            .await
            .context("Failed to write weather history")?;
        tokio::fs::rename(&staging, &path)
            .await
            .context("Failed to replace weather history")?;

        Ok(history.entries.len())
    }

    /// Load the history for a location, if any has been recorded
    pub async fn load(&self, location: &str) -> Result<Option<HistoryFile>> {
        self.read(&self.history_path(location)).await
    }

    async fn read(&self, path: &Path) -> Result<Option<HistoryFile>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read weather history")?;
        let history = serde_json::from_str(&content).context("Failed to parse weather history")?;
        Ok(Some(history))
    }
}
