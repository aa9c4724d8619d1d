// Weather domain: wttr.in lookups and per-location history

pub mod client;
pub mod history;
pub mod report;

pub use client::{WeatherClient, WeatherError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use history::{HistoryEntry, HistoryFile, WeatherHistory, DEFAULT_HISTORY_LIMIT};
pub use report::WeatherReport;
