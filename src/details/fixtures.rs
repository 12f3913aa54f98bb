//! In-memory detail source backed by fixtures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{DetailError, DetailSource};
use crate::models::{RecordDetails, RecordId};

/// Reason returned for ids that have no fixture.
const MISSING_RECORD_REASON: &str = "Запись не найдена";

/// Canned answer for one record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureEntry {
    /// Details returned on success.
    #[serde(default)]
    pub details: Option<RecordDetails>,
    /// Application failure reason. Takes precedence over `details`.
    #[serde(default)]
    pub error: Option<String>,
    /// Simulate a transport failure instead of answering.
    #[serde(default)]
    pub unreachable: bool,
    /// Response latency for this record, overriding the source default.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

impl FixtureEntry {
    pub fn details(details: RecordDetails) -> Self {
        Self {
            details: Some(details),
            ..Default::default()
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }

    fn outcome(&self) -> Result<RecordDetails, DetailError> {
        if self.unreachable {
            return Err(DetailError::Transport("fixture marked unreachable".to_string()));
        }
        if let Some(ref reason) = self.error {
            return Err(DetailError::Application(reason.clone()));
        }
        Ok(self.details.clone().unwrap_or_default())
    }
}

/// Detail source that answers from a fixed table and records every request.
#[derive(Debug, Clone, Default)]
pub struct StaticDetailSource {
    records: HashMap<RecordId, FixtureEntry>,
    latency: Duration,
    requests: Arc<Mutex<Vec<RecordId>>>,
}

impl StaticDetailSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixtures from a JSON object keyed by record id.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let records: HashMap<RecordId, FixtureEntry> = serde_json::from_str(raw)?;
        Ok(Self {
            records,
            ..Default::default()
        })
    }

    /// Default latency applied to every response.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_record(mut self, id: impl Into<RecordId>, entry: FixtureEntry) -> Self {
        self.records.insert(id.into(), entry);
        self
    }

    /// Ids requested so far, in request order.
    pub async fn requests(&self) -> Vec<RecordId> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl DetailSource for StaticDetailSource {
    async fn fetch(&self, id: &RecordId) -> Result<RecordDetails, DetailError> {
        self.requests.lock().await.push(id.clone());

        let entry = self.records.get(id);
        let delay = entry
            .and_then(|e| e.delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(self.latency);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        debug!("Serving fixture for record {}", id);
        match entry {
            Some(entry) => entry.outcome(),
            None => Err(DetailError::Application(MISSING_RECORD_REASON.to_string())),
        }
    }
}
