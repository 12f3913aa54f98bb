//! Record detail lookup.
//!
//! The tooltip only needs "give me the details of record X". Production code
//! asks the web backend over HTTP; the CLI and tests can serve fixtures.

mod fixtures;
mod http;

pub use fixtures::{FixtureEntry, StaticDetailSource};
pub use http::HttpDetailSource;

use async_trait::async_trait;

use crate::models::{DetailsEnvelope, RecordDetails, RecordId};

/// Reason shown when the backend could not be reached at all.
pub const TRANSPORT_FAILURE_REASON: &str = "Не удалось связаться с сервером";

/// Reason shown when the backend answered with something unreadable.
pub const DECODE_FAILURE_REASON: &str = "Некорректный ответ сервера";

/// Reason shown when the backend reports failure without saying why.
pub const DEFAULT_FAILURE_REASON: &str = "Не удалось получить данные о записи";

/// Asynchronous lookup of record details by id.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch(&self, id: &RecordId) -> Result<RecordDetails, DetailError>;
}

/// Errors that can occur while fetching record details.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetailError {
    /// The request never completed (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("Ошибка HTTP: {0}")]
    Http(u16),
    /// The body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
    /// The backend reported an application-level failure.
    #[error("{0}")]
    Application(String),
}

impl DetailError {
    /// Failures that mean the detail lookup itself is broken, as opposed to
    /// the backend explicitly refusing the request.
    pub fn is_transport(&self) -> bool {
        !matches!(self, DetailError::Application(_))
    }

    /// Text to show to the user inside the tooltip.
    pub fn reason(&self) -> String {
        match self {
            DetailError::Transport(_) => TRANSPORT_FAILURE_REASON.to_string(),
            DetailError::Http(_) => self.to_string(),
            DetailError::Decode(_) => DECODE_FAILURE_REASON.to_string(),
            DetailError::Application(reason) => reason.clone(),
        }
    }
}

impl DetailsEnvelope {
    /// Turn the backend envelope into details or an application failure.
    pub fn into_result(self) -> Result<RecordDetails, DetailError> {
        if !self.success {
            let reason = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string());
            return Err(DetailError::Application(reason));
        }
        self.details
            .ok_or_else(|| DetailError::Decode("success response without details".to_string()))
    }
}
