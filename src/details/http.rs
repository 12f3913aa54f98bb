//! HTTP client for the record details endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{DetailError, DetailSource};
use crate::config::Settings;
use crate::models::{DetailsEnvelope, RecordDetails, RecordId};

const USER_AGENT: &str = concat!("recordtip/", env!("CARGO_PKG_VERSION"));

/// Resolve user agent from config value.
/// - None => default recordtip user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// Fetches record details from `{endpoint}/{details_path}/{id}`.
#[derive(Debug, Clone)]
pub struct HttpDetailSource {
    client: Client,
    base: Url,
}

impl HttpDetailSource {
    /// Create a source from application settings.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.endpoint,
            &settings.details_path,
            Duration::from_secs(settings.request_timeout),
            settings.user_agent.as_deref(),
        )
    }

    /// Create a source for an endpoint and a details path such as
    /// `api/record_details`.
    pub fn new(
        endpoint: &str,
        details_path: &str,
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent_config))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let endpoint = with_trailing_slash(Url::parse(endpoint)?);
        let path = format!("{}/", details_path.trim_matches('/'));
        let base = endpoint.join(&path)?;

        Ok(Self { client, base })
    }

    /// URL requested for a record.
    pub fn url_for(&self, id: &RecordId) -> Result<Url, DetailError> {
        self.base
            .join(&urlencoding::encode(id.as_str()))
            .map_err(|e| DetailError::Transport(e.to_string()))
    }
}

#[async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch(&self, id: &RecordId) -> Result<RecordDetails, DetailError> {
        let url = self.url_for(id)?;
        debug!("Requesting record details: {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DetailError::Transport(e.to_string()))?;

        let status = resp.status();
        debug!("Record {} details responded with {}", id, status);
        if !status.is_success() {
            return Err(DetailError::Http(status.as_u16()));
        }

        let envelope: DetailsEnvelope = resp
            .json()
            .await
            .map_err(|e| DetailError::Decode(e.to_string()))?;

        envelope.into_result()
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
