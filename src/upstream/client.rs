use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};

use crate::config::{HttpConfig, MunicipalityId};
use crate::error::{EessError, Result};
use crate::logging::get_logger;

use super::{Document, fields};

/// Source of upstream station documents
///
/// The poller only depends on this trait so tests can feed scripted
/// documents and failures without a network.
#[async_trait::async_trait]
pub trait StationSource: Send + Sync {
    /// Fetch the station document for one municipality
    async fn fetch(&self, municipality_id: MunicipalityId) -> Result<Document>;
}

/// HTTP implementation backed by a shared `reqwest::Client`
pub struct HttpStationSource {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    logger: crate::logging::StructuredLogger,
}

impl HttpStationSource {
    /// Build a source from the HTTP settings
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.timeout_secs.min(10)))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim().to_string(),
            user_agent: cfg.user_agent.clone(),
            logger: get_logger("upstream"),
        })
    }

    /// Build a source for a custom base URL (mock servers in tests)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let cfg = HttpConfig {
            base_url: base_url.to_string(),
            ..HttpConfig::default()
        };
        Self::new(&cfg)
    }

    /// Full request URL for a municipality
    pub fn url_for(&self, municipality_id: MunicipalityId) -> String {
        format!("{}{}", self.base_url, municipality_id)
    }
}

#[async_trait::async_trait]
impl StationSource for HttpStationSource {
    async fn fetch(&self, municipality_id: MunicipalityId) -> Result<Document> {
        let url = self.url_for(municipality_id);
        self.logger.debug(&format!("GET {url}"));

        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EessError::http_status(status.as_u16(), &url));
        }

        let bytes = resp.bytes().await?;
        let document = decode_document(&bytes)?;
        if let Some(result) = document.get(fields::QUERY_RESULT).and_then(|v| v.as_str()) {
            self.logger
                .debug(&format!("Upstream answered '{result}' for {url}"));
        }
        Ok(document)
    }
}

/// Decode a response body, tolerating a leading UTF-8 byte order mark
pub fn decode_document(body: &[u8]) -> Result<Document> {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    serde_json::from_slice(body).map_err(|e| EessError::decode(format!("invalid JSON body: {e}")))
}
