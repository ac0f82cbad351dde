//! Remote quote source
//!
//! The remote is a plain JSON resource: `GET` returns an array of
//! `{id, title, ...}` records, `POST` accepts `{quotes, timestamp}`.
//! Records are mapped to quotes with the title as text and a category
//! derived from the id's parity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Quote, ServerId};

/// Category given to remote records with an even id
pub const EVEN_ID_CATEGORY: &str = "Server Wisdom";
/// Category given to remote records with an odd id
pub const ODD_ID_CATEGORY: &str = "Server Inspiration";

/// Where synced quotes come from and go to
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the remote collection
    async fn fetch(&self) -> Result<Vec<Quote>>;

    /// Upload the full local collection
    async fn push(&self, quotes: &[Quote]) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct RemoteRecord {
    id: i64,
    title: String,
}

#[derive(Debug, Serialize)]
struct PushBody<'a> {
    quotes: &'a [Quote],
    timestamp: DateTime<Utc>,
}

/// HTTP implementation of [`RemoteSource`]
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    url: String,
    quote_limit: usize,
}

impl HttpRemote {
    /// Build a client for `config.remote_url` with the configured timeout
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("quotebook/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: config.remote_url.clone(),
            quote_limit: config.remote_quote_limit,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch(&self) -> Result<Vec<Quote>> {
        debug!("Fetching quotes from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "GET {} returned {}",
                self.url, status
            )));
        }

        let body = response.text().await?;
        parse_remote_payload(&body, self.quote_limit, Utc::now())
    }

    async fn push(&self, quotes: &[Quote]) -> Result<()> {
        let body = PushBody {
            quotes,
            timestamp: Utc::now(),
        };

        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "POST {} returned {}",
                self.url, status
            )));
        }

        debug!("Pushed {} quote(s) to {}", quotes.len(), self.url);
        Ok(())
    }
}

/// Map a `GET` response body to quotes
///
/// Only the first `limit` records are read; each must carry a numeric `id`
/// and a non-blank string `title`. Anything else is
/// [`Error::InvalidPayload`].
pub fn parse_remote_payload(
    body: &str,
    limit: usize,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<Quote>> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| Error::InvalidPayload(format!("response is not JSON: {}", e)))?;

    let Value::Array(records) = document else {
        return Err(Error::InvalidPayload(
            "expected an array of records".to_string(),
        ));
    };

    records
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(position, raw)| {
            let record: RemoteRecord = serde_json::from_value(raw).map_err(|e| {
                Error::InvalidPayload(format!("record {}: {}", position, e))
            })?;
            record_to_quote(record, fetched_at)
                .map_err(|e| Error::InvalidPayload(format!("record {}: {}", position, e)))
        })
        .collect()
}

fn record_to_quote(record: RemoteRecord, fetched_at: DateTime<Utc>) -> Result<Quote> {
    let category = if record.id % 2 == 0 {
        EVEN_ID_CATEGORY
    } else {
        ODD_ID_CATEGORY
    };

    Ok(Quote::validated(&record.title, category)?
        .with_server_origin(ServerId::Number(record.id), fetched_at))
}
