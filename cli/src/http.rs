//! HTTP transport to the accounting gateway.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `POST /sessions` with `{"appName": ...}` returns `{"ticket": ...}`
//! - `POST /sessions/{ticket}/requests` takes a [`BatchRequest`] and returns a [`BatchResponse`]
//! - `DELETE /sessions/{ticket}` ends the session

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use termsync_engine::error::Result;
use termsync_engine::{BatchRequest, BatchResponse, Error, Session};

/// Session ticket issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket(String);

impl Ticket {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenRequest<'a> {
    app_name: &'a str,
}

#[derive(Deserialize)]
struct OpenResponse {
    ticket: String,
}

/// [`Session`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    base_url: String,
}

impl HttpSession {
    /// Create a session client for the gateway at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended with `segments`, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> std::result::Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot be a base URL", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-success status into a message carrying the body.
async fn check(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("{}: {}", status, body.trim()))
}

#[async_trait]
impl Session for HttpSession {
    type Handle = Ticket;

    async fn open(&self, app_name: &str) -> Result<Ticket> {
        let url = self.url(&["sessions"]).map_err(Error::SessionOpen)?;
        let response = self
            .client
            .post(url)
            .json(&OpenRequest { app_name })
            .send()
            .await
            .map_err(|e| Error::SessionOpen(e.to_string()))?;

        let opened: OpenResponse = check(response)
            .await
            .map_err(Error::SessionOpen)?
            .json()
            .await
            .map_err(|e| Error::SessionOpen(e.to_string()))?;

        tracing::debug!(ticket = %opened.ticket, app_name, "session opened");
        Ok(Ticket(opened.ticket))
    }

    async fn submit(&self, handle: &Ticket, request: &BatchRequest) -> Result<BatchResponse> {
        let url = self
            .url(&["sessions", handle.as_str(), "requests"])
            .map_err(Error::Submit)?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Submit(e.to_string()))?;

        check(response)
            .await
            .map_err(Error::Submit)?
            .json()
            .await
            .map_err(|e| Error::UnexpectedResponse(e.to_string()))
    }

    async fn close(&self, handle: Ticket) -> Result<()> {
        let url = self
            .url(&["sessions", handle.as_str()])
            .map_err(Error::SessionClose)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| Error::SessionClose(e.to_string()))?;

        check(response).await.map_err(Error::SessionClose)?;
        tracing::debug!(ticket = %handle.as_str(), "session closed");
        Ok(())
    }
}
