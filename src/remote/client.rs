//! HTTP client for the Plex Media Server API.

use reqwest::header::ACCEPT;
use reqwest::Client;

use super::sections::{parse_sections, LibrarySection};
use super::LibraryService;
use crate::error::RemoteError;
use crate::{Config, Error, Result};

/// Header carrying the auth token on every request.
pub const TOKEN_HEADER: &str = "X-Plex-Token";

/// Plex API client.
#[derive(Clone)]
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for PlexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlexClient")
            .field("base_url", &self.base_url)
            .field("has_token", &!self.token.is_empty())
            .finish_non_exhaustive()
    }
}

impl PlexClient {
    /// Create a client from configuration.
    ///
    /// Every request is bounded by `config.request_timeout()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("plexwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(base_url = %config.base_url(), "Created Plex client");

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            token: config.token().to_string(),
        })
    }

    /// Server base address.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue an authenticated GET and return the body.
    async fn get(&self, endpoint: &str) -> Result<String> {
        let url = format!("{}{endpoint}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .header(ACCEPT, "application/xml")
            .send()
            .await
            .map_err(|e| RemoteError::transport(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::transport(endpoint, e))?;

        tracing::trace!(%endpoint, bytes = body.len(), "Plex request complete");
        Ok(body)
    }
}

impl LibraryService for PlexClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn ping(&self) -> Result<()> {
        self.get("/").await.map(|_| ())
    }

    async fn list_sections(&self) -> Result<Vec<LibrarySection>> {
        let body = self.get("/library/sections").await?;
        parse_sections(&body)
    }

    async fn refresh_section(&self, id: &str) -> Result<()> {
        self.get(&format!("/library/sections/{id}/refresh"))
            .await
            .map(|_| ())
    }
}
