//! Markdown collaboration adapter (HackMD-style services)
//!
//! This service has no API key and no group or session concepts. It
//! authenticates with a session cookie obtained from an optional LDAP bridge
//! login at construction, and creates pads by POSTing a markdown body to
//! `/new` and reading the pad id off the redirect target. Group and session
//! operations fall through to the trait defaults.

use std::time::Duration;

use tracing::{debug, warn};

use super::PadBackend;
use crate::error::BackendError;

/// Adapter for a HackMD-style markdown service.
#[derive(Debug, Clone)]
pub struct MarkdownBackend {
    base_url: String,
    http: reqwest::Client,
}

impl MarkdownBackend {
    /// Connect to the service at `url`. A credential of the form
    /// `ldap:username:password` performs a bridge login; an empty credential
    /// skips authentication; anything else is a configuration error.
    /// Construction probes the base URL so a dead server fails here rather
    /// than on first use.
    pub async fn connect(
        credential: &str,
        url: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url = url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(BackendError::from)?;

        if !credential.is_empty() {
            let rest = credential.strip_prefix("ldap:").ok_or_else(|| {
                BackendError::validation("authentication method not recognized")
            })?;
            let (username, password) = rest.split_once(':').ok_or_else(|| {
                BackendError::validation("credential has to be 'ldap:username:password'")
            })?;
            let login_url = format!("{}/auth/ldap", base_url);
            debug!(url = %login_url, username, "markdown backend ldap login");
            http.post(&login_url)
                .form(&[("username", username), ("password", password)])
                .send()
                .await
                .map_err(|e| BackendError::transport(format!("could not log in: {}", e)))?;
        }

        // Connectivity probe; the service serves its front page on the base URL.
        http.get(&base_url)
            .send()
            .await
            .map_err(|e| BackendError::transport(format!("could not connect to server: {}", e)))?;

        Ok(Self { base_url, http })
    }
}

impl PadBackend for MarkdownBackend {
    async fn is_online(&self) -> bool {
        match self.http.get(&self.base_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!(%err, url = %self.base_url, "markdown server offline");
                false
            }
        }
    }

    async fn create_group_pad(
        &self,
        _remote_group_id: &str,
        name: &str,
        text: Option<&str>,
    ) -> Result<String, BackendError> {
        let body = match text {
            Some(text) => text.to_string(),
            None => format!("# {}", name),
        };
        let response = self
            .http
            .post(format!("{}/new", self.base_url))
            .header("Content-Type", "text/markdown")
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::remote(
                "new",
                format!("pad creation answered {}", response.status()),
            ));
        }
        // The service redirects to the fresh pad; its id is the final path
        // segment of wherever we landed.
        let pad_id = response
            .url()
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or_else(|| BackendError::remote("new", "no pad id in redirect target"))?;
        debug!(%pad_id, "markdown pad created");
        Ok(pad_id)
    }

    fn pad_link(&self, remote_pad_id: &str, _user_name: Option<&str>) -> Option<String> {
        // ?both opens the split view / edit mode
        Some(format!("{}/{}?both", self.base_url, remote_pad_id))
    }

    async fn get_text(&self, remote_pad_id: &str) -> Result<String, BackendError> {
        let url = format!("{}/{}/download", self.base_url, remote_pad_id);
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::not_found(format!("pad {}", remote_pad_id)));
        }
        if !response.status().is_success() {
            return Err(BackendError::remote(
                "download",
                format!("answered {}", response.status()),
            ));
        }
        Ok(response.text().await?)
    }
}
