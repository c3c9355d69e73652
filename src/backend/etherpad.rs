//! Etherpad Lite adapter
//!
//! Speaks the Etherpad HTTP API: every call is a GET against
//! `{base}/api/1/{function}` with the API key and the function arguments as
//! query parameters, answered by a JSON envelope
//! `{"code": n, "message": "...", "data": {...}}`. A non-zero code is a
//! remote rejection carrying the server's own message.
//!
//! Pad ids are deterministic: `"{remote_group_id}${sanitized_name}"`. The
//! create call builds the id before talking to the server, so an "already
//! exists" rejection still yields the right id, and `list_group_pads`
//! recovers the name half by splitting on `$`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{sanitize_pad_name, PadBackend};
use crate::error::BackendError;

/// Adapter for an Etherpad Lite server.
#[derive(Debug, Clone)]
pub struct EtherpadBackend {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

/// The Etherpad reply envelope.
#[derive(Debug, Deserialize)]
struct ApiReply {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

impl EtherpadBackend {
    /// Build an adapter for the server at `url` with the given API key.
    pub fn new(api_key: &str, url: &str, timeout: Duration) -> Result<Self, BackendError> {
        if api_key.trim().is_empty() {
            return Err(BackendError::validation("etherpad API key is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::from)?;
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    /// One API call: non-2xx and network failures are transport errors,
    /// a non-zero reply code is a remote rejection.
    async fn call(&self, function: &str, params: &[(&str, &str)]) -> Result<Value, BackendError> {
        let url = format!("{}/api/1/{}", self.base_url, function);
        debug!(function, "etherpad api call");

        let mut query: Vec<(&str, &str)> = vec![("apikey", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::transport(format!(
                "{} answered {}",
                function, status
            )));
        }

        let reply: ApiReply = response.json().await?;
        if reply.code != 0 {
            return Err(BackendError::remote(function, reply.message));
        }
        Ok(reply.data)
    }

    /// Delete-style call: remote rejections mean the resource is already
    /// gone, which is the end-state we wanted.
    async fn call_delete(&self, function: &str, params: &[(&str, &str)]) -> Result<(), BackendError> {
        match self.call(function, params).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_remote_rejection() => {
                debug!(function, %err, "treating remote rejection as already-deleted");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn data_str(data: &Value, key: &str, function: &str) -> Result<String, BackendError> {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                BackendError::remote(function, format!("reply is missing '{}'", key))
            })
    }
}

impl PadBackend for EtherpadBackend {
    async fn is_online(&self) -> bool {
        match self.call("checkToken", &[]).await {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, url = %self.base_url, "etherpad server offline");
                false
            }
        }
    }

    async fn get_or_create_group(&self, mapper: &str) -> Result<String, BackendError> {
        let data = self
            .call("createGroupIfNotExistsFor", &[("groupMapper", mapper)])
            .await?;
        Self::data_str(&data, "groupID", "createGroupIfNotExistsFor")
    }

    async fn delete_group(&self, remote_group_id: &str) -> Result<(), BackendError> {
        self.call_delete("deleteGroup", &[("groupID", remote_group_id)])
            .await
    }

    async fn create_group_pad(
        &self,
        remote_group_id: &str,
        name: &str,
        text: Option<&str>,
    ) -> Result<String, BackendError> {
        // The id is fixed by construction; an "already exists" rejection
        // from the server still leaves us with a usable pad.
        let pad_id = format!("{}${}", remote_group_id, sanitize_pad_name(name));

        let created = self
            .call(
                "createGroupPad",
                &[("groupID", remote_group_id), ("padName", name)],
            )
            .await;
        match created {
            Ok(_) => {
                if let Some(text) = text {
                    self.call("setText", &[("padID", &pad_id), ("text", text)])
                        .await?;
                }
            }
            Err(err) if err.is_remote_rejection() => {
                debug!(%pad_id, %err, "pad already exists remotely");
            }
            Err(err) => return Err(err),
        }
        Ok(pad_id)
    }

    async fn list_group_pads(&self, remote_group_id: &str) -> Result<Vec<String>, BackendError> {
        let data = self
            .call("listPads", &[("groupID", remote_group_id)])
            .await?;
        let ids = data
            .get("padIDs")
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::remote("listPads", "reply is missing 'padIDs'"))?;
        Ok(ids
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|id| id.split('$').nth(1))
            .map(str::to_string)
            .collect())
    }

    async fn set_password(&self, remote_pad_id: &str, password: &str) -> Result<(), BackendError> {
        self.call(
            "setPassword",
            &[("padID", remote_pad_id), ("password", password)],
        )
        .await?;
        Ok(())
    }

    async fn set_public_status(
        &self,
        remote_pad_id: &str,
        public: bool,
    ) -> Result<(), BackendError> {
        // The API wants the literal strings "true"/"false".
        let status = if public { "true" } else { "false" };
        self.call(
            "setPublicStatus",
            &[("padID", remote_pad_id), ("publicStatus", status)],
        )
        .await?;
        Ok(())
    }

    async fn is_pad_public(&self, remote_pad_id: &str) -> Result<bool, BackendError> {
        let data = self
            .call("getPublicStatus", &[("padID", remote_pad_id)])
            .await?;
        data.get("publicStatus")
            .and_then(Value::as_bool)
            .ok_or_else(|| BackendError::remote("getPublicStatus", "reply is missing 'publicStatus'"))
    }

    async fn delete_pad(&self, remote_pad_id: &str) -> Result<(), BackendError> {
        self.call_delete("deletePad", &[("padID", remote_pad_id)])
            .await
    }

    async fn create_session(
        &self,
        remote_group_id: &str,
        remote_author_id: &str,
        expires_at: i64,
    ) -> Result<Option<String>, BackendError> {
        let valid_until = expires_at.to_string();
        let data = self
            .call(
                "createSession",
                &[
                    ("groupID", remote_group_id),
                    ("authorID", remote_author_id),
                    ("validUntil", &valid_until),
                ],
            )
            .await?;
        Self::data_str(&data, "sessionID", "createSession").map(Some)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
        self.call_delete("deleteSession", &[("sessionID", session_id)])
            .await
    }

    async fn create_user(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<String, BackendError> {
        let name = display_name.unwrap_or(user_id);
        let data = self
            .call(
                "createAuthorIfNotExistsFor",
                &[("authorMapper", user_id), ("name", name)],
            )
            .await?;
        Self::data_str(&data, "authorID", "createAuthorIfNotExistsFor")
    }

    fn pad_link(&self, remote_pad_id: &str, user_name: Option<&str>) -> Option<String> {
        let base = format!("{}/p/{}", self.base_url, remote_pad_id);
        Some(match user_name {
            Some(user) => format!("{}?userName={}", base, user),
            None => base,
        })
    }

    async fn get_text(&self, remote_pad_id: &str) -> Result<String, BackendError> {
        let data = self.call("getText", &[("padID", remote_pad_id)]).await?;
        Self::data_str(&data, "text", "getText")
    }
}
