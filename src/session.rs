//! Editing-session reconciliation
//!
//! On every request that touches a pad, the caller hands the broker its
//! session blob - the per-client record of which remote group sessions it
//! holds - and gets back a blob reconciled against the author's current
//! group memberships:
//!
//! 1. Backend offline or no author: the blob is returned untouched. A pad
//!    page must never fail to render because the session plumbing did.
//! 2. Expiry only moves forward. A lapsed window gets `now + session
//!    length`; an unexpired window keeps its expiry exactly as-is. There is
//!    no sliding extension mid-window, so membership changes are picked up
//!    with at most one window of staleness.
//! 3. Groups with no entry, or any group once the window lapsed, get a
//!    fresh session. The creates are independent per group and dispatched
//!    concurrently.
//! 4. Entries for groups the author no longer belongs to are revoked -
//!    after the creates, so a token just carried forward is never revoked.
//!
//! A backend without a session concept returns no token; those groups get
//! no entry and contribute nothing to the cookie, which is not an error.
//!
//! The blob is a value threaded through the call, never ambient state; it
//! lives in the caller's per-client session store between requests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::PadBackend;
use crate::config::BrokerConfig;
use crate::error::BackendError;
use crate::model::{PadAuthor, PadGroup};

/// One held remote session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSession {
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

/// The per-client session record, stored (as JSON) in the caller's session
/// store and rebuilt here on each qualifying request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBlob {
    /// Epoch seconds; 0 means "never issued", which is always stale
    pub expires: i64,
    /// Cookie domain, the backend server's hostname
    pub domain: String,
    /// remote group id -> held session
    #[serde(default)]
    pub sessions: HashMap<String, GroupSession>,
}

impl SessionBlob {
    /// A blob that has never held a session: epoch-zero expiry, so the
    /// first reconciliation always treats it as stale.
    pub fn fresh(domain: impl Into<String>) -> Self {
        Self {
            expires: 0,
            domain: domain.into(),
            sessions: HashMap::new(),
        }
    }
}

/// What the (excluded) view layer needs to emit a cookie.
///
/// `http_only` is `false` throughout: the pad editor's client-side script
/// reads the tokens to talk to the backend directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    /// Epoch seconds
    pub expires: i64,
    pub domain: Option<String>,
    pub http_only: bool,
}

/// The aggregate editing cookie: every held token, joined with the encoded
/// comma the backend's editor expects. Empty value when nothing is held.
pub fn editing_cookie(blob: &SessionBlob) -> CookieSpec {
    let mut tokens: Vec<&str> = blob
        .sessions
        .values()
        .map(|s| s.session_id.as_str())
        .collect();
    tokens.sort_unstable();
    CookieSpec {
        name: "sessionID".to_string(),
        value: tokens.join("%2C"),
        expires: blob.expires,
        domain: (!blob.domain.is_empty()).then(|| blob.domain.clone()),
        http_only: false,
    }
}

/// The per-pad cookie for one group's session, when held.
pub fn pad_cookie(blob: &SessionBlob, remote_group_id: &str) -> Option<CookieSpec> {
    blob.sessions.get(remote_group_id).map(|session| CookieSpec {
        name: "padSessionID".to_string(),
        value: session.session_id.clone(),
        expires: blob.expires,
        domain: None,
        http_only: false,
    })
}

/// Reconciles held sessions against current group memberships.
#[derive(Debug, Clone)]
pub struct SessionBroker {
    session_length_secs: i64,
}

impl SessionBroker {
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            session_length_secs: config.session_length_secs as i64,
        }
    }

    /// One reconciliation pass. `groups` is the author's current membership
    /// (from [`crate::directory::author_groups`]); `domain` is the cookie
    /// domain for a fresh blob. Returns the blob to persist.
    pub async fn reconcile<B: PadBackend>(
        &self,
        backend: &B,
        author: Option<&PadAuthor>,
        groups: &[PadGroup],
        blob: Option<SessionBlob>,
        domain: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionBlob, BackendError> {
        let mut old = blob.unwrap_or_else(|| SessionBlob::fresh(domain));

        let Some(author) = author else {
            return Ok(old);
        };
        let Some(author_remote) = author.remote_id.as_deref() else {
            warn!(user = %author.user_id, "author has no remote id; skipping reconciliation");
            return Ok(old);
        };
        if !backend.is_online().await {
            debug!("backend offline; leaving sessions untouched");
            return Ok(old);
        }

        let now_ts = now.timestamp();
        let stale = old.expires < now_ts;
        // forward-only: a lapsed window opens a new one, an unexpired
        // window is left exactly as-is
        let new_expires = if stale {
            now_ts + self.session_length_secs
        } else {
            old.expires
        };

        let mut new_blob = SessionBlob {
            expires: new_expires,
            domain: domain.to_string(),
            sessions: HashMap::new(),
        };

        // split membership into sessions to mint and sessions to carry
        let mut to_create: Vec<&str> = Vec::new();
        for group in groups {
            let Some(group_remote) = group.remote_id.as_deref() else {
                warn!(mapper = %group.mapper, "group has no remote id; skipped");
                continue;
            };
            if stale || !old.sessions.contains_key(group_remote) {
                to_create.push(group_remote);
            } else if let Some(session) = old.sessions.remove(group_remote) {
                new_blob.sessions.insert(group_remote.to_string(), session);
            }
        }

        // independent per group, so mint them concurrently
        let minted = join_all(
            to_create
                .iter()
                .map(|group_remote| backend.create_session(group_remote, author_remote, new_expires)),
        )
        .await;
        for (group_remote, minted) in to_create.iter().zip(minted) {
            if let Some(token) = minted? {
                debug!(group = %group_remote, "session created");
                new_blob
                    .sessions
                    .insert(group_remote.to_string(), GroupSession { session_id: token });
            }
            // a stale entry for this group is superseded either way
            old.sessions.remove(*group_remote);
        }

        // whatever is left belongs to groups the author left; revoke after
        // the creates so a reused token is never revoked
        for (group_remote, session) in old.sessions {
            debug!(group = %group_remote, "revoking orphaned session");
            backend.delete_session(&session.session_id).await?;
        }

        Ok(new_blob)
    }
}
