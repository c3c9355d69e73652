//! Shared fixtures for the integration tests: a scripted in-memory backend
//! and record builders.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use padbroker::backend::sanitize_pad_name;
use padbroker::error::BackendError;
use padbroker::{BackendKind, PadAuthor, PadBackend, PadGroup, PadServer};

/// A backend whose behavior the test scripts: online or not, sessions or
/// not, with every session create/revoke recorded.
#[derive(Debug)]
pub struct ScriptedBackend {
    pub online: bool,
    /// When false the backend has no session concept (`create_session`
    /// yields no token)
    pub issues_sessions: bool,
    /// When true every `create_session` fails with a transport error
    pub fail_session_create: bool,
    /// When true every `delete_session` fails with a transport error
    pub fail_session_revoke: bool,
    counter: AtomicU64,
    pub created_sessions: Mutex<Vec<(String, String, i64)>>,
    pub revoked_sessions: Mutex<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            online: true,
            issues_sessions: true,
            fail_session_create: false,
            fail_session_revoke: false,
            counter: AtomicU64::new(0),
            created_sessions: Mutex::new(Vec::new()),
            revoked_sessions: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedBackend {
    pub fn offline() -> Self {
        Self {
            online: false,
            ..Self::default()
        }
    }

    pub fn sessionless() -> Self {
        Self {
            issues_sessions: false,
            ..Self::default()
        }
    }

    pub fn failing_session_create() -> Self {
        Self {
            fail_session_create: true,
            ..Self::default()
        }
    }

    pub fn failing_session_revoke() -> Self {
        Self {
            fail_session_revoke: true,
            ..Self::default()
        }
    }

    pub fn session_count(&self) -> usize {
        self.created_sessions.lock().unwrap().len()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked_sessions.lock().unwrap().clone()
    }
}

impl PadBackend for ScriptedBackend {
    async fn is_online(&self) -> bool {
        self.online
    }

    async fn get_or_create_group(&self, mapper: &str) -> Result<String, BackendError> {
        Ok(format!("g.{}", mapper))
    }

    async fn create_group_pad(
        &self,
        remote_group_id: &str,
        name: &str,
        _text: Option<&str>,
    ) -> Result<String, BackendError> {
        Ok(format!("{}${}", remote_group_id, sanitize_pad_name(name)))
    }

    async fn create_session(
        &self,
        remote_group_id: &str,
        remote_author_id: &str,
        expires_at: i64,
    ) -> Result<Option<String>, BackendError> {
        if self.fail_session_create {
            return Err(BackendError::transport("connection reset during createSession"));
        }
        if !self.issues_sessions {
            return Ok(None);
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let token = format!("s.{}", n);
        self.created_sessions.lock().unwrap().push((
            remote_group_id.to_string(),
            remote_author_id.to_string(),
            expires_at,
        ));
        Ok(Some(token))
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
        if self.fail_session_revoke {
            return Err(BackendError::transport("connection reset during deleteSession"));
        }
        self.revoked_sessions
            .lock()
            .unwrap()
            .push(session_id.to_string());
        Ok(())
    }
}

pub fn server(backend: BackendKind) -> PadServer {
    PadServer {
        id: Uuid::new_v4(),
        title: "Team Pads".into(),
        url: "https://pads.example.org".into(),
        api_key: "key".into(),
        backend,
        notes: String::new(),
    }
}

pub fn group_with_remote(server_id: Uuid, mapper: &str, remote: &str) -> PadGroup {
    let mut group = PadGroup::new(mapper, server_id);
    group.assign_remote_id(remote).unwrap();
    group
}

pub fn author_with_remote(server_id: Uuid, user: &str, remote: &str) -> PadAuthor {
    let mut author = PadAuthor::new(user, server_id);
    author.assign_remote_id(remote).unwrap();
    author
}
