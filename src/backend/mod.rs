//! Backend adapters
//!
//! Every pad-hosting service the broker can talk to is wrapped in an adapter
//! implementing [`PadBackend`], the single capability contract the rest of
//! the crate is written against. The services have incompatible APIs - the
//! Etherpad API is synchronous REST with an API key, the markdown service
//! creates pads through redirects and authenticates with cookies - and the
//! adapter boundary keeps that divergence out of the lifecycle and session
//! code.
//!
//! Adapter selection is enum dispatch on the server record's stored
//! [`BackendKind`](crate::model::BackendKind): [`Backend::connect`] returns
//! the matching variant.
//!
//! # Error policy
//!
//! - `is_online` never fails; any transport or protocol error is `false`.
//! - `delete_pad`, `delete_group`, and `delete_session` swallow remote
//!   rejections (the desired end-state already holds) and only propagate
//!   transport failures.
//! - `create_session` may return `Ok(None)`: the backend has no session
//!   concept. Callers treat that as "no cookie to set", not an error.
//! - Nothing here retries; a failed call surfaces once.

pub mod etherpad;
pub mod markdown;
pub mod null;

pub use etherpad::EtherpadBackend;
pub use markdown::MarkdownBackend;
pub use null::NullBackend;

use crate::config::BrokerConfig;
use crate::error::BackendError;
use crate::model::{BackendKind, PadServer};

/// Make a pad name syntactically valid as part of a remote pad id: each run
/// of whitespace and each run of colons collapses to a single underscore.
pub fn sanitize_pad_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            out.push('_');
        } else if c == ':' {
            while chars.peek() == Some(&':') {
                chars.next();
            }
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

/// The capability contract all adapters satisfy.
///
/// Default bodies give the null semantics: no remote service, every
/// operation trivially succeeds. Concrete adapters override what their
/// service actually supports.
pub trait PadBackend: Send + Sync {
    /// Backend-specific pad-name sanitization; the default is shared by all
    /// current adapters.
    fn sanitize_pad_name(&self, name: &str) -> String {
        sanitize_pad_name(name)
    }

    /// Best-effort liveness probe. Never fails the caller's flow.
    fn is_online(&self) -> impl std::future::Future<Output = bool> + Send {
        async { true }
    }

    /// Idempotent group creation: the same mapping key always yields the
    /// same remote group id.
    fn get_or_create_group(
        &self,
        mapper: &str,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send {
        let mapper = mapper.to_string();
        async move { Ok(mapper) }
    }

    /// Delete a remote group. "Already absent" counts as success.
    fn delete_group(
        &self,
        _remote_group_id: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send {
        async { Ok(()) }
    }

    /// Create a pad inside a group, optionally seeding its text. The
    /// returned id is deterministic where the backend allows it.
    fn create_group_pad(
        &self,
        remote_group_id: &str,
        name: &str,
        text: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;

    /// Names of the pads the backend holds for a group.
    fn list_group_pads(
        &self,
        _remote_group_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, BackendError>> + Send {
        async { Ok(Vec::new()) }
    }

    fn set_password(
        &self,
        _remote_pad_id: &str,
        _password: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send {
        async { Ok(()) }
    }

    fn set_public_status(
        &self,
        _remote_pad_id: &str,
        _public: bool,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send {
        async { Ok(()) }
    }

    fn is_pad_public(
        &self,
        _remote_pad_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, BackendError>> + Send {
        async { Ok(true) }
    }

    /// Delete a remote pad. "Already absent" counts as success.
    fn delete_pad(
        &self,
        _remote_pad_id: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send {
        async { Ok(()) }
    }

    /// Mint a session token for an author on a group, valid until
    /// `expires_at` (epoch seconds). `Ok(None)` means the backend has no
    /// session concept.
    fn create_session(
        &self,
        _remote_group_id: &str,
        _remote_author_id: &str,
        _expires_at: i64,
    ) -> impl std::future::Future<Output = Result<Option<String>, BackendError>> + Send {
        async { Ok(None) }
    }

    /// Revoke a session token.
    fn delete_session(
        &self,
        _session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send {
        async { Ok(()) }
    }

    /// Materialize the remote author identity for a user.
    fn create_user(
        &self,
        user_id: &str,
        _display_name: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send {
        let user_id = user_id.to_string();
        async move { Ok(user_id) }
    }

    /// Browser URL for a pad, optionally personalized with a user name.
    fn pad_link(&self, _remote_pad_id: &str, _user_name: Option<&str>) -> Option<String> {
        None
    }

    /// Current text content of a pad.
    fn get_text(
        &self,
        _remote_pad_id: &str,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send {
        async { Ok(String::new()) }
    }
}

/// Adapter instance for one configured server, selected by its stored
/// backend kind.
#[derive(Debug)]
pub enum Backend {
    Etherpad(EtherpadBackend),
    Markdown(MarkdownBackend),
    Null(NullBackend),
}

impl Backend {
    /// Construct the adapter for a server. Fails fast on malformed
    /// credentials; the markdown backend also logs in here.
    pub async fn connect(server: &PadServer, config: &BrokerConfig) -> Result<Self, BackendError> {
        match server.backend {
            BackendKind::Etherpad => Ok(Self::Etherpad(EtherpadBackend::new(
                &server.api_key,
                &server.url,
                config.request_timeout(),
            )?)),
            BackendKind::Markdown => Ok(Self::Markdown(
                MarkdownBackend::connect(&server.api_key, &server.url, config.request_timeout())
                    .await?,
            )),
            BackendKind::Null => Ok(Self::Null(NullBackend)),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $b:ident => $call:expr) => {
        match $self {
            Backend::Etherpad($b) => $call,
            Backend::Markdown($b) => $call,
            Backend::Null($b) => $call,
        }
    };
}

impl PadBackend for Backend {
    fn sanitize_pad_name(&self, name: &str) -> String {
        delegate!(self, b => b.sanitize_pad_name(name))
    }

    async fn is_online(&self) -> bool {
        delegate!(self, b => b.is_online().await)
    }

    async fn get_or_create_group(&self, mapper: &str) -> Result<String, BackendError> {
        delegate!(self, b => b.get_or_create_group(mapper).await)
    }

    async fn delete_group(&self, remote_group_id: &str) -> Result<(), BackendError> {
        delegate!(self, b => b.delete_group(remote_group_id).await)
    }

    async fn create_group_pad(
        &self,
        remote_group_id: &str,
        name: &str,
        text: Option<&str>,
    ) -> Result<String, BackendError> {
        delegate!(self, b => b.create_group_pad(remote_group_id, name, text).await)
    }

    async fn list_group_pads(&self, remote_group_id: &str) -> Result<Vec<String>, BackendError> {
        delegate!(self, b => b.list_group_pads(remote_group_id).await)
    }

    async fn set_password(&self, remote_pad_id: &str, password: &str) -> Result<(), BackendError> {
        delegate!(self, b => b.set_password(remote_pad_id, password).await)
    }

    async fn set_public_status(
        &self,
        remote_pad_id: &str,
        public: bool,
    ) -> Result<(), BackendError> {
        delegate!(self, b => b.set_public_status(remote_pad_id, public).await)
    }

    async fn is_pad_public(&self, remote_pad_id: &str) -> Result<bool, BackendError> {
        delegate!(self, b => b.is_pad_public(remote_pad_id).await)
    }

    async fn delete_pad(&self, remote_pad_id: &str) -> Result<(), BackendError> {
        delegate!(self, b => b.delete_pad(remote_pad_id).await)
    }

    async fn create_session(
        &self,
        remote_group_id: &str,
        remote_author_id: &str,
        expires_at: i64,
    ) -> Result<Option<String>, BackendError> {
        delegate!(self, b => b.create_session(remote_group_id, remote_author_id, expires_at).await)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
        delegate!(self, b => b.delete_session(session_id).await)
    }

    async fn create_user(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<String, BackendError> {
        delegate!(self, b => b.create_user(user_id, display_name).await)
    }

    fn pad_link(&self, remote_pad_id: &str, user_name: Option<&str>) -> Option<String> {
        delegate!(self, b => b.pad_link(remote_pad_id, user_name))
    }

    async fn get_text(&self, remote_pad_id: &str) -> Result<String, BackendError> {
        delegate!(self, b => b.get_text(remote_pad_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_colon_and_space() {
        assert_eq!(sanitize_pad_name("Meeting: Notes"), "Meeting__Notes");
    }

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_pad_name("a   b"), "a_b");
        assert_eq!(sanitize_pad_name("a:::b"), "a_b");
        assert_eq!(sanitize_pad_name("plain"), "plain");
        assert_eq!(sanitize_pad_name("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_adjacent_runs_stay_distinct() {
        // a whitespace run followed by a colon run gives two underscores
        assert_eq!(sanitize_pad_name("a ::b"), "a__b");
        assert_eq!(sanitize_pad_name(" : "), "___");
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_deterministic(name in ".{0,64}") {
            prop_assert_eq!(sanitize_pad_name(&name), sanitize_pad_name(&name));
        }

        #[test]
        fn prop_sanitized_has_no_separators(name in ".{0,64}") {
            let out = sanitize_pad_name(&name);
            prop_assert!(!out.contains(':'));
            prop_assert!(!out.chars().any(char::is_whitespace));
        }

        #[test]
        fn prop_sanitize_is_idempotent(name in ".{0,64}") {
            let once = sanitize_pad_name(&name);
            prop_assert_eq!(sanitize_pad_name(&once), once);
        }
    }
}
