//! Null adapter: a server record with no remote service behind it.
//!
//! Every operation is the trait default - deletes succeed, listings are
//! empty, and `create_session` yields no token, so the reconciler stores no
//! entry and the caller sets no cookie.

use super::{sanitize_pad_name, PadBackend};
use crate::error::BackendError;

/// Backend with no remote side.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl PadBackend for NullBackend {
    async fn create_group_pad(
        &self,
        remote_group_id: &str,
        name: &str,
        _text: Option<&str>,
    ) -> Result<String, BackendError> {
        Ok(format!("{}:{}", remote_group_id, sanitize_pad_name(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_backend_has_no_sessions() {
        let backend = NullBackend;
        assert!(backend.is_online().await);
        let token = backend.create_session("g", "a", 0).await.unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_null_group_is_the_mapper() {
        let backend = NullBackend;
        assert_eq!(backend.get_or_create_group("team-x").await.unwrap(), "team-x");
        let pad_id = backend.create_group_pad("team-x", "Meeting: Notes", None).await.unwrap();
        assert_eq!(pad_id, "team-x:Meeting__Notes");
    }

    #[tokio::test]
    async fn test_null_deletes_are_idempotent() {
        let backend = NullBackend;
        backend.delete_pad("nope").await.unwrap();
        backend.delete_pad("nope").await.unwrap();
        backend.delete_group("nope").await.unwrap();
    }
}
