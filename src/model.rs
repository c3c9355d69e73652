//! Record types and the store seam
//!
//! This module defines the durable records the broker works with -
//! servers, categories, groups, authors, and pads - together with the
//! [`RecordStore`] trait the surrounding application implements and a
//! [`MemoryStore`] used in tests and small deployments.
//!
//! # Lazy remote identities
//!
//! Groups, authors, and pads all carry an `Option<String>` remote id that is
//! assigned exactly once, on first contact with the backend. The transition
//! is an explicit guarded call ([`PadGroup::assign_remote_id`] and friends),
//! never an implicit side effect of saving, so it can be tested without a
//! store or a live backend. Once set, a remote id never changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::BrokerError;

/// Which adapter a [`PadServer`] is spoken to with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Etherpad Lite HTTP API (API-key auth, groups and sessions)
    Etherpad,
    /// HackMD-style markdown service (cookie auth, redirect-based creation)
    Markdown,
    /// No remote service; every operation is a local no-op
    Null,
}

/// A configured pad-hosting server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadServer {
    pub id: Uuid,
    pub title: String,
    /// Base URL, with or without trailing slash
    pub url: String,
    /// API key or login credential; format is backend-specific
    pub api_key: String,
    pub backend: BackendKind,
    pub notes: String,
}

impl PadServer {
    /// Build a runtime server record from a configuration entry
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: config.title.clone(),
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            backend: config.backend,
            notes: config.notes.clone(),
        }
    }

    /// The hostname of the server URL, used as the session cookie domain
    pub fn hostname(&self) -> Option<String> {
        let rest = self
            .url
            .strip_prefix("https://")
            .or_else(|| self.url.strip_prefix("http://"))?;
        let host = rest.split('/').next()?.split(':').next()?;
        if host.is_empty() {
            None
        } else {
            Some(host.to_string())
        }
    }
}

/// A category groups pads thematically and carries the authorization
/// mapping: the identity-provider group names whose members may edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent: Option<Uuid>,
    /// Identity-provider group names granted access to this category
    pub idp_groups: Vec<String>,
}

/// A pad group: the backend's access-scoping unit, mapped one-to-one onto a
/// local record keyed by `(mapper, server_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadGroup {
    pub id: Uuid,
    /// Stable, URL-safe key used to request the same remote group every time
    pub mapper: String,
    /// Backend-assigned group id; `None` until first remote contact
    pub remote_id: Option<String>,
    pub server_id: Uuid,
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
}

impl PadGroup {
    pub fn new(mapper: impl Into<String>, server_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            mapper: mapper.into(),
            remote_id: None,
            server_id,
            name: None,
            category_id: None,
        }
    }

    /// One-shot remote identity assignment. Errors if already assigned.
    pub fn assign_remote_id(&mut self, remote_id: impl Into<String>) -> Result<(), BrokerError> {
        if self.remote_id.is_some() {
            return Err(BrokerError::AlreadyCreated {
                name: self.mapper.clone(),
            });
        }
        self.remote_id = Some(remote_id.into());
        Ok(())
    }
}

/// An author: one per (user, server) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadAuthor {
    pub id: Uuid,
    /// The identity provider's stable user id
    pub user_id: String,
    /// Backend-assigned author id; `None` until first remote contact
    pub remote_id: Option<String>,
    pub server_id: Uuid,
}

impl PadAuthor {
    pub fn new(user_id: impl Into<String>, server_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            remote_id: None,
            server_id,
        }
    }

    /// One-shot remote identity assignment. Errors if already assigned.
    pub fn assign_remote_id(&mut self, remote_id: impl Into<String>) -> Result<(), BrokerError> {
        if self.remote_id.is_some() {
            return Err(BrokerError::AlreadyCreated {
                name: self.user_id.clone(),
            });
        }
        self.remote_id = Some(remote_id.into());
        Ok(())
    }
}

/// Template settings carried by pads that serve as duplication sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// Public flag for pads duplicated from this one
    pub is_public: bool,
    /// Template for the new pad's password
    pub password: String,
    /// Template for the new pad's name
    pub pad_name: String,
    /// Template for the new pad's short slug
    pub slug: String,
}

/// A pad record. `remote_id` is `None` until the pad exists on the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pad {
    pub id: Uuid,
    pub name: String,
    pub server_id: Uuid,
    pub group_id: Uuid,
    /// Backend pad id; for the Etherpad backend this is
    /// `"{remote_group_id}${sanitized_name}"`
    pub remote_id: Option<String>,
    pub password: Option<String>,
    pub slug: Option<String>,
    pub is_public: bool,
    pub is_template: bool,
    pub template: TemplateSettings,
}

impl Pad {
    pub fn new(name: impl Into<String>, server_id: Uuid, group_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            server_id,
            group_id,
            remote_id: None,
            password: None,
            slug: None,
            is_public: false,
            is_template: false,
            template: TemplateSettings::default(),
        }
    }

    /// Whether the pad exists on the backend yet
    pub fn is_created(&self) -> bool {
        self.remote_id.is_some()
    }

    /// One-shot remote identity assignment. Errors if already assigned.
    pub fn assign_remote_id(&mut self, remote_id: impl Into<String>) -> Result<(), BrokerError> {
        if self.remote_id.is_some() {
            return Err(BrokerError::AlreadyCreated {
                name: self.name.clone(),
            });
        }
        self.remote_id = Some(remote_id.into());
        Ok(())
    }
}

/// What the authenticated-identity provider hands the broker for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user id
    pub user_id: String,
    pub display_name: String,
    pub authenticated: bool,
    /// The user's identity-provider group memberships
    pub idp_groups: Vec<String>,
}

impl UserIdentity {
    pub fn authenticated(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        idp_groups: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            authenticated: true,
            idp_groups,
        }
    }

    /// An anonymous visitor: no author, no sessions
    pub fn anonymous() -> Self {
        Self {
            user_id: String::new(),
            display_name: String::new(),
            authenticated: false,
            idp_groups: Vec::new(),
        }
    }
}

/// The persistence seam. The surrounding application supplies the real
/// implementation; the broker only needs these lookups and writes.
pub trait RecordStore {
    fn category(&self, id: Uuid) -> Option<Category>;
    fn save_category(&mut self, category: Category);

    fn group(&self, id: Uuid) -> Option<PadGroup>;
    fn group_by_mapper(&self, server_id: Uuid, mapper: &str) -> Option<PadGroup>;
    fn groups_on_server(&self, server_id: Uuid) -> Vec<PadGroup>;
    fn save_group(&mut self, group: PadGroup);
    fn delete_group(&mut self, id: Uuid);

    fn author_for(&self, server_id: Uuid, user_id: &str) -> Option<PadAuthor>;
    fn save_author(&mut self, author: PadAuthor);

    fn pad(&self, id: Uuid) -> Option<Pad>;
    fn pads_in_group(&self, group_id: Uuid) -> Vec<Pad>;
    fn save_pad(&mut self, pad: Pad);
    fn delete_pad(&mut self, id: Uuid);
}

/// In-memory [`RecordStore`], used by the tests and by deployments that keep
/// their records elsewhere and only mirror what the broker needs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    categories: HashMap<Uuid, Category>,
    groups: HashMap<Uuid, PadGroup>,
    authors: HashMap<Uuid, PadAuthor>,
    pads: HashMap<Uuid, Pad>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn category(&self, id: Uuid) -> Option<Category> {
        self.categories.get(&id).cloned()
    }

    fn save_category(&mut self, category: Category) {
        self.categories.insert(category.id, category);
    }

    fn group(&self, id: Uuid) -> Option<PadGroup> {
        self.groups.get(&id).cloned()
    }

    fn group_by_mapper(&self, server_id: Uuid, mapper: &str) -> Option<PadGroup> {
        self.groups
            .values()
            .find(|g| g.server_id == server_id && g.mapper == mapper)
            .cloned()
    }

    fn groups_on_server(&self, server_id: Uuid) -> Vec<PadGroup> {
        self.groups
            .values()
            .filter(|g| g.server_id == server_id)
            .cloned()
            .collect()
    }

    fn save_group(&mut self, group: PadGroup) {
        self.groups.insert(group.id, group);
    }

    fn delete_group(&mut self, id: Uuid) {
        self.groups.remove(&id);
    }

    fn author_for(&self, server_id: Uuid, user_id: &str) -> Option<PadAuthor> {
        self.authors
            .values()
            .find(|a| a.server_id == server_id && a.user_id == user_id)
            .cloned()
    }

    fn save_author(&mut self, author: PadAuthor) {
        self.authors.insert(author.id, author);
    }

    fn pad(&self, id: Uuid) -> Option<Pad> {
        self.pads.get(&id).cloned()
    }

    fn pads_in_group(&self, group_id: Uuid) -> Vec<Pad> {
        self.pads
            .values()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect()
    }

    fn save_pad(&mut self, pad: Pad) {
        self.pads.insert(pad.id, pad);
    }

    fn delete_pad(&mut self, id: Uuid) {
        self.pads.remove(&id);
    }
}
