//! padbroker - pad lifecycle and editing-session brokering
//!
//! This library manages collaborative documents ("pads") across
//! interchangeable backend hosting services and brokers short-lived
//! per-user, per-group editing sessions against them.
//!
//! # Overview
//!
//! - **`backend`** - one adapter per hosting service, all behind the
//!   [`backend::PadBackend`] capability contract, selected by the server
//!   record's stored backend kind
//! - **`directory`** - which remote author a user is, which groups they may
//!   edit (the authorization boundary)
//! - **`lifecycle`** - pad create/update/destroy/duplicate and group
//!   cascade destruction
//! - **`session`** - the request-time reconciler that diffs held remote
//!   sessions against current group memberships, minting and revoking
//!   under time-based expiry
//! - **`model`** - the records and the [`model::RecordStore`] seam the
//!   surrounding application implements
//! - **`config`** / **`error`** / **`template`** - ambient plumbing
//!
//! The web layer around this crate - routing, rendering, cookie emission -
//! stays outside; it feeds requests in and turns the returned
//! [`session::CookieSpec`] values into actual cookies.

pub mod backend;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod session;
pub mod template;

pub use backend::{Backend, PadBackend};
pub use config::{BrokerConfig, ConfigFile, ServerConfig};
pub use error::{BackendError, BrokerError};
pub use model::{
    BackendKind, Category, MemoryStore, Pad, PadAuthor, PadGroup, PadServer, RecordStore,
    UserIdentity,
};
pub use session::{editing_cookie, pad_cookie, CookieSpec, SessionBlob, SessionBroker};
