//! Group and author directory
//!
//! Resolves the two identities the broker juggles per request: which remote
//! author a user is on a given server, and which pad groups that user may
//! edit. Both remote identities are materialized lazily, exactly once, on
//! first contact.
//!
//! `author_groups` is the authorization boundary: a group is visible to a
//! user when its category names at least one of the user's
//! identity-provider groups. Pad access checks go through it.

use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::PadBackend;
use crate::error::BrokerError;
use crate::model::{PadAuthor, PadGroup, PadServer, RecordStore, UserIdentity};

/// Get or create the author record for `user` on `server`.
///
/// Unauthenticated users have no author: `Ok(None)`, not an error. On first
/// contact the backend mints the remote author id, which is then fixed for
/// the record's lifetime.
pub async fn current_author<S, B>(
    store: &mut S,
    backend: &B,
    server: &PadServer,
    user: &UserIdentity,
) -> Result<Option<PadAuthor>, BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    if !user.authenticated {
        return Ok(None);
    }

    if let Some(author) = store.author_for(server.id, &user.user_id) {
        return Ok(Some(author));
    }

    let mut author = PadAuthor::new(&user.user_id, server.id);
    let remote_id = backend
        .create_user(&user.user_id, Some(&user.display_name))
        .await?;
    author.assign_remote_id(remote_id)?;
    info!(user = %user.user_id, server = %server.title, "created pad author");
    store.save_author(author.clone());
    Ok(Some(author))
}

/// Groups on `server` the user may edit, via the category-to-idp-group
/// mapping. Sorted by mapper so callers iterate deterministically.
pub fn author_groups<S: RecordStore>(
    store: &S,
    server: &PadServer,
    user: &UserIdentity,
) -> Vec<PadGroup> {
    let mut groups: Vec<PadGroup> = store
        .groups_on_server(server.id)
        .into_iter()
        .filter(|group| {
            group
                .category_id
                .and_then(|id| store.category(id))
                .is_some_and(|category| {
                    category
                        .idp_groups
                        .iter()
                        .any(|g| user.idp_groups.contains(g))
                })
        })
        .collect();
    groups.sort_by(|a, b| a.mapper.cmp(&b.mapper));
    groups
}

/// Whether `author` belongs to the group, i.e. may edit its pads.
pub fn is_group_author<S: RecordStore>(
    store: &S,
    server: &PadServer,
    group: &PadGroup,
    user: &UserIdentity,
) -> bool {
    author_groups(store, server, user)
        .iter()
        .any(|g| g.id == group.id)
}

/// Get or create the local group for `mapper` on `server`, minting the
/// remote group id on first save and never again.
pub async fn get_or_create_group<S, B>(
    store: &mut S,
    backend: &B,
    server: &PadServer,
    mapper: &str,
    name: Option<String>,
    category_id: Option<Uuid>,
) -> Result<PadGroup, BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    if let Some(group) = store.group_by_mapper(server.id, mapper) {
        debug!(mapper, "group already known");
        return Ok(group);
    }

    let mut group = PadGroup::new(mapper, server.id);
    group.name = name;
    group.category_id = category_id;
    let remote_id = backend.get_or_create_group(mapper).await?;
    group.assign_remote_id(remote_id)?;
    info!(mapper, remote_id = group.remote_id.as_deref(), "created pad group");
    store.save_group(group.clone());
    Ok(group)
}
