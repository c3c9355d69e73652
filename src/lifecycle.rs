//! Pad lifecycle
//!
//! Drives a pad through `Uninitialized -> Created -> Updated* -> Destroyed`
//! against its group's backend. Creation requires the group's remote id to
//! exist already (the group minted it on its own first save); the pad's
//! remote id is assigned here, once, and never changes afterwards.
//!
//! Destroying a group cascades: pads first, then the remote group, then the
//! local record. There is no compensation - a remote failure mid-cascade
//! leaves the remainder in place and surfaces the error.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::backend::PadBackend;
use crate::error::BrokerError;
use crate::model::{Pad, PadGroup, RecordStore};
use crate::template::{render, TemplateContext};

/// Create `pad` on the backend, optionally seeding its text, then push its
/// settings and persist the record. One-shot: a pad that already has a
/// remote id is rejected.
pub async fn create<S, B>(
    store: &mut S,
    backend: &B,
    mut pad: Pad,
    text: Option<&str>,
) -> Result<Pad, BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    if pad.is_created() {
        return Err(BrokerError::AlreadyCreated {
            name: pad.name.clone(),
        });
    }
    let group = store
        .group(pad.group_id)
        .ok_or_else(|| BrokerError::no_such_record(format!("group {}", pad.group_id)))?;
    let group_remote = group
        .remote_id
        .as_deref()
        .ok_or_else(|| BrokerError::missing_remote_id(format!("group '{}'", group.mapper)))?;

    let remote_id = backend.create_group_pad(group_remote, &pad.name, text).await?;
    pad.assign_remote_id(remote_id)?;
    info!(name = %pad.name, remote_id = pad.remote_id.as_deref(), "pad created");

    update(backend, &pad).await?;
    store.save_pad(pad.clone());
    Ok(pad)
}

/// Push the pad's settings to the backend: password when present, public
/// status always. Idempotent; legal any number of times once created.
pub async fn update<B: PadBackend>(backend: &B, pad: &Pad) -> Result<(), BrokerError> {
    let remote_id = pad
        .remote_id
        .as_deref()
        .ok_or_else(|| BrokerError::missing_remote_id(format!("pad '{}'", pad.name)))?;
    if let Some(password) = &pad.password {
        backend.set_password(remote_id, password).await?;
    }
    backend.set_public_status(remote_id, pad.is_public).await?;
    Ok(())
}

/// Destroy a pad remotely (already-absent counts as success) and drop the
/// record. Irreversible.
pub async fn destroy<S, B>(store: &mut S, backend: &B, pad: &Pad) -> Result<(), BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    if let Some(remote_id) = &pad.remote_id {
        backend.delete_pad(remote_id).await?;
    }
    store.delete_pad(pad.id);
    info!(name = %pad.name, "pad destroyed");
    Ok(())
}

/// Cascade-destroy a group: every pad, then the remote group, then the
/// record. Not transactional; a failure partway is not rolled back.
pub async fn destroy_group<S, B>(
    store: &mut S,
    backend: &B,
    group: &PadGroup,
) -> Result<(), BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    for pad in store.pads_in_group(group.id) {
        destroy(store, backend, &pad).await?;
    }
    if let Some(remote_id) = &group.remote_id {
        backend.delete_group(remote_id).await?;
    }
    store.delete_group(group.id);
    info!(mapper = %group.mapper, "group destroyed");
    Ok(())
}

/// Duplicate a template pad into a brand-new pad in the same group.
///
/// Two-phase render: the password, name, and slug templates see only
/// `{date}`; the body (the source pad's current text) then sees `{date}`,
/// `{name}`, `{password}`, and `{slug}`, so it can embed the values just
/// generated.
pub async fn duplicate<S, B>(
    store: &mut S,
    backend: &B,
    pad: &Pad,
    now: DateTime<Utc>,
) -> Result<Pad, BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    let source_remote = pad
        .remote_id
        .as_deref()
        .ok_or_else(|| BrokerError::missing_remote_id(format!("pad '{}'", pad.name)))?;
    let text = backend.get_text(source_remote).await?;

    let date = now.format("%Y-%m-%d %H:%M").to_string();
    let params = TemplateContext::with_date(date.clone());
    let password = render(&pad.template.password, &params);
    let name = render(&pad.template.pad_name, &params);
    let slug = render(&pad.template.slug, &params);

    let body = render(
        &text,
        &TemplateContext {
            date,
            name: name.clone(),
            password: password.clone(),
            slug: slug.clone(),
        },
    );

    let mut new_pad = Pad::new(name, pad.server_id, pad.group_id);
    new_pad.password = (!password.is_empty()).then_some(password);
    new_pad.slug = (!slug.is_empty()).then_some(slug);
    new_pad.is_public = pad.template.is_public;

    create(store, backend, new_pad, Some(&body)).await
}

/// Remote pad names in `group` with no matching local record.
pub async fn unknown_pads<S, B>(
    store: &S,
    backend: &B,
    group: &PadGroup,
) -> Result<Vec<String>, BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    let remote_id = group
        .remote_id
        .as_deref()
        .ok_or_else(|| BrokerError::missing_remote_id(format!("group '{}'", group.mapper)))?;
    let remote_names = backend.list_group_pads(remote_id).await?;

    let known: Vec<String> = store
        .pads_in_group(group.id)
        .iter()
        .map(|pad| backend.sanitize_pad_name(&pad.name))
        .collect();
    Ok(remote_names
        .into_iter()
        .filter(|name| !known.contains(name))
        .collect())
}

/// Adopt pads that exist on the backend but not locally, reconstructing
/// their deterministic remote ids. Returns the imported records.
pub async fn import_unknown<S, B>(
    store: &mut S,
    backend: &B,
    group: &PadGroup,
) -> Result<Vec<Pad>, BrokerError>
where
    S: RecordStore,
    B: PadBackend,
{
    let names = unknown_pads(store, backend, group).await?;
    let group_remote = group
        .remote_id
        .as_deref()
        .ok_or_else(|| BrokerError::missing_remote_id(format!("group '{}'", group.mapper)))?;

    let mut imported = Vec::with_capacity(names.len());
    for name in names {
        let mut pad = Pad::new(&name, group.server_id, group.id);
        pad.assign_remote_id(format!("{}${}", group_remote, name))?;
        store.save_pad(pad.clone());
        imported.push(pad);
    }
    if !imported.is_empty() {
        info!(mapper = %group.mapper, count = imported.len(), "imported remote pads");
    } else {
        warn!(mapper = %group.mapper, "no unknown pads to import");
    }
    Ok(imported)
}

/// Browser link for a pad, personalized when a user name is given.
pub fn pad_link<B: PadBackend>(backend: &B, pad: &Pad, user_name: Option<&str>) -> Option<String> {
    pad.remote_id
        .as_deref()
        .and_then(|remote_id| backend.pad_link(remote_id, user_name))
}

/// Current text of a pad, for raw display.
pub async fn pad_text<B: PadBackend>(backend: &B, pad: &Pad) -> Result<String, BrokerError> {
    let remote_id = pad
        .remote_id
        .as_deref()
        .ok_or_else(|| BrokerError::missing_remote_id(format!("pad '{}'", pad.name)))?;
    Ok(backend.get_text(remote_id).await?)
}
