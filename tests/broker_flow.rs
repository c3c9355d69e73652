//! Full request flow: resolve the author, find their groups, create a pad,
//! reconcile sessions, and build the cookies the view layer would emit.

mod common;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use common::{server, ScriptedBackend};
use padbroker::{
    directory, editing_cookie, lifecycle, pad_cookie, BackendKind, BrokerConfig, Category,
    MemoryStore, Pad, RecordStore, SessionBroker, UserIdentity,
};

#[tokio::test]
async fn pad_view_request_end_to_end() {
    let backend = ScriptedBackend::default();
    let mut store = MemoryStore::new();
    let server = server(BackendKind::Etherpad);
    let config = BrokerConfig::builder().session_length_secs(3600).build().unwrap();

    // a category editable by the "staff" idp group
    let category = Category {
        id: Uuid::new_v4(),
        name: "Teams".into(),
        slug: "teams".into(),
        parent: None,
        idp_groups: vec!["staff".into()],
    };
    store.save_category(category.clone());

    let group = directory::get_or_create_group(
        &mut store,
        &backend,
        &server,
        "team-x",
        Some("Team X".into()),
        Some(category.id),
    )
    .await
    .unwrap();
    assert_eq!(group.remote_id.as_deref(), Some("g.team-x"));

    // pad created under the group
    let pad = Pad::new("Meeting: Notes", server.id, group.id);
    let pad = lifecycle::create(&mut store, &backend, pad, Some("agenda"))
        .await
        .unwrap();
    assert_eq!(pad.remote_id.as_deref(), Some("g.team-x$Meeting__Notes"));

    // an authenticated staff member shows up
    let user = UserIdentity::authenticated("jmiller", "J. Miller", vec!["staff".into()]);
    let author = directory::current_author(&mut store, &backend, &server, &user)
        .await
        .unwrap()
        .unwrap();
    let groups = directory::author_groups(&store, &server, &user);
    assert_eq!(groups.len(), 1);
    assert!(directory::is_group_author(&store, &server, &group, &user));

    // request-time reconciliation
    let broker = SessionBroker::new(&config);
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let domain = server.hostname().unwrap();
    let blob = broker
        .reconcile(&backend, Some(&author), &groups, None, &domain, now)
        .await
        .unwrap();

    assert_eq!(blob.domain, "pads.example.org");
    assert_eq!(blob.sessions.len(), 1);
    assert_eq!(blob.expires, 1_700_000_000 + 3600);

    // cookies the view layer would set
    let aggregate = editing_cookie(&blob);
    assert_eq!(aggregate.name, "sessionID");
    assert_eq!(aggregate.value, blob.sessions["g.team-x"].session_id);
    let per_pad = pad_cookie(&blob, group.remote_id.as_deref().unwrap()).unwrap();
    assert_eq!(per_pad.name, "padSessionID");

    // an outsider gets no groups and therefore no sessions
    let outsider = UserIdentity::authenticated("guest", "Guest", vec!["visitors".into()]);
    let outsider_author = directory::current_author(&mut store, &backend, &server, &outsider)
        .await
        .unwrap()
        .unwrap();
    let no_groups = directory::author_groups(&store, &server, &outsider);
    assert!(no_groups.is_empty());
    let outsider_blob = broker
        .reconcile(&backend, Some(&outsider_author), &no_groups, None, &domain, now)
        .await
        .unwrap();
    assert!(outsider_blob.sessions.is_empty());
    assert_eq!(editing_cookie(&outsider_blob).value, "");
}

#[tokio::test]
async fn group_destruction_cascades_before_remote_delete() {
    let backend = ScriptedBackend::default();
    let mut store = MemoryStore::new();
    let server = server(BackendKind::Etherpad);

    let group = directory::get_or_create_group(&mut store, &backend, &server, "team-x", None, None)
        .await
        .unwrap();
    for name in ["One", "Two", "Three"] {
        let pad = Pad::new(name, server.id, group.id);
        lifecycle::create(&mut store, &backend, pad, None).await.unwrap();
    }
    assert_eq!(store.pads_in_group(group.id).len(), 3);

    lifecycle::destroy_group(&mut store, &backend, &group).await.unwrap();
    assert!(store.pads_in_group(group.id).is_empty());
    assert!(store.group(group.id).is_none());
}
