#![allow(clippy::float_cmp)]

use std::time::Duration;

use events::{Position, RoomObject, ServerEvent};

use super::*;

fn connected() -> Reconciler {
    let mut reconciler = Reconciler::new();
    reconciler.set_status(ConnectionStatus::Connected);
    reconciler
}

fn object(id: &str) -> RoomObject {
    RoomObject::new(id, "sticky", 0.0, 0.0)
}

fn pos(x: f64, y: f64) -> Position {
    Position { x, y }
}

// =============================================================
// Creation
// =============================================================

#[test]
fn create_emits_when_connected() {
    let mut reconciler = connected();
    let event = reconciler.create_local(object("o1"));
    assert!(matches!(event, Some(ClientEvent::CreateObject(_))));
    assert_eq!(reconciler.len(), 1);
}

#[test]
fn create_applies_locally_but_skips_emission_when_disconnected() {
    let mut reconciler = Reconciler::new();
    assert!(reconciler.create_local(object("o1")).is_none());
    assert_eq!(reconciler.len(), 1);
}

// =============================================================
// Throttle window
// =============================================================

#[test]
fn second_update_inside_the_window_is_suppressed() {
    let mut reconciler = connected();
    reconciler.create_local(object("o1"));
    let t0 = Instant::now();

    assert!(reconciler.update_local_throttled_at("o1", pos(1.0, 1.0), t0).is_some());
    assert!(
        reconciler
            .update_local_throttled_at("o1", pos(2.0, 2.0), t0 + Duration::from_millis(10))
            .is_none()
    );

    // The local mirror still moved.
    assert_eq!(reconciler.get("o1").expect("o1").x, 2.0);
}

#[test]
fn updates_a_full_window_apart_both_emit() {
    let mut reconciler = connected();
    reconciler.create_local(object("o1"));
    let t0 = Instant::now();

    assert!(reconciler.update_local_throttled_at("o1", pos(1.0, 1.0), t0).is_some());
    assert!(
        reconciler
            .update_local_throttled_at("o1", pos(2.0, 2.0), t0 + Duration::from_millis(16))
            .is_some()
    );
}

#[test]
fn suppressed_calls_do_not_advance_the_window() {
    let mut reconciler = connected();
    reconciler.create_local(object("o1"));
    let t0 = Instant::now();

    reconciler.update_local_throttled_at("o1", pos(1.0, 1.0), t0);
    // 10 ms in: suppressed. If this advanced the window, the call at
    // t0+17ms would still be inside it.
    assert!(
        reconciler
            .update_local_throttled_at("o1", pos(2.0, 2.0), t0 + Duration::from_millis(10))
            .is_none()
    );
    assert!(
        reconciler
            .update_local_throttled_at("o1", pos(3.0, 3.0), t0 + Duration::from_millis(17))
            .is_some()
    );
}

#[test]
fn throttle_keys_are_per_object() {
    let mut reconciler = connected();
    reconciler.create_local(object("a"));
    reconciler.create_local(object("b"));
    let t0 = Instant::now();

    assert!(reconciler.update_local_throttled_at("a", pos(1.0, 1.0), t0).is_some());
    assert!(
        reconciler
            .update_local_throttled_at("b", pos(1.0, 1.0), t0 + Duration::from_millis(5))
            .is_some()
    );
}

#[test]
fn update_of_unknown_object_is_a_no_op() {
    let mut reconciler = connected();
    assert!(reconciler.update_local_throttled("ghost", pos(1.0, 1.0)).is_none());
    assert!(reconciler.update_local_forced("ghost", pos(1.0, 1.0)).is_none());
}

#[test]
fn updates_are_suppressed_while_disconnected_but_apply_locally() {
    let mut reconciler = Reconciler::new();
    reconciler.set_status(ConnectionStatus::Connected);
    reconciler.create_local(object("o1"));
    reconciler.set_status(ConnectionStatus::Disconnected);

    assert!(reconciler.update_local_forced("o1", pos(7.0, 8.0)).is_none());
    assert_eq!(reconciler.get("o1").expect("o1").x, 7.0);

    // Reconnecting resumes emission with no queued backlog.
    reconciler.set_status(ConnectionStatus::Connected);
    assert!(reconciler.update_local_forced("o1", pos(9.0, 9.0)).is_some());
}

// =============================================================
// Forced emission
// =============================================================

#[test]
fn forced_update_bypasses_and_resets_the_window() {
    let mut reconciler = connected();
    reconciler.create_local(object("o1"));
    let t0 = Instant::now();

    reconciler.update_local_throttled_at("o1", pos(1.0, 1.0), t0);

    // Inside the window, but forced — emits anyway.
    let forced = reconciler.update_local_forced_at("o1", pos(2.0, 2.0), t0 + Duration::from_millis(5));
    assert!(forced.is_some());

    // The window restarted at the forced emission.
    assert!(
        reconciler
            .update_local_throttled_at("o1", pos(3.0, 3.0), t0 + Duration::from_millis(15))
            .is_none()
    );
    assert!(
        reconciler
            .update_local_throttled_at("o1", pos(4.0, 4.0), t0 + Duration::from_millis(21))
            .is_some()
    );
}

// =============================================================
// Deletion
// =============================================================

#[test]
fn delete_emits_and_clears_throttle_state() {
    let mut reconciler = connected();
    reconciler.create_local(object("o1"));
    assert!(matches!(
        reconciler.delete_local("o1"),
        Some(ClientEvent::DeleteObject { .. })
    ));
    assert!(reconciler.is_empty());
    assert!(reconciler.delete_local("o1").is_none());
}

// =============================================================
// Inbound reconciliation
// =============================================================

#[test]
fn peer_create_and_update_merge_into_the_mirror() {
    let mut reconciler = connected();
    reconciler.apply_server_event(ServerEvent::ObjectCreated(object("o1")));
    reconciler.apply_server_event(ServerEvent::ObjectUpdated {
        object_id: "o1".to_owned(),
        position: pos(50.0, 60.0),
    });

    let mirrored = reconciler.get("o1").expect("o1");
    assert_eq!(mirrored.x, 50.0);
    assert_eq!(mirrored.y, 60.0);
}

#[test]
fn peer_update_for_unknown_object_is_dropped() {
    let mut reconciler = connected();
    reconciler.apply_server_event(ServerEvent::ObjectUpdated {
        object_id: "ghost".to_owned(),
        position: pos(1.0, 1.0),
    });
    assert!(reconciler.is_empty());
}

#[test]
fn room_state_replaces_the_mirror_wholesale() {
    let mut reconciler = connected();
    reconciler.create_local(object("local"));
    reconciler.apply_server_event(ServerEvent::RoomState(vec![object("a"), object("b")]));

    assert_eq!(reconciler.len(), 2);
    assert!(reconciler.get("local").is_none());
}

#[test]
fn peer_delete_removes_the_object() {
    let mut reconciler = connected();
    reconciler.create_local(object("o1"));
    reconciler.apply_server_event(ServerEvent::ObjectDeleted { object_id: "o1".to_owned() });
    assert!(reconciler.is_empty());
}

#[test]
fn cursors_track_peers_and_clear_on_part() {
    let mut reconciler = connected();
    reconciler.apply_server_event(ServerEvent::CursorMoved {
        client_id: "c1".to_owned(),
        x: 3.0,
        y: 4.0,
    });
    assert_eq!(reconciler.cursors().get("c1"), Some(&pos(3.0, 4.0)));

    reconciler.apply_server_event(ServerEvent::PeerLeft { client_id: "c1".to_owned() });
    assert!(reconciler.cursors().is_empty());
}

#[test]
fn objects_are_listed_in_id_order() {
    let mut reconciler = connected();
    reconciler.create_local(object("b"));
    reconciler.create_local(object("a"));
    reconciler.create_local(object("c"));

    let objects = reconciler.objects();
    let ids: Vec<&str> = objects.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}
