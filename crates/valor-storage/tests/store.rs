use std::sync::Arc;
use std::thread;

use valor_core::models::message::{Message, MessageContent, Role};
use valor_storage::error::StorageError;
use valor_storage::snapshot::SessionSnapshot;
use valor_storage::store::{MemorySessionStore, SessionStore};

const SYSTEM: &str = "You are Valor.";

fn store(capacity: usize) -> MemorySessionStore {
    MemorySessionStore::new(SYSTEM, capacity).unwrap()
}

#[test]
fn get_creates_session_seeded_with_system_message() {
    let store = store(4);
    assert!(store.is_empty());

    let session = store.get("alice");
    assert_eq!(session.user_id, "alice");
    assert_eq!(session.len(), 1);
    assert_eq!(session.messages[0].role, Role::System);
    assert_eq!(session.messages[0].content.as_text(), SYSTEM);
    assert_eq!(store.len(), 1);
}

#[test]
fn appends_preserve_order() {
    let store = store(4);
    store
        .append_user_message("alice", MessageContent::from("ping"))
        .unwrap();
    store
        .append_assistant_message("alice", MessageContent::from("pong"))
        .unwrap();

    let session = store.get("alice");
    let roles: Vec<Role> = session.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    assert_eq!(session.messages[1].content.as_text(), "ping");
    assert_eq!(session.messages[2].content.as_text(), "pong");
    assert!(session.messages[1].created_at.is_some());
}

#[test]
fn append_exchange_adds_exactly_two_messages() {
    let store = store(4);
    let before = store.get("alice").len();
    store
        .append_exchange("alice", Message::user("hi"), Message::assistant("hello"))
        .unwrap();
    assert_eq!(store.get("alice").len(), before + 2);
}

#[test]
fn empty_user_id_is_rejected_for_writes() {
    let store = store(4);
    let err = store
        .append_user_message("", MessageContent::from("x"))
        .unwrap_err();
    assert!(matches!(err, StorageError::EmptyUserId));
    assert!(matches!(store.clear(""), Err(StorageError::EmptyUserId)));

    // Reads never fail, but do not store anything either.
    assert_eq!(store.get("").len(), 1);
    assert!(store.is_empty());
}

#[test]
fn clear_then_get_leaves_only_the_system_message() {
    let store = store(4);
    store
        .append_exchange("alice", Message::user("a"), Message::assistant("b"))
        .unwrap();
    store.clear("alice").unwrap();

    let session = store.get("alice");
    assert_eq!(session.len(), 1);
    assert_eq!(session.messages[0].role, Role::System);
}

#[test]
fn clear_of_unknown_user_is_harmless() {
    let store = store(4);
    store.clear("nobody").unwrap();
    assert_eq!(store.get("nobody").len(), 1);
}

#[test]
fn zero_capacity_is_rejected() {
    assert!(matches!(
        MemorySessionStore::new(SYSTEM, 0),
        Err(StorageError::ZeroCapacity)
    ));
}

#[test]
fn least_recently_used_session_is_evicted() {
    let store = store(2);
    store
        .append_user_message("a", MessageContent::from("1"))
        .unwrap();
    store
        .append_user_message("b", MessageContent::from("2"))
        .unwrap();
    // Touch "a" so "b" becomes the oldest.
    store.get("a");
    store
        .append_user_message("c", MessageContent::from("3"))
        .unwrap();

    assert_eq!(store.len(), 2);
    let users: Vec<String> = store
        .snapshot()
        .sessions
        .into_iter()
        .map(|s| s.user_id)
        .collect();
    assert_eq!(users, vec!["a".to_string(), "c".to_string()]);

    // "b" comes back fresh.
    assert_eq!(store.get("b").len(), 1);
}

#[test]
fn snapshot_orders_sessions_least_recent_first() {
    let store = store(8);
    store.get("x");
    store.get("y");
    store.get("x");

    let users: Vec<String> = store
        .snapshot()
        .sessions
        .into_iter()
        .map(|s| s.user_id)
        .collect();
    assert_eq!(users, vec!["y".to_string(), "x".to_string()]);
}

#[test]
fn restore_replaces_contents_and_respects_capacity() {
    let source = store(8);
    for user in ["u1", "u2", "u3"] {
        source
            .append_user_message(user, MessageContent::from(user))
            .unwrap();
    }
    let snapshot = source.snapshot();

    let target = store(2);
    target.get("stale");
    target.restore(snapshot);

    assert_eq!(target.len(), 2);
    let users: Vec<String> = target
        .snapshot()
        .sessions
        .into_iter()
        .map(|s| s.user_id)
        .collect();
    assert_eq!(users, vec!["u2".to_string(), "u3".to_string()]);
    assert_eq!(target.get("u3").messages[1].content.as_text(), "u3");
}

#[test]
fn restore_of_empty_snapshot_clears_the_store() {
    let store = store(4);
    store.get("alice");
    store.restore(SessionSnapshot::default());
    assert!(store.is_empty());
}

#[test]
fn concurrent_writers_for_distinct_users_stay_isolated() {
    let store = Arc::new(store(64));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let user = format!("user-{i}");
                for turn in 0..25 {
                    store
                        .append_exchange(
                            &user,
                            Message::user(format!("{user} q{turn}")),
                            Message::assistant(format!("{user} a{turn}")),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..8 {
        let user = format!("user-{i}");
        let session = store.get(&user);
        assert_eq!(session.len(), 1 + 50);
        for message in session.messages.iter().skip(1) {
            assert!(message.content.as_text().starts_with(&user));
        }
        for pair in session.messages[1..].chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }
}
