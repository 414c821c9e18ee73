//! Integration tests for the vault engine and access gate.
//!
//! Each test runs against an in-memory remote store and a cache file in
//! a scratch directory.

use tempfile::TempDir;
use zeroize::Zeroizing;

use stash::cache::{CacheRecord, LocalCache};
use stash::crypto::Argon2Params;
use stash::errors::{ErrorKind, Op, StashError};
use stash::remote::{MemoryStore, RemoteStore};
use stash::vault::{authorize, Action, EngineState, VaultEngine};

fn fast() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

fn cache_in(dir: &TempDir) -> LocalCache {
    LocalCache::new(dir.path().join("cache.json"))
}

fn engine(dir: &TempDir, store: &MemoryStore, passphrase: &str) -> VaultEngine {
    VaultEngine::new(
        cache_in(dir),
        Box::new(store.clone()),
        Zeroizing::new(passphrase.to_string()),
        fast(),
    )
}

fn get_all(engine: &VaultEngine, pattern: &str) -> Vec<String> {
    engine.get(pattern).expect("lookup").collect()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_scenario() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("vault1", r#"{"a":"1"}"#);

    let mut first = engine(&dir, &store, "pw123");
    first.create("vault1").unwrap();
    assert_eq!(first.state(), EngineState::Unlocked);

    let mut second = engine(&dir, &store, "pw123");
    authorize(Action::Add, "pw123", &second).unwrap();
    second.pull().unwrap();
    assert_eq!(get_all(&second, "a"), vec!["1"]);
    second.add_or_update("b", "2");
    second.push().unwrap();

    let mut third = engine(&dir, &store, "pw123");
    third.pull().unwrap();
    assert_eq!(get_all(&third, "b"), vec!["2"]);
    assert_eq!(get_all(&third, "a"), vec!["1"]);

    let intruder = engine(&dir, &store, "wrong");
    for action in [Action::Get, Action::Add, Action::Delete, Action::Publish] {
        let err = authorize(action, "wrong", &intruder).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }
}

#[test]
fn create_stores_non_string_values_as_json_text() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"port":5432,"tls":true,"s":"x"}"#);

    let mut engine = engine(&dir, &store, "pw");
    engine.create("v").unwrap();

    assert_eq!(engine.secrets().get("port"), Some(&b"5432"[..]));
    assert_eq!(engine.secrets().get("tls"), Some(&b"true"[..]));
    assert_eq!(engine.secrets().get("s"), Some(&b"x"[..]));
}

#[test]
fn create_rejects_non_object_document() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", "[1,2,3]");

    let mut engine = engine(&dir, &store, "pw");
    let err = engine.create("v").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(err.op(), Some(Op::Create));
    assert!(err.to_string().starts_with("[Create failed]"));
    assert!(!engine.cache().exists(), "nothing may be persisted on failure");
}

#[test]
fn create_with_missing_remote_document_fails() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine(&dir, &MemoryStore::new(), "pw");
    let err = engine.create("nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!engine.cache().exists());
}

#[test]
fn create_replaces_previous_vault_and_hash() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new()
        .with_object("old", r#"{"x":"1"}"#)
        .with_object("new", r#"{"y":"2"}"#);

    engine(&dir, &store, "first").create("old").unwrap();
    engine(&dir, &store, "second").create("new").unwrap();

    let check = engine(&dir, &store, "second");
    authorize(Action::Get, "second", &check).unwrap();
    assert!(authorize(Action::Get, "first", &check).is_err());

    let record = cache_in(&dir).load().unwrap();
    assert_eq!(record.name, "new");
}

// ---------------------------------------------------------------------------
// Pull / push
// ---------------------------------------------------------------------------

#[test]
fn push_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"k1":"v1","k2":"v2"}"#);
    engine(&dir, &store, "pw").create("v").unwrap();

    let mut engine = engine(&dir, &store, "pw");
    engine.pull().unwrap();
    let before = engine.secrets().clone();
    let first_blob = cache_in(&dir).load().unwrap().data;

    engine.push().unwrap();
    engine.pull().unwrap();

    assert_eq!(engine.secrets(), &before);
    // Fresh salt and nonces on every push.
    assert_ne!(cache_in(&dir).load().unwrap().data, first_blob);
}

#[test]
fn push_keeps_name_and_hash() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"k":"v"}"#);
    engine(&dir, &store, "pw").create("v").unwrap();
    let before = cache_in(&dir).load().unwrap();

    let mut engine = engine(&dir, &store, "pw");
    engine.pull().unwrap();
    engine.add_or_update("k2", "v2");
    engine.push().unwrap();

    let after = cache_in(&dir).load().unwrap();
    assert_eq!(after.name, before.name);
    assert_eq!(after.hash, before.hash);
    assert_ne!(after.data, before.data);
}

#[test]
fn push_on_locked_engine_writes_current_map() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"k":"v"}"#);
    engine(&dir, &store, "pw").create("v").unwrap();

    let mut locked = engine(&dir, &store, "pw");
    assert_eq!(locked.state(), EngineState::Locked);
    locked.push().unwrap();

    let mut reader = engine(&dir, &store, "pw");
    reader.pull().unwrap();
    assert!(reader.secrets().is_empty());
}

#[test]
fn failed_pull_keeps_previous_state() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"k":"v"}"#);

    let mut engine = engine(&dir, &store, "pw");
    engine.create("v").unwrap();

    // Corrupt the wallet on disk.
    let cache = cache_in(&dir);
    let mut record = cache.load().unwrap();
    let last = record.data.len() - 1;
    record.data[last] ^= 0x01;
    cache.store(&record).unwrap();

    let err = engine.pull().unwrap_err();
    assert_eq!(err.op(), Some(Op::Pull));
    assert_eq!(err.kind(), ErrorKind::Crypto);
    assert_eq!(engine.state(), EngineState::Unlocked);
    assert_eq!(engine.secrets().get("k"), Some(&b"v"[..]));
}

#[test]
fn pull_with_wrong_passphrase_stays_locked() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"k":"v"}"#);
    engine(&dir, &store, "pw").create("v").unwrap();

    let mut wrong = engine(&dir, &store, "other");
    assert!(wrong.pull().is_err());
    assert_eq!(wrong.state(), EngineState::Locked);
    assert!(wrong.secrets().is_empty());
}

#[test]
fn pull_without_cache_fails() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine(&dir, &MemoryStore::new(), "pw");
    let err = engine.pull().unwrap_err();
    match err {
        StashError::Operation { op, source } => {
            assert_eq!(op, Op::Pull);
            assert!(matches!(*source, StashError::CacheMissing(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[test]
fn pattern_lookup() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"alpha":1,"albeit":2,"beta":3}"#);
    let mut engine = engine(&dir, &store, "pw");
    engine.create("v").unwrap();

    let mut matches = get_all(&engine, "al.*");
    matches.sort();
    assert_eq!(matches, vec![r#"{"albeit":2}"#, r#"{"alpha":1}"#]);

    let err = engine.get("zzz").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = engine.get("(").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Pattern);
}

#[test]
fn exact_match_wins_over_pattern() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"a.b":"exact","axb":"other"}"#);
    let mut engine = engine(&dir, &store, "pw");
    engine.create("v").unwrap();

    assert!(engine.get("a.b").unwrap().is_exact());
    assert_eq!(get_all(&engine, "a.b"), vec!["exact"]);
    assert!(!engine.get("a.*").unwrap().is_exact());
}

#[test]
fn pattern_matches_lowercased_keys() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", r#"{"DB_URL":"postgres://db"}"#);
    let mut engine = engine(&dir, &store, "pw");
    engine.create("v").unwrap();

    assert_eq!(
        get_all(&engine, "db_.*"),
        vec![r#"{"DB_URL":"postgres://db"}"#]
    );
}

#[test]
fn add_update_delete() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", "{}");
    let mut engine = engine(&dir, &store, "pw");
    engine.create("v").unwrap();

    assert!(engine.add_or_update("k", "1"));
    assert!(!engine.add_or_update("k", "2"));
    assert_eq!(get_all(&engine, "k"), vec!["2"]);

    assert!(engine.delete("k"));
    assert!(!engine.delete("k"), "deleting an absent key is a no-op");
    assert!(engine.secrets().is_empty());
}

#[test]
fn get_on_locked_engine_finds_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, &MemoryStore::new(), "pw");
    assert_eq!(engine.get("anything").unwrap_err().kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Fetch / publish
// ---------------------------------------------------------------------------

#[test]
fn publish_then_fetch_elsewhere() {
    let alice_dir = TempDir::new().unwrap();
    let bob_dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("source", r#"{"token":"t0k3n"}"#);

    let mut alice = engine(&alice_dir, &store, "shared-pw");
    alice.create("source").unwrap();
    alice.publish("team").unwrap();

    assert!(store.contains("team"));
    assert_eq!(cache_in(&alice_dir).load().unwrap().name, "team");

    let published = CacheRecord::from_json(&store.read("team").unwrap()).unwrap();
    assert_eq!(published.name, "team");

    let mut bob = engine(&bob_dir, &store, "shared-pw");
    authorize(Action::Fetch, "shared-pw", &bob).unwrap();
    bob.fetch("team").unwrap();
    assert_eq!(bob.state(), EngineState::Locked);

    authorize(Action::Get, "shared-pw", &bob).unwrap();
    bob.pull().unwrap();
    assert_eq!(get_all(&bob, "token"), vec!["t0k3n"]);
}

#[test]
fn publish_without_cache_fails() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let mut engine = engine(&dir, &store, "pw");

    let err = engine.publish("v").unwrap_err();
    assert_eq!(err.op(), Some(Op::Publish));
    assert!(!store.contains("v"));
}

#[test]
fn fetch_rejects_malformed_record() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("v", "not json");
    let mut engine = engine(&dir, &store, "pw");

    let err = engine.fetch("v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(err.op(), Some(Op::Fetch));
    assert!(!engine.cache().exists());
}

// ---------------------------------------------------------------------------
// Access gate
// ---------------------------------------------------------------------------

#[test]
fn gate_requires_non_empty_passphrase_everywhere() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, &MemoryStore::new(), "");
    for action in [Action::Create, Action::Fetch, Action::Get] {
        assert!(matches!(
            authorize(action, "", &engine),
            Err(StashError::EmptyPassphrase)
        ));
    }
}

#[test]
fn gate_rejects_fetched_record_with_forged_hash_cost() {
    let alice_dir = TempDir::new().unwrap();
    let bob_dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_object("source", r#"{"k":"v"}"#);

    let mut alice = engine(&alice_dir, &store, "pw");
    alice.create("source").unwrap();
    alice.publish("team").unwrap();

    // Swap the cost in the published hash for an absurd memory cost.
    let mut record = CacheRecord::from_json(&store.read("team").unwrap()).unwrap();
    let hash = String::from_utf8(record.hash.clone()).unwrap();
    let fields: Vec<&str> = hash.split('$').collect();
    record.hash = format!(
        "${}${}$m=4294967295,t=1,p=1${}${}",
        fields[1], fields[2], fields[4], fields[5]
    )
    .into_bytes();
    store.write("team", &record.to_json().unwrap()).unwrap();

    let mut bob = engine(&bob_dir, &store, "pw");
    bob.fetch("team").unwrap();
    assert!(matches!(
        authorize(Action::Get, "pw", &bob),
        Err(StashError::AuthFailed)
    ));
}

#[test]
fn gate_without_cache() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, &MemoryStore::new(), "pw");

    assert!(authorize(Action::Create, "pw", &engine).is_ok());
    assert!(authorize(Action::Fetch, "pw", &engine).is_ok());

    let err = authorize(Action::Get, "pw", &engine).unwrap_err();
    assert!(matches!(err, StashError::NoLocalVault));
    assert_eq!(err.kind(), ErrorKind::Auth);
}
