//! Tests for the key/value persistence facade.

use std::sync::Arc;

use prospector::domain::Profile;
use prospector::store::{self, KvStore, MemoryKvStore, SqliteKvStore};

fn sample_profile() -> Profile {
    Profile {
        name: "Ana".to_owned(),
        contact_email: "ana@x.com".to_owned(),
        website_url: "https://x.com".to_owned(),
    }
}

#[tokio::test]
async fn sqlite_round_trips_typed_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.db");
    let kv = SqliteKvStore::open(&path).await.expect("open");

    store::save(&kv, "profile", &sample_profile()).await;
    let loaded: Profile = store::load(&kv, "profile", Profile::default()).await;
    assert_eq!(loaded, sample_profile());
}

#[tokio::test]
async fn sqlite_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.db");

    {
        let kv = SqliteKvStore::open(&path).await.expect("open");
        store::save(&kv, "profile", &sample_profile()).await;
    }

    let kv = SqliteKvStore::open(&path).await.expect("reopen");
    let loaded: Profile = store::load(&kv, "profile", Profile::default()).await;
    assert_eq!(loaded.name, "Ana");
}

#[tokio::test]
async fn load_returns_default_when_key_missing() {
    let kv = MemoryKvStore::new();
    let loaded: Vec<String> = store::load(&kv, "services", vec!["fallback".to_owned()]).await;
    assert_eq!(loaded, vec!["fallback".to_owned()]);
}

#[tokio::test]
async fn load_returns_default_on_corrupt_document() {
    let kv = MemoryKvStore::new();
    kv.save_raw("profile", "{definitely not json")
        .await
        .expect("raw save");

    let loaded: Profile = store::load(&kv, "profile", Profile::default()).await;
    assert_eq!(loaded, Profile::default());
}

#[tokio::test]
async fn last_write_wins_per_key() {
    let kv = MemoryKvStore::new();
    store::save(&kv, "k", &"first".to_owned()).await;
    store::save(&kv, "k", &"second".to_owned()).await;

    let loaded: String = store::load(&kv, "k", String::new()).await;
    assert_eq!(loaded, "second");
}

#[tokio::test]
async fn failing_writes_are_swallowed() {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::failing());

    // Must not panic or error; durability is best-effort.
    store::save(kv.as_ref(), "profile", &sample_profile()).await;

    let loaded: Profile = store::load(kv.as_ref(), "profile", Profile::default()).await;
    assert_eq!(loaded, Profile::default());
}
