use std::sync::Arc;

use usermirror::core::UserRecord;
use usermirror::store::InMemoryUserStore;
use usermirror::sync::{ResyncDriver, SyncConfig, UserIndex};
use usermirror::vectorstores::InMemoryIndex;

#[tokio::test]
async fn default_features_cover_a_local_resync() {
    let index = Arc::new(InMemoryIndex::new());
    let users = Arc::new(UserIndex::from_config(index.clone(), &SyncConfig::default()));
    let source = Arc::new(InMemoryUserStore::from_users(vec![
        UserRecord::new("u1", "a@x.com").with_full_name("Alice"),
        UserRecord::new("u2", "b@x.com"),
    ]));

    let report = ResyncDriver::new(source, users).resync_all().await.unwrap();

    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(index.len("users_collection").await, Some(2));
}

#[test]
fn point_ids_are_reexported() {
    assert_eq!(usermirror::embeddings::point_id("u1"), 0xe477_4cdd);
}
