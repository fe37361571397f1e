use usermirror_store::{InMemoryUserStore, UserFilter, UserRecord, UserSource};

fn users(n: usize) -> Vec<UserRecord> {
    (0..n)
        .map(|i| UserRecord::new(format!("u{i}"), format!("user{i}@x.com")))
        .collect()
}

#[tokio::test]
async fn find_all_returns_insertion_order() {
    let store = InMemoryUserStore::from_users(users(3));
    let ids: Vec<String> = store
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(ids, vec!["u0", "u1", "u2"]);
}

#[tokio::test]
async fn find_one_by_id_and_email() {
    let store = InMemoryUserStore::from_users(users(3));

    let by_id = store.find_one(&UserFilter::Id("u1".into())).await.unwrap();
    assert_eq!(by_id.unwrap().email, "user1@x.com");

    let by_email = store
        .find_one(&UserFilter::Email("user2@x.com".into()))
        .await
        .unwrap();
    assert_eq!(by_email.unwrap().id, "u2");

    let none = store
        .find_one(&UserFilter::Email("ghost@x.com".into()))
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn find_page_skips_and_limits() {
    let store = InMemoryUserStore::from_users(users(5));
    let page = store.find_page(3, 10).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, "u3");

    assert!(store.find_page(10, 10).await.unwrap().is_empty());
    assert_eq!(store.find_page(0, 2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn save_replaces_by_id() {
    let store = InMemoryUserStore::new();
    store.save(UserRecord::new("u1", "old@x.com")).await;
    store.save(UserRecord::new("u1", "new@x.com")).await;

    let all = store.find_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].email, "new@x.com");
}

#[tokio::test]
async fn remove_returns_removed_user() {
    let store = InMemoryUserStore::from_users(users(2));
    assert_eq!(store.remove("u0").await.unwrap().id, "u0");
    assert!(store.remove("u0").await.is_none());
    assert_eq!(store.find_all().await.unwrap().len(), 1);
}
