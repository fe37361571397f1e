use std::collections::HashMap;

use usermirror_mongodb::MongoConfig;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn config_new_sets_defaults() {
    let config = MongoConfig::new("mongodb://localhost:27017", "app");
    assert_eq!(config.uri, "mongodb://localhost:27017");
    assert_eq!(config.database, "app");
    assert_eq!(config.collection, "users");
}

#[test]
fn config_with_collection() {
    let config = MongoConfig::new("mongodb://localhost:27017", "app").with_collection("accounts");
    assert_eq!(config.collection, "accounts");
}

#[test]
fn config_from_environment() {
    let config = MongoConfig::from_lookup(lookup(&[
        ("MONGO_DATABASE_URI", "mongodb://mongo:27017"),
        ("MONGO_DATABASE", "prod"),
        ("MONGO_USERS_COLLECTION", "people"),
    ]))
    .unwrap();
    assert_eq!(config.uri, "mongodb://mongo:27017");
    assert_eq!(config.database, "prod");
    assert_eq!(config.collection, "people");
}

#[test]
fn config_requires_uri_and_database() {
    let err = MongoConfig::from_lookup(lookup(&[("MONGO_DATABASE", "prod")])).unwrap_err();
    assert!(err.to_string().contains("MONGO_DATABASE_URI"));

    let err = MongoConfig::from_lookup(lookup(&[("MONGO_DATABASE_URI", "mongodb://m")]))
        .unwrap_err();
    assert!(err.to_string().contains("MONGO_DATABASE"));
}

// ---------------------------------------------------------------------------
// Integration tests (require a running MongoDB instance)
// Run with: MONGODB_URI=... cargo test -p usermirror-mongodb -- --ignored
// ---------------------------------------------------------------------------

#[cfg(test)]
mod integration {
    use bson::doc;
    use usermirror_core::{UserFilter, UserSource};
    use usermirror_mongodb::{MongoConfig, MongoUserStore};

    async fn setup(collection: &str) -> MongoUserStore {
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let config = MongoConfig::new(uri, "usermirror_test").with_collection(collection);
        let store = MongoUserStore::connect(config)
            .await
            .expect("failed to connect");

        let users = store
            .client()
            .database("usermirror_test")
            .collection::<bson::Document>(collection);
        users.drop().await.expect("failed to drop collection");
        users
            .insert_many(vec![
                doc! { "email": "a@x.com", "full_name": "Alice", "is_active": true },
                doc! { "email": "b@x.com", "is_superuser": true },
                doc! { "full_name": "No Email" },
            ])
            .await
            .expect("failed to seed users");
        store
    }

    #[tokio::test]
    #[ignore = "requires running MongoDB instance"]
    async fn reads_all_users_including_malformed() {
        let store = setup("users_all").await;
        store.ping().await.unwrap();

        let users = store.find_all().await.unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users.iter().filter(|u| u.identity().is_err()).count(), 1);
    }

    #[tokio::test]
    #[ignore = "requires running MongoDB instance"]
    async fn finds_one_by_email_then_by_id() {
        let store = setup("users_one").await;

        let bob = store
            .find_one(&UserFilter::Email("b@x.com".into()))
            .await
            .unwrap()
            .expect("bob exists");
        assert!(bob.is_superuser);

        let again = store
            .find_one(&UserFilter::Id(bob.id.clone()))
            .await
            .unwrap();
        assert_eq!(again, Some(bob));
    }

    #[tokio::test]
    #[ignore = "requires running MongoDB instance"]
    async fn pages_through_users() {
        let store = setup("users_paged").await;
        assert_eq!(store.find_page(0, 2).await.unwrap().len(), 2);
        assert_eq!(store.find_page(2, 2).await.unwrap().len(), 1);
        assert!(store.find_page(0, 0).await.unwrap().is_empty());
    }
}
