use std::sync::Arc;

use usermirror::core::{SyncError, VectorIndex};
use usermirror::qdrant::{QdrantConfig, QdrantIndex};
use usermirror::sync::demo::{add_demo_points, init_index, DEMO_COLLECTION};
use usermirror::sync::{CollectionBootstrapper, SyncConfig, UserIndex};

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    tracing_subscriber::fmt::init();

    let config = QdrantConfig::from_env()?;
    println!("Connecting to Qdrant at {}", config.url);
    let index = Arc::new(QdrantIndex::new(config)?);
    index.ping().await?;

    let users = UserIndex::from_config(index.clone(), &SyncConfig::from_env()?);
    let bootstrapper = CollectionBootstrapper::new(index.clone());
    init_index(&bootstrapper, users.spec()).await?;

    // Pass --extra-points to also add Paris, Tokyo and New York.
    if std::env::args().any(|arg| arg == "--extra-points") {
        let written = add_demo_points(&bootstrapper).await?;
        println!("Added {written} point(s) to '{DEMO_COLLECTION}'");
    }

    println!("\nCollections:");
    for name in index.list_collections().await? {
        println!("  - {name}");
    }
    Ok(())
}
