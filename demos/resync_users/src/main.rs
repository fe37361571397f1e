use std::sync::Arc;

use usermirror::core::SyncError;
use usermirror::mongodb::{MongoConfig, MongoUserStore};
use usermirror::qdrant::{QdrantConfig, QdrantIndex};
use usermirror::sync::{ResyncDriver, SyncConfig, UserIndex};

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    tracing_subscriber::fmt::init();

    let sync_config = SyncConfig::from_env()?;
    let index = Arc::new(QdrantIndex::new(QdrantConfig::from_env()?)?);
    let store = MongoUserStore::connect(MongoConfig::from_env()?).await?;
    store.ping().await?;

    let users = Arc::new(UserIndex::from_config(index, &sync_config));
    let driver = ResyncDriver::new(Arc::new(store), users)
        .with_concurrency(sync_config.concurrency);

    let report = driver.resync_all().await?;
    println!("Found {} user(s) in MongoDB\n", report.summary.total);

    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("✅ {} ({})", outcome.email, outcome.user_id),
            Some(error) => println!("❌ {} ({}): {error}", outcome.email, outcome.user_id),
        }
    }

    println!(
        "\n{}/{} users synced to '{}'",
        report.summary.succeeded, report.summary.total, sync_config.collection
    );
    Ok(())
}
