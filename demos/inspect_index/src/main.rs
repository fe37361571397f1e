use std::sync::Arc;

use usermirror::core::SyncError;
use usermirror::qdrant::{QdrantConfig, QdrantIndex};
use usermirror::sync::IndexInspector;

const SAMPLE_LIMIT: usize = 3;

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    tracing_subscriber::fmt::init();

    let index = Arc::new(QdrantIndex::new(QdrantConfig::from_env()?)?);
    let reports = IndexInspector::new(index).inspect(SAMPLE_LIMIT).await?;

    println!("Found {} collection(s)", reports.len());
    for report in &reports {
        println!("\n=== {} ===", report.name);
        if let Some(error) = &report.error {
            println!("  error: {error}");
            continue;
        }
        if let Some(info) = &report.info {
            println!("  points:   {}", info.points_count);
            if let Some(dimension) = info.dimension {
                println!("  size:     {dimension}");
            }
            if let Some(distance) = info.distance {
                println!("  distance: {distance}");
            }
            println!("  status:   {}", info.status);
        }
        for sample in &report.samples {
            let mut keys: Vec<_> = sample.payload.iter().collect();
            keys.sort_by(|a, b| a.0.cmp(b.0));
            let fields: Vec<String> = keys.iter().map(|(k, v)| format!("{k}={v}")).collect();
            println!("  #{}: {}", sample.id, fields.join(", "));
        }
    }
    Ok(())
}
