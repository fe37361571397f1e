use std::sync::Arc;

use usermirror_core::{CollectionInfo, IndexEntry, SyncError, VectorIndex};

/// What one collection looked like when it was inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub name: String,
    pub info: Option<CollectionInfo>,
    /// Up to the requested number of entries; empty for empty collections.
    pub samples: Vec<IndexEntry>,
    /// Set when describing or sampling this collection failed.
    pub error: Option<String>,
}

impl CollectionReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Read-only overview of an index.
pub struct IndexInspector {
    index: Arc<dyn VectorIndex>,
}

impl IndexInspector {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    /// Report on every collection, with up to `sample_limit` payloads each.
    ///
    /// Only listing the collections can fail the call; a collection that
    /// cannot be described gets a report carrying the error.
    pub async fn inspect(&self, sample_limit: usize) -> Result<Vec<CollectionReport>, SyncError> {
        let names = self.index.list_collections().await?;
        tracing::debug!("inspecting {} collection(s)", names.len());

        let mut reports = Vec::with_capacity(names.len());
        for name in names {
            reports.push(self.report(name, sample_limit).await);
        }
        Ok(reports)
    }

    async fn report(&self, name: String, sample_limit: usize) -> CollectionReport {
        match self.describe(&name, sample_limit, false).await {
            Ok((info, samples)) => CollectionReport {
                name,
                info: Some(info),
                samples,
                error: None,
            },
            Err(e) => {
                tracing::warn!("failed to inspect collection '{name}': {e}");
                CollectionReport {
                    name,
                    info: None,
                    samples: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Describe one collection and sample up to `sample_limit` of its entries.
    pub async fn describe(
        &self,
        name: &str,
        sample_limit: usize,
        with_vectors: bool,
    ) -> Result<(CollectionInfo, Vec<IndexEntry>), SyncError> {
        let info = self.index.describe_collection(name).await?;
        let samples = if info.points_count > 0 && sample_limit > 0 {
            self.index
                .scroll(name, None, sample_limit, with_vectors)
                .await?
        } else {
            Vec::new()
        };
        Ok((info, samples))
    }
}
