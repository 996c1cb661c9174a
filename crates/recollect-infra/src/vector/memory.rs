//! In-process vector backend.
//!
//! Keeps every collection in memory behind a `DashMap`. Inserted rows land
//! in a pending buffer and only become searchable after `flush`, the same
//! visibility barrier a server-side store imposes. Search is exact: every
//! visible row is scored and the results are stably sorted, so ties keep
//! insertion order.
//!
//! Used by tests and by embedded setups that do not need persistence.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;

use recollect_core::memory::backend::VectorBackend;
use recollect_types::collection::{
    BackendHit, CollectionSchema, DistanceMetric, IndexSpec, MAX_MEMORY_TYPE_LEN, NewRow,
    SearchParams, StoredFields,
};
use recollect_types::error::BackendError;
use recollect_types::memory::{MAX_TEXT_LEN, MemoryRecord, OwnerId, RecordId};

struct Collection {
    dimension: usize,
    index: IndexSpec,
    visible: Vec<MemoryRecord>,
    pending: Vec<MemoryRecord>,
}

/// Distance between two equal-length vectors under `metric`.
///
/// `L2` is squared Euclidean. `Cosine` treats a zero vector as orthogonal
/// to everything.
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
        DistanceMetric::Dot => 1.0 - dot(a, b),
        DistanceMetric::Cosine => {
            let norms = dot(a, a).sqrt() * dot(b, b).sqrt();
            if norms == 0.0 {
                1.0
            } else {
                1.0 - dot(a, b) / norms
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Memory-resident [`VectorBackend`].
pub struct InMemoryVectorBackend {
    collections: DashMap<String, Arc<RwLock<Collection>>>,
    max_text_len: usize,
}

impl Default for InMemoryVectorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVectorBackend {
    pub fn new() -> Self {
        Self::with_max_text_len(MAX_TEXT_LEN)
    }

    /// Backend rejecting texts longer than `max_text_len` bytes.
    pub fn with_max_text_len(max_text_len: usize) -> Self {
        Self {
            collections: DashMap::new(),
            max_text_len,
        }
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Rows inserted but not yet flushed.
    pub async fn pending_len(&self, name: &str) -> Result<usize, BackendError> {
        Ok(self.collection(name)?.read().await.pending.len())
    }

    fn collection(&self, name: &str) -> Result<Arc<RwLock<Collection>>, BackendError> {
        self.collections
            .get(name)
            .map(|c| Arc::clone(c.value()))
            .ok_or_else(|| BackendError::NotFound(name.to_string()))
    }

    fn to_record(&self, dimension: usize, row: NewRow) -> Result<MemoryRecord, BackendError> {
        if row.text.len() > self.max_text_len {
            return Err(BackendError::Rejected(format!(
                "text of {} bytes exceeds max_length {}",
                row.text.len(),
                self.max_text_len
            )));
        }
        if row.memory_type.len() > MAX_MEMORY_TYPE_LEN {
            return Err(BackendError::Rejected(format!(
                "memory_type exceeds max_length {MAX_MEMORY_TYPE_LEN}"
            )));
        }
        if row.embedding.len() != dimension {
            return Err(BackendError::Rejected(format!(
                "embedding has {} entries, collection expects {dimension}",
                row.embedding.len()
            )));
        }
        let owner_id =
            OwnerId::new(row.owner_id).map_err(|e| BackendError::Rejected(e.to_string()))?;

        Ok(MemoryRecord {
            id: RecordId::generate(),
            text: row.text,
            embedding: row.embedding,
            owner_id,
            timestamp: row.timestamp,
            memory_type: row.memory_type,
        })
    }
}

impl VectorBackend for InMemoryVectorBackend {
    async fn exists(&self, name: &str) -> Result<bool, BackendError> {
        Ok(self.collections.contains_key(name))
    }

    async fn create(
        &self,
        name: &str,
        schema: &CollectionSchema,
        index: &IndexSpec,
    ) -> Result<(), BackendError> {
        if schema.dimension == 0 {
            return Err(BackendError::Rejected(
                "collection dimension must be positive".to_string(),
            ));
        }
        match self.collections.entry(name.to_string()) {
            Entry::Occupied(_) => Err(BackendError::AlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(Collection {
                    dimension: schema.dimension,
                    index: index.clone(),
                    visible: Vec::new(),
                    pending: Vec::new(),
                })));
                Ok(())
            }
        }
    }

    async fn insert(&self, name: &str, rows: Vec<NewRow>) -> Result<Vec<RecordId>, BackendError> {
        let collection = self.collection(name)?;
        let mut collection = collection.write().await;

        // All-or-nothing: convert every row before buffering any.
        let records = rows
            .into_iter()
            .map(|row| self.to_record(collection.dimension, row))
            .collect::<Result<Vec<_>, _>>()?;

        let ids = records.iter().map(|r| r.id).collect();
        collection.pending.extend(records);
        Ok(ids)
    }

    async fn flush(&self, name: &str) -> Result<(), BackendError> {
        let collection = self.collection(name)?;
        let mut collection = collection.write().await;
        let mut pending = std::mem::take(&mut collection.pending);
        collection.visible.append(&mut pending);
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        query: &[f32],
        metric: DistanceMetric,
        _params: &SearchParams,
        top_k: usize,
    ) -> Result<Vec<BackendHit>, BackendError> {
        let collection = self.collection(name)?;
        let collection = collection.read().await;
        if query.len() != collection.dimension {
            return Err(BackendError::Rejected(format!(
                "query has {} entries, collection expects {}",
                query.len(),
                collection.dimension
            )));
        }
        if metric != collection.index.metric {
            return Err(BackendError::Rejected(format!(
                "collection '{name}' is indexed for {} distance, search requested {metric}",
                collection.index.metric
            )));
        }

        let mut scored: Vec<(f32, &MemoryRecord)> = collection
            .visible
            .iter()
            .map(|record| (distance(metric, query, &record.embedding), record))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(distance, record)| BackendHit {
                id: record.id,
                distance,
                fields: StoredFields {
                    text: record.text.clone(),
                    owner_id: record.owner_id.to_string(),
                    timestamp: record.timestamp,
                    memory_type: record.memory_type.clone(),
                },
            })
            .collect())
    }

    async fn count(&self, name: &str) -> Result<u64, BackendError> {
        let collection = self.collection(name)?;
        let visible = collection.read().await.visible.len();
        Ok(visible as u64)
    }
}
