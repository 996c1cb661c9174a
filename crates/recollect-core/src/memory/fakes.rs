//! In-test doubles for the backend and embedder ports.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use recollect_types::collection::{
    BackendHit, CollectionSchema, DistanceMetric, IndexSpec, NewRow, SearchParams, StoredFields,
};
use recollect_types::error::{BackendError, EmbeddingError};
use recollect_types::memory::RecordId;

use super::backend::VectorBackend;
use super::embedder::Embedder;

#[derive(Default)]
struct FakeCollection {
    visible: Vec<(RecordId, NewRow)>,
    pending: Vec<(RecordId, NewRow)>,
}

/// Spy backend: counts every call and can inject failures.
#[derive(Default)]
pub struct FakeBackend {
    collections: Mutex<HashMap<String, FakeCollection>>,
    pub exists_calls: AtomicUsize,
    pub creates: AtomicUsize,
    pub inserts: AtomicUsize,
    pub flushes: AtomicUsize,
    pub searches: AtomicUsize,
    pub unavailable: AtomicBool,
    pub race_on_create: AtomicBool,
    pub reject_inserts: AtomicBool,
    pub reject_searches: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_collection(&self, name: &str) {
        self.collections
            .lock()
            .unwrap()
            .insert(name.to_string(), FakeCollection::default());
    }

    pub fn collection_count(&self) -> usize {
        self.collections.lock().unwrap().len()
    }

    pub fn total_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
            + self.creates.load(Ordering::SeqCst)
            + self.inserts.load(Ordering::SeqCst)
            + self.flushes.load(Ordering::SeqCst)
            + self.searches.load(Ordering::SeqCst)
    }

    pub fn rows(&self, name: &str) -> Vec<(RecordId, NewRow)> {
        self.collections
            .lock()
            .unwrap()
            .get(name)
            .map(|c| c.visible.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl VectorBackend for FakeBackend {
    async fn exists(&self, name: &str) -> Result<bool, BackendError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.collections.lock().unwrap().contains_key(name))
    }

    async fn create(
        &self,
        name: &str,
        _schema: &CollectionSchema,
        _index: &IndexSpec,
    ) -> Result<(), BackendError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut collections = self.collections.lock().unwrap();
        if collections.contains_key(name) {
            return Err(BackendError::AlreadyExists(name.to_string()));
        }
        collections.insert(name.to_string(), FakeCollection::default());
        if self.race_on_create.load(Ordering::SeqCst) {
            return Err(BackendError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    async fn insert(&self, name: &str, rows: Vec<NewRow>) -> Result<Vec<RecordId>, BackendError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("text exceeds max_length".to_string()));
        }
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = RecordId::generate();
            ids.push(id);
            collection.pending.push((id, row));
        }
        Ok(ids)
    }

    async fn flush(&self, name: &str) -> Result<(), BackendError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;
        let pending = std::mem::take(&mut collection.pending);
        collection.visible.extend(pending);
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        query: &[f32],
        _metric: DistanceMetric,
        _params: &SearchParams,
        top_k: usize,
    ) -> Result<Vec<BackendHit>, BackendError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.reject_searches.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("collection not loaded".to_string()));
        }
        let collections = self.collections.lock().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;
        let mut hits: Vec<BackendHit> = collection
            .visible
            .iter()
            .map(|(id, row)| BackendHit {
                id: *id,
                distance: row
                    .embedding
                    .iter()
                    .zip(query)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum(),
                fields: StoredFields {
                    text: row.text.clone(),
                    owner_id: row.owner_id.clone(),
                    timestamp: row.timestamp,
                    memory_type: row.memory_type.clone(),
                },
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self, name: &str) -> Result<u64, BackendError> {
        self.check_available()?;
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, |c| c.visible.len() as u64))
    }
}

/// Embeds each text as a one-hot-ish vector keyed on its length.
pub struct LengthEmbedder {
    pub dimension: usize,
    pub calls: AtomicUsize,
    /// When set, returns one vector fewer than requested.
    pub drop_one: AtomicBool,
    /// When set, returns vectors one entry short.
    pub short_vectors: AtomicBool,
    pub fail: AtomicBool,
}

impl LengthEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
            drop_one: AtomicBool::new(false),
            short_vectors: AtomicBool::new(false),
            fail: AtomicBool::new(false),
        }
    }
}

impl Embedder for LengthEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Provider("model not loaded".to_string()));
        }
        let dim = if self.short_vectors.load(Ordering::SeqCst) {
            self.dimension - 1
        } else {
            self.dimension
        };
        let mut out: Vec<Vec<f32>> = texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0; dim];
                if dim > 0 {
                    v[t.len() % dim] = 1.0;
                }
                v
            })
            .collect();
        if self.drop_one.load(Ordering::SeqCst) {
            out.pop();
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        "length"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
