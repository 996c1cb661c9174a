//! MemoryStore -- the public insert/search surface.
//!
//! Owns the embedder, the backend handle and the collection registry.
//! Holds no per-call session state: every record lives in the backend, and
//! the only local state is the registry's verified-owner cache and the
//! batch clock.

use recollect_types::collection::{CollectionSchema, IndexSpec, NewRow};
use recollect_types::config::StoreConfig;
use recollect_types::error::MemoryError;
use recollect_types::memory::{DEFAULT_MEMORY_TYPE, MemoryHit, OwnerId};

use super::backend::VectorBackend;
use super::clock::BatchClock;
use super::embedder::{Embedder, validate_embeddings};
use super::registry::CollectionRegistry;

/// Semantic memory store over an embedder `E` and a vector backend `B`.
///
/// Construct once, share behind an `Arc`, drop to release the backend
/// connection and the embedding model.
pub struct MemoryStore<E, B> {
    config: StoreConfig,
    embedder: E,
    backend: B,
    registry: CollectionRegistry,
    clock: BatchClock,
}

impl<E: Embedder, B: VectorBackend> MemoryStore<E, B> {
    /// Build a store. Fails if the embedder's dimension disagrees with config.
    pub fn new(config: StoreConfig, embedder: E, backend: B) -> Result<Self, MemoryError> {
        if config.dimension == 0 {
            return Err(MemoryError::Validation(
                "store dimension must be positive".to_string(),
            ));
        }
        if config.default_top_k == 0 {
            return Err(MemoryError::Validation(
                "default_top_k must be positive".to_string(),
            ));
        }
        if embedder.dimension() != config.dimension {
            return Err(MemoryError::Validation(format!(
                "embedder '{}' produces {}-dimensional vectors, store is configured for {}",
                embedder.model_name(),
                embedder.dimension(),
                config.dimension
            )));
        }

        let registry = CollectionRegistry::new(
            CollectionSchema::memory(config.dimension),
            IndexSpec::on_embedding(config.metric),
        );

        Ok(Self {
            config,
            embedder,
            backend,
            registry,
            clock: BatchClock::new(),
        })
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Embed and persist `texts` for `owner_id`, visible to searches on return.
    ///
    /// All records of one call share a timestamp. Identical texts are stored
    /// as distinct records. Returns the number of records inserted.
    #[tracing::instrument(
        name = "insert_memories",
        skip(self, texts),
        fields(owner = %owner_id, count = texts.len())
    )]
    pub async fn insert_memories(
        &self,
        texts: &[String],
        owner_id: &str,
        memory_type: Option<&str>,
    ) -> Result<usize, MemoryError> {
        let owner = OwnerId::new(owner_id)?;
        if texts.is_empty() {
            return Err(MemoryError::Validation(
                "texts must contain at least one entry".to_string(),
            ));
        }
        let memory_type = memory_type.unwrap_or(DEFAULT_MEMORY_TYPE);
        if memory_type.trim().is_empty() {
            return Err(MemoryError::Validation(
                "memory_type must not be empty".to_string(),
            ));
        }

        let collection = self.registry.ensure(&self.backend, &owner).await?;

        let embeddings = self.embedder.embed(texts).await?;
        validate_embeddings(&embeddings, texts.len(), collection.dimension)?;

        let timestamp = self.clock.stamp();
        let rows: Vec<NewRow> = texts
            .iter()
            .zip(embeddings)
            .map(|(text, embedding)| NewRow {
                text: text.clone(),
                embedding,
                owner_id: owner.to_string(),
                timestamp,
                memory_type: memory_type.to_string(),
            })
            .collect();

        let ids = self
            .backend
            .insert(&collection.name, rows)
            .await
            .map_err(MemoryError::from_insert)?;
        if ids.len() != texts.len() {
            return Err(MemoryError::Insert(format!(
                "backend acknowledged {} of {} rows",
                ids.len(),
                texts.len()
            )));
        }

        self.backend
            .flush(&collection.name)
            .await
            .map_err(MemoryError::from_insert)?;

        tracing::debug!(
            collection = %collection.name,
            timestamp,
            memory_type,
            "Inserted memories"
        );
        Ok(ids.len())
    }

    /// The `top_k` memories of `owner_id` closest to `query`, nearest first.
    ///
    /// `None` uses the configured default. An owner with no collection yet
    /// gets an empty result; backend failures are errors, never empty results.
    #[tracing::instrument(
        name = "search_memory",
        skip(self, query),
        fields(owner = %owner_id, top_k = ?top_k)
    )]
    pub async fn search_memory(
        &self,
        query: &str,
        owner_id: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        let owner = OwnerId::new(owner_id)?;
        if query.trim().is_empty() {
            return Err(MemoryError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        if top_k == 0 {
            return Err(MemoryError::Validation(
                "top_k must be positive".to_string(),
            ));
        }

        let Some(collection) = self.registry.lookup(&self.backend, &owner).await? else {
            tracing::debug!("No collection for owner yet; returning no memories");
            return Ok(Vec::new());
        };

        let query_batch = [query.to_string()];
        let mut embeddings = self.embedder.embed(&query_batch).await?;
        validate_embeddings(&embeddings, 1, collection.dimension)?;
        let query_vector = embeddings.swap_remove(0);

        let hits = self
            .backend
            .search(
                &collection.name,
                &query_vector,
                self.config.metric,
                &self.config.search_params(),
                top_k,
            )
            .await
            .map_err(MemoryError::from_search)?;
        if hits.len() > top_k {
            return Err(MemoryError::Search(format!(
                "backend returned {} hits for top_k {top_k}",
                hits.len()
            )));
        }

        tracing::debug!(collection = %collection.name, hits = hits.len(), "Searched memories");

        Ok(hits
            .into_iter()
            .map(|hit| MemoryHit {
                record_id: hit.id,
                distance: hit.distance,
                text: hit.fields.text,
                owner_id: hit.fields.owner_id,
                timestamp: hit.fields.timestamp,
                memory_type: hit.fields.memory_type,
            })
            .collect())
    }

    /// Number of memories stored for `owner_id`; zero if it has none.
    #[tracing::instrument(name = "count_memories", skip(self), fields(owner = %owner_id))]
    pub async fn count_memories(&self, owner_id: &str) -> Result<u64, MemoryError> {
        let owner = OwnerId::new(owner_id)?;
        let Some(collection) = self.registry.lookup(&self.backend, &owner).await? else {
            return Ok(0);
        };
        self.backend
            .count(&collection.name)
            .await
            .map_err(MemoryError::from_search)
    }
}
