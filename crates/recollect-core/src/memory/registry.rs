//! Collection registry: owner id -> verified backend collection.
//!
//! Guarantees that an owner's collection exists with the memory schema
//! before any insert touches it. Creation is a lock-free check-then-create
//! against the backend; losing a creation race ("already exists") counts as
//! success. A local cache remembers owners already verified so the
//! existence check is paid at most once per owner per process.

use dashmap::DashSet;

use recollect_types::collection::{CollectionHandle, CollectionSchema, IndexSpec};
use recollect_types::error::{BackendError, MemoryError};
use recollect_types::memory::OwnerId;

use super::backend::VectorBackend;

const COLLECTION_PREFIX: &str = "memory_";

/// Deterministic, collision-free collection name for an owner.
///
/// ASCII alphanumerics pass through; every other byte (including `_`) is
/// written as `_` followed by two lowercase hex digits.
pub fn collection_name(owner: &OwnerId) -> String {
    let raw = owner.as_str();
    let mut name = String::with_capacity(COLLECTION_PREFIX.len() + raw.len());
    name.push_str(COLLECTION_PREFIX);
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() {
            name.push(byte as char);
        } else {
            name.push_str(&format!("_{byte:02x}"));
        }
    }
    name
}

/// Maps owners to collections that are known to exist.
pub struct CollectionRegistry {
    schema: CollectionSchema,
    index: IndexSpec,
    verified: DashSet<String>,
}

impl CollectionRegistry {
    pub fn new(schema: CollectionSchema, index: IndexSpec) -> Self {
        Self {
            schema,
            index,
            verified: DashSet::new(),
        }
    }

    fn handle(&self, name: String) -> CollectionHandle {
        CollectionHandle {
            name,
            dimension: self.schema.dimension,
        }
    }

    /// Make sure the owner's collection exists, creating it if absent.
    ///
    /// Safe to call concurrently for the same or different owners.
    /// Backend unavailability is returned as-is, never retried.
    pub async fn ensure<B: VectorBackend>(
        &self,
        backend: &B,
        owner: &OwnerId,
    ) -> Result<CollectionHandle, MemoryError> {
        let name = collection_name(owner);
        if self.verified.contains(&name) {
            return Ok(self.handle(name));
        }

        let exists = backend
            .exists(&name)
            .await
            .map_err(MemoryError::from_collection)?;

        if !exists {
            match backend.create(&name, &self.schema, &self.index).await {
                Ok(()) => {
                    tracing::info!(
                        collection = %name,
                        dimension = self.schema.dimension,
                        metric = %self.index.metric,
                        "Created memory collection"
                    );
                }
                Err(BackendError::AlreadyExists(_)) => {
                    tracing::warn!(collection = %name, "Collection created concurrently; using it");
                }
                Err(e) => return Err(MemoryError::from_collection(e)),
            }
        }

        self.verified.insert(name.clone());
        Ok(self.handle(name))
    }

    /// Find the owner's collection without creating it.
    ///
    /// `Ok(None)` means the owner has no memories yet.
    pub async fn lookup<B: VectorBackend>(
        &self,
        backend: &B,
        owner: &OwnerId,
    ) -> Result<Option<CollectionHandle>, MemoryError> {
        let name = collection_name(owner);
        if self.verified.contains(&name) {
            return Ok(Some(self.handle(name)));
        }

        let exists = backend
            .exists(&name)
            .await
            .map_err(MemoryError::from_search)?;
        if !exists {
            return Ok(None);
        }

        self.verified.insert(name.clone());
        Ok(Some(self.handle(name)))
    }

    #[cfg(test)]
    fn is_verified(&self, owner: &OwnerId) -> bool {
        self.verified.contains(&collection_name(owner))
    }
}
