//! LanceDB vector backend: one table per owner collection.
//!
//! Wraps a `lancedb::Connection` (local directory or LanceDB Cloud `db://`
//! URI) and implements [`VectorBackend`] over it. Local connections read
//! with strong consistency, so a cached table handle still observes rows
//! committed by other connections to the same directory. Creation of a
//! given table is serialized within one process; different tables are
//! created independently.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arrow_array::{RecordBatch, RecordBatchIterator};
use dashmap::DashMap;
use futures_util::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use recollect_core::memory::backend::VectorBackend;
use recollect_types::collection::{
    BackendHit, CollectionSchema, DistanceMetric, FIELD_EMBEDDING, IndexSpec, NewRow, SearchParams,
};
use recollect_types::error::BackendError;
use recollect_types::memory::RecordId;

use super::schema::{
    arrow_schema, batch_to_hits, embedding_dimension, rows_to_batch, stored_metric,
};

const REMOTE_SCHEME: &str = "db://";

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct LanceConnectOptions {
    /// Local directory, object store URI, or `db://` database.
    pub uri: String,
    /// Required for `db://` URIs.
    pub api_key: Option<SecretString>,
    pub region: Option<String>,
}

impl LanceConnectOptions {
    pub fn local(path: &Path) -> Result<Self, BackendError> {
        let uri = path.to_str().ok_or_else(|| {
            BackendError::Rejected(format!("Path contains invalid UTF-8: {}", path.display()))
        })?;
        Ok(Self {
            uri: uri.to_string(),
            api_key: None,
            region: None,
        })
    }

    pub fn is_remote(&self) -> bool {
        self.uri.starts_with(REMOTE_SCHEME)
    }
}

/// Map a LanceDB error onto the backend error taxonomy.
fn lance_error(err: lancedb::Error) -> BackendError {
    match err {
        lancedb::Error::TableNotFound { name, .. } => BackendError::NotFound(name),
        lancedb::Error::TableAlreadyExists { name, .. } => BackendError::AlreadyExists(name),
        lancedb::Error::CreateDir { .. }
        | lancedb::Error::Http { .. }
        | lancedb::Error::Retry { .. } => BackendError::Unavailable(err.to_string()),
        other => BackendError::Rejected(other.to_string()),
    }
}

fn distance_type(metric: DistanceMetric) -> DistanceType {
    match metric {
        DistanceMetric::L2 => DistanceType::L2,
        DistanceMetric::Cosine => DistanceType::Cosine,
        DistanceMetric::Dot => DistanceType::Dot,
    }
}

/// LanceDB-backed [`VectorBackend`].
pub struct LanceVectorBackend {
    db: lancedb::Connection,
    uri: String,
    remote: bool,
    tables: DashMap<String, lancedb::Table>,
    create_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LanceVectorBackend {
    /// Connect to the database described by `options`.
    ///
    /// Local directories are created if missing. Connection failures are
    /// [`BackendError::Unavailable`].
    pub async fn connect(options: LanceConnectOptions) -> Result<Self, BackendError> {
        let remote = options.is_remote();
        let LanceConnectOptions {
            uri,
            api_key,
            region,
        } = options;

        let mut builder = lancedb::connect(&uri);
        if remote {
            let api_key = api_key.ok_or_else(|| {
                BackendError::Unavailable(format!("{uri} requires an API key, none was provided"))
            })?;
            builder = builder.api_key(api_key.expose_secret());
            if let Some(region) = &region {
                builder = builder.region(region);
            }
        } else {
            if !uri.contains("://") {
                std::fs::create_dir_all(&uri).map_err(|e| {
                    BackendError::Unavailable(format!(
                        "Failed to create vector store at {uri}: {e}"
                    ))
                })?;
            }
            // Check for newer table versions on every read.
            builder = builder.read_consistency_interval(Duration::ZERO);
        }

        let db = builder.execute().await.map_err(|e| {
            BackendError::Unavailable(format!("Failed to connect to {uri}: {e}"))
        })?;

        tracing::debug!(uri = %uri, remote, "Connected to LanceDB");

        Ok(Self {
            db,
            uri,
            remote,
            tables: DashMap::new(),
            create_locks: DashMap::new(),
        })
    }

    /// Open or create an embedded store in a local directory.
    pub async fn open_local(path: &Path) -> Result<Self, BackendError> {
        Self::connect(LanceConnectOptions::local(path)?).await
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// List all table names in the database.
    pub async fn table_names(&self) -> Result<Vec<String>, BackendError> {
        self.db.table_names().execute().await.map_err(lance_error)
    }

    async fn try_open(&self, name: &str) -> Result<Option<lancedb::Table>, BackendError> {
        let cached = self.tables.get(name).map(|t| t.clone());
        if let Some(table) = cached {
            return Ok(Some(table));
        }

        match self.db.open_table(name).execute().await {
            Ok(table) => {
                self.tables.insert(name.to_string(), table.clone());
                Ok(Some(table))
            }
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(lance_error(e)),
        }
    }

    async fn table(&self, name: &str) -> Result<lancedb::Table, BackendError> {
        self.try_open(name)
            .await?
            .ok_or_else(|| BackendError::NotFound(name.to_string()))
    }
}

impl VectorBackend for LanceVectorBackend {
    async fn exists(&self, name: &str) -> Result<bool, BackendError> {
        Ok(self.try_open(name).await?.is_some())
    }

    async fn create(
        &self,
        name: &str,
        schema: &CollectionSchema,
        index: &IndexSpec,
    ) -> Result<(), BackendError> {
        let arrow = Arc::new(arrow_schema(schema, index)?);

        let lock = Arc::clone(self.create_locks.entry(name.to_string()).or_default().value());
        let _guard = lock.lock().await;
        if self.try_open(name).await?.is_some() {
            return Err(BackendError::AlreadyExists(name.to_string()));
        }

        match self.db.create_empty_table(name, arrow).execute().await {
            Ok(table) => {
                self.tables.insert(name.to_string(), table);
                Ok(())
            }
            Err(e) => {
                let err = lance_error(e);
                // Another process may have committed the table first.
                if !matches!(err, BackendError::AlreadyExists(_))
                    && self.try_open(name).await?.is_some()
                {
                    return Err(BackendError::AlreadyExists(name.to_string()));
                }
                Err(err)
            }
        }
    }

    async fn insert(&self, name: &str, rows: Vec<NewRow>) -> Result<Vec<RecordId>, BackendError> {
        let table = self.table(name).await?;
        let schema = table.schema().await.map_err(lance_error)?;
        let dimension = embedding_dimension(&schema)?;

        let ids: Vec<RecordId> = rows.iter().map(|_| RecordId::generate()).collect();
        let batch = rows_to_batch(schema.clone(), dimension, &ids, &rows)?;
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        table.add(reader).execute().await.map_err(lance_error)?;

        Ok(ids)
    }

    async fn flush(&self, name: &str) -> Result<(), BackendError> {
        if self.remote {
            return Ok(());
        }
        let table = self.table(name).await?;
        table.checkout_latest().await.map_err(lance_error)
    }

    async fn search(
        &self,
        name: &str,
        query: &[f32],
        metric: DistanceMetric,
        params: &SearchParams,
        top_k: usize,
    ) -> Result<Vec<BackendHit>, BackendError> {
        let table = self.table(name).await?;
        let schema = table.schema().await.map_err(lance_error)?;
        if let Some(indexed) = stored_metric(&schema) {
            if indexed != metric {
                return Err(BackendError::Rejected(format!(
                    "collection '{name}' is indexed for {indexed} distance, search requested {metric}"
                )));
            }
        }

        let results = table
            .vector_search(query)
            .map_err(lance_error)?
            .column(FIELD_EMBEDDING)
            .distance_type(distance_type(metric))
            .nprobes(params.nprobes)
            .limit(top_k)
            .execute()
            .await
            .map_err(lance_error)?;

        let batches: Vec<RecordBatch> = results.try_collect().await.map_err(lance_error)?;

        let mut hits = Vec::with_capacity(top_k);
        for batch in &batches {
            hits.extend(batch_to_hits(batch)?);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);

        Ok(hits)
    }

    async fn count(&self, name: &str) -> Result<u64, BackendError> {
        let table = self.table(name).await?;
        let rows = table.count_rows(None).await.map_err(lance_error)?;
        Ok(rows as u64)
    }
}
