//! Arrow schema and record batch conversion for LanceDB memory tables.
//!
//! The Arrow schema is derived from the backend-neutral [`CollectionSchema`];
//! the similarity index spec travels in the schema metadata. Rows are
//! encoded and decoded by column *name*, never by position.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use uuid::Uuid;

use recollect_types::collection::{
    BackendHit, CollectionSchema, DistanceMetric, FIELD_EMBEDDING, FIELD_ID, FIELD_MEMORY_TYPE,
    FIELD_OWNER_ID, FIELD_TEXT, FIELD_TIMESTAMP, FieldKind, IndexSpec, NewRow, StoredFields,
};
use recollect_types::error::BackendError;
use recollect_types::memory::RecordId;

/// Column LanceDB appends to vector search results.
pub const DISTANCE_COLUMN: &str = "_distance";

pub const METADATA_INDEX_FIELD: &str = "recollect.index.field";
pub const METADATA_INDEX_METRIC: &str = "recollect.index.metric";
pub const METADATA_DIMENSION: &str = "recollect.dimension";

fn vector_item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, true))
}

fn list_size(dimension: usize) -> Result<i32, BackendError> {
    i32::try_from(dimension)
        .map_err(|_| BackendError::Rejected(format!("dimension {dimension} is too large")))
}

/// Arrow schema for a memory table, with the index spec in its metadata.
pub fn arrow_schema(schema: &CollectionSchema, index: &IndexSpec) -> Result<Schema, BackendError> {
    let mut fields = Vec::with_capacity(schema.fields.len());
    for spec in &schema.fields {
        let data_type = match spec.kind {
            FieldKind::RecordId | FieldKind::Text { .. } => DataType::Utf8,
            FieldKind::Int64 => DataType::Int64,
            FieldKind::Vector { dimension } => {
                DataType::FixedSizeList(vector_item_field(), list_size(dimension)?)
            }
        };
        fields.push(Field::new(spec.name, data_type, false));
    }

    let metadata = HashMap::from([
        (METADATA_INDEX_FIELD.to_string(), index.field.to_string()),
        (METADATA_INDEX_METRIC.to_string(), index.metric.to_string()),
        (METADATA_DIMENSION.to_string(), schema.dimension.to_string()),
    ]);

    Ok(Schema::new(fields).with_metadata(metadata))
}

/// The metric recorded when the table was created, if any.
pub fn stored_metric(schema: &Schema) -> Option<DistanceMetric> {
    schema
        .metadata()
        .get(METADATA_INDEX_METRIC)
        .and_then(|m| m.parse().ok())
}

/// Embedding width of an existing table, read from its vector column.
pub fn embedding_dimension(schema: &Schema) -> Result<usize, BackendError> {
    let field = schema.field_with_name(FIELD_EMBEDDING).map_err(|_| {
        BackendError::Malformed(format!("table has no '{FIELD_EMBEDDING}' column"))
    })?;
    match field.data_type() {
        DataType::FixedSizeList(_, size) => usize::try_from(*size).map_err(|_| {
            BackendError::Malformed(format!("invalid embedding width {size}"))
        }),
        other => Err(BackendError::Malformed(format!(
            "'{FIELD_EMBEDDING}' column has type {other:?}, expected a fixed-size list"
        ))),
    }
}

/// Encode rows (with their pre-assigned ids) as one record batch.
///
/// Columns are emitted in `schema` order. Every embedding must have
/// `dimension` entries.
pub fn rows_to_batch(
    schema: SchemaRef,
    dimension: usize,
    ids: &[RecordId],
    rows: &[NewRow],
) -> Result<RecordBatch, BackendError> {
    if ids.len() != rows.len() {
        return Err(BackendError::Rejected(format!(
            "{} ids for {} rows",
            ids.len(),
            rows.len()
        )));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let column: ArrayRef = match field.name().as_str() {
            FIELD_ID => Arc::new(StringArray::from_iter_values(
                ids.iter().map(|id| id.to_string()),
            )),
            FIELD_TEXT => Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.text.as_str()),
            )),
            FIELD_OWNER_ID => Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.owner_id.as_str()),
            )),
            FIELD_MEMORY_TYPE => Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.memory_type.as_str()),
            )),
            FIELD_TIMESTAMP => Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.timestamp),
            )),
            FIELD_EMBEDDING => Arc::new(embedding_column(dimension, rows)?),
            other => {
                return Err(BackendError::Rejected(format!(
                    "table has unexpected column '{other}'"
                )));
            }
        };
        columns.push(column);
    }

    RecordBatch::try_new(schema, columns)
        .map_err(|e| BackendError::Rejected(format!("Failed to build record batch: {e}")))
}

fn embedding_column(dimension: usize, rows: &[NewRow]) -> Result<FixedSizeListArray, BackendError> {
    let mut values = Vec::with_capacity(rows.len() * dimension);
    for (i, row) in rows.iter().enumerate() {
        if row.embedding.len() != dimension {
            return Err(BackendError::Rejected(format!(
                "row {i} has a {}-dimensional embedding, table expects {dimension}",
                row.embedding.len()
            )));
        }
        values.extend_from_slice(&row.embedding);
    }

    FixedSizeListArray::try_new(
        vector_item_field(),
        list_size(dimension)?,
        Arc::new(Float32Array::from(values)),
        None,
    )
    .map_err(|e| BackendError::Rejected(format!("Failed to build embedding column: {e}")))
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T, BackendError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| BackendError::Malformed(format!("result is missing column '{name}'")))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| BackendError::Malformed(format!("column '{name}' has an unexpected type")))
}

fn non_null(array: &dyn Array, name: &str, row: usize) -> Result<(), BackendError> {
    if array.is_null(row) {
        return Err(BackendError::Malformed(format!(
            "column '{name}' is null at row {row}"
        )));
    }
    Ok(())
}

/// Decode one vector search result batch into hits, preserving row order.
pub fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<BackendHit>, BackendError> {
    let num_rows = batch.num_rows();
    if num_rows == 0 {
        return Ok(Vec::new());
    }

    let ids = column::<StringArray>(batch, FIELD_ID)?;
    let texts = column::<StringArray>(batch, FIELD_TEXT)?;
    let owners = column::<StringArray>(batch, FIELD_OWNER_ID)?;
    let timestamps = column::<Int64Array>(batch, FIELD_TIMESTAMP)?;
    let types = column::<StringArray>(batch, FIELD_MEMORY_TYPE)?;
    let distances = column::<Float32Array>(batch, DISTANCE_COLUMN)?;

    let mut hits = Vec::with_capacity(num_rows);
    for i in 0..num_rows {
        non_null(ids, FIELD_ID, i)?;
        non_null(texts, FIELD_TEXT, i)?;
        non_null(owners, FIELD_OWNER_ID, i)?;
        non_null(timestamps, FIELD_TIMESTAMP, i)?;
        non_null(types, FIELD_MEMORY_TYPE, i)?;
        non_null(distances, DISTANCE_COLUMN, i)?;

        let id = Uuid::parse_str(ids.value(i))
            .map_err(|e| BackendError::Malformed(format!("invalid record id at row {i}: {e}")))?;

        hits.push(BackendHit {
            id: RecordId(id),
            distance: distances.value(i),
            fields: StoredFields {
                text: texts.value(i).to_string(),
                owner_id: owners.value(i).to_string(),
                timestamp: timestamps.value(i),
                memory_type: types.value(i).to_string(),
            },
        });
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_schema(dimension: usize) -> SchemaRef {
        Arc::new(
            arrow_schema(
                &CollectionSchema::memory(dimension),
                &IndexSpec::on_embedding(DistanceMetric::Cosine),
            )
            .unwrap(),
        )
    }

    fn row(text: &str, embedding: Vec<f32>) -> NewRow {
        NewRow {
            text: text.to_string(),
            embedding,
            owner_id: "u1".to_string(),
            timestamp: 1_700_000_000,
            memory_type: "thought".to_string(),
        }
    }

    #[test]
    fn test_arrow_schema_has_memory_fields() {
        let schema = memory_schema(384);
        assert_eq!(schema.fields().len(), 6);
        for name in [FIELD_ID, FIELD_TEXT, FIELD_OWNER_ID, FIELD_TIMESTAMP, FIELD_MEMORY_TYPE] {
            assert!(schema.field_with_name(name).is_ok(), "missing {name}");
        }

        let vector_field = schema.field_with_name(FIELD_EMBEDDING).unwrap();
        match vector_field.data_type() {
            DataType::FixedSizeList(_, size) => assert_eq!(*size, 384),
            other => panic!("Expected FixedSizeList, got {:?}", other),
        }
    }

    #[test]
    fn test_arrow_schema_records_index_in_metadata() {
        let schema = memory_schema(8);
        assert_eq!(stored_metric(&schema), Some(DistanceMetric::Cosine));
        assert_eq!(
            schema.metadata().get(METADATA_INDEX_FIELD).map(String::as_str),
            Some(FIELD_EMBEDDING)
        );
        assert_eq!(
            schema.metadata().get(METADATA_DIMENSION).map(String::as_str),
            Some("8")
        );
        assert_eq!(embedding_dimension(&schema).unwrap(), 8);
    }

    #[test]
    fn test_rows_to_batch_follows_schema_order() {
        let schema = memory_schema(2);
        let ids = vec![RecordId::generate(), RecordId::generate()];
        let rows = vec![row("a", vec![1.0, 0.0]), row("b", vec![0.0, 1.0])];

        let batch = rows_to_batch(schema.clone(), 2, &ids, &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().fields(), schema.fields());

        let texts = column::<StringArray>(&batch, FIELD_TEXT).unwrap();
        assert_eq!(texts.value(1), "b");
        let stored_ids = column::<StringArray>(&batch, FIELD_ID).unwrap();
        assert_eq!(stored_ids.value(0), ids[0].to_string());
    }

    #[test]
    fn test_rows_to_batch_rejects_wrong_dimension() {
        let schema = memory_schema(3);
        let ids = vec![RecordId::generate()];
        let err = rows_to_batch(schema, 3, &ids, &[row("a", vec![1.0])]).unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }

    #[test]
    fn test_batch_to_hits_requires_distance_column() {
        let schema = memory_schema(2);
        let ids = vec![RecordId::generate()];
        let batch = rows_to_batch(schema, 2, &ids, &[row("a", vec![1.0, 0.0])]).unwrap();

        let err = batch_to_hits(&batch).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(ref m) if m.contains(DISTANCE_COLUMN)));
    }

    #[test]
    fn test_batch_to_hits_decodes_by_name() {
        let id = RecordId::generate();
        let schema = Arc::new(Schema::new(vec![
            Field::new(DISTANCE_COLUMN, DataType::Float32, false),
            Field::new(FIELD_MEMORY_TYPE, DataType::Utf8, false),
            Field::new(FIELD_TIMESTAMP, DataType::Int64, false),
            Field::new(FIELD_OWNER_ID, DataType::Utf8, false),
            Field::new(FIELD_TEXT, DataType::Utf8, false),
            Field::new(FIELD_ID, DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float32Array::from(vec![0.25])),
                Arc::new(StringArray::from(vec!["goal"])),
                Arc::new(Int64Array::from(vec![42])),
                Arc::new(StringArray::from(vec!["u1"])),
                Arc::new(StringArray::from(vec!["save money"])),
                Arc::new(StringArray::from(vec![id.to_string()])),
            ],
        )
        .unwrap();

        let hits = batch_to_hits(&batch).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(hits[0].distance, 0.25);
        assert_eq!(hits[0].fields.text, "save money");
        assert_eq!(hits[0].fields.timestamp, 42);
        assert_eq!(hits[0].fields.memory_type, "goal");
    }

    #[test]
    fn test_batch_to_hits_rejects_bad_id() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(DISTANCE_COLUMN, DataType::Float32, false),
            Field::new(FIELD_MEMORY_TYPE, DataType::Utf8, false),
            Field::new(FIELD_TIMESTAMP, DataType::Int64, false),
            Field::new(FIELD_OWNER_ID, DataType::Utf8, false),
            Field::new(FIELD_TEXT, DataType::Utf8, false),
            Field::new(FIELD_ID, DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float32Array::from(vec![0.0])),
                Arc::new(StringArray::from(vec!["thought"])),
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(StringArray::from(vec!["u1"])),
                Arc::new(StringArray::from(vec!["x"])),
                Arc::new(StringArray::from(vec!["not-a-uuid"])),
            ],
        )
        .unwrap();

        assert!(matches!(
            batch_to_hits(&batch),
            Err(BackendError::Malformed(_))
        ));
    }
}
