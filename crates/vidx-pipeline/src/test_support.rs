//! In-memory collaborators for stage tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use vidx_indexer::{IndexerResult, UploadRequest, UploadedVideo, VideoIndexer};
use vidx_models::{ArtifactType, BlobPath};
use vidx_storage::{BlobStore, ObjectInfo, StorageError, StorageResult};
use vidx_table::{EntityQuery, RowStore, TableEntity, TableError, TableResult};

use crate::config::PipelineConfig;
use crate::pipeline::Pipeline;

mock! {
    pub Indexer {}

    #[async_trait]
    impl VideoIndexer for Indexer {
        async fn upload_video(&self, request: &UploadRequest) -> IndexerResult<UploadedVideo>;
        async fn get_artifact(
            &self,
            video_id: &str,
            artifact: ArtifactType,
        ) -> IndexerResult<Value>;
        async fn get_index(&self, video_id: &str) -> IndexerResult<Value>;
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn put_bytes(&self, path: &str, data: Vec<u8>) {
        self.blobs.lock().unwrap().insert(path.to_string(), data);
    }

    pub fn put_json(&self, path: &str, value: Value) {
        self.put_bytes(path, serde_json::to_vec(&value).unwrap());
    }

    pub fn json(&self, path: &str) -> Option<Value> {
        let blobs = self.blobs.lock().unwrap();
        blobs.get(path).map(|data| serde_json::from_slice(data).unwrap())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_blob(
        &self,
        path: &BlobPath,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.put_bytes(&path.to_string(), data);
        Ok(())
    }

    async fn get_blob(&self, path: &BlobPath) -> StorageResult<Vec<u8>> {
        let key = path.to_string();
        self.blobs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn list_blobs(&self, container: &str, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs
            .iter()
            .filter_map(|(key, data)| {
                let path = BlobPath::parse(key).ok()?;
                (path.container == container && path.name.starts_with(prefix)).then(|| ObjectInfo {
                    path,
                    size: data.len() as u64,
                    last_modified: None,
                })
            })
            .collect())
    }

    async fn check_connectivity(&self, _container: &str) -> StorageResult<()> {
        Ok(())
    }
}

/// Row store keyed by (table, row key) with merge-on-upsert.
#[derive(Default)]
pub struct MemoryRowStore {
    rows: Mutex<BTreeMap<(String, String), TableEntity>>,
    tables: Mutex<Vec<String>>,
    fail_rows_containing: Mutex<Option<String>>,
}

impl MemoryRowStore {
    pub fn put(&self, table: &str, entity: TableEntity) {
        let key = (table.to_string(), entity.row_key.clone());
        self.rows.lock().unwrap().insert(key, entity);
    }

    pub fn row(&self, table: &str, row_key: &str) -> Option<TableEntity> {
        let key = (table.to_string(), row_key.to_string());
        self.rows.lock().unwrap().get(&key).cloned()
    }

    /// Every `ensure_table` call, in order.
    pub fn tables_created(&self) -> Vec<String> {
        self.tables.lock().unwrap().clone()
    }

    pub fn fail_upserts_containing(&self, needle: &str) {
        *self.fail_rows_containing.lock().unwrap() = Some(needle.to_string());
    }
}

fn column<'a>(entity: &'a TableEntity, name: &str) -> Option<&'a str> {
    match name {
        "PartitionKey" => Some(&entity.partition_key),
        "RowKey" => Some(&entity.row_key),
        _ => entity.get_str(name),
    }
}

/// Understands `A eq 'x' and B eq 'y'` filters only.
fn matches_filter(entity: &TableEntity, filter: &str) -> bool {
    filter.split(" and ").all(|clause| {
        let Some((name, literal)) = clause.split_once(" eq ") else {
            return false;
        };
        let value = literal.trim_matches('\'').replace("''", "'");
        column(entity, name) == Some(value.as_str())
    })
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn ensure_table(&self, table: &str) -> TableResult<bool> {
        self.tables.lock().unwrap().push(table.to_string());
        Ok(true)
    }

    async fn upsert(&self, table: &str, entity: TableEntity) -> TableResult<()> {
        if let Some(needle) = self.fail_rows_containing.lock().unwrap().as_deref() {
            if entity.row_key.contains(needle) {
                return Err(TableError::ServerError(500, "injected failure".into()));
            }
        }

        let key = (table.to_string(), entity.row_key.clone());
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&key) {
            Some(existing) => existing.properties.extend(entity.properties),
            None => {
                rows.insert(key, entity);
            }
        }
        Ok(())
    }

    async fn query(&self, table: &str, query: &EntityQuery) -> TableResult<Vec<TableEntity>> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<_> = rows
            .iter()
            .filter(|((t, _), entity)| {
                t == table && query.filter.as_deref().map_or(true, |f| matches_filter(entity, f))
            })
            .map(|(_, entity)| entity.clone())
            .collect();
        if let Some(top) = query.top {
            found.truncate(top as usize);
        }
        Ok(found)
    }

    async fn check_connectivity(&self) -> TableResult<()> {
        Ok(())
    }
}

pub struct Harness {
    pub indexer: MockIndexer,
    pub blobs: Arc<MemoryBlobStore>,
    pub rows: Arc<MemoryRowStore>,
    pub config: PipelineConfig,
}

impl Harness {
    /// Build a pipeline around the stores and the indexer mock configured so
    /// far. The harness keeps the stores for inspection.
    pub fn build(&mut self) -> Pipeline {
        let indexer = std::mem::replace(&mut self.indexer, MockIndexer::new());
        Pipeline::new(
            self.config.clone(),
            self.blobs.clone(),
            self.rows.clone(),
            Arc::new(indexer),
        )
    }
}

pub fn harness() -> Harness {
    Harness {
        indexer: MockIndexer::new(),
        blobs: Arc::new(MemoryBlobStore::default()),
        rows: Arc::new(MemoryRowStore::default()),
        config: PipelineConfig::default(),
    }
}

pub fn uploaded(id: &str) -> UploadedVideo {
    UploadedVideo {
        id: id.to_string(),
        name: "keynote".to_string(),
        state: Some("Uploaded".to_string()),
    }
}

/// A tracking row as PutVideo writes it.
pub fn tracked_row(id: &str, name: &str, path: &str) -> TableEntity {
    TableEntity::new("examplekey", id)
        .with("VideoIndexerId", id)
        .with("VideoName", name)
        .with("VideoPath", path)
        .with("VideoUrl", format!("https://blob.test/{}", path))
        .with("State", "Uploaded")
}
