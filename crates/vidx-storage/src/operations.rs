//! High-level storage operations.

use serde::de::DeserializeOwned;
use serde::Serialize;
use vidx_models::BlobPath;

use crate::error::StorageResult;
use crate::store::BlobStore;

/// Content type for every JSON document the pipeline stores.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialize `value` and store it at `path`.
pub async fn put_json<T>(store: &dyn BlobStore, path: &BlobPath, value: &T) -> StorageResult<()>
where
    T: Serialize + ?Sized,
{
    let data = serde_json::to_vec(value)?;
    store.put_blob(path, data, JSON_CONTENT_TYPE).await
}

/// Fetch the object at `path` and deserialize it.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    path: &BlobPath,
) -> StorageResult<T> {
    let data = store.get_blob(path).await?;
    Ok(serde_json::from_slice(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::store::ObjectInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<BlobPath, (Vec<u8>, String)>>,
    }

    #[async_trait]
    impl BlobStore for MemoryStore {
        async fn put_blob(
            &self,
            path: &BlobPath,
            data: Vec<u8>,
            content_type: &str,
        ) -> StorageResult<()> {
            self.objects
                .lock()
                .unwrap()
                .insert(path.clone(), (data, content_type.to_string()));
            Ok(())
        }

        async fn get_blob(&self, path: &BlobPath) -> StorageResult<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(path)
                .map(|(data, _)| data.clone())
                .ok_or_else(|| StorageError::not_found(path.to_string()))
        }

        async fn list_blobs(
            &self,
            _container: &str,
            _prefix: &str,
        ) -> StorageResult<Vec<ObjectInfo>> {
            Ok(Vec::new())
        }

        async fn check_connectivity(&self, _container: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::default();
        let path = BlobPath::new("content", "clip_Ocr.json");

        put_json(&store, &path, &serde_json::json!({ "results": [1, 2] }))
            .await
            .unwrap();

        let stored = store.objects.lock().unwrap().get(&path).cloned().unwrap();
        assert_eq!(stored.1, JSON_CONTENT_TYPE);

        let value: serde_json::Value = get_json(&store, &path).await.unwrap();
        assert_eq!(value["results"][1], 2);
    }

    #[tokio::test]
    async fn test_get_json_missing_object() {
        let store = MemoryStore::default();
        let result: StorageResult<serde_json::Value> =
            get_json(&store, &BlobPath::new("content", "missing.json")).await;
        assert!(result.unwrap_err().is_not_found());
    }
}
