//! Document store implementations.
//!
//! [`FileDocumentStore`] keeps one JSON file per collection under a data
//! directory, each holding an id-to-document map. Writes go through a temp
//! file and rename so a crash never leaves a half-written collection.
//! [`MemoryDocumentStore`] backs tests and ephemeral runs.

use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use super::traits::DocumentStore;

pub struct FileDocumentStore {
    base_directory: PathBuf,
    // serializes read-modify-write cycles on the collection files
    lock: Mutex<()>,
}

impl FileDocumentStore {
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_directory = base_directory.as_ref().to_path_buf();
        fs::create_dir_all(&base_directory).with_context(|| {
            format!(
                "failed to create document store directory {}",
                base_directory.display()
            )
        })?;
        Ok(Self {
            base_directory,
            lock: Mutex::new(()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_directory.join(format!("{collection}.json"))
    }

    fn read_collection(&self, collection: &str) -> Result<BTreeMap<String, Value>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read collection file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("collection file {} is not valid JSON", path.display()))
    }

    fn write_collection(&self, collection: &str, docs: &BTreeMap<String, Value>) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp_path = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(docs)?;
        fs::write(&tmp_path, contents)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl DocumentStore for FileDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_collection(collection)?.remove(id))
    }

    fn set(&self, collection: &str, id: &str, doc: &Value) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut docs = self.read_collection(collection)?;
        docs.insert(id.to_string(), doc.clone());
        self.write_collection(collection, &docs)?;
        debug!("stored document {}/{}", collection, id);
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut docs = self.read_collection(collection)?;
        let doc = docs
            .get_mut(id)
            .with_context(|| format!("no document {collection}/{id} to update"))?;
        merge_fields(doc, patch);
        self.write_collection(collection, &docs)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut docs = self.read_collection(collection)?;
        if docs.remove(id).is_some() {
            self.write_collection(collection, &docs)?;
            debug!("deleted document {}/{}", collection, id);
        }
        Ok(())
    }

    fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Value>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self
            .read_collection(collection)?
            .into_values()
            .filter(|doc| doc.get(field) == Some(value))
            .collect())
    }
}

fn merge_fields(doc: &mut Value, patch: &Value) {
    match (doc, patch) {
        (Value::Object(doc), Value::Object(patch)) => {
            for (key, value) in patch {
                doc.insert(key.clone(), value.clone());
            }
        }
        (doc, patch) => *doc = patch.clone(),
    }
}

/// In-memory document store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
}

#[cfg(test)]
impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn set(&self, collection: &str, id: &str, doc: &Value) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .with_context(|| format!("no document {collection}/{id} to update"))?;
        merge_fields(doc, patch);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Value>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_roundtrip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileDocumentStore::new(dir.path()).expect("Failed to init store");

        let doc = json!({"description": "Mercado", "amount": 120.0, "userId": "u1"});
        store.set("expenses", "expense::1", &doc).unwrap();

        assert_eq!(store.get("expenses", "expense::1").unwrap(), Some(doc));
        assert_eq!(store.get("expenses", "expense::2").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites_whole_document() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileDocumentStore::new(dir.path()).expect("Failed to init store");

        store
            .set("expenses", "e1", &json!({"amount": 1.0, "notes": "x"}))
            .unwrap();
        store.set("expenses", "e1", &json!({"amount": 2.0})).unwrap();

        let doc = store.get("expenses", "e1").unwrap().unwrap();
        assert_eq!(doc, json!({"amount": 2.0}));
    }

    #[test]
    fn test_update_merges_fields() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileDocumentStore::new(dir.path()).expect("Failed to init store");

        store
            .set("users", "u1", &json!({"currency": {"code": "USD"}, "createdAt": "x"}))
            .unwrap();
        store
            .update("users", "u1", &json!({"activeBudgetRuleId": "50-30-20"}))
            .unwrap();

        let doc = store.get("users", "u1").unwrap().unwrap();
        assert_eq!(doc["createdAt"], "x");
        assert_eq!(doc["activeBudgetRuleId"], "50-30-20");
    }

    #[test]
    fn test_update_missing_document_fails() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileDocumentStore::new(dir.path()).expect("Failed to init store");
        assert!(store.update("users", "ghost", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileDocumentStore::new(dir.path()).expect("Failed to init store");

        store.set("goals", "g1", &json!({"title": "Viaje"})).unwrap();
        store.delete("goals", "g1").unwrap();
        store.delete("goals", "g1").unwrap();
        assert_eq!(store.get("goals", "g1").unwrap(), None);
    }

    #[test]
    fn test_query_eq_filters_by_field() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileDocumentStore::new(dir.path()).expect("Failed to init store");

        store
            .set("expenses", "e1", &json!({"userId": "u1", "amount": 1.0}))
            .unwrap();
        store
            .set("expenses", "e2", &json!({"userId": "u2", "amount": 2.0}))
            .unwrap();
        store
            .set("expenses", "e3", &json!({"userId": "u1", "amount": 3.0}))
            .unwrap();

        let docs = store.query_eq("expenses", "userId", &json!("u1")).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d["userId"] == "u1"));
    }

    #[test]
    fn test_collections_survive_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        {
            let store = FileDocumentStore::new(dir.path()).expect("Failed to init store");
            store.set("incomes", "i1", &json!({"amount": 100.0})).unwrap();
        }
        let store = FileDocumentStore::new(dir.path()).expect("Failed to reopen store");
        assert!(store.get("incomes", "i1").unwrap().is_some());
    }

    #[test]
    fn test_memory_store_behaves_like_file_store() {
        let store = MemoryDocumentStore::new();
        store.set("expenses", "e1", &json!({"userId": "u1"})).unwrap();
        assert!(store.get("expenses", "e1").unwrap().is_some());
        assert_eq!(
            store.query_eq("expenses", "userId", &json!("u1")).unwrap().len(),
            1
        );
        store.delete("expenses", "e1").unwrap();
        assert!(store.get("expenses", "e1").unwrap().is_none());
    }
}
