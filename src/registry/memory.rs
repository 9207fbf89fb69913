use std::collections::HashMap;
use std::sync::RwLock;

use super::error::{RegistryError, RegistryResult};
use super::store::ModelStore;
use super::types::ModelRecord;

#[derive(Default)]
struct Namespace {
    record: Option<ModelRecord>,
    files: HashMap<String, Vec<u8>>,
}

#[derive(Default)]
struct Inner {
    namespaces: HashMap<String, Namespace>,
    // ids in the order their namespace was first allocated
    order: Vec<String>,
}

/// Volatile store: everything lives in process memory and is lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> RegistryError {
    RegistryError::Storage(e.to_string())
}

impl ModelStore for MemoryStore {
    fn ensure_namespace(&self, id: &str) -> RegistryResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if !inner.namespaces.contains_key(id) {
            inner.namespaces.insert(id.to_string(), Namespace::default());
            inner.order.push(id.to_string());
        }
        Ok(())
    }

    fn put_record(&self, record: &ModelRecord) -> RegistryResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let ns = inner
            .namespaces
            .get_mut(&record.id)
            .ok_or_else(|| RegistryError::NotFound(record.id.clone()))?;
        ns.record = Some(record.clone());
        Ok(())
    }

    fn get_record(&self, id: &str) -> RegistryResult<Option<ModelRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.namespaces.get(id).and_then(|ns| ns.record.clone()))
    }

    fn list_records(&self) -> RegistryResult<Vec<ModelRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.namespaces.get(id))
            .filter_map(|ns| ns.record.clone())
            .collect())
    }

    fn put_file(&self, id: &str, name: &str, content: &[u8]) -> RegistryResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let ns = inner
            .namespaces
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        ns.files.insert(name.to_string(), content.to_vec());
        Ok(())
    }

    fn get_file(&self, id: &str, name: &str) -> RegistryResult<Option<Vec<u8>>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .namespaces
            .get(id)
            .and_then(|ns| ns.files.get(name).cloned()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
