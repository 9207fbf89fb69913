use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{RegistryError, RegistryResult};
use super::store::ModelStore;
use super::types::{ArtifactFile, ModelRecord};

/// Owns the model records and enforces the registry rules on top of a store.
///
/// The registry is built once at startup and shared with every request
/// handler. Records are never locked: concurrent writes to the same model
/// resolve as last write wins in the backing store.
pub struct ModelRegistry {
    store: Arc<dyn ModelStore>,
    // last creation timestamp handed out; creation times strictly increase
    last_created: Mutex<DateTime<Utc>>,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ModelStore>) -> Self {
        Self {
            store,
            last_created: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Registers a new model and returns the stored record.
    ///
    /// # Errors
    ///
    /// `Validation` if `name` is empty or only whitespace.
    pub fn create(&self, name: &str) -> RegistryResult<ModelRecord> {
        if name.trim().is_empty() {
            return Err(RegistryError::validation("name is required"));
        }

        let id = Uuid::new_v4().to_string();
        self.store.ensure_namespace(&id)?;

        let record = ModelRecord::new(id, name.to_string(), self.next_creation_time()?);
        self.store.put_record(&record)?;

        info!(model_id = %record.id, "Created model '{}'", record.name);
        Ok(record)
    }

    /// Wall-clock time, nudged forward when the clock has not advanced since
    /// the previous creation so stores can recover creation order from it.
    fn next_creation_time(&self) -> RegistryResult<DateTime<Utc>> {
        let mut last = self
            .last_created
            .lock()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        let mut now = Utc::now();
        if now <= *last {
            now = *last + Duration::nanoseconds(1);
        }
        *last = now;
        Ok(now)
    }

    /// Replaces the captures of an existing model with `data`.
    pub fn attach_captures(&self, id: &str, data: Vec<Value>) -> RegistryResult<()> {
        if id.is_empty() {
            return Err(RegistryError::validation("id is required"));
        }

        let mut record = self.get(id)?;
        record.captures = data;
        record.touch();
        self.store.put_record(&record)?;

        info!(model_id = %id, "Saved {} captures", record.captures.len());
        Ok(())
    }

    /// Stores artifact files under an existing model.
    ///
    /// Every name is appended to `file_names`, even when it was uploaded
    /// before; the stored content for a repeated name is the latest one.
    /// Returns the stored names in submission order.
    pub fn attach_files(&self, id: &str, files: Vec<ArtifactFile>) -> RegistryResult<Vec<String>> {
        let mut record = self.get(id)?;

        for file in &files {
            validate_file_name(&file.name)?;
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            self.store.put_file(id, &file.name, &file.content)?;
            debug!(model_id = %id, "Stored {} ({} bytes)", file.name, file.content.len());
            stored.push(file.name);
        }

        record.file_names.extend(stored.iter().cloned());
        record.touch();
        self.store.put_record(&record)?;

        info!(model_id = %id, "Attached {} files", stored.len());
        Ok(stored)
    }

    /// Looks up a single model.
    pub fn get(&self, id: &str) -> RegistryResult<ModelRecord> {
        self.store
            .get_record(id)?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// All models in creation order.
    pub fn list(&self) -> RegistryResult<Vec<ModelRecord>> {
        self.store.list_records()
    }

    /// Content of an artifact previously stored with [`attach_files`](Self::attach_files).
    pub fn read_file(&self, id: &str, name: &str) -> RegistryResult<Vec<u8>> {
        // make an unknown model distinguishable from an unknown file
        self.get(id)?;
        validate_file_name(name)?;
        self.store
            .get_file(id, name)?
            .ok_or_else(|| RegistryError::FileNotFound {
                id: id.to_string(),
                file: name.to_string(),
            })
    }
}

/// File names become storage keys and must stay inside the model's namespace.
pub fn validate_file_name(name: &str) -> RegistryResult<()> {
    if name.is_empty() {
        return Err(RegistryError::validation("file name is required"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(RegistryError::validation(format!("invalid file name: {}", name)));
    }
    Ok(())
}

/// Unwraps an optional request field or reports it as missing.
pub fn required<T>(field: &str, value: Option<T>) -> RegistryResult<T> {
    value.ok_or_else(|| RegistryError::validation(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_like_file_names() {
        for name in ["", ".", "..", "a/b", "..\\evil", "nul\0byte"] {
            assert!(validate_file_name(name).is_err(), "{:?} should be rejected", name);
        }
    }

    #[test]
    fn accepts_plain_file_names() {
        for name in ["model.json", "model.weights.bin", "..hidden", "metadata"] {
            assert!(validate_file_name(name).is_ok(), "{:?} should be accepted", name);
        }
    }

    #[test]
    fn required_reports_field_name() {
        let err = required::<String>("data", None).unwrap_err();
        assert_eq!(err.to_string(), "data is required");
        assert_eq!(required("id", Some(3)).unwrap(), 3);
    }
}
