//! Flat-file backend.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<id>/info.json      id, name, fileNames, timestamps
//! <root>/<id>/capturas.json  captures array
//! <root>/<id>/files/<name>   raw uploaded artifacts
//! ```
//!
//! A model exists once its `info.json` has been written. Metadata files are
//! written to a uniquely named temporary file in the model directory and
//! persisted over the target, so readers never observe a half-written
//! document and concurrent writers never share a temporary path.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{RegistryError, RegistryResult};
use super::store::ModelStore;
use super::types::ModelRecord;

const INFO_FILE: &str = "info.json";
const CAPTURES_FILE: &str = "capturas.json";
const FILES_DIR: &str = "files";

/// Contents of `info.json`; captures are kept in their own file.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoFile {
    id: String,
    name: String,
    #[serde(default)]
    file_names: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Durable store keeping one directory per model.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> RegistryResult<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
            info!("Created storage directory: {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `id`, or `None` when the id cannot name a model.
    ///
    /// Only canonical UUIDs map to a directory so that a caller-supplied id
    /// can never address anything outside the root.
    fn model_dir(&self, id: &str) -> Option<PathBuf> {
        let parsed = Uuid::parse_str(id).ok()?;
        if parsed.hyphenated().to_string() != id {
            return None;
        }
        Some(self.root.join(id))
    }

    fn existing_model_dir(&self, id: &str) -> RegistryResult<PathBuf> {
        match self.model_dir(id) {
            Some(dir) if dir.is_dir() => Ok(dir),
            _ => Err(RegistryError::NotFound(id.to_string())),
        }
    }

    fn read_record(dir: &Path) -> RegistryResult<Option<ModelRecord>> {
        let info_path = dir.join(INFO_FILE);
        let info: InfoFile = match fs::read_to_string(&info_path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let captures: Vec<Value> = match fs::read_to_string(dir.join(CAPTURES_FILE)) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(ModelRecord {
            id: info.id,
            name: info.name,
            captures,
            file_names: info.file_names,
            created_at: info.created_at,
            updated_at: info.updated_at,
        }))
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> RegistryResult<()> {
    let content = serde_json::to_vec_pretty(value)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(&content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl ModelStore for FsStore {
    fn ensure_namespace(&self, id: &str) -> RegistryResult<()> {
        let dir = self
            .model_dir(id)
            .ok_or_else(|| RegistryError::validation(format!("invalid model id: {}", id)))?;
        fs::create_dir_all(dir.join(FILES_DIR))?;
        debug!(model_id = %id, "Namespace ready at {}", dir.display());
        Ok(())
    }

    fn put_record(&self, record: &ModelRecord) -> RegistryResult<()> {
        let dir = self.existing_model_dir(&record.id)?;

        // captures first: info.json is what makes the record visible
        write_json_atomic(&dir.join(CAPTURES_FILE), &record.captures)?;

        let info = InfoFile {
            id: record.id.clone(),
            name: record.name.clone(),
            file_names: record.file_names.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        write_json_atomic(&dir.join(INFO_FILE), &info)
    }

    fn get_record(&self, id: &str) -> RegistryResult<Option<ModelRecord>> {
        match self.model_dir(id) {
            Some(dir) => Self::read_record(&dir),
            None => Ok(None),
        }
    }

    fn list_records(&self) -> RegistryResult<Vec<ModelRecord>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(dir) = self.model_dir(&name) else {
                continue;
            };
            // one damaged record must not hide the others; get() still reports it
            match Self::read_record(&dir) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => warn!("Skipping {}: no {}", dir.display(), INFO_FILE),
                Err(e) => warn!("Skipping {}: {}", dir.display(), e),
            }
        }

        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    fn put_file(&self, id: &str, name: &str, content: &[u8]) -> RegistryResult<()> {
        let dir = self.existing_model_dir(id)?;
        // files/ is allocated by ensure_namespace; a missing one is a storage fault
        fs::write(dir.join(FILES_DIR).join(name), content)?;
        Ok(())
    }

    fn get_file(&self, id: &str, name: &str) -> RegistryResult<Option<Vec<u8>>> {
        let Some(dir) = self.model_dir(id) else {
            return Ok(None);
        };
        match fs::read(dir.join(FILES_DIR).join(name)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
