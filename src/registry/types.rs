use serde::{Serialize, Deserialize};
use serde_json::Value;
use chrono::{DateTime, Utc};

/// A model registered by a client.
///
/// This is the unit the registry persists: display metadata, the most
/// recently saved capture set and the names of every uploaded artifact.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    /// Unique identifier allocated at creation
    pub id: String,
    /// Human-readable name supplied by the client
    pub name: String,
    /// Opaque capture data, replaced wholesale on each save
    #[serde(default)]
    pub captures: Vec<Value>,
    /// Names of uploaded artifact files, in upload order
    #[serde(default)]
    pub file_names: Vec<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl ModelRecord {
    pub fn new(id: String, name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            captures: Vec::new(),
            file_names: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// An uploaded file decoded by the transport layer.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    /// Original client-supplied file name
    pub name: String,
    /// Raw content, opaque to the registry
    pub content: Vec<u8>,
}

impl ArtifactFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}
