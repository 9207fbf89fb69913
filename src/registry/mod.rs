//! # Model Registry
//!
//! Maps model identifiers to their metadata, capture data and uploaded
//! artifact names. The registry owns the rules (validation, id allocation,
//! existence checks); persistence is delegated to a [`ModelStore`].
//!
//! ## Backends
//!
//! - [`MemoryStore`]: process-local, used by tests and throwaway runs
//! - [`FsStore`]: one directory per model with JSON side-files

mod error;
mod fs;
mod memory;
mod registry;
mod store;
mod types;

pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use registry::{required, validate_file_name, ModelRegistry};
pub use store::ModelStore;
pub use types::{ArtifactFile, ModelRecord};
