use super::error::RegistryResult;
use super::types::ModelRecord;

/// Persistence backend for model records and their artifact files.
///
/// Implementations hold no business rules: validation, id allocation and
/// existence checks live in [`ModelRegistry`](super::ModelRegistry). Every
/// backend must behave identically under the registry contract.
pub trait ModelStore: Send + Sync {
    /// Allocates storage for `id`. Calling it again for the same id is a no-op.
    fn ensure_namespace(&self, id: &str) -> RegistryResult<()>;

    /// Writes the record's metadata and captures, replacing any previous copy.
    fn put_record(&self, record: &ModelRecord) -> RegistryResult<()>;

    /// Reads a record back, `None` if the id was never stored.
    fn get_record(&self, id: &str) -> RegistryResult<Option<ModelRecord>>;

    /// Returns every stored record in creation order.
    fn list_records(&self) -> RegistryResult<Vec<ModelRecord>>;

    /// Writes artifact content under the record's namespace (last write wins).
    fn put_file(&self, id: &str, name: &str, content: &[u8]) -> RegistryResult<()>;

    /// Reads artifact content, `None` if nothing is stored under `name`.
    fn get_file(&self, id: &str, name: &str) -> RegistryResult<Option<Vec<u8>>>;

    /// Short backend label used in logs.
    fn backend_name(&self) -> &'static str;
}
