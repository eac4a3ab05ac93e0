use crate::Result;

/// String key-value persistence
///
/// The contract is deliberately small: values are opaque text, a missing
/// key is `None` rather than an error, and `set` overwrites.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}
