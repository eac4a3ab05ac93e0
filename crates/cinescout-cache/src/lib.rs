// Durable key-value storage
// Holds the favorites record (and anything else small that needs to survive a restart)

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{CacheError, Result};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::KeyValueStore;
