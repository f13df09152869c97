pub mod bridge;
pub mod errors;
pub mod file_store;
pub mod store;

pub use bridge::PersistenceBridge;
pub use errors::{PersistenceError, PersistenceResult};
pub use file_store::FileStore;
pub use store::{InMemoryStore, KeyValueStore};
