//! In-process backends, used by tests and for running the server without a database.
mod cache;
mod store;

pub use cache::MemoryCache;
pub use store::MemoryStore;
