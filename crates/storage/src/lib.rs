//! `partsbin-storage` — the persistent key-value port.
//!
//! The engine keeps all state in memory and mirrors it to a string key-value
//! store immediately after every mutating operation. Two implementations: an
//! in-memory store with shared handles (tests) and a file-per-key JSON store
//! (production).

pub mod file;
pub mod keys;
pub mod kv;
pub mod memory;

pub use file::JsonFileStore;
pub use kv::{KeyValueStore, StorageError};
pub use memory::MemoryStore;
