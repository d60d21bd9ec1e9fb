//! Storage module for the MicroCollab data layer
//!
//! A namespaced key-value interface standing in for browser local storage:
//! string payloads, whole-value replacement on every write, last write wins.

mod keys;
mod store;
mod typed;

pub use keys::StoreKey;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use typed::Storage;

#[cfg(test)]
pub use store::MockKeyValueStore;
