//! Persistent storage adapters.
//!
//! Provides [`JsonFileKeyValueStore`], the file-backed implementation of
//! the [`KeyValueStore`](verinox_application::KeyValueStore) port.

mod json_file_store;

pub use json_file_store::JsonFileKeyValueStore;
