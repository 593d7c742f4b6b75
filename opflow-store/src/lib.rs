#![forbid(unsafe_code)]

pub mod file;
pub mod memory;
pub mod store;

pub use crate::file::FileStore;
pub use crate::memory::MemoryStore;
pub use crate::store::{
    namespace_or_default, NewEvent, StateStore, StoreError, StoredEvent, DEFAULT_NAMESPACE,
};
