mod trait_store;
mod types;

pub use trait_store::{StateStore, StoreError};
pub use types::{namespace_or_default, NewEvent, StoredEvent, DEFAULT_NAMESPACE};
