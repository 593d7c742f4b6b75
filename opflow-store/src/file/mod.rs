mod documents;
mod events;
mod store;

pub use store::FileStore;
