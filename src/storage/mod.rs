//! Object-store client seam.
//!
//! `ObjectStoreClient` is the only contract the gateway core talks storage
//! through. `LocalStore` is the bundled SQLite-and-disk backend used by the
//! binary; `MemoryStore` backs tests and embedded use.

pub mod client;
pub mod local;
pub mod memory;

pub use client::{
    BatchDeleteError, BatchDeleteResult, HeadObject, ListedObject, ObjectStoreClient, StoreError,
};
pub use local::LocalStore;
pub use memory::MemoryStore;
