//! Value types exposed by the gateway core.
//!
//! Plain immutable records with no back-references: the only component that
//! holds the object-store client is `StorageGateway`. Everything here
//! serializes naturally as camelCase JSON via `serde`.

pub mod batch;
pub mod file_record;
pub mod presigned;
pub mod upload;
