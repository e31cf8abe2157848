//! Gateway core: key generation, validation, content typing, storage
//! gateway, presigned URLs, and batch coordination.
//!
//! Components are independent and composed by explicit calls; none keeps
//! cross-call mutable state.

pub mod batch;
pub mod content_type;
pub mod gateway;
pub mod keygen;
pub mod presign;
pub mod validation;
