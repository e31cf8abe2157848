//! File management gateway over an object store.
//!
//! The core is in [`services`]: key generation, upload validation, the
//! storage gateway, presigned URLs, and batch coordination. [`storage`]
//! holds the object-store client seam and its bundled backends; the HTTP
//! boundary lives in [`handlers`] and [`routes`].

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
