//! HTTP handlers: file operations plus health probes.

pub mod file_handlers;
pub mod health_handlers;
