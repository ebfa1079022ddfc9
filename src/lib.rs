//! Library crate for pugbot, exposing modules for binaries and integration tests.

/// Chat services the bot renders into.
pub mod backend;
/// Configuration loading.
pub mod config;
mod dto;
mod error;
/// HTTP control plane.
pub mod routes;
/// Reconciliation, scheduling and command handling.
pub mod services;
/// Snapshots, sessions and the shared registry.
pub mod state;
