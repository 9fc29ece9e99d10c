//! Library crate for pitchside-back, exposing modules for binaries and integration tests.

/// Read cache with request coalescing and stale-while-revalidate.
pub mod cache;
/// Runtime configuration.
pub mod config;
/// Document store access and league entities.
pub mod dao;
/// Wire types of the HTTP API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// League services built on the cache and the store.
pub mod services;
/// Shared application state.
pub mod state;
