//! Request and response payloads of the HTTP API.

pub mod admin;
pub mod health;
pub mod league;
pub mod sse;
