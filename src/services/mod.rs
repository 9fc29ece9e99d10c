/// Admin writes to league settings.
pub mod admin_service;
/// Caller identity derived from the authentication proxy.
pub mod auth;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match summary generation.
pub mod insights;
/// Tracked writes that invalidate the read cache.
pub mod mutation;
/// Guarded admin promotion flow.
pub mod promotion;
/// Public page assembly.
pub mod public_service;
/// Cached read hooks per league resource.
pub mod resources;
/// Server-Sent Events streaming of cache invalidations.
pub mod sse_service;
/// League table computation.
pub mod standings;
/// Storage connection supervisor with degraded mode.
pub mod storage_supervisor;
/// Display projections for league pages.
pub mod views;
