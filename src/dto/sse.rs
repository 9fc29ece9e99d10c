//! Events pushed over the server-sent event stream.

use serde::Serialize;
use utoipa::ToSchema;

use crate::cache::ResourceType;

/// Named SSE payload, serialised ahead of framing.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// SSE event name, if any.
    pub event: Option<String>,
    /// JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Serialise `payload` as the event data.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// First event of every invalidation stream.
#[derive(Debug, Serialize, ToSchema)]
pub struct Handshake {
    /// Greeting text.
    pub message: String,
    /// Whether reads currently fail because the store is unreachable.
    pub degraded: bool,
    /// Resource types this stream reports invalidations for.
    #[schema(value_type = Vec<String>)]
    pub resources: Vec<ResourceType>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether the backend runs without a document store.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast after every cached entry of a resource type was dropped.
pub struct InvalidationEvent {
    /// Resource type whose entries must be refetched.
    #[schema(value_type = String, example = "teams")]
    pub resource: ResourceType,
}
