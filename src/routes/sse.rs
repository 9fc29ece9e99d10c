//! Server-sent event stream.

use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/invalidations",
    tag = "sse",
    responses((status = 200, description = "Cache invalidation stream", content_type = "text/event-stream", body = String))
)]
/// Stream resource invalidations so clients know when to refetch.
pub async fn invalidation_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New invalidation SSE connection");
    sse_service::invalidation_stream(&state)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/invalidations", get(invalidation_stream))
}
