//! Pitchside Back binary entrypoint wiring REST, SSE and the document store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitchside_back::{
    config::{AppConfig, StoreBackend},
    dao::document_store::memory::MemoryDocumentStore,
    routes,
    services::insights::InsightGenerator,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = StoreBackend::from_env().context("selecting storage backend")?;
    let app_state = AppState::with_generator(config, insight_generator());

    start_storage(app_state.clone(), backend).await?;
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, ?backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the selected backend, supervising remote stores in the background.
///
/// Missing connection settings are fatal; an unreachable store only keeps the
/// server in degraded mode.
async fn start_storage(state: SharedState, backend: StoreBackend) -> anyhow::Result<()> {
    use pitchside_back::services::storage_supervisor;

    match backend {
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            use pitchside_back::dao::{
                document_store::{
                    DocumentStore,
                    mongodb::{MongoConfig, MongoDocumentStore},
                },
                storage::StorageError,
            };

            let config = MongoConfig::from_env()
                .await
                .context("loading MongoDB configuration")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = MongoDocumentStore::connect(config)
                        .await
                        .map_err(StorageError::from)?;
                    Ok(Arc::new(store) as Arc<dyn DocumentStore>)
                }
            }));
        }
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            use pitchside_back::dao::{
                document_store::{
                    DocumentStore,
                    couchdb::{CouchConfig, CouchDocumentStore},
                },
                storage::StorageError,
            };

            let config = CouchConfig::from_env().context("loading CouchDB configuration")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = CouchDocumentStore::connect(config)
                        .await
                        .map_err(StorageError::from)?;
                    Ok(Arc::new(store) as Arc<dyn DocumentStore>)
                }
            }));
        }
        StoreBackend::Memory => {
            warn!("using the in-memory store; data is lost on restart");
            state.set_store(Arc::new(MemoryDocumentStore::new())).await;
        }
    }
    Ok(())
}

/// Remote generator when `INSIGHT_GENERATOR_URL` is set, local template otherwise.
fn insight_generator() -> Arc<dyn InsightGenerator> {
    #[cfg(feature = "http-insights")]
    {
        use pitchside_back::services::insights::HttpInsightGenerator;

        if let Some(generator) = HttpInsightGenerator::from_env() {
            info!("match summaries delegated to the remote generator");
            return Arc::new(generator);
        }
    }
    Arc::new(pitchside_back::services::insights::TemplateInsightGenerator)
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
