//! Admin writes other than promotion and insight generation.

use tracing::info;

use crate::{
    cache::ResourceType,
    dao::{
        models::{Entity, SETTINGS_ID, SettingsEntity},
        storage::StorageError,
    },
    dto::{admin::UpdateSettingsRequest, league::SettingsResponse},
    error::ServiceError,
    services::mutation::Mutation,
    state::SharedState,
};

/// Resources a settings update makes stale.
pub const SETTINGS_INVALIDATES: &[ResourceType] = &[ResourceType::Settings];

/// Merge `request` into the singleton settings document, creating it when absent.
///
/// The merged document is validated before anything is written.
pub async fn update_settings(
    state: &SharedState,
    mutation: &Mutation<SettingsEntity>,
    request: UpdateSettingsRequest,
) -> Result<SettingsResponse, ServiceError> {
    let updated = mutation
        .run(state.cache(), || async {
            let store = state.require_store().await?;
            let partial = request.into_partial();
            if partial.is_empty() {
                return Err(ServiceError::InvalidInput("no settings fields given".into()));
            }

            let current = store.get(SettingsEntity::COLLECTION, SETTINGS_ID).await;
            let (mut document, exists) = match current {
                Ok(document) => (document, true),
                Err(StorageError::NotFound { .. }) => (
                    SettingsEntity::fallback(state.config().default_league_name.clone())
                        .to_document(),
                    false,
                ),
                Err(err) => return Err(err.into()),
            };
            document.merge(partial.clone());
            let merged =
                SettingsEntity::from_document(document.clone()).map_err(|err| match err {
                    StorageError::Validation { message, .. } => ServiceError::InvalidInput(message),
                    other => other.into(),
                })?;

            if exists {
                store
                    .update(SettingsEntity::COLLECTION, SETTINGS_ID, partial)
                    .await?;
            } else {
                store
                    .insert(SettingsEntity::COLLECTION, document)
                    .await?;
            }
            info!(created = !exists, "league settings updated");
            Ok(merged)
        })
        .await?;

    Ok(SettingsResponse::from(&updated))
}
