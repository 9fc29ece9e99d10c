//! Admin promotion: a capacity check and a secret code guarding a role write.
//!
//! Promotions are serialized inside one process by the state's promotion gate,
//! held from the limit check through the write. Several processes sharing one
//! store can still both pass the limit check before either writes.

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::{
    cache::ResourceType,
    dao::{
        document_store::{Collection, Query},
        models::UserRole,
    },
    dto::admin::PromotionResponse,
    error::ServiceError,
    services::mutation::Mutation,
    state::{
        SharedState,
        promotion::{PromotionEvent, PromotionFailure, PromotionFlow, PromotionPhase},
    },
};

/// Resources a promotion makes stale.
pub const PROMOTION_INVALIDATES: &[ResourceType] = &[ResourceType::Users];

/// Promote `user_id` to admin when the limit and the code allow it.
pub async fn promote(
    state: &SharedState,
    mutation: &Mutation<PromotionResponse>,
    user_id: &str,
    code: &str,
) -> Result<PromotionResponse, ServiceError> {
    mutation
        .run(state.cache(), || run_flow(state, user_id, code))
        .await
}

async fn run_flow(
    state: &SharedState,
    user_id: &str,
    code: &str,
) -> Result<PromotionResponse, ServiceError> {
    let _gate = state.promotion_gate().await;
    let store = state.require_store().await?;
    let mut flow = PromotionFlow::new();
    flow.apply(PromotionEvent::Submit)?;

    let max = state.config().max_admins;
    let counted = store
        .query(
            Collection::Users,
            Query::all().where_eq("role", UserRole::Admin.as_str()),
        )
        .await;
    let admins = match counted {
        Ok(admins) => admins.len(),
        Err(err) => {
            flow.apply(PromotionEvent::CountFailed(err.to_string()))?;
            return Err(fail(user_id, &flow, err.into()));
        }
    };
    let phase = flow
        .apply(PromotionEvent::AdminsCounted { admins, max })?
        .clone();
    if let PromotionPhase::Failed(failure) = phase {
        return Err(fail(user_id, &flow, rejection(failure)));
    }

    let accepted = state
        .config()
        .promotion_code
        .as_deref()
        .is_some_and(|secret| secret == code);
    let phase = flow.apply(PromotionEvent::CodeChecked { accepted })?.clone();
    if let PromotionPhase::Failed(failure) = phase {
        return Err(fail(user_id, &flow, rejection(failure)));
    }

    if let Err(err) = store.update(Collection::Users, user_id, admin_fields()).await {
        flow.apply(PromotionEvent::WriteFailed(err.to_string()))?;
        return Err(fail(user_id, &flow, err.into()));
    }
    flow.apply(PromotionEvent::Written)?;
    info!(user_id, admins = admins + 1, max, "user promoted to admin");

    Ok(PromotionResponse {
        user_id: user_id.to_owned(),
        role: UserRole::Admin,
        phases: flow.trail().iter().map(phase_name).collect(),
    })
}

fn admin_fields() -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("role".into(), json!(UserRole::Admin.as_str()));
    fields.insert("active".into(), json!(true));
    fields
}

fn rejection(failure: PromotionFailure) -> ServiceError {
    ServiceError::Rejected(failure.to_string())
}

fn fail(user_id: &str, flow: &PromotionFlow, err: ServiceError) -> ServiceError {
    warn!(user_id, phase = ?flow.phase(), error = %err, "admin promotion failed");
    err
}

fn phase_name(phase: &PromotionPhase) -> String {
    match phase {
        PromotionPhase::Idle => "idle".into(),
        PromotionPhase::CheckingLimit => "checkingLimit".into(),
        PromotionPhase::CheckingCode => "checkingCode".into(),
        PromotionPhase::Writing => "writing".into(),
        PromotionPhase::Done => "done".into(),
        PromotionPhase::Failed(_) => "failed".into(),
    }
}
