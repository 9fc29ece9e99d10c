//! Caller identity as supplied by the upstream authentication proxy.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    dao::{models::UserEntity, storage::StorageError},
    error::{AppError, ServiceError},
    services::resources,
    state::SharedState,
};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Who is calling and what they may do.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// Authenticated user id, when the proxy supplied one.
    pub user_id: Option<String>,
    /// Stored account of the caller, if it exists.
    pub current_user: Option<UserEntity>,
    /// Whether the proxy authenticated the caller.
    pub is_authenticated: bool,
    /// Whether the caller is an active admin.
    pub is_admin: bool,
}

impl AuthContext {
    /// Context of an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Build the context for `user_id`, loading the account through the cache.
    ///
    /// An authenticated id without a stored account yields a non-admin context.
    pub async fn resolve(state: &SharedState, user_id: Option<&str>) -> Result<Self, ServiceError> {
        let Some(user_id) = user_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(Self::anonymous());
        };

        let current_user = match resources::user(user_id).read(state).await {
            Ok(user) => Some(user.as_ref().clone()),
            Err(StorageError::NotFound { .. }) => None,
            Err(err) => return Err(err.into()),
        };
        let is_admin = current_user.as_ref().is_some_and(UserEntity::is_admin);

        Ok(Self {
            user_id: Some(user_id.to_owned()),
            current_user,
            is_authenticated: true,
            is_admin,
        })
    }

    /// Authenticated user id or [`ServiceError::Unauthorized`].
    pub fn require_user(&self) -> Result<&str, ServiceError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ServiceError::Unauthorized(format!("missing `{USER_ID_HEADER}` header")))
    }

    /// Succeeds only for an active admin.
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        self.require_user()?;
        if self.is_admin {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied("admin role required".into()))
        }
    }
}

impl FromRequestParts<SharedState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(AuthContext::resolve(state, user_id).await?)
    }
}
