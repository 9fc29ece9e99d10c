//! Payloads of the admin and promotion endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::dao::models::UserRole;

fn validate_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Partial update of the league settings. Absent fields are left untouched.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    /// New league title.
    #[validate(length(max = 80), custom(function = "validate_trimmed"))]
    pub league_name: Option<String>,
    /// New season label.
    #[validate(length(min = 1, max = 40))]
    pub season: Option<String>,
    /// Points per win, at most 10.
    #[validate(range(max = 10))]
    pub points_for_win: Option<u32>,
    /// Points per draw, at most 10.
    #[validate(range(max = 10))]
    pub points_for_draw: Option<u32>,
}

impl UpdateSettingsRequest {
    /// Top-level fields to merge into the stored settings document.
    pub fn into_partial(self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Code submitted by a user asking to become admin.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PromotionRequest {
    /// Shared promotion code.
    #[validate(length(min = 1, max = 128))]
    pub code: String,
}

/// Successful promotion.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionResponse {
    /// Promoted account.
    pub user_id: String,
    /// Role after the promotion.
    pub role: UserRole,
    /// Phases the promotion went through, in order.
    pub phases: Vec<String>,
}
