//! Typed league documents decoded and validated from raw store documents.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dao::{
    document_store::{Collection, Document},
    storage::{StorageError, StorageResult},
};

/// Identifier of the singleton settings document.
pub const SETTINGS_ID: &str = "league";

/// A league document with a fixed home collection and a validated schema.
pub trait Entity: DeserializeOwned + Serialize + Validate + Send + Sync + 'static {
    /// Collection the entity lives in.
    const COLLECTION: Collection;

    /// Identifier of this entity inside its collection.
    fn id(&self) -> &str;

    /// Decode and validate a raw document, rejecting malformed data.
    fn from_document(document: Document) -> StorageResult<Self> {
        let id = document.id.clone();
        let entity: Self = serde_json::from_value(document.to_value()).map_err(|err| {
            StorageError::Validation {
                collection: Self::COLLECTION,
                id: id.clone(),
                message: err.to_string(),
            }
        })?;
        entity
            .validate()
            .map_err(|errors| StorageError::Validation {
                collection: Self::COLLECTION,
                id,
                message: describe(&errors),
            })?;
        Ok(entity)
    }

    /// Encode into a raw document; the id is carried out of band.
    fn to_document(&self) -> Document {
        let value = serde_json::to_value(self).unwrap_or_default();
        let mut document = Document::new(self.id(), value);
        document.fields.remove("id");
        document
    }
}

/// Flatten validator errors into a single readable line.
fn describe(errors: &ValidationErrors) -> String {
    errors.to_string().replace('\n', "; ")
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn validate_rfc3339(value: &str) -> Result<(), ValidationError> {
    OffsetDateTime::parse(value, &Rfc3339).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("timestamp");
        err.message = Some(format!("`{value}` is not an RFC 3339 timestamp").into());
        err
    })
}

/// Highest score a stored fixture may carry.
pub const MAX_SCORE: i64 = 999;

/// A completed fixture must carry two scores within `0..=MAX_SCORE`.
fn check_final_score(
    completed: bool,
    score1: Option<i64>,
    score2: Option<i64>,
) -> Result<(), ValidationError> {
    if !completed {
        return Ok(());
    }
    let in_range = |score: i64| (0..=MAX_SCORE).contains(&score);
    match (score1, score2) {
        (Some(a), Some(b)) if in_range(a) && in_range(b) => Ok(()),
        _ => {
            let mut err = ValidationError::new("final_score");
            err.message = Some(
                format!("completed matches need score1 and score2 between 0 and {MAX_SCORE}").into(),
            );
            Err(err)
        }
    }
}

/// Player listed on a team roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntity {
    /// Display name.
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    /// Shirt number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Free-form playing position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// A club taking part in the league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntity {
    /// Document id.
    pub id: String,
    /// Club name shown in lists and tables.
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    /// Badge image location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Current roster.
    #[serde(default)]
    #[validate(nested)]
    pub players: Vec<PlayerEntity>,
}

impl Entity for TeamEntity {
    const COLLECTION: Collection = Collection::Teams;

    fn id(&self) -> &str {
        &self.id
    }
}

fn validate_match(entity: &MatchEntity) -> Result<(), ValidationError> {
    check_final_score(entity.completed, entity.score1, entity.score2)
}

/// A scheduled or played regular-season fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_match"))]
pub struct MatchEntity {
    /// Document id.
    pub id: String,
    /// Home team id.
    pub team1_id: String,
    /// Away team id.
    pub team2_id: String,
    /// Home team name at scheduling time.
    pub team1_name: String,
    /// Away team name at scheduling time.
    pub team2_name: String,
    /// Kick-off date, ISO-8601.
    pub date: String,
    /// Venue; empty when unknown.
    #[serde(default)]
    pub location: String,
    /// Whether the final whistle has blown.
    #[serde(default)]
    pub completed: bool,
    /// Home goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score1: Option<i64>,
    /// Away goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score2: Option<i64>,
}

impl MatchEntity {
    /// Final score, present only once the match is completed.
    pub fn final_score(&self) -> Option<(i64, i64)> {
        if !self.completed {
            return None;
        }
        self.score1.zip(self.score2)
    }

    /// Whether `team_id` plays in this match.
    pub fn involves(&self, team_id: &str) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

impl Entity for MatchEntity {
    const COLLECTION: Collection = Collection::Matches;

    fn id(&self) -> &str {
        &self.id
    }
}

fn validate_playoff(entity: &PlayoffMatchEntity) -> Result<(), ValidationError> {
    check_final_score(entity.completed, entity.score1, entity.score2)
}

/// A knockout fixture, slotted by round and match number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_playoff"))]
pub struct PlayoffMatchEntity {
    /// Document id.
    pub id: String,
    /// Knockout round, starting at 1.
    #[validate(range(min = 1))]
    pub round: u32,
    /// Slot within the round, starting at 1.
    #[validate(range(min = 1))]
    pub match_number: u32,
    /// First team, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team1_id: Option<String>,
    /// Second team, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team2_id: Option<String>,
    /// First team name, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team1_name: Option<String>,
    /// Second team name, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team2_name: Option<String>,
    /// Whether the tie has been played.
    #[serde(default)]
    pub completed: bool,
    /// First team goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score1: Option<i64>,
    /// Second team goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score2: Option<i64>,
}

impl Entity for PlayoffMatchEntity {
    const COLLECTION: Collection = Collection::PlayoffMatches;

    fn id(&self) -> &str {
        &self.id
    }
}

/// What an insight is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    /// Summary of a single match.
    Match,
    /// Any kind this build does not know.
    #[serde(other)]
    Other,
}

/// Generated text summary attached to another document. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightEntity {
    /// Document id.
    pub id: String,
    /// Subject type.
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// Id of the summarised document.
    pub related_id: String,
    /// Summary text.
    #[validate(custom(function = "validate_not_blank"))]
    pub content: String,
    /// RFC 3339 creation time.
    #[validate(custom(function = "validate_rfc3339"))]
    pub created_at: String,
}

impl Entity for InsightEntity {
    const COLLECTION: Collection = Collection::Insights;

    fn id(&self) -> &str {
        &self.id
    }
}

/// League-wide display configuration, stored as the singleton [`SETTINGS_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsEntity {
    /// Always [`SETTINGS_ID`].
    pub id: String,
    /// Title shown above every page.
    #[validate(custom(function = "validate_not_blank"))]
    pub league_name: String,
    /// Season label, e.g. `2024/25`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    /// Points per win; the default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 10))]
    pub points_for_win: Option<u32>,
    /// Points per draw; the default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 10))]
    pub points_for_draw: Option<u32>,
}

impl SettingsEntity {
    /// Settings used when no document has been stored yet.
    pub fn fallback(league_name: impl Into<String>) -> Self {
        Self {
            id: SETTINGS_ID.to_owned(),
            league_name: league_name.into(),
            season: None,
            points_for_win: None,
            points_for_draw: None,
        }
    }
}

impl Entity for SettingsEntity {
    const COLLECTION: Collection = Collection::Settings;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// May edit settings and generate summaries.
    Admin,
    /// Regular account; also any unknown role.
    #[default]
    #[serde(other)]
    User,
}

impl UserRole {
    /// Wire value stored in the `role` field.
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// Account known to the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Provider account id.
    pub id: String,
    /// Contact address.
    #[validate(email)]
    pub email: String,
    /// Access level.
    #[serde(default)]
    pub role: UserRole,
    /// Disabled accounts lose admin rights.
    #[serde(default)]
    pub active: bool,
}

impl UserEntity {
    /// Whether the account may use admin features.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin && self.active
    }
}

impl Entity for UserEntity {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }
}
