use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the league backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::league::get_settings,
        crate::routes::league::get_teams,
        crate::routes::league::get_team,
        crate::routes::league::get_matches,
        crate::routes::league::get_match,
        crate::routes::league::get_standings,
        crate::routes::league::get_playoffs,
        crate::routes::users::promote_self,
        crate::routes::admin::update_settings,
        crate::routes::admin::generate_insight,
        crate::routes::sse::invalidation_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::league::TeamSummary,
            crate::dto::league::TeamListResponse,
            crate::dto::league::MatchCard,
            crate::dto::league::TeamPageResponse,
            crate::dto::league::MatchPageResponse,
            crate::dto::league::StandingRow,
            crate::dto::league::StandingsResponse,
            crate::dto::league::PlayoffCard,
            crate::dto::league::PlayoffRound,
            crate::dto::league::PlayoffsResponse,
            crate::dto::league::SettingsResponse,
            crate::dto::admin::UpdateSettingsRequest,
            crate::dto::admin::PromotionRequest,
            crate::dto::admin::PromotionResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::InvalidationEvent,
            crate::dao::models::PlayerEntity,
            crate::dao::models::InsightEntity,
            crate::dao::models::InsightKind,
            crate::dao::models::UserRole,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "league", description = "Public league pages"),
        (name = "users", description = "Operations on the calling user"),
        (name = "admin", description = "Admin-only league management"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/teams/{id}",
            "/matches/{id}",
            "/users/me/promote",
            "/admin/settings",
            "/admin/matches/{id}/insights",
            "/sse/invalidations",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn every_schema_field_is_described() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        for (name, schema) in schemas {
            let Some(properties) = schema["properties"].as_object() else {
                continue;
            };
            for (field, property) in properties {
                if property.get("type").is_none() {
                    continue;
                }
                assert!(
                    property["description"].as_str().is_some_and(|text| !text.is_empty()),
                    "{name}.{field} has no description"
                );
            }
        }
        let promotion = &schemas["PromotionResponse"]["properties"];
        assert_eq!(promotion["userId"]["description"], "Promoted account.");
    }
}
