use std::fmt;

use serde::Serialize;

/// Resource families the cache is partitioned by; invalidation works per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    /// Team lists and single teams.
    Teams,
    /// Fixture lists, per-team fixtures and single matches.
    Matches,
    /// League settings.
    Settings,
    /// Summary lists per match.
    Insights,
    /// Account lookups.
    Users,
    /// The knockout bracket.
    PlayoffMatches,
}

impl ResourceType {
    /// Every resource family.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Teams,
        ResourceType::Matches,
        ResourceType::Settings,
        ResourceType::Insights,
        ResourceType::Users,
        ResourceType::PlayoffMatches,
    ];

    /// Stable label used in logs and invalidation events.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Teams => "teams",
            ResourceType::Matches => "matches",
            ResourceType::Settings => "settings",
            ResourceType::Insights => "insights",
            ResourceType::Users => "users",
            ResourceType::PlayoffMatches => "playoffMatches",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key: a resource family plus its serialized query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: ResourceType,
    params: String,
}

impl CacheKey {
    /// Key for a parameterless read, e.g. "all teams".
    pub fn all(resource: ResourceType) -> Self {
        Self {
            resource,
            params: String::new(),
        }
    }

    /// Key for a parameterised read. Parameters are serialized to JSON.
    pub fn with_params<P: Serialize + ?Sized>(resource: ResourceType, params: &P) -> Self {
        let params = serde_json::to_string(params).unwrap_or_default();
        Self { resource, params }
    }

    /// Resource family of this key.
    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    /// Serialized parameters; empty for parameterless reads.
    pub fn params(&self) -> &str {
        &self.params
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}:{}", self.resource, self.params)
        }
    }
}
