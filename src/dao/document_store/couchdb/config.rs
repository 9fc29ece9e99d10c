use std::time::Duration;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Basic-auth credentials for CouchDB.
#[derive(Debug, Clone)]
pub struct CouchCredentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Where the league database lives and how to reach it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://couch:5984`.
    pub base_url: String,
    /// Database holding every league collection.
    pub database: String,
    /// Optional basic-auth credentials.
    pub credentials: Option<CouchCredentials>,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

impl CouchConfig {
    /// Anonymous access with the default timeout.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            credentials: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read `COUCH_BASE_URL` and `COUCH_DB`, plus optional `COUCH_USERNAME`,
    /// `COUCH_PASSWORD` and `COUCH_TIMEOUT_SECS`.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> CouchResult<Self> {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(CouchDaoError::MissingEnvVar { var })
        };
        let mut config = Self::new(required("COUCH_BASE_URL")?, required("COUCH_DB")?);

        if let (Some(username), Some(password)) = (lookup("COUCH_USERNAME"), lookup("COUCH_PASSWORD")) {
            config.credentials = Some(CouchCredentials { username, password });
        }
        if let Some(secs) = lookup("COUCH_TIMEOUT_SECS").and_then(|raw| raw.parse::<u64>().ok()) {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<_, _> = vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn database_name_is_required() {
        let err = CouchConfig::from_lookup(lookup(&[("COUCH_BASE_URL", "http://couch:5984")]))
            .unwrap_err();
        assert!(matches!(err, CouchDaoError::MissingEnvVar { var: "COUCH_DB" }));
    }

    #[test]
    fn credentials_need_both_halves() {
        let config = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://couch:5984"),
            ("COUCH_DB", "league"),
            ("COUCH_USERNAME", "admin"),
            ("COUCH_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert!(config.credentials.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }
}
