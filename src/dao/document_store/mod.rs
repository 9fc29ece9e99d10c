/// CouchDB backend over its HTTP API.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
/// MongoDB backend using the official driver.
#[cfg(feature = "mongo-store")]
pub mod mongodb;
mod query;

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dao::storage::StorageResult;

pub use self::query::{Query, SortOrder};

/// Collections known to the league backend. Names are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// Clubs and their rosters.
    #[serde(rename = "teams")]
    Teams,
    /// Regular-season fixtures.
    #[serde(rename = "matches")]
    Matches,
    /// Accounts and roles.
    #[serde(rename = "users")]
    Users,
    /// The league settings singleton.
    #[serde(rename = "settings")]
    Settings,
    /// Generated summaries.
    #[serde(rename = "insights")]
    Insights,
    /// Knockout fixtures.
    #[serde(rename = "playoffMatches")]
    PlayoffMatches,
}

impl Collection {
    /// Every collection, in declaration order.
    pub const ALL: [Collection; 6] = [
        Collection::Teams,
        Collection::Matches,
        Collection::Users,
        Collection::Settings,
        Collection::Insights,
        Collection::PlayoffMatches,
    ];

    /// Name of the collection inside the remote store.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Teams => "teams",
            Collection::Matches => "matches",
            Collection::Users => "users",
            Collection::Settings => "settings",
            Collection::Insights => "insights",
            Collection::PlayoffMatches => "playoffMatches",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw document as exchanged with the remote store: an id plus top-level fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier, unique within its collection.
    pub id: String,
    /// Top-level fields, excluding the identifier.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Build a document from an id and a JSON object. Non-object values yield no fields.
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Shallow-merge `partial` into this document, overwriting existing keys.
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (key, value) in partial {
            self.fields.insert(key, value);
        }
    }

    /// JSON object view including the identifier under `id`.
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".to_owned(), Value::String(self.id.clone()));
        Value::Object(object)
    }
}

/// Abstraction over the remote document database.
///
/// Every call is a single remote request; implementations never retry on
/// their own and never roll back local state on failure.
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document, failing with `NotFound` when it is absent.
    fn get(&self, collection: Collection, id: &str) -> BoxFuture<'static, StorageResult<Document>>;
    /// Fetch every document matching `query`, in the query's order.
    fn query(
        &self,
        collection: Collection,
        query: Query,
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>>;
    /// Shallow-merge `partial` into an existing document.
    fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Create or replace a document.
    fn insert(&self, collection: Collection, document: Document)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round-trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the underlying connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_only_given_keys() {
        let mut doc = Document::new("u1", json!({"email": "a@b.c", "role": "user"}));
        let partial = json!({"role": "admin", "active": true});
        let Value::Object(partial) = partial else {
            unreachable!()
        };
        doc.merge(partial);

        assert_eq!(doc.field("email"), Some(&json!("a@b.c")));
        assert_eq!(doc.field("role"), Some(&json!("admin")));
        assert_eq!(doc.field("active"), Some(&json!(true)));
    }

    #[test]
    fn to_value_exposes_id() {
        let doc = Document::new("t1", json!({"name": "Rovers"}));
        assert_eq!(doc.to_value(), json!({"id": "t1", "name": "Rovers"}));
    }

    #[test]
    fn collection_names_match_wire_contract() {
        let names: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            ["teams", "matches", "users", "settings", "insights", "playoffMatches"]
        );
    }
}
