use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dao::document_store::{Collection, Document};

/// Separator between the collection prefix and the document id.
pub const ID_SEPARATOR: &str = "::";
/// Highest code point; bounds `_all_docs` range scans to one prefix.
pub const END_SUFFIX: &str = "\u{ffff}";

/// All collections share one CouchDB database; ids are namespaced per collection.
pub fn doc_id(collection: Collection, id: &str) -> String {
    format!("{}{}{}", collection.name(), ID_SEPARATOR, id)
}

/// Leading part shared by every id of `collection`.
pub fn collection_prefix(collection: Collection) -> String {
    format!("{}{}", collection.name(), ID_SEPARATOR)
}

/// Body of `GET _all_docs`.
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    /// One row per matching id.
    pub rows: Vec<AllDocsRow>,
}

/// Single `_all_docs` row.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    /// Full document, present with `include_docs=true`.
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Stored document as CouchDB sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument {
    /// Namespaced id, see [`doc_id`].
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision the next write must quote.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Every other field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CouchDocument {
    /// Wrap `document` for `collection`, quoting `rev` when updating.
    pub fn from_document(collection: Collection, document: Document, rev: Option<String>) -> Self {
        Self {
            id: doc_id(collection, &document.id),
            rev,
            fields: document.fields,
        }
    }

    /// Strip the collection namespace and CouchDB bookkeeping fields.
    pub fn into_document(self, collection: Collection) -> Document {
        let prefix = collection_prefix(collection);
        let id = self
            .id
            .strip_prefix(prefix.as_str())
            .map(str::to_owned)
            .unwrap_or(self.id);
        let fields = self
            .fields
            .into_iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .collect();
        Document { id, fields }
    }
}
