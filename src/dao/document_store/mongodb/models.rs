use mongodb::bson::{Bson, Document as BsonDocument, doc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dao::document_store::{Document, Query, SortOrder};

/// Wire shape of a league document inside MongoDB: string `_id` plus free-form fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl From<Document> for MongoDocument {
    fn from(value: Document) -> Self {
        Self {
            id: value.id,
            fields: value.fields,
        }
    }
}

impl From<MongoDocument> for Document {
    fn from(value: MongoDocument) -> Self {
        Self {
            id: value.id,
            fields: value.fields,
        }
    }
}

/// Filter selecting the document with `_id == id`.
pub fn doc_id(id: &str) -> BsonDocument {
    doc! {"_id": id}
}

/// Translate the equality predicates of `query` into a MongoDB filter.
pub fn filter_document(query: &Query) -> BsonDocument {
    let mut filter = BsonDocument::new();
    for (field, value) in query.filters() {
        let key = if field == "id" { "_id" } else { field.as_str() };
        filter.insert(key, json_to_bson(value));
    }
    filter
}

/// Translate the ordering of `query` into a MongoDB sort specification.
pub fn sort_document(query: &Query) -> Option<BsonDocument> {
    if query.ordering().is_empty() {
        return None;
    }
    let mut sort = BsonDocument::new();
    for (field, order) in query.ordering() {
        let direction = match order {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        };
        sort.insert(field.as_str(), direction);
    }
    // Stable order for equal keys.
    sort.insert("_id", 1);
    Some(sort)
}

/// `$set` update document merging the given top-level fields.
pub fn set_document(partial: &Map<String, Value>) -> BsonDocument {
    let mut fields = BsonDocument::new();
    for (key, value) in partial {
        fields.insert(key.as_str(), json_to_bson(value));
    }
    doc! {"$set": fields}
}

fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(flag) => Bson::Boolean(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Bson::Int64(int),
            None => Bson::Double(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => Bson::String(text.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => {
            let mut document = BsonDocument::new();
            for (key, value) in map {
                document.insert(key.as_str(), json_to_bson(value));
            }
            Bson::Document(document)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_maps_id_to_primary_key() {
        let query = Query::all().where_eq("id", "league").where_eq("active", true);
        let filter = filter_document(&query);
        assert_eq!(filter, doc! {"_id": "league", "active": true});
    }

    #[test]
    fn sort_keeps_precedence_and_ties_on_id() {
        let query = Query::all()
            .order_by("round", SortOrder::Ascending)
            .order_by("matchNumber", SortOrder::Descending);
        let sort = sort_document(&query).unwrap();
        assert_eq!(sort, doc! {"round": 1, "matchNumber": -1, "_id": 1});
        assert!(sort_document(&Query::all()).is_none());
    }
}
