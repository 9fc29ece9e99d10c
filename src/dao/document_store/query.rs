use std::cmp::Ordering;

use serde_json::Value;

use super::Document;

/// Sort direction for a query field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Conjunction of field-equality predicates plus an ordering.
///
/// Backends with native query support translate it; the others filter and
/// sort in memory through [`Query::matches`] and [`Query::sort`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
    order: Vec<(String, SortOrder)>,
}

impl Query {
    /// Query matching every document, unordered.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict results to documents whose `field` equals `value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Append an ordering key; earlier keys take precedence.
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order.push((field.into(), order));
        self
    }

    /// Equality predicates in insertion order.
    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    /// Ordering keys in precedence order.
    pub fn ordering(&self) -> &[(String, SortOrder)] {
        &self.order
    }

    /// Whether `document` satisfies every predicate. `id` addresses the identifier.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|(field, expected)| {
            if field == "id" {
                return expected.as_str() == Some(document.id.as_str());
            }
            document.field(field) == Some(expected)
        })
    }

    /// Sort `documents` by the ordering keys, breaking ties by id.
    pub fn sort(&self, documents: &mut [Document]) {
        documents.sort_by(|a, b| {
            for (field, order) in &self.order {
                let ordering = compare_values(a.field(field), b.field(field));
                let ordering = match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.id.cmp(&b.id)
        });
    }

    /// Filter then sort an unordered set of documents.
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut selected: Vec<Document> =
            documents.into_iter().filter(|doc| self.matches(doc)).collect();
        self.sort(&mut selected);
        selected
    }
}

/// Missing fields sort first, then null, booleans, numbers, strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn playoff(id: &str, round: u32, number: u32) -> Document {
        Document::new(id, json!({"round": round, "matchNumber": number}))
    }

    #[test]
    fn filters_by_every_predicate() {
        let query = Query::all()
            .where_eq("type", "match")
            .where_eq("relatedId", "m1");
        let hit = Document::new("i1", json!({"type": "match", "relatedId": "m1"}));
        let other_match = Document::new("i2", json!({"type": "match", "relatedId": "m2"}));
        let other_type = Document::new("i3", json!({"type": "team", "relatedId": "m1"}));

        assert!(query.matches(&hit));
        assert!(!query.matches(&other_match));
        assert!(!query.matches(&other_type));
    }

    #[test]
    fn orders_by_composite_key() {
        let query = Query::all()
            .order_by("round", SortOrder::Ascending)
            .order_by("matchNumber", SortOrder::Ascending);
        let docs = vec![
            playoff("c", 2, 1),
            playoff("b", 1, 2),
            playoff("a", 1, 1),
            playoff("d", 10, 1),
        ];

        let ids: Vec<_> = query.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }

    #[test]
    fn descending_order_reverses() {
        let query = Query::all().order_by("date", SortOrder::Descending);
        let docs = vec![
            Document::new("old", json!({"date": "2024-03-01"})),
            Document::new("new", json!({"date": "2024-05-01"})),
        ];

        let ids: Vec<_> = query.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["new", "old"]);
    }

    #[test]
    fn id_predicate_targets_identifier() {
        let query = Query::all().where_eq("id", "league");
        assert!(query.matches(&Document::new("league", json!({}))));
        assert!(!query.matches(&Document::new("other", json!({}))));
    }
}
