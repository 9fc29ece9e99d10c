use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value};
use tracing::debug;
use url::Url;

use crate::dao::{
    document_store::{Collection, Document, DocumentStore, Query},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchDocument, END_SUFFIX, collection_prefix, doc_id},
};

/// CouchDB-backed [`DocumentStore`]. Queries filter and sort client-side.
#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    database_url: Arc<Url>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchDocumentStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let database_url = Arc::new(database_url(&config.base_url, &config.database)?);
        let database = Arc::<str>::from(config.database);
        let auth = config
            .credentials
            .map(|creds| (Arc::<str>::from(creds.username), Arc::<str>::from(creds.password)));

        let store = Self {
            client,
            database_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.authorized(self.client.request(method, document_url(&self.database_url, path)))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = Url::clone(&self.database_url);

        let response = self
            .authorized(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: url.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorized(self.client.put(url.clone()))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::Transport {
                        path: url.to_string(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::Database {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::Database {
                database,
                status: other,
            }),
        }
    }

    async fn get_raw<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::Decode {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::from_status(doc_id.to_string(), other)),
        }
    }

    async fn put_raw<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::from_status(
                doc_id.to_string(),
                response.status(),
            ))
        }
    }

    async fn list_collection(&self, collection: Collection) -> CouchResult<Vec<Document>> {
        const ALL_DOCS: &str = "_all_docs";
        let prefix = collection_prefix(collection);
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::from_status(
                ALL_DOCS.to_string(),
                response.status(),
            ));
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::Decode {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::with_capacity(payload.rows.len());
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed: CouchDocument =
                    from_value(doc).map_err(|source| CouchDaoError::Malformed {
                        path: ALL_DOCS.to_string(),
                        source,
                    })?;
                documents.push(parsed.into_document(collection));
            }
        }

        Ok(documents)
    }

    async fn get_document(&self, collection: Collection, id: String) -> CouchResult<Document> {
        self.get_raw::<CouchDocument>(&doc_id(collection, &id))
            .await?
            .map(|doc| doc.into_document(collection))
            .ok_or(CouchDaoError::NotFound { collection, id })
    }

    async fn update_document(
        &self,
        collection: Collection,
        id: String,
        partial: Map<String, Value>,
    ) -> CouchResult<()> {
        let couch_id = doc_id(collection, &id);
        let mut retried = false;
        loop {
            let Some(existing) = self.get_raw::<CouchDocument>(&couch_id).await? else {
                return Err(CouchDaoError::NotFound { collection, id });
            };

            let rev = existing.rev.clone();
            let mut document = existing.into_document(collection);
            document.merge(partial.clone());
            match self
                .put_raw(&couch_id, &CouchDocument::from_document(collection, document, rev))
                .await
            {
                Err(CouchDaoError::Conflict { .. }) if !retried => {
                    debug!(%couch_id, "revision conflict; re-reading before retry");
                    retried = true;
                }
                result => return result,
            }
        }
    }

    async fn insert_document(&self, collection: Collection, document: Document) -> CouchResult<()> {
        let couch_id = doc_id(collection, &document.id);
        let rev = self
            .get_raw::<CouchDocument>(&couch_id)
            .await?
            .and_then(|existing| existing.rev);
        self.put_raw(&couch_id, &CouchDocument::from_document(collection, document, rev))
            .await
    }
}

impl DocumentStore for CouchDocumentStore {
    fn get(&self, collection: Collection, id: &str) -> BoxFuture<'static, StorageResult<Document>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { store.get_document(collection, id).await.map_err(Into::into) })
    }

    fn query(
        &self,
        collection: Collection,
        query: Query,
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store.list_collection(collection).await?;
            Ok(query.apply(documents))
        })
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            store
                .update_document(collection, id, partial)
                .await
                .map_err(Into::into)
        })
    }

    fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_document(collection, document)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = Url::clone(&store.database_url);
            let response = store
                .authorized(store.client.get(url.clone()))
                .send()
                .await
                .map_err(|source| CouchDaoError::Transport {
                    path: url.to_string(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::from_status(url.to_string(), response.status()).into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

/// `base_url` with `database` appended as one path segment.
fn database_url(base_url: &str, database: &str) -> CouchResult<Url> {
    let invalid = |reason: String| CouchDaoError::InvalidUrl {
        url: base_url.to_owned(),
        reason,
    };
    let mut url = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("not a hierarchical url".into()))?
        .pop_if_empty()
        .push(database);
    Ok(url)
}

/// Append `path` as a single percent-encoded segment, so ids containing
/// `/`, `?`, `#` or `%` address exactly one document.
fn document_url(database_url: &Url, path: &str) -> Url {
    let mut url = database_url.clone();
    // `database_url` was built through `path_segments_mut`, so this cannot fail.
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::document_store::{Collection, couchdb::models::doc_id};

    #[test]
    fn database_is_appended_to_base_path() {
        let url = database_url("http://couch:5984/", "league").unwrap();
        assert_eq!(url.as_str(), "http://couch:5984/league");

        let url = database_url("http://proxy/couch", "league").unwrap();
        assert_eq!(url.as_str(), "http://proxy/couch/league");

        assert!(matches!(
            database_url("couch:5984", "league"),
            Err(CouchDaoError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn document_ids_are_encoded_as_one_segment() {
        let base = database_url("http://couch:5984", "league").unwrap();
        let url = document_url(&base, &doc_id(Collection::Teams, "a/b?c#d%e"));
        assert_eq!(url.path(), "/league/teams::a%2Fb%3Fc%23d%25e");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = document_url(&base, "_all_docs");
        assert_eq!(url.as_str(), "http://couch:5984/league/_all_docs");
    }
}
