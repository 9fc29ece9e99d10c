use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection as MongoCollection, Database, IndexModel, bson::doc, options::IndexOptions};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoDocument, doc_id, filter_document, set_document, sort_document},
};
use crate::dao::{
    document_store::{Collection, Document, DocumentStore, Query},
    storage::StorageResult,
};

/// MongoDB-backed [`DocumentStore`]. Clones share the connection.
#[derive(Clone)]
pub struct MongoDocumentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept so the connection pool lives as long as the database handle.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoDocumentStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        // Playoff brackets are always read ordered by (round, matchNumber).
        let playoffs = self.collection(Collection::PlayoffMatches).await;
        let bracket_index = IndexModel::builder()
            .keys(doc! {"round": 1, "matchNumber": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("playoff_round_match_idx".to_owned()))
                    .build(),
            )
            .build();
        playoffs
            .create_index(bracket_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: Collection::PlayoffMatches,
                index: "round,matchNumber",
                source,
            })?;

        let insights = self.collection(Collection::Insights).await;
        let related_index = IndexModel::builder()
            .keys(doc! {"type": 1, "relatedId": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("insight_related_idx".to_owned()))
                    .build(),
            )
            .build();
        insights
            .create_index(related_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: Collection::Insights,
                index: "type,relatedId",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self, collection: Collection) -> MongoCollection<MongoDocument> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<MongoDocument>(collection.name())
    }

    async fn get_document(&self, collection: Collection, id: String) -> MongoResult<Document> {
        let handle = self.collection(collection).await;
        handle
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })?
            .map(Document::from)
            .ok_or(MongoDaoError::NotFound { collection, id })
    }

    async fn query_documents(&self, collection: Collection, query: Query) -> MongoResult<Vec<Document>> {
        let handle = self.collection(collection).await;
        let mut find = handle.find(filter_document(&query));
        if let Some(sort) = sort_document(&query) {
            find = find.sort(sort);
        }

        let documents: Vec<MongoDocument> = find
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })?;

        Ok(documents.into_iter().map(Document::from).collect())
    }

    async fn update_document(
        &self,
        collection: Collection,
        id: String,
        partial: Map<String, Value>,
    ) -> MongoResult<()> {
        let handle = self.collection(collection).await;
        let result = handle
            .update_one(doc_id(&id), set_document(&partial))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection,
                id: id.clone(),
                source,
            })?;

        if result.matched_count == 0 {
            return Err(MongoDaoError::NotFound { collection, id });
        }
        Ok(())
    }

    async fn insert_document(&self, collection: Collection, document: Document) -> MongoResult<()> {
        let handle = self.collection(collection).await;
        let id = document.id.clone();
        let document = MongoDocument::from(document);
        handle
            .replace_one(doc_id(&id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection,
                id,
                source,
            })?;
        Ok(())
    }
}

impl DocumentStore for MongoDocumentStore {
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
            store
                .query_documents(collection, query)
                .await
                .map_err(Into::into)
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
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
