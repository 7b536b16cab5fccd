//! MongoDB connection and typed collections
//!
//! Every schema names its collection and indexes through [`MongoSchema`].
//! Reads and updates through [`MongoCollection`] never see soft-deleted
//! documents.

use bson::{doc, oid::ObjectId, Document};
use mongodb::{
    options::{ClientOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::db::schemas::Metadata;
use crate::types::OdontoError;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(3);

/// A document type with its own collection
pub trait MongoSchema: Serialize + DeserializeOwned + Unpin + Send + Sync {
    const COLLECTION: &'static str;

    /// Indexes created when the collection is first opened
    fn indexes() -> Vec<IndexModel> {
        Vec::new()
    }

    fn metadata_mut(&mut self) -> &mut Metadata;
}

/// Shorthand for a named ascending index
pub(crate) fn ascending_index(field: &str, name: &str, unique: bool) -> IndexModel {
    let options = mongodb::options::IndexOptions::builder()
        .name(name.to_string())
        .unique(unique.then_some(true))
        .build();
    IndexModel::builder()
        .keys(doc! { field: 1 })
        .options(options)
        .build()
}

fn live(mut filter: Document) -> Document {
    filter.insert("metadata.is_deleted", doc! { "$ne": true });
    filter
}

#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping, giving up quickly when the server is unreachable
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, OdontoError> {
        info!("Connecting to MongoDB at {}", uri);

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| OdontoError::Database(format!("Invalid MongoDB URI: {}", e)))?;
        options.app_name = Some("odontolegal".into());
        options.server_selection_timeout = Some(STARTUP_TIMEOUT);
        options.connect_timeout = Some(STARTUP_TIMEOUT);

        let client = Client::with_options(options)
            .map_err(|e| OdontoError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| OdontoError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Open the collection for `T`, creating its indexes
    pub async fn collection<T: MongoSchema>(&self) -> Result<MongoCollection<T>, OdontoError> {
        let inner = self.client.database(&self.db_name).collection::<T>(T::COLLECTION);

        let indexes = T::indexes();
        if !indexes.is_empty() {
            inner.create_indexes(indexes).await.map_err(|e| {
                OdontoError::Database(format!("Failed to create indexes on {}: {}", T::COLLECTION, e))
            })?;
            debug!(collection = T::COLLECTION, "Indexes ensured");
        }

        Ok(MongoCollection { inner })
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed collection that hides soft-deleted documents
#[derive(Debug, Clone)]
pub struct MongoCollection<T: MongoSchema> {
    inner: Collection<T>,
}

impl<T: MongoSchema> MongoCollection<T> {
    /// Insert with fresh metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, OdontoError> {
        *item.metadata_mut() = Metadata::new();

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| OdontoError::Database(format!("Insert into {} failed: {}", T::COLLECTION, e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| OdontoError::Database("Inserted id is not an ObjectId".into()))
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, OdontoError> {
        self.inner
            .find_one(live(filter))
            .await
            .map_err(|e| OdontoError::Database(format!("Find in {} failed: {}", T::COLLECTION, e)))
    }

    /// Find by hex ObjectId. Malformed ids are treated as absent.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, OdontoError> {
        match ObjectId::parse_str(id) {
            Ok(oid) => self.find_one(doc! { "_id": oid }).await,
            Err(_) => Ok(None),
        }
    }

    /// Update at most one document matching `filter`.
    ///
    /// Callers detect a lost condition through `matched_count`.
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, OdontoError> {
        self.inner
            .update_one(live(filter), update.into())
            .await
            .map_err(|e| OdontoError::Database(format!("Update in {} failed: {}", T::COLLECTION, e)))
    }
}
