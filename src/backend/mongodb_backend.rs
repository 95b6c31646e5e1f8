use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, FindOneOptions};
use mongodb::{Client, ClientSession, Collection};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Backend, BackendError, Connection, Snapshot};

/// The config struct for MongoDB connections.
/// Contains the URI, database name and the collection holding one document per run.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct MongoDBConfig {
    pub uri: String,
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    "nightly_metrics".to_string()
}

/// A concrete `Backend` that reads snapshots from MongoDB.
///
/// Each run is one document shaped like [`Snapshot`] (timestamps as RFC 3339 strings).
/// The latest run is the document with the highest `run_id`.
pub struct MongoBackend {
    client: Client,
    collection: Collection<Snapshot>,
}

/// A client session checked out of the driver pool; returned to it on drop.
struct MongoConnection {
    session: ClientSession,
    collection: Collection<Snapshot>,
}

impl MongoBackend {
    /// Creates a new `MongoBackend` from the given config.
    /// The driver connects lazily, so an unreachable server surfaces on the first scrape.
    pub async fn new(config: &MongoDBConfig) -> Result<Self, String> {
        info!("Connecting to MongoDB at URI: {}", config.uri);

        let mut client_options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| format!("Failed to parse MongoDB URI: {}", e))?;
        client_options.app_name = Some("nightly-exporter".to_string());

        let client = Client::with_options(client_options)
            .map_err(|e| format!("Failed to create MongoDB client: {}", e))?;

        let collection = client
            .database(&config.database)
            .collection::<Snapshot>(&config.collection);

        Ok(Self { client, collection })
    }

    fn latest_run() -> FindOneOptions {
        FindOneOptions::builder().sort(doc! { "run_id": -1 }).build()
    }
}

fn query_error(e: MongoError) -> BackendError {
    match *e.kind {
        ErrorKind::BsonDeserialization(ref inner) => BackendError::Decode(inner.to_string()),
        _ => BackendError::Query(e.to_string()),
    }
}

#[async_trait]
impl Backend for MongoBackend {
    async fn connect(&self) -> Result<Box<dyn Connection>, BackendError> {
        let session = self
            .client
            .start_session(None)
            .await
            .map_err(|e| BackendError::Connect(e.to_string()))?;

        Ok(Box::new(MongoConnection {
            session,
            collection: self.collection.clone(),
        }))
    }

    fn get_name(&self) -> &str {
        "mongo"
    }
}

#[async_trait]
impl Connection for MongoConnection {
    async fn get_metrics(&mut self) -> Result<Option<Snapshot>, BackendError> {
        let snapshot = self
            .collection
            .find_one_with_session(None, MongoBackend::latest_run(), &mut self.session)
            .await
            .map_err(query_error)?;

        match &snapshot {
            Some(s) => debug!(run_id = s.run_id, "Fetched latest nightly run"),
            None => debug!("No nightly run stored yet"),
        }

        Ok(snapshot)
    }
}
