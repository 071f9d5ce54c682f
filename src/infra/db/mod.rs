//! Database connection and initialization.

use mongodb::{bson::doc, Client, Collection};

use crate::config::{Config, COLLECTION_CONSULTATIONS, COLLECTION_USERS};
use crate::errors::AppResult;
use crate::infra::repositories::entities::{ConsultationDocument, UserDocument};

mod indexes;

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect, verify the deployment answers a ping and create indexes.
    ///
    /// The database named in the connection string wins over
    /// `MONGODB_DATABASE`.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let database = Self::connect_without_indexes(config).await?;

        match database.ping().await {
            Ok(()) => tracing::info!(db = %database.name(), "Successfully connected to MongoDB"),
            Err(e) => {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                return Err(e);
            }
        }

        indexes::ensure(&database.db).await?;
        tracing::info!("MongoDB indexes ensured");

        Ok(database)
    }

    /// Build the client without touching the server.
    pub async fn connect_without_indexes(config: &Config) -> AppResult<Self> {
        let client = Client::with_uri_str(config.mongodb_uri()).await?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(&config.mongodb_database));
        Ok(Self { db })
    }

    pub fn name(&self) -> &str {
        self.db.name()
    }

    pub fn users(&self) -> Collection<UserDocument> {
        self.db.collection(COLLECTION_USERS)
    }

    pub fn consultations(&self) -> Collection<ConsultationDocument> {
        self.db.collection(COLLECTION_CONSULTATIONS)
    }

    /// Check database connectivity.
    pub async fn ping(&self) -> AppResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
