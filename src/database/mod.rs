use std::sync::Arc;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_migrations::EmbeddedMigrations;
use diesel_migrations::MigrationHarness;
use diesel_migrations::embed_migrations;
use log::debug;
use log::info;

use crate::database::error::DatabaseError;
use crate::database::table::FeatureChannelTable;
use crate::database::table::PgFeatureChannelTable;
use crate::database::table::PgShiftRegisterTable;
use crate::database::table::PgTeamRegisterTable;
use crate::database::table::ShiftRegisterTable;
use crate::database::table::TeamRegisterTable;

pub mod error;
pub mod model;
pub mod schema;
pub mod table;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const POOL_MAX_SIZE: usize = 8;

pub struct Database {
    pub feature_channel_table: Arc<dyn FeatureChannelTable>,
    pub team_register_table: Arc<dyn TeamRegisterTable>,
    pub shift_register_table: Arc<dyn ShiftRegisterTable>,
}

impl Database {
    /// Connects a pooled PostgreSQL database.
    pub async fn new(db_url: &str) -> Result<Self, DatabaseError> {
        debug!("Connecting to db...");
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
        let pool = Pool::builder(manager).max_size(POOL_MAX_SIZE).build()?;

        // Fail at startup instead of on the first command.
        drop(pool.get().await?);
        info!("Connected to db.");

        Ok(Self::from_tables(
            Arc::new(PgFeatureChannelTable::new(pool.clone())),
            Arc::new(PgTeamRegisterTable::new(pool.clone())),
            Arc::new(PgShiftRegisterTable::new(pool)),
        ))
    }

    pub fn from_tables(
        feature_channel_table: Arc<dyn FeatureChannelTable>,
        team_register_table: Arc<dyn TeamRegisterTable>,
        shift_register_table: Arc<dyn ShiftRegisterTable>,
    ) -> Self {
        Self {
            feature_channel_table,
            team_register_table,
            shift_register_table,
        }
    }
}

/// Applies pending embedded migrations on a blocking connection.
pub async fn run_migrations(db_url: &str) -> Result<(), DatabaseError> {
    let db_url = db_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&db_url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DatabaseError::MigrationError {
                message: e.to_string(),
            })?;
        for version in &applied {
            info!("Applied migration {version}");
        }
        Ok(())
    })
    .await
    .map_err(|e| DatabaseError::InternalError {
        message: format!("Migration task failed: {e}"),
    })?
}
