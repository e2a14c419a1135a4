use diesel_async::pooled_connection::deadpool::BuildError;
use diesel_async::pooled_connection::deadpool::PoolError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DatabaseError {
    #[error("Internal database error: {0}")]
    BackendError(#[from] diesel::result::Error),

    #[error("Failed to connect to database: {0}")]
    ConnectionError(#[from] diesel::ConnectionError),

    #[error("Database pool error: {0}")]
    PoolError(#[from] PoolError),

    #[error("Failed to build database pool: {0}")]
    PoolBuildError(#[from] BuildError),

    #[error("Migration failed: {message}")]
    MigrationError { message: String },

    #[error("Internal database error: {message}")]
    InternalError { message: String },
}
