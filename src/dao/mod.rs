pub mod customers;

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Opens the connection pool for the billing database, creating the file if it does not exist.
 *
 * #Arguments
 * `file`: Path to the `SQLite` database file.
 * `max_connections`: Pool size. One connection keeps all access serialized.
 * `acquire_timeout`: Milliseconds to wait for a free connection.
 * `idle_timeout`: Milliseconds an unused connection is kept open.
 *
 * #Returns
 * The connection pool or an `ApplicationError` if the database can not be opened.
 */
pub async fn init_pool(file: &str, max_connections: u32, acquire_timeout: u64, idle_timeout: u64) -> Result<Pool<Sqlite>, ApplicationError> {
    let connect_options = SqliteConnectOptions::new().filename(file).create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_millis(acquire_timeout))
        .idle_timeout(Duration::from_millis(idle_timeout))
        .connect_with(connect_options)
        .await
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to open database {file}: {err}")))
}
