use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::SqliteConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{BillingRecord, CustomerDbResp},
};

/**
 * SQL statement creating the customers table on first launch.
 */
const CREATE_CUSTOMERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS customers (
                                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                                        name TEXT NOT NULL,
                                        units INTEGER NOT NULL,
                                        total_bill REAL NOT NULL)";

/**
 * SQL query to add a new bill.
 */
const INSERT_CUSTOMER: &str = "INSERT INTO customers (name, units, total_bill) VALUES (?1, ?2, ?3)";

/**
 * SQL query to update an existing bill.
 */
const UPDATE_CUSTOMER: &str = "UPDATE customers SET name = ?1, units = ?2, total_bill = ?3 WHERE id = ?4";

/**
 * SQL query to delete a bill.
 */
const DELETE_CUSTOMER: &str = "DELETE FROM customers WHERE id = ?1";

/**
 * SQL query to delete all bills.
 */
const DELETE_ALL_CUSTOMERS: &str = "DELETE FROM customers";

/**
 * SQL query to retrieve all bills in insertion order.
 */
const QUERY_CUSTOMERS_LIST: &str = "SELECT id, name, units, total_bill FROM customers ORDER BY id";

/**
 * SQL query to retrieve a single bill.
 */
const QUERY_CUSTOMER: &str = "SELECT id, name, units, total_bill FROM customers WHERE id = ?1";

/**
 * DAO for the customers table holding billing records.
 */
pub struct CustomerDao {}

impl CustomerDao {
    /**
     * Creates a new instance of `CustomerDao`.
     *
     * #Returns
     * A new instance of `CustomerDao`.
     */
    pub fn new() -> Self {
        CustomerDao {}
    }

    /**
     * Creates the customers table if it is missing.
     *
     * #Arguments
     * `connection`: The database connection.
     */
    #[instrument(skip(self, connection))]
    pub async fn create_schema(&self, connection: &mut SqliteConnection) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query(CREATE_CUSTOMERS_TABLE)
            .execute(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "create customers table"))?;
        Ok(())
    }

    /**
     * Adds a new bill.
     *
     * #Arguments
     * `connection`: The database connection.
     * `name`: Customer name.
     * `units`: Units consumed.
     * `total`: Calculated total.
     *
     * #Returns
     * The id assigned by the database.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn insert(&self, connection: &mut SqliteConnection, name: &str, units: i64, total: Decimal) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(INSERT_CUSTOMER)
            .bind(name)
            .bind(units)
            .bind(Self::to_real(total)?)
            .execute(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "insert bill"))?;
        Ok(result.last_insert_rowid())
    }

    /**
     * Rewrites name, units and total of an existing bill. Never creates a new row.
     *
     * #Arguments
     * `connection`: The database connection.
     * `id`: Id of the bill to update.
     * `name`: Customer name.
     * `units`: Units consumed.
     * `total`: Calculated total.
     *
     * #Returns
     * A result indicating success, or `NotFound` if no bill has the id.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn update(&self, connection: &mut SqliteConnection, id: i64, name: &str, units: i64, total: Decimal) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_CUSTOMER)
            .bind(name)
            .bind(units)
            .bind(Self::to_real(total)?)
            .bind(id)
            .execute(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "update bill"))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Bill with id {} not found for update", id);
            return Err(ApplicationError::new(ErrorType::NotFound, format!("Bill ID {id} not found")));
        }
        Ok(())
    }

    /**
     * Deletes a bill by its id.
     *
     * #Arguments
     * `connection`: The database connection.
     * `id`: Id of the bill to delete.
     *
     * #Returns
     * A result indicating success, or `NotFound` if no bill has the id.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn delete(&self, connection: &mut SqliteConnection, id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_CUSTOMER)
            .bind(id)
            .execute(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "delete bill"))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Bill with id {} not found for deletion", id);
            return Err(ApplicationError::new(ErrorType::NotFound, format!("Bill ID {id} not found")));
        }
        Ok(())
    }

    /**
     * Deletes every bill. Succeeds on an empty table.
     *
     * #Arguments
     * `connection`: The database connection.
     *
     * #Returns
     * The number of deleted bills.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn clear_all(&self, connection: &mut SqliteConnection) -> Result<u64, ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_ALL_CUSTOMERS)
            .execute(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "delete all bills"))?;
        Ok(result.rows_affected())
    }

    /**
     * Retrieves all bills ordered by id.
     *
     * #Arguments
     * `connection`: The database connection.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn list_all(&self, connection: &mut SqliteConnection) -> Result<Vec<BillingRecord>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<CustomerDbResp> = sqlx::query_as(QUERY_CUSTOMERS_LIST)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "list bills"))?;
        results.into_iter().map(BillingRecord::try_from).collect()
    }

    /**
     * Retrieves a single bill.
     *
     * #Arguments
     * `connection`: The database connection.
     * `id`: Id of the bill.
     *
     * #Returns
     * The bill, or `NotFound` if no bill has the id.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get(&self, connection: &mut SqliteConnection, id: i64) -> Result<BillingRecord, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<CustomerDbResp> = sqlx::query_as(QUERY_CUSTOMER)
            .bind(id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "get bill"))?;
        match result {
            Some(row) => BillingRecord::try_from(row),
            None => {
                tracing::debug!("Bill with id {} not found", id);
                Err(ApplicationError::new(ErrorType::NotFound, format!("Bill ID {id} not found")))
            }
        }
    }

    /**
     * Converts a total to the REAL stored in the `total_bill` column. Totals that would not read back as the same value are rejected.
     *
     * #Arguments
     * `total`: The computed bill.
     *
     * #Returns
     * The exact REAL value, or a validation error.
     */
    fn to_real(total: Decimal) -> Result<f64, ApplicationError> {
        match total.to_f64() {
            Some(real) if Decimal::try_from(real).ok() == Some(total) => Ok(real),
            _ => {
                tracing::debug!("Total {} can not be stored exactly", total);
                Err(ApplicationError::new(ErrorType::Validation, format!("Total {total} can not be stored exactly")))
            }
        }
    }

    /**
     * Maps a sqlx error to an application error.
     *
     * #Arguments
     * `error`: The sqlx error.
     * `operation`: Short description of the failed operation.
     */
    fn handle_database_error(error: &sqlx::Error, operation: &str) -> ApplicationError {
        tracing::error!("Failed to {}: {}", operation, error);
        ApplicationError::new(ErrorType::DatabaseError, format!("Failed to {operation}: {error}"))
    }
}
