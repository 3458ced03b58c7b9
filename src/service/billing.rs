use sqlx::pool::PoolConnection;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::{
    dao::customers::CustomerDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{BillingRecord, PrintOutcome},
        tariff::Tariff,
    },
    service::{receipt::ReceiptGenerator, validation::validate},
};

/**
 * Represents the service for managing electricity bills.
 */
pub struct BillingService {
    /**
     * The DAO for the customers table.
     */
    customer_dao: CustomerDao,
    /**
     * Connection pool for database operations.
     */
    connection_pool: Pool<Sqlite>,
    /**
     * Tariff used for calculating totals.
     */
    tariff: Tariff,
    /**
     * Generator for printed bill slips.
     */
    receipt_generator: ReceiptGenerator,
}

impl BillingService {
    /**
     * Creates a new instance of `BillingService`.
     *
     * #Arguments
     * `customer_dao`: The DAO for the customers table.
     * `connection_pool`: Connection pool for database operations.
     * `tariff`: Tariff used for calculating totals.
     * `receipt_generator`: Generator for printed bill slips.
     *
     * #Returns
     * A new instance of `BillingService`.
     */
    pub fn new(customer_dao: CustomerDao, connection_pool: Pool<Sqlite>, tariff: Tariff, receipt_generator: ReceiptGenerator) -> Self {
        BillingService { customer_dao, connection_pool, tariff, receipt_generator }
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    /**
     * Creates the customers table if this is the first launch.
     */
    pub async fn init_schema(&self) -> Result<(), ApplicationError> {
        let mut connection = self.connection().await?;
        self.customer_dao.create_schema(&mut connection).await
    }

    /**
     * Validates the form, calculates the bill and stores it.
     *
     * #Arguments
     * `name`: Customer name as typed.
     * `units_text`: Units consumed as typed.
     *
     * #Returns
     * The stored record including its new id.
     */
    #[instrument(skip(self))]
    pub async fn add_bill(&self, name: &str, units_text: &str) -> Result<BillingRecord, ApplicationError> {
        let input = validate(name, units_text)?;
        let total = self.tariff.compute_bill(input.units)?;
        let mut connection = self.connection().await?;
        let id = self.customer_dao.insert(&mut connection, &input.name, input.units, total).await?;
        tracing::info!("Bill {} created for {}", id, input.name);
        Ok(BillingRecord::new(id, input.name, input.units, total))
    }

    /**
     * Validates the form, recalculates the bill and replaces the stored values of an existing bill.
     *
     * #Arguments
     * `id`: Id of the bill to update.
     * `name`: Customer name as typed.
     * `units_text`: Units consumed as typed.
     *
     * #Returns
     * The updated record, or `NotFound` if the id does not exist.
     */
    #[instrument(skip(self))]
    pub async fn update_bill(&self, id: i64, name: &str, units_text: &str) -> Result<BillingRecord, ApplicationError> {
        let input = validate(name, units_text)?;
        let total = self.tariff.compute_bill(input.units)?;
        let mut connection = self.connection().await?;
        self.customer_dao.update(&mut connection, id, &input.name, input.units, total).await?;
        tracing::info!("Bill {} updated", id);
        Ok(BillingRecord::new(id, input.name, input.units, total))
    }

    /**
     * Deletes a bill.
     *
     * #Arguments
     * `id`: Id of the bill to delete.
     */
    #[instrument(skip(self))]
    pub async fn delete_bill(&self, id: i64) -> Result<(), ApplicationError> {
        let mut connection = self.connection().await?;
        self.customer_dao.delete(&mut connection, id).await?;
        tracing::info!("Bill {} deleted", id);
        Ok(())
    }

    /**
     * Deletes all bills.
     *
     * #Returns
     * The number of deleted bills.
     */
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<u64, ApplicationError> {
        let mut connection = self.connection().await?;
        let deleted = self.customer_dao.clear_all(&mut connection).await?;
        tracing::info!("All bills deleted ({} rows)", deleted);
        Ok(deleted)
    }

    /**
     * Retrieves all bills in insertion order.
     */
    pub async fn list_bills(&self) -> Result<Vec<BillingRecord>, ApplicationError> {
        let mut connection = self.connection().await?;
        self.customer_dao.list_all(&mut connection).await
    }

    /**
     * Renders, saves and prints the slip for a bill.
     *
     * A printer failure does not fail the operation, it is returned as a warning.
     *
     * #Arguments
     * `id`: Id of the bill to print.
     *
     * #Returns
     * The saved file and receipt text, or `NotFound` / `Io` errors.
     */
    #[instrument(skip(self))]
    pub async fn print_bill(&self, id: i64) -> Result<PrintOutcome, ApplicationError> {
        let record = {
            let mut connection = self.connection().await?;
            self.customer_dao.get(&mut connection, id).await?
        };
        let receipt_text = self.receipt_generator.generate(&record);
        let file_path = self.receipt_generator.persist(&record, &receipt_text)?;
        let printer_warning = self.receipt_generator.dispatch_to_printer(&file_path);
        Ok(PrintOutcome { file_path, receipt_text, printer_warning })
    }

    /**
     * Acquires a connection for a single operation. It is returned to the pool when dropped.
     */
    async fn connection(&self) -> Result<PoolConnection<Sqlite>, ApplicationError> {
        self.connection_pool.acquire().await.map_err(|err| {
            tracing::error!("Failed to acquire database connection: {}", err);
            ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire database connection: {err}"))
        })
    }
}

#[cfg(test)]
pub mod test {
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::*;
    use crate::dao::init_pool;
    use crate::service::receipt::{Printer, test::RecordingPrinter};

    /**
     * Builds a service over a fresh database and receipt directory inside `dir`.
     */
    pub async fn init_service(dir: &TempDir, printer: Option<Box<dyn Printer>>) -> BillingService {
        let file = dir.path().join("billing.db");
        let pool = init_pool(file.to_str().unwrap(), 1, 1000, 60000).await.unwrap();
        let tariff = Tariff::new(Decimal::from(6), "₹".to_string());
        let receipt_generator = ReceiptGenerator::new(tariff.clone(), dir.path().to_path_buf(), "Bill_".to_string(), "txt".to_string(), printer);
        let service = BillingService::new(CustomerDao::new(), pool, tariff, receipt_generator);
        service.init_schema().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_add_bill_computes_total() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, None).await;
        let record = service.add_bill("Alice", "100").await.unwrap();
        assert_eq!(record.total_amount, Decimal::from(600));
        assert_eq!(service.list_bills().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_add_bill_with_total_beyond_real_precision() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, None).await;
        for units_text in ["9999999999999999", "9223372036854775807"] {
            let err = service.add_bill("Alice", units_text).await.unwrap_err();
            assert_eq!(err.error_type, ErrorType::Validation);
        }
        assert!(service.list_bills().await.unwrap().is_empty());
        let existing = service.add_bill("Alice", "100").await.unwrap();
        let err = service.update_bill(existing.id, "Alice", "9999999999999999").await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::Validation);
        assert_eq!(service.list_bills().await.unwrap(), vec![existing]);
    }

    #[tokio::test]
    async fn test_invalid_input_does_not_mutate() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, None).await;
        let existing = service.add_bill("Alice", "1").await.unwrap();
        for (name, units_text) in [("", "10"), ("   ", "10"), ("Bob", "1x"), ("Bob", "-3"), ("Bob", "2.5")] {
            let err = service.add_bill(name, units_text).await.unwrap_err();
            assert_eq!(err.error_type, ErrorType::Validation);
            let err = service.update_bill(existing.id, name, units_text).await.unwrap_err();
            assert_eq!(err.error_type, ErrorType::Validation);
        }
        assert_eq!(service.list_bills().await.unwrap(), vec![existing]);
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, None).await;
        let record = service.add_bill("A", "10").await.unwrap();
        assert_eq!(record.total_amount, Decimal::from(60));
        service.update_bill(record.id, "B", "20").await.unwrap();
        assert_eq!(service.list_bills().await.unwrap(), vec![BillingRecord::new(record.id, "B".to_string(), 20, Decimal::from(120))]);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_bill() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, None).await;
        assert_eq!(service.update_bill(5, "B", "20").await.unwrap_err().error_type, ErrorType::NotFound);
        assert_eq!(service.delete_bill(5).await.unwrap_err().error_type, ErrorType::NotFound);
        assert!(service.list_bills().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_twice() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, None).await;
        service.add_bill("Alice", "1").await.unwrap();
        assert_eq!(service.clear_all().await.unwrap(), 1);
        assert!(service.list_bills().await.unwrap().is_empty());
        assert_eq!(service.clear_all().await.unwrap(), 0);
        assert!(service.list_bills().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_print_bill_saves_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let printed = Rc::new(RefCell::new(Vec::new()));
        let service = init_service(&dir, Some(Box::new(RecordingPrinter { printed: printed.clone(), fail: false }))).await;
        let record = service.add_bill("Alice", "100").await.unwrap();
        let outcome = service.print_bill(record.id).await.unwrap();
        assert_eq!(outcome.file_path, dir.path().join(format!("Bill_{}.txt", record.id)));
        assert!(outcome.receipt_text.contains("Alice"));
        assert!(outcome.receipt_text.contains("100"));
        assert!(outcome.receipt_text.contains("600"));
        assert_eq!(outcome.printer_warning, None);
        assert_eq!(fs::read_to_string(&outcome.file_path).unwrap(), outcome.receipt_text);

        service.update_bill(record.id, "Alice Smith", "100").await.unwrap();
        let again = service.print_bill(record.id).await.unwrap();
        assert_eq!(again.file_path, outcome.file_path);
        assert!(fs::read_to_string(&again.file_path).unwrap().contains("Alice Smith"));
        assert_eq!(printed.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_print_bill_with_failing_printer_still_saves() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, Some(Box::new(RecordingPrinter { printed: Rc::new(RefCell::new(Vec::new())), fail: true }))).await;
        let record = service.add_bill("Alice", "100").await.unwrap();
        let outcome = service.print_bill(record.id).await.unwrap();
        assert!(outcome.printer_warning.is_some());
        assert!(Path::new(&outcome.file_path).exists());
    }

    #[tokio::test]
    async fn test_print_missing_bill() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, None).await;
        assert_eq!(service.print_bill(1).await.unwrap_err().error_type, ErrorType::NotFound);
        assert!(!dir.path().join("Bill_1.txt").exists());
    }
}
