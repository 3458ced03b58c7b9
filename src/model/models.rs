use std::path::PathBuf;

use rust_decimal::Decimal;

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Database response type for a row of the customers table.
 */
pub type CustomerDbResp = (i64, String, i64, f64);

/**
 * A stored billing record. The total is always units multiplied by the rate in effect when the record was written.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct BillingRecord {
    /**
     * Identifier assigned by the store, never reused.
     */
    pub id: i64,
    pub customer_name: String,
    /**
     * Consumption in kWh.
     */
    pub units_consumed: i64,
    pub total_amount: Decimal,
}

impl BillingRecord {
    pub fn new(id: i64, customer_name: String, units_consumed: i64, total_amount: Decimal) -> Self {
        BillingRecord { id, customer_name, units_consumed, total_amount }
    }
}

/**
 * Converts a database row into a `BillingRecord`.
 *
 * `total_bill` is stored as REAL, so a non finite value is reported as a database error.
 */
impl TryFrom<CustomerDbResp> for BillingRecord {
    type Error = ApplicationError;

    fn try_from((id, name, units, total_bill): CustomerDbResp) -> Result<Self, Self::Error> {
        let total_amount = Decimal::try_from(total_bill).map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Invalid total stored for bill {id}: {err}")))?;
        Ok(BillingRecord::new(id, name, units, total_amount))
    }
}

/**
 * Form input that passed validation.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    /**
     * Trimmed customer name.
     */
    pub name: String,
    pub units: i64,
}

/**
 * Result of printing a bill.
 */
#[derive(Debug, Clone)]
pub struct PrintOutcome {
    /**
     * Where the receipt was written.
     */
    pub file_path: PathBuf,
    /**
     * The rendered receipt.
     */
    pub receipt_text: String,
    /**
     * Set when the printer could not be reached. The receipt is still saved.
     */
    pub printer_warning: Option<String>,
}
