use rust_decimal::Decimal;

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Flat rate tariff. Holds the single rate and currency symbol used both for calculating bills and for formatting amounts.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    /**
     * Price of one kWh.
     */
    rate_per_unit: Decimal,
    /**
     * Symbol printed in front of amounts.
     */
    currency_symbol: String,
}

impl Tariff {
    /**
     * Creates a new tariff.
     *
     * #Arguments
     * `rate_per_unit`: Price of one kWh.
     * `currency_symbol`: Symbol printed in front of amounts.
     */
    pub fn new(rate_per_unit: Decimal, currency_symbol: String) -> Self {
        Tariff { rate_per_unit, currency_symbol }
    }

    /**
     * Calculates the total bill for the given consumption.
     *
     * #Arguments
     * `units`: Validated, non negative consumption in kWh.
     *
     * #Returns
     * `units * rate_per_unit`, or a validation error if the product does not fit in a decimal.
     */
    pub fn compute_bill(&self, units: i64) -> Result<Decimal, ApplicationError> {
        Decimal::from(units)
            .checked_mul(self.rate_per_unit)
            .ok_or_else(|| ApplicationError::new(ErrorType::Validation, format!("Bill for {units} units is out of range")))
    }

    /**
     * Formats an amount with the currency symbol, without trailing zeros.
     */
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!("{}{}", self.currency_symbol, amount.normalize())
    }

    /**
     * Formats the rate with the currency symbol.
     */
    pub fn format_rate(&self) -> String {
        self.format_amount(self.rate_per_unit)
    }
}
