use clap::Parser;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/**
 * Rate per kWh used when the configuration does not set one.
 */
pub const DEFAULT_RATE_PER_UNIT: i64 = 6;

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    pub config_file: String,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * Logging configuration for the application. Defaults to `electricity_billing.log` in the working directory.
     */
    #[serde(default)]
    pub logging: LoggingConfig,
    /**
     * Database configuration for the application.
     */
    pub database: Database,
    /**
     * Tariff used for calculating bills.
     */
    #[serde(default)]
    pub billing: BillingConfig,
    /**
     * Where and how receipts are written.
     */
    #[serde(default)]
    pub receipt: ReceiptConfig,
    /**
     * Printer dispatch configuration.
     */
    #[serde(default)]
    pub printing: PrintingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to log the log level.
     */
    pub level: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Path to the log file. The terminal belongs to the user interface, so logs always go here.
     */
    pub logfile: String,
    /**
     * Additional directives for logging configuration.
     */
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { target: true, line_number: true, level: true, ansi: false, logfile: "electricity_billing.log".to_string(), directives: vec![] }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /**
     * Type of the database.
     */
    pub db_type: DatabaseType,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseType {
    /**
     * Local `SQLite` file. Timeouts are in milliseconds.
     */
    #[serde(rename_all = "camelCase")]
    Sqlite { file: String, max_connections: u32, acquire_timeout: u64, idle_timeout: u64 },
}

/**
 * Tariff configuration. The rate is only defined here.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingConfig {
    pub rate_per_unit: Decimal,
    pub currency_symbol: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig { rate_per_unit: Decimal::from(DEFAULT_RATE_PER_UNIT), currency_symbol: "₹".to_string() }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptConfig {
    /**
     * Directory receipts are written to.
     */
    pub directory: String,
    /**
     * File name is `<file_prefix><id>.<file_extension>`.
     */
    pub file_prefix: String,
    pub file_extension: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        ReceiptConfig { directory: ".".to_string(), file_prefix: "Bill_".to_string(), file_extension: "txt".to_string() }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintingConfig {
    /**
     * When false receipts are only saved.
     */
    pub enabled: bool,
    /**
     * Program and arguments used to spool a file. The file path is appended as the last argument.
     */
    pub command: Vec<String>,
}

impl Default for PrintingConfig {
    fn default() -> Self {
        PrintingConfig { enabled: true, command: vec!["lpr".to_string()] }
    }
}
