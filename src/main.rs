mod dao;
mod model;
mod service;
mod tui;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::dao::customers::CustomerDao;
use crate::dao::init_pool;
use crate::model::config::{ApplicationArguments, Config, DatabaseType, LoggingConfig};
use crate::model::tariff::Tariff;
use crate::service::billing::BillingService;
use crate::service::receipt::{CommandPrinter, Printer, ReceiptGenerator};
use crate::tui::ui::run_tui;

use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/**
 * Loads the configuration, opens the billing database and runs the terminal interface until the user quits.
 */
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let connection_pool = match &config.database.db_type {
        DatabaseType::Sqlite { file, max_connections, acquire_timeout, idle_timeout } => {
            init_pool(file, *max_connections, *acquire_timeout, *idle_timeout).await.map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?
        }
    };

    let billing_service = get_billing_service(&config, connection_pool);
    billing_service.init_schema().await.map_err(|err| std::io::Error::other(format!("Failed to create database schema: {err}")))?;

    tracing::info!("Electricity billing started with config {}", args.config_file);

    run_tui(billing_service).await.map_err(|err| std::io::Error::other(format!("Terminal user interface failed: {err}")))
}

/**
 * Initializes logging for the application. The terminal is used by the user interface, so logs are appended to the log file.
 *
 * #Arguments
 * `logging`: The logging configuration.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let logfile = OpenOptions::new().create(true).append(true).open(&logging.logfile).map_err(|err| std::io::Error::other(format!("Failed to open log file {}: {err}", logging.logfile)))?;

    let mut env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in &logging.directives {
        let directive: Directive = directive.parse().map_err(|err| std::io::Error::other(format!("Invalid logging directive {directive}: {err}")))?;
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(logfile))
                .with_target(logging.target)
                .with_line_number(logging.line_number)
                .with_level(logging.level)
                .with_ansi(logging.ansi),
        )
        .init();

    Ok(())
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}

/**
 * Wires the billing service from the configuration.
 *
 * #Arguments
 * `config`: The application configuration.
 * `connection_pool`: The opened database pool.
 *
 * #Returns
 * The billing service used by the user interface.
 */
fn get_billing_service(config: &Config, connection_pool: sqlx::Pool<sqlx::Sqlite>) -> BillingService {
    let tariff = Tariff::new(config.billing.rate_per_unit, config.billing.currency_symbol.clone());
    let printer: Option<Box<dyn Printer>> = if config.printing.enabled { Some(Box::new(CommandPrinter::new(config.printing.command.clone()))) } else { None };
    let receipt_generator = ReceiptGenerator::new(
        tariff.clone(),
        PathBuf::from(&config.receipt.directory),
        config.receipt.file_prefix.clone(),
        config.receipt.file_extension.clone(),
        printer,
    );
    BillingService::new(CustomerDao::new(), connection_pool, tariff, receipt_generator)
}
