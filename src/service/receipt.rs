use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{DateTime, Local};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::BillingRecord,
    tariff::Tariff,
};

/**
 * Timestamp format printed on receipts.
 */
const RECEIPT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RECEIPT_RULE: &str = "---------------------------------";

/**
 * Hands a saved receipt file to something that can print it.
 */
pub trait Printer {
    /**
     * Sends the file to the printer.
     *
     * #Arguments
     * `file_path`: The saved receipt.
     *
     * #Returns
     * An `ApplicationError` of type `PrintDispatch` if the file could not be handed over.
     */
    fn print(&self, file_path: &Path) -> Result<(), ApplicationError>;
}

/**
 * Prints by running an external spooler command such as `lpr` with the file path as last argument.
 * The command gets no stdin and its output is captured, so it never draws over the terminal interface.
 */
pub struct CommandPrinter {
    command: Vec<String>,
}

impl CommandPrinter {
    pub fn new(command: Vec<String>) -> Self {
        CommandPrinter { command }
    }
}

impl Printer for CommandPrinter {
    fn print(&self, file_path: &Path) -> Result<(), ApplicationError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(ApplicationError::new(ErrorType::PrintDispatch, "No print command configured".to_string()));
        };
        let output = Command::new(program)
            .args(args)
            .arg(file_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| ApplicationError::new(ErrorType::PrintDispatch, format!("Printing failed: could not run {program}: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("Printing failed: {program} exited with {}", output.status)
            } else {
                format!("Printing failed: {program} exited with {}: {stderr}", output.status)
            };
            return Err(ApplicationError::new(ErrorType::PrintDispatch, message));
        }
        Ok(())
    }
}

/**
 * Renders billing records as text receipts, saves them and forwards them to a printer.
 */
pub struct ReceiptGenerator {
    /**
     * Tariff used for the rate line and for formatting amounts.
     */
    tariff: Tariff,
    /**
     * Directory receipts are saved in.
     */
    directory: PathBuf,
    file_prefix: String,
    file_extension: String,
    /**
     * None when printing is disabled.
     */
    printer: Option<Box<dyn Printer>>,
}

impl ReceiptGenerator {
    /**
     * Creates a new instance of `ReceiptGenerator`.
     *
     * #Arguments
     * `tariff`: Tariff used for the rate line and for formatting amounts.
     * `directory`: Directory receipts are saved in.
     * `file_prefix`: Prefix of the receipt file name.
     * `file_extension`: Extension of the receipt file name, without the dot.
     * `printer`: Printer receipts are sent to, or None to only save them.
     */
    pub fn new(tariff: Tariff, directory: PathBuf, file_prefix: String, file_extension: String, printer: Option<Box<dyn Printer>>) -> Self {
        ReceiptGenerator { tariff, directory, file_prefix, file_extension, printer }
    }

    /**
     * Renders the receipt for a record, stamped with the current local time.
     */
    pub fn generate(&self, record: &BillingRecord) -> String {
        self.render(record, &Local::now())
    }

    /**
     * Renders the receipt for a record.
     *
     * #Arguments
     * `record`: The billing record.
     * `generated_at`: Time printed on the receipt, to the second.
     */
    pub fn render(&self, record: &BillingRecord, generated_at: &DateTime<Local>) -> String {
        [
            "⚡ ELECTRICITY BILL RECEIPT ⚡".to_string(),
            RECEIPT_RULE.to_string(),
            format!("Date: {}", generated_at.format(RECEIPT_DATE_FORMAT)),
            format!("Bill ID: {}", record.id),
            format!("Customer: {}", record.customer_name),
            format!("Units Consumed: {} kWh", record.units_consumed),
            format!("Rate per Unit: {}", self.tariff.format_rate()),
            RECEIPT_RULE.to_string(),
            format!("Total Bill: {}", self.tariff.format_amount(record.total_amount)),
            RECEIPT_RULE.to_string(),
            "Thank you for your payment!".to_string(),
        ]
        .join("\n")
            + "\n"
    }

    /**
     * Path of the receipt file for a bill id.
     */
    pub fn file_path(&self, id: i64) -> PathBuf {
        self.directory.join(format!("{}{}.{}", self.file_prefix, id, self.file_extension))
    }

    /**
     * Saves the receipt as UTF-8, replacing any earlier receipt for the same bill.
     *
     * #Arguments
     * `record`: The billing record, only its id is used for the file name.
     * `receipt_text`: The rendered receipt.
     *
     * #Returns
     * The path written, or an `Io` error.
     */
    pub fn persist(&self, record: &BillingRecord, receipt_text: &str) -> Result<PathBuf, ApplicationError> {
        let file_path = self.file_path(record.id);
        fs::write(&file_path, receipt_text).map_err(|err| {
            tracing::error!("Failed to write receipt {}: {}", file_path.display(), err);
            ApplicationError::new(ErrorType::Io, format!("Failed to save bill slip {}: {err}", file_path.display()))
        })?;
        tracing::info!("Saved receipt for bill {} to {}", record.id, file_path.display());
        Ok(file_path)
    }

    /**
     * Sends a saved receipt to the printer. Never fails.
     *
     * #Returns
     * A warning to show the user when printing did not work.
     */
    pub fn dispatch_to_printer(&self, file_path: &Path) -> Option<String> {
        let printer = self.printer.as_ref()?;
        match printer.print(file_path) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!("Receipt {} saved but not printed: {}", file_path.display(), err);
                Some(err.message)
            }
        }
    }
}
