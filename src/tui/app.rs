use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::models::BillingRecord;
use crate::service::billing::BillingService;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    BillId,
    Name,
    Units,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::BillId => Field::Name,
            Field::Name => Field::Units,
            Field::Units => Field::BillId,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing(Field),
}

/**
 * Destructive action waiting for a yes/no answer.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Delete(i64),
    ClearAll,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

/**
 * Dialog shown after an action.
 */
#[derive(Clone, Debug)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/**
 * Form and table state. Every handler runs its service call to completion before returning.
 */
pub struct App {
    pub service: BillingService,
    pub records: Vec<BillingRecord>,
    pub selected_idx: Option<usize>,
    pub bill_id_input: String,
    pub name_input: String,
    pub units_input: String,
    pub input_mode: InputMode,
    pub confirmation: Option<Confirmation>,
    pub notification: Option<Notification>,
    pub receipt_preview: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub async fn new(service: BillingService) -> Self {
        let mut app = Self {
            service,
            records: Vec::new(),
            selected_idx: None,
            bill_id_input: String::new(),
            name_input: String::new(),
            units_input: String::new(),
            input_mode: InputMode::Normal,
            confirmation: None,
            notification: None,
            receipt_preview: None,
            should_quit: false,
        };
        app.refresh().await;
        app
    }

    /**
     * Re-reads the whole table and keeps the selection in range.
     */
    pub async fn refresh(&mut self) {
        match self.service.list_bills().await {
            Ok(records) => {
                self.records = records;
                self.selected_idx = match self.selected_idx {
                    _ if self.records.is_empty() => None,
                    Some(idx) => Some(idx.min(self.records.len() - 1)),
                    None => Some(0),
                };
            }
            Err(err) => self.notify_error(&err),
        }
    }

    pub async fn add_bill(&mut self) {
        match self.service.add_bill(&self.name_input, &self.units_input).await {
            Ok(record) => {
                let total = self.service.tariff().format_amount(record.total_amount);
                self.notify(NotificationKind::Info, format!("Bill generated for {} and saved successfully.\nTotal: {total}", record.customer_name));
                self.clear_fields();
                self.refresh().await;
                self.selected_idx = self.records.iter().position(|r| r.id == record.id).or(self.selected_idx);
            }
            Err(err) => self.notify_error(&err),
        }
    }

    pub async fn update_bill(&mut self) {
        let id = match self.target_id("update") {
            Ok(id) => id,
            Err(err) => return self.notify_error(&err),
        };
        match self.service.update_bill(id, &self.name_input, &self.units_input).await {
            Ok(_) => {
                self.notify(NotificationKind::Info, format!("Bill ID {id} updated successfully."));
                self.clear_fields();
                self.refresh().await;
            }
            Err(err) => self.notify_error(&err),
        }
    }

    /**
     * Asks for confirmation before deleting the targeted bill.
     */
    pub fn request_delete(&mut self) {
        match self.target_id("delete") {
            Ok(id) => self.confirmation = Some(Confirmation::Delete(id)),
            Err(err) => self.notify_error(&err),
        }
    }

    /**
     * Asks for confirmation before deleting every bill.
     */
    pub fn request_clear_all(&mut self) {
        self.confirmation = Some(Confirmation::ClearAll);
    }

    /**
     * Answers the pending confirmation. Declining changes nothing.
     */
    pub async fn confirm(&mut self, accepted: bool) {
        let Some(confirmation) = self.confirmation.take() else {
            return;
        };
        if !accepted {
            return;
        }
        match confirmation {
            Confirmation::Delete(id) => match self.service.delete_bill(id).await {
                Ok(()) => {
                    self.bill_id_input.clear();
                    self.refresh().await;
                    self.notify(NotificationKind::Info, format!("Bill ID {id} deleted successfully."));
                }
                Err(err) => self.notify_error(&err),
            },
            Confirmation::ClearAll => match self.service.clear_all().await {
                Ok(_) => {
                    self.refresh().await;
                    self.notify(NotificationKind::Info, "All records deleted!".to_string());
                }
                Err(err) => self.notify_error(&err),
            },
        }
    }

    /**
     * Saves and prints the targeted bill, then shows the slip.
     */
    pub async fn print_bill(&mut self) {
        let id = match self.target_id("print") {
            Ok(id) => id,
            Err(err) => return self.notify_error(&err),
        };
        match self.service.print_bill(id).await {
            Ok(outcome) => {
                let file_name = outcome.file_path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_else(|| outcome.file_path.display().to_string());
                match outcome.printer_warning {
                    Some(warning) => self.notify(NotificationKind::Warning, format!("Bill slip saved as {file_name}\n{warning}")),
                    None => self.notify(NotificationKind::Info, format!("Bill slip saved as {file_name}")),
                }
                self.receipt_preview = Some(outcome.receipt_text);
            }
            Err(err) => self.notify_error(&err),
        }
    }

    pub fn clear_fields(&mut self) {
        self.name_input.clear();
        self.units_input.clear();
    }

    pub fn select_next(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let idx = self.selected_idx.map_or(0, |idx| (idx + 1).min(self.records.len() - 1));
        self.select(idx);
    }

    pub fn select_prev(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let idx = self.selected_idx.map_or(0, |idx| idx.saturating_sub(1));
        self.select(idx);
    }

    /**
     * Highlights a row and copies its values into the form for editing.
     */
    fn select(&mut self, idx: usize) {
        self.selected_idx = Some(idx);
        if let Some(record) = self.records.get(idx) {
            self.name_input = record.customer_name.clone();
            self.units_input = record.units_consumed.to_string();
        }
    }

    /**
     * Closes the notification, then the receipt preview.
     */
    pub fn dismiss(&mut self) {
        if self.notification.take().is_none() {
            self.receipt_preview = None;
        }
    }

    pub fn input_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::BillId => &mut self.bill_id_input,
            Field::Name => &mut self.name_input,
            Field::Units => &mut self.units_input,
        }
    }

    /**
     * The typed bill id wins over the highlighted row. Like units, a typed id must be plain digits.
     */
    fn target_id(&self, action: &str) -> Result<i64, ApplicationError> {
        let typed = self.bill_id_input.trim();
        if !typed.is_empty() {
            return match typed.parse::<i64>() {
                Ok(id) if id > 0 && typed.chars().all(|c| c.is_ascii_digit()) => Ok(id),
                _ => Err(ApplicationError::new(ErrorType::NotFound, format!("Invalid bill ID: {typed}"))),
            };
        }
        self.selected_idx
            .and_then(|idx| self.records.get(idx))
            .map(|record| record.id)
            .ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("Please select a bill to {action}.")))
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        self.notification = Some(Notification { kind, message });
    }

    fn notify_error(&mut self, err: &ApplicationError) {
        self.notify(NotificationKind::Error, err.message.clone());
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::*;
    use crate::service::billing::test::init_service;
    use crate::service::receipt::test::RecordingPrinter;

    async fn init_app(dir: &TempDir) -> App {
        App::new(init_service(dir, None).await).await
    }

    async fn add(app: &mut App, name: &str, units: &str) {
        app.name_input = name.to_string();
        app.units_input = units.to_string();
        app.add_bill().await;
    }

    #[tokio::test]
    async fn test_add_refreshes_table_and_clears_form() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        assert!(app.records.is_empty());
        assert_eq!(app.selected_idx, None);
        add(&mut app, "Alice", "100").await;
        assert_eq!(app.records.len(), 1);
        assert_eq!(app.records[0].total_amount, Decimal::from(600));
        assert_eq!(app.selected_idx, Some(0));
        assert!(app.name_input.is_empty());
        assert!(app.units_input.is_empty());
        let notification = app.notification.unwrap();
        assert_eq!(notification.kind, NotificationKind::Info);
        assert!(notification.message.contains("₹600"));
    }

    #[tokio::test]
    async fn test_invalid_add_keeps_form() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "Alice", "12kWh").await;
        assert!(app.records.is_empty());
        assert_eq!(app.units_input, "12kWh");
        let notification = app.notification.unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert_eq!(notification.message, "Please enter a valid positive number for units!");
    }

    #[tokio::test]
    async fn test_actions_without_target() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        app.print_bill().await;
        assert_eq!(app.notification.take().unwrap().message, "Please select a bill to print.");
        app.request_delete();
        assert_eq!(app.confirmation, None);
        assert_eq!(app.notification.take().unwrap().message, "Please select a bill to delete.");
        app.bill_id_input = "abc".to_string();
        app.update_bill().await;
        assert_eq!(app.notification.take().unwrap().kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_signed_bill_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "A", "10").await;
        let id = app.records[0].id;
        for typed in [format!("+{id}"), format!("-{id}"), "0".to_string()] {
            app.notification = None;
            app.bill_id_input = typed.clone();
            app.request_delete();
            assert_eq!(app.confirmation, None);
            let notification = app.notification.take().unwrap();
            assert_eq!(notification.kind, NotificationKind::Error);
            assert_eq!(notification.message, format!("Invalid bill ID: {typed}"));
            app.print_bill().await;
            assert!(app.receipt_preview.is_none());
            assert_eq!(app.notification.take().unwrap().kind, NotificationKind::Error);
        }
        app.bill_id_input = format!(" {id} ");
        app.request_delete();
        assert_eq!(app.confirmation, Some(Confirmation::Delete(id)));
    }

    #[tokio::test]
    async fn test_update_selected_row() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "A", "10").await;
        app.select_next();
        assert_eq!(app.name_input, "A");
        assert_eq!(app.units_input, "10");
        app.name_input = "B".to_string();
        app.units_input = "20".to_string();
        app.update_bill().await;
        assert_eq!(app.records.len(), 1);
        assert_eq!(app.records[0].customer_name, "B");
        assert_eq!(app.records[0].total_amount, Decimal::from(120));
    }

    #[tokio::test]
    async fn test_typed_id_wins_over_selection() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "Alice", "1").await;
        add(&mut app, "Bob", "2").await;
        let alice_id = app.records[0].id;
        app.selected_idx = Some(1);
        app.bill_id_input = alice_id.to_string();
        app.request_delete();
        assert_eq!(app.confirmation, Some(Confirmation::Delete(alice_id)));
        app.confirm(true).await;
        assert_eq!(app.records.iter().map(|r| r.customer_name.as_str()).collect::<Vec<_>>(), vec!["Bob"]);
        assert!(app.bill_id_input.is_empty());
    }

    #[tokio::test]
    async fn test_declined_delete_and_clear_change_nothing() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "Alice", "1").await;
        app.notification = None;
        app.request_delete();
        app.confirm(false).await;
        app.request_clear_all();
        app.confirm(false).await;
        assert_eq!(app.confirmation, None);
        assert!(app.notification.is_none());
        assert_eq!(app.records.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "Alice", "1").await;
        add(&mut app, "Bob", "2").await;
        app.request_clear_all();
        app.confirm(true).await;
        assert!(app.records.is_empty());
        assert_eq!(app.selected_idx, None);
        assert_eq!(app.notification.unwrap().message, "All records deleted!");
    }

    #[tokio::test]
    async fn test_delete_stale_id() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        app.bill_id_input = "41".to_string();
        app.request_delete();
        app.confirm(true).await;
        let notification = app.notification.unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert_eq!(notification.message, "Bill ID 41 not found");
    }

    #[tokio::test]
    async fn test_print_shows_preview() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "Alice", "100").await;
        app.print_bill().await;
        let id = app.records[0].id;
        assert_eq!(app.notification.as_ref().unwrap().message, format!("Bill slip saved as Bill_{id}.txt"));
        assert!(app.receipt_preview.as_ref().unwrap().contains("Total Bill: ₹600"));
        app.dismiss();
        assert!(app.notification.is_none());
        assert!(app.receipt_preview.is_some());
        app.dismiss();
        assert!(app.receipt_preview.is_none());
    }

    #[tokio::test]
    async fn test_print_with_printer_failure_warns() {
        let dir = TempDir::new().unwrap();
        let service = init_service(&dir, Some(Box::new(RecordingPrinter { printed: Rc::new(RefCell::new(Vec::new())), fail: true }))).await;
        let mut app = App::new(service).await;
        add(&mut app, "Alice", "100").await;
        app.print_bill().await;
        let notification = app.notification.unwrap();
        assert_eq!(notification.kind, NotificationKind::Warning);
        assert!(notification.message.contains("No printer available"));
        assert!(app.receipt_preview.is_some());
    }

    #[tokio::test]
    async fn test_selection_stays_in_range() {
        let dir = TempDir::new().unwrap();
        let mut app = init_app(&dir).await;
        add(&mut app, "Alice", "1").await;
        add(&mut app, "Bob", "2").await;
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_idx, Some(1));
        app.select_prev();
        app.select_prev();
        assert_eq!(app.selected_idx, Some(0));
        app.request_delete();
        app.confirm(true).await;
        assert_eq!(app.selected_idx, Some(0));
        assert_eq!(app.records[0].customer_name, "Bob");
    }
}
