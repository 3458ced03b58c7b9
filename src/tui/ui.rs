use std::error::Error;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
};

use super::app::{App, Confirmation, Field, InputMode, NotificationKind};
use crate::service::billing::BillingService;

/**
 * Runs the terminal interface until the user quits. The terminal is restored even when the event loop fails.
 *
 * #Arguments
 * `service`: The billing service behind every action.
 */
pub async fn run_tui(service: BillingService) -> Result<(), Box<dyn Error>> {
    let mut app = App::new(service).await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                handle_key_event(app, key).await;
            }
        }
    }
}

/**
 * Dispatch keyboard events. Open dialogs take the key before the form does.
 */
async fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.confirmation.is_some() {
        return handle_key_confirmation(app, key).await;
    }
    if app.notification.is_some() || app.receipt_preview.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss();
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_key_normal(app, key).await,
        InputMode::Editing(field) => handle_key_editing(app, field, key),
    }
}

/**
 * Key handling in normal mode.
 */
async fn handle_key_normal(app: &mut App, key: KeyEvent) {
    use KeyCode::*;

    match key.code {
        Char('q') | Esc => app.should_quit = true,

        // Form
        Tab | Char('e') => app.input_mode = InputMode::Editing(Field::Name),
        Char('i') => app.input_mode = InputMode::Editing(Field::BillId),
        Char('x') => app.clear_fields(),

        // Actions
        Char('a') => app.add_bill().await,
        Char('u') => app.update_bill().await,
        Char('d') => app.request_delete(),
        Char('c') => app.request_clear_all(),
        Char('r') => app.refresh().await,
        Char('p') => app.print_bill().await,

        // Table selection
        Up => app.select_prev(),
        Down => app.select_next(),

        _ => {}
    }
}

/**
 * Typing into a form field.
 */
fn handle_key_editing(app: &mut App, field: Field, key: KeyEvent) {
    use KeyCode::*;

    match key.code {
        Esc | Enter => app.input_mode = InputMode::Normal,
        Tab => app.input_mode = InputMode::Editing(field.next()),
        Backspace => {
            app.input_mut(field).pop();
        }
        Char(c) => app.input_mut(field).push(c),
        _ => {}
    }
}

async fn handle_key_confirmation(app: &mut App, key: KeyEvent) {
    use KeyCode::*;

    match key.code {
        Char('y') | Char('Y') => app.confirm(true).await,
        Char('n') | Char('N') | Esc => app.confirm(false).await,
        _ => {}
    }
}

/**
 * Top-level UI layout: header, form, table, footer, then any open dialog on top.
 */
fn ui(f: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(5), // form
            Constraint::Min(0),    // table
            Constraint::Length(3), // footer
        ])
        .split(f.area());

    let header = Paragraph::new("⚡ Electricity Bill Print System ⚡")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    draw_form(f, chunks[1], app);
    draw_bills(f, chunks[2], app);

    let footer_text = match app.input_mode {
        InputMode::Normal => "a: add  u: update  d: delete  c: clear table  r: refresh  p: print  |  Tab/e: edit form  i: edit bill id  x: clear fields  ↑/↓: select  q: quit",
        InputMode::Editing(_) => "Editing: type to enter text, Tab for next field, Enter/Esc to finish",
    };
    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);

    if let Some(preview) = &app.receipt_preview {
        draw_popup(f, "Bill Receipt", preview, Color::Cyan, 60, 70);
    }
    if let Some(notification) = &app.notification {
        let (title, color) = match notification.kind {
            NotificationKind::Info => ("Success", Color::Green),
            NotificationKind::Warning => ("Warning", Color::Yellow),
            NotificationKind::Error => ("Error", Color::Red),
        };
        draw_popup(f, title, &format!("{}\n\n[Enter] OK", notification.message), color, 50, 30);
    }
    if let Some(confirmation) = &app.confirmation {
        let question = match confirmation {
            Confirmation::Delete(id) => format!("Are you sure you want to delete Bill ID {id}?"),
            Confirmation::ClearAll => "Are you sure you want to delete all records?".to_string(),
        };
        draw_popup(f, "Confirm", &format!("{question}\n\n[y] Yes   [n] No"), Color::Yellow, 50, 30);
    }
}

/**
 * Form with the three inputs, the field being edited is highlighted.
 */
fn draw_form(f: &mut Frame<'_>, area: Rect, app: &App) {
    let fields = [
        (Field::BillId, "Bill ID (for update/delete): ", &app.bill_id_input),
        (Field::Name, "Customer Name:               ", &app.name_input),
        (Field::Units, "Units Consumed:              ", &app.units_input),
    ];
    let lines: Vec<Line> = fields
        .into_iter()
        .map(|(field, label, value)| {
            let style = if app.input_mode == InputMode::Editing(field) {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![Span::raw(label), Span::styled(value.clone(), style)])
        })
        .collect();

    let form = Paragraph::new(lines).block(Block::default().title("Bill").borders(Borders::ALL));
    f.render_widget(form, area);
}

/**
 * Table of all stored bills.
 */
fn draw_bills(f: &mut Frame<'_>, area: Rect, app: &App) {
    let tariff = app.service.tariff();
    let rows = app.records.iter().enumerate().map(|(idx, record)| {
        let cells = vec![record.id.to_string(), record.customer_name.clone(), record.units_consumed.to_string(), tariff.format_amount(record.total_amount)];
        let mut row = Row::new(cells);
        if Some(idx) == app.selected_idx {
            row = row.style(Style::default().add_modifier(Modifier::REVERSED));
        }
        row
    });

    let widths = [Constraint::Length(8), Constraint::Min(16), Constraint::Length(22), Constraint::Length(16)];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Bill ID", "Customer Name", "Units Consumed (kWh)", "Total Bill"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().title(format!("Bills ({})", app.records.len())).borders(Borders::ALL));

    f.render_widget(table, area);
}

fn draw_popup(f: &mut Frame<'_>, title: &str, text: &str, color: Color, percent_x: u16, percent_y: u16) {
    let area = centered_rect(percent_x, percent_y, f.area());
    let popup = Paragraph::new(text.to_string())
        .wrap(Wrap { trim: false })
        .block(Block::default().title(Span::styled(title.to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD))).borders(Borders::ALL));
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage((100 - percent_y) / 2), Constraint::Percentage(percent_y), Constraint::Percentage((100 - percent_y) / 2)])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage((100 - percent_x) / 2), Constraint::Percentage(percent_x), Constraint::Percentage((100 - percent_x) / 2)])
        .split(vertical[1])[1]
}
