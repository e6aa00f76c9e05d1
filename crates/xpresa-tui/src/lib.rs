// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use xpresa_app::money::{format_cents, format_cents_plain, parse_cents_or_zero, parse_required_cents};
use xpresa_app::{
    ActionError, AppCommand, AppEvent, AppMode, AppState, ConfirmAction, DASHBOARD_PATH, Expense,
    ExpenseFormInput, ExpenseId, FeedView, FetchTicket, Focus, FormKind, FormPayload, LOGIN_PATH,
    Location, NAV_TARGETS, NEW_ORDER_PATH, NavigationRequest, OrderFeed, OrderFormInput, OrderId,
    OrderItem, OrderListing, OrderStatus, OrderSummary, PaymentAccount, SESSION_ABSENT_MESSAGE,
    Screen, ScrollBehavior, Session, StatusCounts, StatusFilter, empty_message,
};

pub const EXPENSE_SAVED_MESSAGE: &str = "Gasto guardado correctamente";
pub const EXPENSE_DELETE_FAILED_MESSAGE: &str = "Error al eliminar el gasto";
pub const ORDER_SAVED_MESSAGE: &str = "Pedido creado correctamente";
const LOADING_ORDERS_TEXT: &str = "Cargando pedidos...";
const NO_EXPENSES_TEXT: &str = "No hay gastos registrados recientemente.";
const SIDEBAR_WIDTH: u16 = 24;
const DETAIL_HEIGHT: u16 = 9;
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[day]/[month]/[year]");

pub trait AppRuntime {
    fn load_orders(&mut self, filter: &StatusFilter) -> Result<OrderListing, ActionError>;
    fn load_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, ActionError>;
    fn advance_order_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ActionError>;
    fn list_expenses(&mut self) -> Result<Vec<Expense>, ActionError>;
    fn submit_form(&mut self, payload: &FormPayload) -> Result<(), ActionError>;
    fn delete_expense(&mut self, expense_id: ExpenseId) -> Result<(), ActionError>;
    fn session(&self) -> &Session;
    fn logout(&mut self) -> Result<(), ActionError>;
    /// Runs the query for `ticket` and posts the response to the event loop,
    /// which applies it on its next tick.
    fn spawn_order_fetch(&mut self, ticket: FetchTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.load_orders(&ticket.filter);
        tx.send(InternalEvent::OrdersLoaded { ticket, result })
            .map_err(|_| anyhow::anyhow!("order event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    OrdersLoaded {
        ticket: FetchTicket,
        result: Result<OrderListing, ActionError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormChoiceKind {
    None,
    PaymentAccount,
    OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormFieldSpec {
    label: &'static str,
    choices: FormChoiceKind,
}

const EXPENSE_DESCRIPTION: usize = 0;
const EXPENSE_AMOUNT: usize = 1;
const EXPENSE_ACCOUNT: usize = 2;

const EXPENSE_FIELDS: [FormFieldSpec; 3] = [
    FormFieldSpec {
        label: "descripción",
        choices: FormChoiceKind::None,
    },
    FormFieldSpec {
        label: "monto",
        choices: FormChoiceKind::None,
    },
    FormFieldSpec {
        label: "cuenta",
        choices: FormChoiceKind::PaymentAccount,
    },
];

const ORDER_CUSTOMER: usize = 0;
const ORDER_EMAIL: usize = 1;
const ORDER_ACCOUNT: usize = 2;
const ORDER_ANTICIPO: usize = 3;
const ORDER_TOTAL: usize = 4;
const ORDER_STATUS: usize = 5;
const ORDER_NOTES: usize = 6;

const ORDER_FIELDS: [FormFieldSpec; 7] = [
    FormFieldSpec {
        label: "cliente",
        choices: FormChoiceKind::None,
    },
    FormFieldSpec {
        label: "correo",
        choices: FormChoiceKind::None,
    },
    FormFieldSpec {
        label: "cuenta",
        choices: FormChoiceKind::PaymentAccount,
    },
    FormFieldSpec {
        label: "anticipo",
        choices: FormChoiceKind::None,
    },
    FormFieldSpec {
        label: "total",
        choices: FormChoiceKind::None,
    },
    FormFieldSpec {
        label: "estado",
        choices: FormChoiceKind::OrderStatus,
    },
    FormFieldSpec {
        label: "notas",
        choices: FormChoiceKind::None,
    },
];

/// Editable text of an open form, one entry per field. Choice fields hold
/// the wire value of the selection, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    kind: FormKind,
    field_index: usize,
    values: Vec<String>,
}

impl FormUiState {
    fn blank(kind: FormKind) -> Self {
        Self {
            kind,
            field_index: 0,
            values: values_for_payload(&FormPayload::blank_for(kind)),
        }
    }

    fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    fn current_field(&self) -> FormFieldSpec {
        let fields = form_field_specs(self.kind);
        fields[self.field_index.min(fields.len().saturating_sub(1))]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderDetail {
    order_id: OrderId,
    items: Result<Vec<OrderItem>, String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    feed: OrderFeed,
    order_cursor: usize,
    order_detail: Option<OrderDetail>,
    expenses: Vec<Expense>,
    expenses_error: Option<String>,
    expense_cursor: usize,
    form: Option<FormUiState>,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    prime_view_data(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        tick(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        let user = runtime.session().display_name().to_owned();
        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data, &user)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Loads whatever the starting screen shows before the first tick.
fn prime_view_data<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    enter_screen(runtime, view_data, state.screen());
    settle_location(state, runtime, view_data, internal_tx);
}

/// One turn of the event loop: apply completed work, then settle any queued
/// navigation and react to what it changed.
fn tick<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) {
    process_internal_events(state, view_data, internal_rx);
    settle_location(state, runtime, view_data, internal_tx);
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::OrdersLoaded { ticket, result } => {
                view_data.feed.apply(&ticket, result);
                clamp_order_cursor(view_data);
            }
        }
    }
}

fn settle_location<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(AppCommand::Settle);
    for event in &events {
        match event {
            AppEvent::LocationSettled(settled) => {
                if settled.scroll == ScrollBehavior::Reset {
                    view_data.order_cursor = 0;
                }
                view_data.order_detail = None;
            }
            AppEvent::ScreenChanged(screen) => enter_screen(runtime, view_data, *screen),
            _ => {}
        }
    }
    sync_form_ui_state(state, view_data);

    if state.screen() == Screen::Dashboard {
        request_orders(state, runtime, view_data, internal_tx);
    }
}

fn enter_screen<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData, screen: Screen) {
    match screen {
        Screen::Dashboard => {}
        Screen::Expenses => {
            view_data.feed.invalidate();
            load_expenses(runtime, view_data);
        }
        Screen::NewOrder | Screen::SignedOut | Screen::NotFound => view_data.feed.invalidate(),
    }
}

fn request_orders<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(ticket) = view_data.feed.request(state.active_filter()) else {
        return;
    };
    if let Err(error) = runtime.spawn_order_fetch(ticket.clone(), internal_tx.clone()) {
        view_data
            .feed
            .apply(&ticket, Err(ActionError::query(format!("{error:#}"))));
    }
}

/// The ledger belongs to the signed-in seller; without one there is nothing
/// to list.
fn load_expenses<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) {
    if !runtime.session().is_signed_in() {
        view_data.expenses.clear();
        view_data.expenses_error = None;
        view_data.expense_cursor = 0;
        return;
    }
    match runtime.list_expenses() {
        Ok(expenses) => {
            view_data.expenses = expenses;
            view_data.expenses_error = None;
        }
        Err(error) => {
            view_data.expenses.clear();
            view_data.expenses_error = Some(error.to_string());
        }
    }
    clamp_expense_cursor(view_data);
}

/// Reload after a write. A failure keeps the list already on screen.
fn refresh_expenses<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) {
    if let Ok(expenses) = runtime.list_expenses() {
        view_data.expenses = expenses;
        view_data.expenses_error = None;
        clamp_expense_cursor(view_data);
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn dispatch_and_sync(state: &mut AppState, view_data: &mut ViewData, command: AppCommand) {
    state.dispatch(command);
    sync_form_ui_state(state, view_data);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match state.mode {
        AppMode::Confirm(action) => {
            handle_confirm_key(state, runtime, view_data, internal_tx, action, key);
            false
        }
        AppMode::Form(kind) => {
            handle_form_key(state, runtime, view_data, internal_tx, kind, key);
            false
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Tab, _) => {
            state.dispatch(AppCommand::ToggleFocus);
            return false;
        }
        (KeyCode::Char('L'), _) => {
            if runtime.session().is_signed_in() {
                dispatch_and_sync(state, view_data, AppCommand::Confirm(ConfirmAction::Logout));
            } else {
                emit_status(state, view_data, internal_tx, SESSION_ABSENT_MESSAGE);
            }
            return false;
        }
        (KeyCode::Esc, _) => {
            if view_data.order_detail.take().is_none() {
                state.dispatch(AppCommand::Back);
            }
            return false;
        }
        _ => {}
    }

    match state.focus {
        Focus::Sidebar => handle_sidebar_key(state, key),
        Focus::Content => match state.screen() {
            Screen::Dashboard => handle_dashboard_key(state, runtime, view_data, internal_tx, key),
            Screen::Expenses => handle_expenses_key(state, runtime, view_data, internal_tx, key),
            Screen::NewOrder | Screen::SignedOut | Screen::NotFound => {
                if key.code == KeyCode::Enter {
                    state.dispatch(AppCommand::Navigate(NavigationRequest::to(Location::new(
                        DASHBOARD_PATH,
                    ))));
                }
            }
        },
    }
    false
}

fn handle_sidebar_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.dispatch(AppCommand::MoveSidebar(-1));
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.dispatch(AppCommand::MoveSidebar(1));
        }
        KeyCode::Enter => {
            state.dispatch(AppCommand::ActivateSidebar);
            state.dispatch(AppCommand::ToggleFocus);
        }
        _ => {}
    }
}

fn handle_dashboard_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => shift_filter(state, -1),
        KeyCode::Right | KeyCode::Char('l') => shift_filter(state, 1),
        KeyCode::Char(ch @ '0'..='4') => {
            let index = usize::from(ch as u8 - b'0');
            if let Some(filter) = StatusFilter::BAR.get(index) {
                state.dispatch(AppCommand::SetFilter(filter.clone()));
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.order_cursor = view_data.order_cursor.saturating_sub(1);
            view_data.order_detail = None;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.order_cursor = view_data.order_cursor.saturating_add(1);
            clamp_order_cursor(view_data);
            view_data.order_detail = None;
        }
        KeyCode::Enter => toggle_order_detail(state, runtime, view_data, internal_tx),
        KeyCode::Char('s') => advance_selected_order(state, runtime, view_data, internal_tx),
        KeyCode::Char('r') => view_data.feed.invalidate(),
        KeyCode::Char('n') => {
            state.dispatch(AppCommand::Navigate(NavigationRequest::to(Location::new(
                NEW_ORDER_PATH,
            ))));
        }
        _ => {}
    }
}

/// Moves along the filter bar. An unrecognized filter sits before the first
/// entry.
fn shift_filter(state: &mut AppState, delta: isize) {
    let len = StatusFilter::BAR.len() as isize;
    let next = match active_filter_index(state) {
        Some(index) => (index as isize + delta).rem_euclid(len),
        None if delta < 0 => len - 1,
        None => 0,
    };
    let filter = StatusFilter::BAR[next as usize].clone();
    state.dispatch(AppCommand::SetFilter(filter));
}

fn active_filter_index(state: &AppState) -> Option<usize> {
    StatusFilter::BAR
        .iter()
        .position(|filter| filter == state.active_filter())
}

fn selected_order(view_data: &ViewData) -> Option<&OrderSummary> {
    match view_data.feed.view() {
        FeedView::Orders(orders) => orders.get(view_data.order_cursor),
        _ => None,
    }
}

fn clamp_order_cursor(view_data: &mut ViewData) {
    let len = view_data.feed.orders().len();
    view_data.order_cursor = view_data.order_cursor.min(len.saturating_sub(1));
}

fn clamp_expense_cursor(view_data: &mut ViewData) {
    let len = view_data.expenses.len();
    view_data.expense_cursor = view_data.expense_cursor.min(len.saturating_sub(1));
}

fn toggle_order_detail<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(order_id) = selected_order(view_data).map(|order| order.id) else {
        emit_status(state, view_data, internal_tx, "No hay pedido seleccionado");
        return;
    };
    if view_data
        .order_detail
        .as_ref()
        .is_some_and(|detail| detail.order_id == order_id)
    {
        view_data.order_detail = None;
        return;
    }
    let items = runtime
        .load_order_items(order_id)
        .map_err(|error| error.to_string());
    view_data.order_detail = Some(OrderDetail { order_id, items });
}

fn advance_selected_order<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some((order_id, status)) = selected_order(view_data).map(|order| (order.id, order.status))
    else {
        emit_status(state, view_data, internal_tx, "No hay pedido seleccionado");
        return;
    };
    let Some(next) = status.next() else {
        emit_status(state, view_data, internal_tx, "El pedido ya fue enviado");
        return;
    };
    match runtime.advance_order_status(order_id, next) {
        Ok(()) => {
            view_data.feed.invalidate();
            view_data.order_detail = None;
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("Pedido #{} ahora está {}", order_id.get(), next.label()),
            );
        }
        Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
    }
}

fn handle_expenses_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.expense_cursor = view_data.expense_cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.expense_cursor = view_data.expense_cursor.saturating_add(1);
            clamp_expense_cursor(view_data);
        }
        KeyCode::Char('n') => {
            dispatch_and_sync(state, view_data, AppCommand::OpenForm(FormKind::Expense));
        }
        KeyCode::Char('d') => match view_data.expenses.get(view_data.expense_cursor) {
            Some(expense) => {
                let action = ConfirmAction::DeleteExpense(expense.id);
                dispatch_and_sync(state, view_data, AppCommand::Confirm(action));
            }
            None => emit_status(state, view_data, internal_tx, "No hay gasto seleccionado"),
        },
        KeyCode::Char('r') => load_expenses(runtime, view_data),
        _ => {}
    }
}

fn handle_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: ConfirmAction,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            dispatch_and_sync(state, view_data, AppCommand::ExitToNav);
            apply_confirmed(state, runtime, view_data, internal_tx, action);
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            dispatch_and_sync(state, view_data, AppCommand::ExitToNav);
        }
        _ => {}
    }
}

fn apply_confirmed<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: ConfirmAction,
) {
    match action {
        ConfirmAction::DeleteExpense(expense_id) => match runtime.delete_expense(expense_id) {
            Ok(()) => {
                load_expenses(runtime, view_data);
                emit_status(state, view_data, internal_tx, "Gasto eliminado");
            }
            Err(_) => emit_status(state, view_data, internal_tx, EXPENSE_DELETE_FAILED_MESSAGE),
        },
        ConfirmAction::Logout => match runtime.logout() {
            Ok(()) => {
                state.dispatch(AppCommand::Navigate(NavigationRequest::to(Location::new(
                    LOGIN_PATH,
                ))));
                emit_status(state, view_data, internal_tx, "Sesión cerrada");
            }
            Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
        },
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FormKind,
    key: KeyEvent,
) {
    sync_form_ui_state(state, view_data);
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => cancel_form(state, view_data, kind),
        (KeyCode::Enter, _) | (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
            submit_form(state, runtime, view_data, internal_tx, kind);
        }
        (KeyCode::Tab, _) | (KeyCode::Down, _) => {
            let status = move_form_field_cursor(view_data, 1);
            emit_status(state, view_data, internal_tx, status);
        }
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => {
            let status = move_form_field_cursor(view_data, -1);
            emit_status(state, view_data, internal_tx, status);
        }
        (KeyCode::Left, _) => cycle_form_choice(view_data, -1),
        (KeyCode::Right, _) => cycle_form_choice(view_data, 1),
        (KeyCode::Backspace, _) => erase_form_input(view_data),
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            let on_choice = view_data
                .form
                .as_ref()
                .is_some_and(|form| form.current_field().choices != FormChoiceKind::None);
            if !on_choice {
                push_form_char(view_data, ch);
            } else if let Some(digit) = ch.to_digit(10).filter(|digit| *digit > 0) {
                let status = apply_form_choice(view_data, digit as usize - 1);
                emit_status(state, view_data, internal_tx, status);
            }
        }
        _ => {}
    }
}

/// The new-order page is itself the form, so leaving it means leaving the
/// page.
fn cancel_form(state: &mut AppState, view_data: &mut ViewData, kind: FormKind) {
    match kind {
        FormKind::Expense => dispatch_and_sync(state, view_data, AppCommand::ExitToNav),
        FormKind::Order => {
            if !state.navigator.back() {
                state.dispatch(AppCommand::Navigate(NavigationRequest::to(Location::new(
                    DASHBOARD_PATH,
                ))));
            }
        }
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FormKind,
) {
    if let Err(error) = runtime.session().require_user() {
        emit_status(state, view_data, internal_tx, error.to_string());
        return;
    }
    let Some(form) = view_data.form.as_ref() else {
        emit_status(state, view_data, internal_tx, "formulario no disponible");
        return;
    };
    let payload = match validated_payload(form) {
        Ok(payload) => payload,
        Err(error) => {
            emit_status(state, view_data, internal_tx, error.to_string());
            return;
        }
    };
    if let Err(error) = runtime.submit_form(&payload) {
        emit_status(state, view_data, internal_tx, error.to_string());
        return;
    }

    view_data.form = None;
    match kind {
        FormKind::Expense => {
            dispatch_and_sync(state, view_data, AppCommand::ExitToNav);
            refresh_expenses(runtime, view_data);
            emit_status(state, view_data, internal_tx, EXPENSE_SAVED_MESSAGE);
        }
        FormKind::Order => {
            view_data.feed.invalidate();
            state.dispatch(AppCommand::Navigate(NavigationRequest::to(Location::new(
                DASHBOARD_PATH,
            ))));
            emit_status(state, view_data, internal_tx, ORDER_SAVED_MESSAGE);
        }
    }
}

fn sync_form_ui_state(state: &AppState, view_data: &mut ViewData) {
    let AppMode::Form(kind) = state.mode else {
        view_data.form = None;
        return;
    };
    if view_data.form.as_ref().is_some_and(|form| form.kind == kind) {
        return;
    }
    view_data.form = Some(FormUiState::blank(kind));
}

fn move_form_field_cursor(view_data: &mut ViewData, delta: isize) -> String {
    let Some(form) = view_data.form.as_mut() else {
        return "formulario no disponible".to_owned();
    };
    let len = form_field_specs(form.kind).len() as isize;
    form.field_index = (form.field_index as isize + delta).rem_euclid(len) as usize;
    format_form_field_status(form.kind, form.field_index)
}

fn push_form_char(view_data: &mut ViewData, ch: char) {
    if let Some(form) = view_data.form.as_mut()
        && let Some(value) = form.values.get_mut(form.field_index)
    {
        value.push(ch);
    }
}

fn erase_form_input(view_data: &mut ViewData) {
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    let on_choice = form.current_field().choices != FormChoiceKind::None;
    if let Some(value) = form.values.get_mut(form.field_index) {
        if on_choice {
            value.clear();
        } else {
            value.pop();
        }
    }
}

fn apply_form_choice(view_data: &mut ViewData, choice_index: usize) -> String {
    let Some(form) = view_data.form.as_mut() else {
        return "formulario no disponible".to_owned();
    };
    let spec = form.current_field();
    let options = choice_options(spec.choices);
    let Some((value, label)) = options.get(choice_index).copied() else {
        return format!("opción {} no disponible", choice_index + 1);
    };
    if let Some(slot) = form.values.get_mut(form.field_index) {
        *slot = value.to_owned();
    }
    format!("{}: {label}", spec.label)
}

fn cycle_form_choice(view_data: &mut ViewData, delta: isize) {
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    let options = choice_options(form.current_field().choices);
    if options.is_empty() {
        return;
    }
    let len = options.len() as isize;
    let current = form.value(form.field_index);
    let next = match options.iter().position(|(value, _)| *value == current) {
        Some(index) => (index as isize + delta).rem_euclid(len),
        None if delta < 0 => len - 1,
        None => 0,
    };
    if let Some(slot) = form.values.get_mut(form.field_index) {
        *slot = options[next as usize].0.to_owned();
    }
}

fn choice_options(kind: FormChoiceKind) -> Vec<(&'static str, &'static str)> {
    match kind {
        FormChoiceKind::None => Vec::new(),
        FormChoiceKind::PaymentAccount => PaymentAccount::ALL
            .iter()
            .map(|account| (account.as_str(), account.label()))
            .collect(),
        FormChoiceKind::OrderStatus => OrderStatus::ALL
            .iter()
            .map(|status| (status.as_str(), status.label()))
            .collect(),
    }
}

fn choice_label(kind: FormChoiceKind, value: &str) -> Option<&'static str> {
    choice_options(kind)
        .into_iter()
        .find(|(option, _)| *option == value)
        .map(|(_, label)| label)
}

fn format_form_field_status(kind: FormKind, index: usize) -> String {
    let fields = form_field_specs(kind);
    let field = fields[index.min(fields.len().saturating_sub(1))];
    format!("campo {} ({}/{})", field.label, index + 1, fields.len())
}

fn form_field_specs(kind: FormKind) -> &'static [FormFieldSpec] {
    match kind {
        FormKind::Expense => &EXPENSE_FIELDS,
        FormKind::Order => &ORDER_FIELDS,
    }
}

fn values_for_payload(payload: &FormPayload) -> Vec<String> {
    let money = |cents: i64| {
        if cents == 0 {
            String::new()
        } else {
            format_cents_plain(cents)
        }
    };
    match payload {
        FormPayload::Expense(input) => vec![
            input.description.clone(),
            input.amount_cents.map(money).unwrap_or_default(),
            input
                .account
                .map(|account| account.as_str().to_owned())
                .unwrap_or_default(),
        ],
        FormPayload::Order(input) => vec![
            input.customer_name.clone(),
            input.customer_email.clone(),
            input
                .payment_account
                .map(|account| account.as_str().to_owned())
                .unwrap_or_default(),
            money(input.anticipo_cents),
            money(input.total_cents),
            input.status.as_str().to_owned(),
            input.notes.clone(),
        ],
    }
}

/// Builds the payload from the typed text and runs the form's checks. An
/// expense amount that does not parse counts as missing.
fn validated_payload(form: &FormUiState) -> Result<FormPayload, ActionError> {
    let payload = match form.kind {
        FormKind::Expense => FormPayload::Expense(ExpenseFormInput {
            description: form.value(EXPENSE_DESCRIPTION).trim().to_owned(),
            amount_cents: parse_required_cents(form.value(EXPENSE_AMOUNT)).ok(),
            account: PaymentAccount::parse(form.value(EXPENSE_ACCOUNT)),
        }),
        FormKind::Order => {
            let anticipo_cents = parse_cents_or_zero(form.value(ORDER_ANTICIPO))
                .map_err(|_| ActionError::validation("El anticipo no es un monto válido"))?;
            let total_cents = parse_cents_or_zero(form.value(ORDER_TOTAL))
                .map_err(|_| ActionError::validation("El total no es un monto válido"))?;
            FormPayload::Order(OrderFormInput {
                customer_name: form.value(ORDER_CUSTOMER).trim().to_owned(),
                customer_email: form.value(ORDER_EMAIL).trim().to_owned(),
                payment_account: PaymentAccount::parse(form.value(ORDER_ACCOUNT)),
                anticipo_cents,
                total_cents,
                status: OrderStatus::parse(form.value(ORDER_STATUS))
                    .unwrap_or(OrderStatus::Quoted),
                notes: form.value(ORDER_NOTES).trim().to_owned(),
            })
        }
    };
    payload.validate()?;
    Ok(payload)
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData, user: &str) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(render_header_text(state, user))
        .block(Block::default().title("XpresaControl").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(layout[1]);

    let sidebar_border = if state.focus == Focus::Sidebar && state.mode == AppMode::Nav {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let sidebar = Paragraph::new(render_sidebar_text(state)).block(
        Block::default()
            .title("menú")
            .borders(Borders::ALL)
            .border_style(sidebar_border),
    );
    frame.render_widget(sidebar, body[0]);

    let screen = state.screen();
    match screen {
        Screen::Dashboard => render_dashboard(frame, body[1], state, view_data),
        Screen::Expenses => render_ledger(frame, body[1], view_data),
        Screen::NewOrder => {
            let form = Paragraph::new(render_form_text(view_data))
                .block(Block::default().title(screen.title()).borders(Borders::ALL));
            frame.render_widget(form, body[1]);
        }
        Screen::SignedOut | Screen::NotFound => {
            let notice = Paragraph::new(render_notice_text(state))
                .block(Block::default().title(screen.title()).borders(Borders::ALL));
            frame.render_widget(notice, body[1]);
        }
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if state.mode == AppMode::Form(FormKind::Expense) {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(render_form_text(view_data))
            .block(Block::default().title("Nuevo gasto").borders(Borders::ALL));
        frame.render_widget(form, area);
    }

    if let AppMode::Confirm(action) = state.mode {
        let area = centered_rect(50, 24, frame.area());
        frame.render_widget(Clear, area);
        let confirm = Paragraph::new(render_confirm_text(action, view_data)).block(
            Block::default()
                .title("confirmar")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(confirm, area);
    }
}

fn render_dashboard(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let mut constraints = vec![Constraint::Length(3), Constraint::Min(1)];
    if view_data.order_detail.is_some() {
        constraints.push(Constraint::Length(DETAIL_HEIGHT));
    }
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let counts = view_data.feed.counts();
    let titles = StatusFilter::BAR
        .iter()
        .map(|filter| filter_tab_title(filter, counts))
        .collect::<Vec<String>>();
    let highlight = match active_filter_index(state) {
        Some(_) => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        None => Style::default(),
    };
    let tabs = Tabs::new(titles)
        .block(Block::default().title("estado").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(highlight)
        .select(active_filter_index(state).unwrap_or(0));
    frame.render_widget(tabs, sections[0]);

    let title = format!("{} | {}", Screen::Dashboard.title(), state.active_filter().label());
    match view_data.feed.view() {
        FeedView::Orders(orders) => {
            let header = Row::new(
                ["#", "Cliente", "Total", "Estado", "Fecha"].map(|label| {
                    Cell::from(label).style(
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    )
                }),
            );
            let rows = orders.iter().enumerate().map(|(index, order)| {
                let style = if index == view_data.order_cursor {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Row::new(order_row_cells(order).map(Cell::from)).style(style)
            });
            let widths = [
                Constraint::Length(6),
                Constraint::Min(16),
                Constraint::Length(14),
                Constraint::Length(12),
                Constraint::Length(12),
            ];
            let table = Table::new(rows, widths)
                .header(header)
                .column_spacing(1)
                .block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(table, sections[1]);
        }
        view => {
            let style = match view {
                FeedView::Failed(_) => Style::default().fg(Color::Red),
                _ => Style::default(),
            };
            let body = Paragraph::new(render_feed_text(view))
                .style(style)
                .block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(body, sections[1]);
        }
    }

    if let Some(detail) = &view_data.order_detail {
        let panel = Paragraph::new(render_order_detail_text(detail))
            .block(Block::default().title("artículos").borders(Borders::ALL));
        frame.render_widget(panel, sections[2]);
    }
}

fn render_ledger(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let block = Block::default()
        .title(Screen::Expenses.title())
        .borders(Borders::ALL);
    if view_data.expenses_error.is_some() || view_data.expenses.is_empty() {
        let style = if view_data.expenses_error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        let body = Paragraph::new(render_ledger_text(view_data))
            .style(style)
            .block(block);
        frame.render_widget(body, area);
        return;
    }

    let header = Row::new(["Fecha", "Descripción", "Cuenta", "Monto"].map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = view_data.expenses.iter().enumerate().map(|(index, expense)| {
        let style = if index == view_data.expense_cursor {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(expense_row_cells(expense).map(Cell::from)).style(style)
    });
    let widths = [
        Constraint::Length(12),
        Constraint::Min(16),
        Constraint::Length(20),
        Constraint::Length(14),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn render_header_text(state: &AppState, user: &str) -> String {
    format!(
        "{} | {user} | {}",
        state.screen().title(),
        state.location().href()
    )
}

fn render_sidebar_text(state: &AppState) -> String {
    let active = state.active_target();
    let pointing = state.focus == Focus::Sidebar && state.mode == AppMode::Nav;
    NAV_TARGETS
        .iter()
        .enumerate()
        .map(|(index, target)| {
            let cursor = if pointing && index == state.sidebar_cursor {
                ">"
            } else {
                " "
            };
            let marker = if active == Some(target) { "●" } else { " " };
            format!("{cursor}{marker} {} {}", target.icon.glyph(), target.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn filter_tab_title(filter: &StatusFilter, counts: &StatusCounts) -> String {
    format!("{} ({})", filter.label(), counts.for_filter(filter))
}

/// Text shown in place of the order grid. Only the list view has no text of
/// its own.
fn render_feed_text(view: FeedView<'_>) -> String {
    match view {
        FeedView::Loading => LOADING_ORDERS_TEXT.to_owned(),
        FeedView::Failed(error) => error.to_owned(),
        FeedView::Empty(filter) => empty_message(filter),
        FeedView::Orders(orders) => orders
            .iter()
            .map(|order| order_row_cells(order).join("  "))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn order_row_cells(order: &OrderSummary) -> [String; 5] {
    [
        format!("#{}", order.id.get()),
        order
            .customer_name
            .clone()
            .unwrap_or_else(|| "Sin nombre".to_owned()),
        format_cents(order.total_cents),
        order.status.label().to_owned(),
        order.created_at.format(DATE_FORMAT).unwrap_or_default(),
    ]
}

fn render_order_detail_text(detail: &OrderDetail) -> String {
    let items = match &detail.items {
        Ok(items) => items,
        Err(error) => return error.clone(),
    };
    if items.is_empty() {
        return format!("Pedido #{} sin artículos.", detail.order_id.get());
    }
    let mut lines = items
        .iter()
        .map(|item| {
            let size = item
                .size
                .as_deref()
                .map(|size| format!(" ({size})"))
                .unwrap_or_default();
            format!(
                "{} x {}{size} @ {} = {}",
                item.quantity,
                item.product_name,
                format_cents(item.unit_price_cents),
                format_cents(item.subtotal_cents())
            )
        })
        .collect::<Vec<_>>();
    let total = items.iter().map(OrderItem::subtotal_cents).sum::<i64>();
    lines.push(format!("Total artículos: {}", format_cents(total)));
    lines.join("\n")
}

fn render_ledger_text(view_data: &ViewData) -> String {
    if let Some(error) = &view_data.expenses_error {
        return error.clone();
    }
    if view_data.expenses.is_empty() {
        return NO_EXPENSES_TEXT.to_owned();
    }
    view_data
        .expenses
        .iter()
        .enumerate()
        .map(|(index, expense)| {
            let cursor = if index == view_data.expense_cursor {
                ">"
            } else {
                " "
            };
            format!("{cursor} {}", expense_row_cells(expense).join("  "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn expense_row_cells(expense: &Expense) -> [String; 4] {
    [
        expense.created_at.format(DATE_FORMAT).unwrap_or_default(),
        expense.description.clone(),
        expense.account.label().to_owned(),
        format_cents(expense.amount_cents),
    ]
}

fn render_form_text(view_data: &ViewData) -> String {
    let Some(form) = &view_data.form else {
        return String::new();
    };
    let mut lines = Vec::new();
    for (index, spec) in form_field_specs(form.kind).iter().enumerate() {
        let focused = index == form.field_index;
        let cursor = if focused { ">" } else { " " };
        let raw = form.value(index);
        let shown = match spec.choices {
            FormChoiceKind::None => raw.to_owned(),
            kind => choice_label(kind, raw).unwrap_or("-").to_owned(),
        };
        lines.push(format!("{cursor} {}: {shown}", spec.label));
        if focused && spec.choices != FormChoiceKind::None {
            let options = choice_options(spec.choices)
                .iter()
                .enumerate()
                .map(|(option, (_, label))| format!("{} {label}", option + 1))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("    [{options}]"));
        }
    }
    lines.join("\n")
}

fn render_confirm_text(action: ConfirmAction, view_data: &ViewData) -> String {
    let question = match action {
        ConfirmAction::DeleteExpense(expense_id) => {
            match view_data
                .expenses
                .iter()
                .find(|expense| expense.id == expense_id)
            {
                Some(expense) => format!(
                    "¿Estás seguro de eliminar este gasto?\n\"{}\" por {}",
                    expense.description,
                    format_cents(expense.amount_cents)
                ),
                None => "¿Estás seguro de eliminar este gasto?".to_owned(),
            }
        }
        ConfirmAction::Logout => "¿Cerrar sesión?".to_owned(),
    };
    format!("{question}\n\ny: sí | n: no")
}

fn render_notice_text(state: &AppState) -> String {
    match state.screen() {
        Screen::SignedOut => "Sesión cerrada. Pulsa q para salir.".to_owned(),
        _ => format!(
            "No existe la página {}. Pulsa enter para volver a tus pedidos.",
            state.location().path()
        ),
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mode = mode_label(state.mode);
    let mut hints = key_hints(state).to_owned();
    if let AppMode::Form(_) = state.mode
        && let Some(form) = &view_data.form
    {
        hints = format!(
            "{} | {hints}",
            format_form_field_status(form.kind, form.field_index)
        );
    }
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn mode_label(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Nav => "NAV",
        AppMode::Form(_) => "FORM",
        AppMode::Confirm(_) => "CONFIRM",
    }
}

fn key_hints(state: &AppState) -> &'static str {
    match state.mode {
        AppMode::Confirm(_) => "y confirmar | n cancelar",
        AppMode::Form(_) => "tab campo | 1-9 ←/→ opción | enter guardar | esc cancelar",
        AppMode::Nav if state.focus == Focus::Sidebar => {
            "j/k mover | enter abrir | tab contenido | q salir"
        }
        AppMode::Nav => match state.screen() {
            Screen::Dashboard => {
                "h/l 0-4 estado | j/k pedido | enter artículos | s avanzar | n nuevo | r recargar | tab menú | L cerrar sesión | q"
            }
            Screen::Expenses => {
                "j/k gasto | n nuevo | d eliminar | r recargar | tab menú | L cerrar sesión | q"
            }
            _ => "enter inicio | esc atrás | tab menú | q salir",
        },
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
