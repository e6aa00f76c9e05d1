// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, warn};
use xpresa_app::{
    Expense, ExpenseFormInput, ExpenseId, Order, OrderFormInput, OrderId, OrderItem, OrderItemId,
    OrderListing, OrderStatus, OrderSummary, PaymentAccount, PersistedSession, Profile, ProfileId,
    StatusCounts, StatusFilter,
};

pub const APP_NAME: &str = "xpresa";
pub const DEFAULT_RECENT_EXPENSES: usize = 20;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("profiles", &["id", "full_name", "avatar_url", "updated_at"]),
    (
        "orders",
        &[
            "id",
            "temp_id",
            "previo_number",
            "vendedor_id",
            "customer_name",
            "customer_email",
            "payment_account",
            "anticipo_cents",
            "total_cents",
            "status",
            "shipping_guide",
            "shipping_carrier",
            "commission_cents",
            "notes",
            "created_at",
        ],
    ),
    (
        "order_items",
        &[
            "id",
            "order_id",
            "product_name",
            "size",
            "quantity",
            "unit_price_cents",
        ],
    ),
    (
        "expenses",
        &[
            "id",
            "description",
            "amount_cents",
            "account",
            "vendedor_id",
            "created_at",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_orders_status",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status);",
    },
    RequiredIndex {
        name: "idx_orders_created_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at);",
    },
    RequiredIndex {
        name: "idx_orders_vendedor_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_orders_vendedor_id ON orders (vendedor_id);",
    },
    RequiredIndex {
        name: "idx_order_items_order_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id);",
    },
    RequiredIndex {
        name: "idx_expenses_created_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_expenses_created_at ON expenses (created_at);",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub vendedor_id: ProfileId,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub payment_account: Option<PaymentAccount>,
    pub anticipo_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn from_form(input: &OrderFormInput, vendedor_id: ProfileId) -> Self {
        Self {
            vendedor_id,
            customer_name: non_blank(&input.customer_name),
            customer_email: non_blank(&input.customer_email),
            payment_account: input.payment_account,
            anticipo_cents: input.anticipo_cents,
            total_cents: input.total_cents,
            status: input.status,
            notes: non_blank(&input.notes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub description: String,
    pub amount_cents: i64,
    pub account: PaymentAccount,
    pub vendedor_id: ProfileId,
}

impl NewExpense {
    /// Expects a form that already passed validation.
    pub fn from_form(input: &ExpenseFormInput, vendedor_id: ProfileId) -> Result<Self> {
        let amount_cents = input
            .amount_cents
            .ok_or_else(|| anyhow!("expense amount is required -- enter an amount and retry"))?;
        let account = input
            .account
            .ok_or_else(|| anyhow!("expense account is required -- choose an account and retry"))?;
        Ok(Self {
            description: input.description.trim().to_owned(),
            amount_cents,
            account,
            vendedor_id,
        })
    }
}

/// Read and write access to orders and their line items.
pub trait OrderRepository {
    /// Orders matching `filter`, newest first, plus counts over every order.
    fn list_orders(&self, filter: &StatusFilter) -> Result<OrderListing>;
    fn get_order(&self, order_id: OrderId) -> Result<Order>;
    fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;
    fn create_order(&self, order: &NewOrder, items: &[NewOrderItem]) -> Result<OrderId>;
    fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()>;
}

pub trait ExpenseRepository {
    fn list_recent_expenses(&self, limit: usize) -> Result<Vec<Expense>>;
    fn create_expense(&self, expense: &NewExpense) -> Result<ExpenseId>;
    fn delete_expense(&self, expense_id: ExpenseId) -> Result<()>;
}

pub trait ProfileRepository {
    fn get_profile(&self, profile_id: ProfileId) -> Result<Option<Profile>>;
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("created database schema");
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    pub fn create_profile(&self, full_name: Option<&str>) -> Result<ProfileId> {
        let now = now_timestamp()?;
        self.conn
            .execute(
                "INSERT INTO profiles (full_name, updated_at) VALUES (?, ?)",
                params![full_name, now],
            )
            .context("insert profile")?;
        let profile_id = ProfileId::new(self.conn.last_insert_rowid());
        info!(profile_id = profile_id.get(), "created profile");
        Ok(profile_id)
    }

    /// Seeds a seller with a spread of orders and a few expenses. Returns the
    /// seller so a demo session can sign in as them.
    pub fn seed_demo_data(&self) -> Result<Profile> {
        let seller = self.create_profile(Some("Alejandra Ruiz"))?;

        let orders: [(&str, &str, OrderStatus, i64, i64, &[(&str, &str, i64, i64)]); 7] = [
            (
                "Club Deportivo Norte",
                "compras@cdnorte.mx",
                OrderStatus::Quoted,
                0,
                1_260_000,
                &[("Playera dry-fit", "M", 30, 32_000), ("Short deportivo", "M", 30, 10_000)],
            ),
            (
                "Escuela Primaria Benito Juárez",
                "",
                OrderStatus::Pending,
                300_000,
                840_000,
                &[("Polo bordado", "CH", 60, 14_000)],
            ),
            (
                "Taller Mecánico El Güero",
                "elguero@taller.mx",
                OrderStatus::Pending,
                150_000,
                420_000,
                &[("Overol industrial", "G", 12, 35_000)],
            ),
            (
                "Café La Esquina",
                "hola@laesquina.mx",
                OrderStatus::Paid,
                275_000,
                275_000,
                &[("Mandil con logo", "Unitalla", 25, 11_000)],
            ),
            (
                "Liga Infantil Tigres",
                "",
                OrderStatus::Shipped,
                960_000,
                960_000,
                &[("Uniforme completo", "8", 40, 24_000)],
            ),
            (
                "Clínica Dental Sonrisas",
                "admin@sonrisas.mx",
                OrderStatus::Quoted,
                0,
                510_000,
                &[("Filipina médica", "M", 15, 34_000)],
            ),
            (
                "Gimnasio Fuerza",
                "",
                OrderStatus::Shipped,
                480_000,
                480_000,
                &[("Sudadera con capucha", "G", 16, 30_000)],
            ),
        ];

        for (customer, email, status, anticipo, total, items) in orders {
            let new_order = NewOrder {
                vendedor_id: seller,
                customer_name: Some(customer.to_owned()),
                customer_email: non_blank(email),
                payment_account: Some(PaymentAccount::XpresaBanregio),
                anticipo_cents: anticipo,
                total_cents: total,
                status,
                notes: None,
            };
            let items = items
                .iter()
                .map(|(product, size, quantity, unit_price)| NewOrderItem {
                    product_name: (*product).to_owned(),
                    size: Some((*size).to_owned()),
                    quantity: *quantity,
                    unit_price_cents: *unit_price,
                })
                .collect::<Vec<_>>();
            self.create_order(&new_order, &items)?;
        }

        for (description, amount_cents, account) in [
            ("Tinta para sublimación", 185_000, PaymentAccount::Proveedores),
            ("Hilo para bordado", 42_500, PaymentAccount::Efectivo),
            ("Envío paquetería", 31_000, PaymentAccount::MercadoPagoXpresa),
            ("Mantenimiento de plancha", 90_000, PaymentAccount::XpresaHsbc),
        ] {
            self.create_expense(&NewExpense {
                description: description.to_owned(),
                amount_cents,
                account,
                vendedor_id: seller,
            })?;
        }

        self.get_profile(seller)?
            .ok_or_else(|| anyhow!("demo profile {} vanished after insert", seller.get()))
    }

    fn status_counts(&self) -> Result<StatusCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM orders GROUP BY status")
            .context("prepare order counts query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .context("query order counts")?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (raw, count) = row.context("read order count")?;
            match OrderStatus::parse(&raw) {
                Some(status) => counts.set(status, usize::try_from(count).unwrap_or(0)),
                None => warn!(status = %raw, "ignoring orders with unknown status"),
            }
        }
        Ok(counts)
    }
}

impl OrderRepository for Store {
    fn list_orders(&self, filter: &StatusFilter) -> Result<OrderListing> {
        let mut sql = String::from(
            "
            SELECT id, customer_name, total_cents, status, created_at
            FROM orders
            ",
        );
        let status = filter.query_value();
        if status.is_some() {
            sql.push_str("WHERE status = ?1\n");
        }
        sql.push_str("ORDER BY julianday(created_at) DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql).context("prepare orders query")?;
        let rows = match status {
            Some(status) => stmt.query_map(params![status], order_summary_from_row),
            None => stmt.query_map([], order_summary_from_row),
        }
        .context("query orders")?;
        let orders = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect orders")?;

        let counts = self.status_counts()?;
        debug!(filter = %filter, rows = orders.len(), "listed orders");
        Ok(OrderListing { orders, counts })
    }

    fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.conn
            .query_row(
                "
                SELECT
                  id, temp_id, previo_number, vendedor_id, customer_name,
                  customer_email, payment_account, anticipo_cents, total_cents,
                  status, shipping_guide, shipping_carrier, commission_cents,
                  notes, created_at
                FROM orders
                WHERE id = ?
                ",
                params![order_id.get()],
                |row| {
                    let payment_raw: Option<String> = row.get(6)?;
                    let payment_account = payment_raw
                        .map(|raw| parse_account(6, &raw))
                        .transpose()?;
                    let status_raw: String = row.get(9)?;
                    let created_at_raw: String = row.get(14)?;

                    Ok(Order {
                        id: OrderId::new(row.get(0)?),
                        temp_id: row.get(1)?,
                        previo_number: row.get(2)?,
                        vendedor_id: ProfileId::new(row.get(3)?),
                        customer_name: row.get(4)?,
                        customer_email: row.get(5)?,
                        payment_account,
                        anticipo_cents: row.get(7)?,
                        total_cents: row.get(8)?,
                        status: parse_status(9, &status_raw)?,
                        shipping_guide: row.get(10)?,
                        shipping_carrier: row.get(11)?,
                        commission_cents: row.get(12)?,
                        notes: row.get(13)?,
                        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                    })
                },
            )
            .with_context(|| format!("load order {}", order_id.get()))
    }

    fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, order_id, product_name, size, quantity, unit_price_cents
                FROM order_items
                WHERE order_id = ?
                ORDER BY id ASC
                ",
            )
            .context("prepare order items query")?;
        let rows = stmt
            .query_map(params![order_id.get()], |row| {
                Ok(OrderItem {
                    id: OrderItemId::new(row.get(0)?),
                    order_id: OrderId::new(row.get(1)?),
                    product_name: row.get(2)?,
                    size: row.get(3)?,
                    quantity: row.get(4)?,
                    unit_price_cents: row.get(5)?,
                })
            })
            .with_context(|| format!("query items for order {}", order_id.get()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect order items")
    }

    fn create_order(&self, order: &NewOrder, items: &[NewOrderItem]) -> Result<OrderId> {
        let now = now_timestamp()?;
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin order transaction")?;

        let temp_id: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(temp_id), 0) + 1 FROM orders",
                [],
                |row| row.get(0),
            )
            .context("allocate order number")?;
        tx.execute(
            "
            INSERT INTO orders (
              temp_id, vendedor_id, customer_name, customer_email,
              payment_account, anticipo_cents, total_cents, status,
              notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                temp_id,
                order.vendedor_id.get(),
                order.customer_name,
                order.customer_email,
                order.payment_account.map(PaymentAccount::as_str),
                order.anticipo_cents,
                order.total_cents,
                order.status.as_str(),
                order.notes,
                now,
            ],
        )
        .context("insert order")?;
        let order_id = OrderId::new(tx.last_insert_rowid());

        for item in items {
            tx.execute(
                "
                INSERT INTO order_items (
                  order_id, product_name, size, quantity, unit_price_cents
                ) VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    order_id.get(),
                    item.product_name,
                    item.size,
                    item.quantity,
                    item.unit_price_cents,
                ],
            )
            .with_context(|| format!("insert order item {}", item.product_name))?;
        }

        tx.commit().context("commit order")?;
        info!(
            order_id = order_id.get(),
            temp_id,
            status = order.status.as_str(),
            items = items.len(),
            "created order"
        );
        Ok(order_id)
    }

    fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE orders SET status = ? WHERE id = ?",
                params![status.as_str(), order_id.get()],
            )
            .context("update order status")?;
        if rows_affected == 0 {
            bail!(
                "order {} not found -- refresh the dashboard and retry",
                order_id.get()
            );
        }
        info!(order_id = order_id.get(), status = status.as_str(), "updated order status");
        Ok(())
    }
}

impl ExpenseRepository for Store {
    fn list_recent_expenses(&self, limit: usize) -> Result<Vec<Expense>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, description, amount_cents, account, vendedor_id, created_at
                FROM expenses
                ORDER BY julianday(created_at) DESC, id DESC
                LIMIT ?
                ",
            )
            .context("prepare expenses query")?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let account_raw: String = row.get(3)?;
                let created_at_raw: String = row.get(5)?;
                Ok(Expense {
                    id: ExpenseId::new(row.get(0)?),
                    description: row.get(1)?,
                    amount_cents: row.get(2)?,
                    account: parse_account(3, &account_raw)?,
                    vendedor_id: ProfileId::new(row.get(4)?),
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query expenses")?;
        let expenses = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect expenses")?;
        debug!(rows = expenses.len(), "listed expenses");
        Ok(expenses)
    }

    fn create_expense(&self, expense: &NewExpense) -> Result<ExpenseId> {
        if expense.description.trim().is_empty() {
            bail!("expense description is required -- enter a description and retry");
        }
        if expense.amount_cents <= 0 {
            bail!("expense amount must be positive");
        }
        let now = now_timestamp()?;
        self.conn
            .execute(
                "
                INSERT INTO expenses (description, amount_cents, account, vendedor_id, created_at)
                VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    expense.description,
                    expense.amount_cents,
                    expense.account.as_str(),
                    expense.vendedor_id.get(),
                    now,
                ],
            )
            .context("insert expense")?;
        let expense_id = ExpenseId::new(self.conn.last_insert_rowid());
        info!(
            expense_id = expense_id.get(),
            amount_cents = expense.amount_cents,
            account = expense.account.as_str(),
            "created expense"
        );
        Ok(expense_id)
    }

    fn delete_expense(&self, expense_id: ExpenseId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?", params![expense_id.get()])
            .context("delete expense")?;
        if rows_affected == 0 {
            bail!("expense {} not found", expense_id.get());
        }
        info!(expense_id = expense_id.get(), "deleted expense");
        Ok(())
    }
}

impl ProfileRepository for Store {
    fn get_profile(&self, profile_id: ProfileId) -> Result<Option<Profile>> {
        self.conn
            .query_row(
                "SELECT id, full_name, avatar_url, updated_at FROM profiles WHERE id = ?",
                params![profile_id.get()],
                |row| {
                    let updated_at_raw: String = row.get(3)?;
                    Ok(Profile {
                        id: ProfileId::new(row.get(0)?),
                        full_name: row.get(1)?,
                        avatar_url: row.get(2)?,
                        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("load profile {}", profile_id.get()))
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("XPRESA_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    Ok(data_dir()?.join("xpresa.db"))
}

pub fn default_session_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("session.json"))
}

/// The per-user data directory, created on first use.
pub fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set XPRESA_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

/// Reads the persisted session. A missing file is no session; a malformed
/// one is logged and also treated as no session.
pub fn load_session_file(path: &Path) -> Result<Option<PersistedSession>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("read session file {}", path.display()));
        }
    };

    match PersistedSession::parse(&raw) {
        Ok(session) => Ok(Some(session)),
        Err(error) => {
            warn!(path = %path.display(), error = %format!("{error:#}"), "ignoring malformed session file");
            Ok(None)
        }
    }
}

pub fn write_session_file(path: &Path, session: &PersistedSession) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create session directory {}", parent.display()))?;
    }
    fs::write(path, session.to_json()?)
        .with_context(|| format!("write session file {}", path.display()))?;
    set_private_permissions(path)?;
    info!(path = %path.display(), user_id = session.user.id, "wrote session file");
    Ok(())
}

/// Deletes the persisted session. Returns whether a file was removed.
pub fn remove_session_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed session file");
            Ok(true)
        }
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
        Err(error) => {
            Err(error).with_context(|| format!("remove session file {}", path.display()))
        }
    }
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn order_summary_from_row(row: &Row<'_>) -> rusqlite::Result<OrderSummary> {
    let status_raw: String = row.get(3)?;
    let created_at_raw: String = row.get(4)?;
    Ok(OrderSummary {
        id: OrderId::new(row.get(0)?),
        customer_name: row.get(1)?,
        total_cents: row.get(2)?,
        status: parse_status(3, &status_raw)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

fn parse_status(index: usize, raw: &str) -> rusqlite::Result<OrderStatus> {
    OrderStatus::parse(raw).ok_or_else(|| invalid_column(index, format!("unknown order status {raw}")))
}

fn parse_account(index: usize, raw: &str) -> rusqlite::Result<PaymentAccount> {
    PaymentAccount::parse(raw)
        .ok_or_else(|| invalid_column(index, format!("unknown payment account {raw}")))
}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(ErrorKind::InvalidData, message)),
    )
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use an xpresa database or migrate first"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

/// Fixed-width UTC stamps, so equal-length strings also compare in time order.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
);

fn now_timestamp() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(TIMESTAMP_FORMAT)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    invalid_column(0, error.to_string())
}

fn set_private_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("set permissions on {}", path.display()))?;
    }
    Ok(())
}
