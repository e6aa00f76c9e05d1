// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

pub const STATUS_PARAM: &str = "status";
pub const ALL_FILTER: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Quoted,
    Pending,
    Paid,
    Shipped,
}

impl OrderStatus {
    pub const ALL: [Self; 4] = [Self::Quoted, Self::Pending, Self::Paid, Self::Shipped];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quoted => "cotizado",
            Self::Pending => "pendiente",
            Self::Paid => "pagado",
            Self::Shipped => "enviado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cotizado" => Some(Self::Quoted),
            "pendiente" => Some(Self::Pending),
            "pagado" => Some(Self::Paid),
            "enviado" => Some(Self::Shipped),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Quoted => "Cotizado",
            Self::Pending => "Pendiente",
            Self::Paid => "Pagado",
            Self::Shipped => "Enviado",
        }
    }

    /// Next stage in the order lifecycle; shipped orders stay shipped.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Quoted => Some(Self::Pending),
            Self::Pending => Some(Self::Paid),
            Self::Paid => Some(Self::Shipped),
            Self::Shipped => None,
        }
    }
}

/// The order-status restriction derived from the `status` query parameter.
///
/// Values that are neither `all` nor a known status are kept verbatim so they
/// can still be queried and named, even though nothing in the sidebar points
/// at them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Status(OrderStatus),
    Unrecognized(String),
}

impl StatusFilter {
    pub const BAR: [Self; 5] = [
        Self::All,
        Self::Status(OrderStatus::Quoted),
        Self::Status(OrderStatus::Pending),
        Self::Status(OrderStatus::Paid),
        Self::Status(OrderStatus::Shipped),
    ];

    /// `None` and `"all"` both mean no restriction; an empty value is treated
    /// as absent.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some(ALL_FILTER) => Self::All,
            Some(raw) => match OrderStatus::parse(raw) {
                Some(status) => Self::Status(status),
                None => Self::Unrecognized(raw.to_owned()),
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_FILTER,
            Self::Status(status) => status.as_str(),
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Query-string form; `None` removes the parameter.
    pub fn query_value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            other => Some(other.as_str()),
        }
    }

    pub fn status(&self) -> Option<OrderStatus> {
        match self {
            Self::Status(status) => Some(*status),
            Self::All | Self::Unrecognized(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "Todos",
            Self::Status(status) => status.label(),
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusCounts {
    pub quoted: usize,
    pub pending: usize,
    pub paid: usize,
    pub shipped: usize,
}

impl StatusCounts {
    pub const fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Quoted => self.quoted,
            OrderStatus::Pending => self.pending,
            OrderStatus::Paid => self.paid,
            OrderStatus::Shipped => self.shipped,
        }
    }

    pub fn set(&mut self, status: OrderStatus, count: usize) {
        match status {
            OrderStatus::Quoted => self.quoted = count,
            OrderStatus::Pending => self.pending = count,
            OrderStatus::Paid => self.paid = count,
            OrderStatus::Shipped => self.shipped = count,
        }
    }

    pub const fn total(&self) -> usize {
        self.quoted + self.pending + self.paid + self.shipped
    }

    pub fn for_filter(&self, filter: &StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.total(),
            StatusFilter::Status(status) => self.get(*status),
            StatusFilter::Unrecognized(_) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentAccount {
    Proveedores,
    AlexBanorte,
    XpresaBanregio,
    XpresaHsbc,
    MercadoPagoXpresa,
    MercadoPagoAlex,
    Efectivo,
}

impl PaymentAccount {
    pub const ALL: [Self; 7] = [
        Self::Proveedores,
        Self::AlexBanorte,
        Self::XpresaBanregio,
        Self::XpresaHsbc,
        Self::MercadoPagoXpresa,
        Self::MercadoPagoAlex,
        Self::Efectivo,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proveedores => "proveedores",
            Self::AlexBanorte => "alex_banorte",
            Self::XpresaBanregio => "xpresa_banregio",
            Self::XpresaHsbc => "xpresa_hsbc",
            Self::MercadoPagoXpresa => "mercado_pago_xpresa",
            Self::MercadoPagoAlex => "mercado_pago_alex",
            Self::Efectivo => "efectivo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "proveedores" => Some(Self::Proveedores),
            "alex_banorte" => Some(Self::AlexBanorte),
            "xpresa_banregio" => Some(Self::XpresaBanregio),
            "xpresa_hsbc" => Some(Self::XpresaHsbc),
            "mercado_pago_xpresa" => Some(Self::MercadoPagoXpresa),
            "mercado_pago_alex" => Some(Self::MercadoPagoAlex),
            "efectivo" => Some(Self::Efectivo),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Proveedores => "Proveedores",
            Self::AlexBanorte => "Alex Banorte",
            Self::XpresaBanregio => "Xpresa Banregio",
            Self::XpresaHsbc => "Xpresa HSBC",
            Self::MercadoPagoXpresa => "Mercado Pago Xpresa",
            Self::MercadoPagoAlex => "Mercado Pago Alex",
            Self::Efectivo => "Efectivo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub temp_id: i64,
    pub previo_number: Option<i64>,
    pub vendedor_id: ProfileId,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub payment_account: Option<PaymentAccount>,
    pub anticipo_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub shipping_guide: Option<String>,
    pub shipping_carrier: Option<String>,
    pub commission_cents: i64,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub const fn subtotal_cents(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price_cents)
    }
}

/// Read shape returned by the order query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrderListing {
    pub orders: Vec<OrderSummary>,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount_cents: i64,
    pub account: PaymentAccount,
    pub vendedor_id: ProfileId,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Dashboard,
    Expenses,
    NewOrder,
    SignedOut,
    NotFound,
}

impl Screen {
    pub fn for_path(path: &str) -> Self {
        match path {
            crate::DASHBOARD_PATH => Self::Dashboard,
            crate::EXPENSES_PATH => Self::Expenses,
            crate::NEW_ORDER_PATH => Self::NewOrder,
            crate::LOGIN_PATH => Self::SignedOut,
            _ => Self::NotFound,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Mis Pedidos",
            Self::Expenses => "Gastos de Empresa",
            Self::NewOrder => "Nuevo Pedido",
            Self::SignedOut => "Sesión cerrada",
            Self::NotFound => "No encontrado",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Expense,
    Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmAction {
    DeleteExpense(ExpenseId),
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Form(FormKind),
    Confirm(ConfirmAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Focus {
    Sidebar,
    Content,
}
