// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use xpresa_app::{OrderStatus, PaymentAccount};

const CUSTOMER_KINDS: [&str; 10] = [
    "Club Deportivo",
    "Escuela",
    "Taller",
    "Clínica",
    "Café",
    "Gimnasio",
    "Liga Infantil",
    "Restaurante",
    "Constructora",
    "Academia",
];

const CUSTOMER_NAMES: [&str; 14] = [
    "Norte", "Los Pinos", "San Ángel", "Las Palmas", "Tigres", "El Roble", "Sol", "Aurora",
    "Del Valle", "Centenario", "La Esperanza", "Guadalupe", "Miramar", "Cumbres",
];

const PRODUCTS: [(&str, i64, i64); 10] = [
    ("Playera dry-fit", 18_000, 38_000),
    ("Polo bordado", 22_000, 42_000),
    ("Sudadera con capucha", 28_000, 55_000),
    ("Short deportivo", 9_000, 18_000),
    ("Uniforme completo", 20_000, 45_000),
    ("Mandil con logo", 9_000, 16_000),
    ("Filipina médica", 30_000, 52_000),
    ("Overol industrial", 32_000, 60_000),
    ("Gorra bordada", 8_000, 15_000),
    ("Chamarra rompevientos", 35_000, 70_000),
];

const SIZES: [&str; 7] = ["CH", "M", "G", "XG", "8", "10", "Unitalla"];

const EXPENSES: [(&str, i64, i64); 8] = [
    ("Tinta para sublimación", 80_000, 250_000),
    ("Hilo para bordado", 20_000, 60_000),
    ("Envío paquetería", 15_000, 45_000),
    ("Rollo de vinil textil", 60_000, 140_000),
    ("Mantenimiento de plancha", 50_000, 120_000),
    ("Papel transfer", 25_000, 70_000),
    ("Renta de local", 800_000, 1_200_000),
    ("Luz del taller", 90_000, 220_000),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub payment_account: PaymentAccount,
    pub anticipo_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub items: Vec<ItemDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub product_name: String,
    pub size: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount_cents: i64,
    pub account: PaymentAccount,
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible orders and expenses for a textile shop.
#[derive(Debug, Clone)]
pub struct OrderFaker {
    rng: DeterministicRng,
}

impl OrderFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn customer_name(&mut self) -> String {
        format!(
            "{} {}",
            self.pick(&CUSTOMER_KINDS),
            self.pick(&CUSTOMER_NAMES)
        )
    }

    pub fn order(&mut self) -> OrderDraft {
        let status = OrderStatus::ALL[self.rng.int_n(OrderStatus::ALL.len())];
        self.order_with_status(status)
    }

    /// Totals equal the sum of the items. Quotes carry no advance; paid and
    /// shipped orders are fully covered.
    pub fn order_with_status(&mut self, status: OrderStatus) -> OrderDraft {
        let item_count = 1 + self.rng.int_n(3);
        let items = (0..item_count).map(|_| self.item()).collect::<Vec<_>>();
        let total_cents = items
            .iter()
            .map(|item| item.quantity * item.unit_price_cents)
            .sum::<i64>();
        let anticipo_cents = match status {
            OrderStatus::Quoted => 0,
            OrderStatus::Pending => total_cents / 2,
            OrderStatus::Paid | OrderStatus::Shipped => total_cents,
        };

        let customer_name = self.customer_name();
        let customer_email = if self.rng.int_n(3) == 0 {
            String::new()
        } else {
            format!("compras{}@cliente.mx", self.rng.int_n(900) + 100)
        };

        OrderDraft {
            customer_name,
            customer_email,
            payment_account: self.account(),
            anticipo_cents,
            total_cents,
            status,
            items,
        }
    }

    pub fn item(&mut self) -> ItemDraft {
        let (product_name, low, high) = PRODUCTS[self.rng.int_n(PRODUCTS.len())];
        let raw_price = self.int_range_i64(low, high);
        let unit_price_cents = round_to_peso(raw_price);
        ItemDraft {
            product_name: product_name.to_owned(),
            size: self.pick(&SIZES).to_owned(),
            quantity: self.int_range_i64(5, 60),
            unit_price_cents,
        }
    }

    pub fn expense(&mut self) -> ExpenseDraft {
        let (description, low, high) = EXPENSES[self.rng.int_n(EXPENSES.len())];
        let amount_cents = self.int_range_i64(low, high);
        ExpenseDraft {
            description: description.to_owned(),
            amount_cents,
            account: self.account(),
        }
    }

    pub fn account(&mut self) -> PaymentAccount {
        PaymentAccount::ALL[self.rng.int_n(PaymentAccount::ALL.len())]
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("xpresa.db");
    Ok((dir, db_path))
}

pub fn temp_session_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let session_path = dir.path().join("session.json");
    Ok((dir, session_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

fn round_to_peso(cents: i64) -> i64 {
    (cents / 100).max(1) * 100
}
