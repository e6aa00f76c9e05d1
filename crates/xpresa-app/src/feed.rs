// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ActionError, OrderListing, OrderSummary, StatusCounts, StatusFilter};

pub const NO_ORDERS_MESSAGE: &str =
    "Aún no tienes pedidos. Crea tu primer pedido haciendo clic en \"Nuevo Pedido\".";

/// Empty-state text for a filter. Any filter other than `all` is named
/// literally, including values nothing in the sidebar links to.
pub fn empty_message(filter: &StatusFilter) -> String {
    match filter {
        StatusFilter::All => NO_ORDERS_MESSAGE.to_owned(),
        other => format!("No hay pedidos con estado \"{}\".", other.as_str()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub filter: StatusFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedView<'a> {
    Loading,
    Failed(&'a str),
    Empty(&'a StatusFilter),
    Orders(&'a [OrderSummary]),
}

/// Tracks order fetches for the dashboard.
///
/// A filter is requested at most once until `invalidate` is called, whether
/// or not its response has arrived. Responses are applied in arrival order,
/// so a slow stale response can overwrite a newer one; `is_loading` stays
/// true until the newest ticket has answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFeed {
    next_ticket: u64,
    requested: Option<StatusFilter>,
    awaiting: Option<u64>,
    shown: Option<StatusFilter>,
    orders: Vec<OrderSummary>,
    counts: StatusCounts,
    error: Option<String>,
}

impl OrderFeed {
    pub fn request(&mut self, filter: &StatusFilter) -> Option<FetchTicket> {
        if self.requested.as_ref() == Some(filter) {
            return None;
        }
        self.next_ticket += 1;
        self.requested = Some(filter.clone());
        self.awaiting = Some(self.next_ticket);
        Some(FetchTicket {
            id: self.next_ticket,
            filter: filter.clone(),
        })
    }

    pub fn apply(&mut self, ticket: &FetchTicket, result: Result<OrderListing, ActionError>) {
        if self.awaiting == Some(ticket.id) {
            self.awaiting = None;
        }
        self.shown = Some(ticket.filter.clone());
        match result {
            Ok(listing) => {
                self.orders = listing.orders;
                self.counts = listing.counts;
                self.error = None;
            }
            Err(error) => {
                self.orders.clear();
                self.counts = StatusCounts::default();
                self.error = Some(error.to_string());
            }
        }
    }

    /// Forgets the requested filter so the next `request` fetches again.
    pub fn invalidate(&mut self) {
        self.requested = None;
    }

    pub fn is_loading(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn orders(&self) -> &[OrderSummary] {
        &self.orders
    }

    pub fn counts(&self) -> &StatusCounts {
        &self.counts
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view(&self) -> FeedView<'_> {
        if self.is_loading() {
            return FeedView::Loading;
        }
        let Some(shown) = self.shown.as_ref() else {
            return FeedView::Loading;
        };
        if let Some(error) = self.error.as_deref() {
            return FeedView::Failed(error);
        }
        if self.orders.is_empty() {
            return FeedView::Empty(shown);
        }
        FeedView::Orders(&self.orders)
    }
}
