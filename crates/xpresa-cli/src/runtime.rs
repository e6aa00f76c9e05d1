// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::path::PathBuf;
use tracing::{debug, info, warn};
use xpresa_app::{
    ActionError, Expense, ExpenseId, FormPayload, OrderId, OrderItem, OrderListing, OrderStatus,
    Session, StatusFilter,
};
use xpresa_db::{ExpenseRepository, NewExpense, NewOrder, OrderRepository};

/// Adapts a store to the UI's runtime boundary. Store errors reach the UI as
/// their full context chain, which is what the feed and status line render.
pub struct DbRuntime<'a, S> {
    store: &'a S,
    session: Session,
    session_path: Option<PathBuf>,
    recent_expenses: usize,
}

impl<'a, S> DbRuntime<'a, S>
where
    S: OrderRepository + ExpenseRepository,
{
    pub fn new(store: &'a S, session: Session) -> Self {
        Self {
            store,
            session,
            session_path: None,
            recent_expenses: xpresa_db::DEFAULT_RECENT_EXPENSES,
        }
    }

    /// Logout removes this file along with the in-memory session.
    pub fn with_session_path(mut self, path: PathBuf) -> Self {
        self.session_path = Some(path);
        self
    }

    pub fn with_recent_expenses(mut self, limit: usize) -> Self {
        self.recent_expenses = limit;
        self
    }
}

fn query_failure(action: &str, error: anyhow::Error) -> ActionError {
    let message = format!("{error:#}");
    warn!(action, error = %message, "store call failed");
    ActionError::query(message)
}

impl<S> xpresa_tui::AppRuntime for DbRuntime<'_, S>
where
    S: OrderRepository + ExpenseRepository,
{
    fn load_orders(&mut self, filter: &StatusFilter) -> Result<OrderListing, ActionError> {
        debug!(filter = filter.as_str(), "loading orders");
        self.store
            .list_orders(filter)
            .map_err(|error| query_failure("list orders", error))
    }

    fn load_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, ActionError> {
        self.store
            .list_order_items(order_id)
            .map_err(|error| query_failure("list order items", error))
    }

    fn advance_order_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ActionError> {
        self.store
            .update_order_status(order_id, status)
            .map_err(|error| query_failure("update order status", error))
    }

    fn list_expenses(&mut self) -> Result<Vec<Expense>, ActionError> {
        self.session.require_user()?;
        self.store
            .list_recent_expenses(self.recent_expenses)
            .map_err(|error| query_failure("list expenses", error))
    }

    fn submit_form(&mut self, payload: &FormPayload) -> Result<(), ActionError> {
        let user_id = self.session.require_user()?;
        payload.validate()?;

        match payload {
            FormPayload::Expense(form) => {
                let expense = NewExpense::from_form(form, user_id)
                    .map_err(|error| ActionError::validation(format!("{error:#}")))?;
                let expense_id = self
                    .store
                    .create_expense(&expense)
                    .map_err(|error| query_failure("create expense", error))?;
                info!(expense_id = expense_id.get(), "expense saved");
            }
            FormPayload::Order(form) => {
                let order_id = self
                    .store
                    .create_order(&NewOrder::from_form(form, user_id), &[])
                    .map_err(|error| query_failure("create order", error))?;
                info!(order_id = order_id.get(), "order saved");
            }
        }
        Ok(())
    }

    fn delete_expense(&mut self, expense_id: ExpenseId) -> Result<(), ActionError> {
        self.store
            .delete_expense(expense_id)
            .map_err(|error| query_failure("delete expense", error))
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn logout(&mut self) -> Result<(), ActionError> {
        if let Some(path) = &self.session_path {
            xpresa_db::remove_session_file(path)
                .map_err(|error| query_failure("remove session file", error))?;
        }
        self.session.clear();
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DbRuntime;
    use anyhow::{Result, anyhow};
    use std::cell::Cell;
    use time::OffsetDateTime;
    use xpresa_app::{
        ActionError, Expense, ExpenseFormInput, ExpenseId, FormPayload, MISSING_FIELDS_MESSAGE,
        Order, OrderFormInput, OrderId, OrderItem, OrderListing, OrderStatus, PaymentAccount,
        PersistedSession, Session, StatusFilter,
    };
    use xpresa_db::{
        ExpenseRepository, NewExpense, NewOrder, NewOrderItem, OrderRepository,
        ProfileRepository, Store,
    };
    use xpresa_tui::AppRuntime;

    fn signed_in(store: &Store) -> Result<Session> {
        let profile_id = store.create_profile(Some("Marta Lopez"))?;
        let profile = store
            .get_profile(profile_id)?
            .ok_or_else(|| anyhow!("profile {} missing", profile_id.get()))?;
        Ok(Session::resolve(
            Some(profile),
            None,
            OffsetDateTime::now_utc(),
        ))
    }

    fn expense_form(description: &str, amount_cents: i64) -> FormPayload {
        FormPayload::Expense(ExpenseFormInput {
            description: description.to_owned(),
            amount_cents: Some(amount_cents),
            account: Some(PaymentAccount::Efectivo),
        })
    }

    #[test]
    fn submit_expense_persists_and_lists_it() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let session = signed_in(&store)?;
        let mut runtime = DbRuntime::new(&store, session);

        runtime.submit_form(&expense_form("Hilo", 12_050))?;
        let expenses = runtime.list_expenses()?;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].description, "Hilo");
        assert_eq!(expenses[0].amount_cents, 12_050);
        Ok(())
    }

    #[test]
    fn submit_without_session_is_rejected_before_validation() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = DbRuntime::new(&store, Session::default());

        let blank = FormPayload::Expense(ExpenseFormInput::default());
        assert_eq!(runtime.submit_form(&blank), Err(ActionError::SessionAbsent));
        assert_eq!(runtime.list_expenses(), Err(ActionError::SessionAbsent));
        Ok(())
    }

    #[test]
    fn invalid_expense_never_reaches_the_store() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let session = signed_in(&store)?;
        let mut runtime = DbRuntime::new(&store, session);

        let error = runtime
            .submit_form(&expense_form("Hilo", 0))
            .expect_err("zero amount should fail");
        assert_eq!(error, ActionError::validation(MISSING_FIELDS_MESSAGE));
        assert!(store.list_recent_expenses(20)?.is_empty());
        Ok(())
    }

    #[test]
    fn submit_order_creates_it_for_the_signed_in_seller() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let session = signed_in(&store)?;
        let seller = session.require_user()?;
        let mut runtime = DbRuntime::new(&store, session);

        runtime.submit_form(&FormPayload::Order(OrderFormInput {
            customer_name: "Escuela Lomas".to_owned(),
            customer_email: "direccion@lomas.edu.mx".to_owned(),
            payment_account: Some(PaymentAccount::Efectivo),
            anticipo_cents: 50_000,
            total_cents: 200_000,
            status: OrderStatus::Pending,
            notes: String::new(),
        }))?;

        let listing = runtime.load_orders(&StatusFilter::Status(OrderStatus::Pending))?;
        assert_eq!(listing.orders.len(), 1);
        assert_eq!(listing.counts.pending, 1);
        let order = store.get_order(listing.orders[0].id)?;
        assert_eq!(order.vendedor_id, seller);
        assert_eq!(order.notes, None);
        Ok(())
    }

    #[test]
    fn advance_and_delete_go_through_the_store() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let session = signed_in(&store)?;
        let mut runtime = DbRuntime::new(&store, session);

        runtime.submit_form(&expense_form("Tinta", 30_000))?;
        let expense_id = runtime.list_expenses()?[0].id;
        runtime.delete_expense(expense_id)?;
        assert!(runtime.list_expenses()?.is_empty());

        runtime.submit_form(&FormPayload::Order(OrderFormInput {
            customer_name: "Club Norte".to_owned(),
            customer_email: String::new(),
            payment_account: None,
            anticipo_cents: 0,
            total_cents: 90_000,
            status: OrderStatus::Quoted,
            notes: String::new(),
        }))?;
        let order_id = runtime.load_orders(&StatusFilter::All)?.orders[0].id;
        runtime.advance_order_status(order_id, OrderStatus::Pending)?;
        assert_eq!(store.get_order(order_id)?.status, OrderStatus::Pending);
        assert!(runtime.load_order_items(order_id)?.is_empty());
        Ok(())
    }

    #[test]
    fn recent_expense_limit_is_applied() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let session = signed_in(&store)?;
        let mut runtime = DbRuntime::new(&store, session).with_recent_expenses(2);

        for description in ["Hilo", "Tinta", "Bolsas"] {
            runtime.submit_form(&expense_form(description, 1_000))?;
        }
        assert_eq!(runtime.list_expenses()?.len(), 2);
        Ok(())
    }

    #[test]
    fn logout_removes_session_file_and_clears_session() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let session = signed_in(&store)?;
        let temp = tempfile::tempdir()?;
        let session_path = temp.path().join("session.json");
        let profile = session
            .profile()
            .ok_or_else(|| anyhow!("expected a signed-in profile"))?;
        xpresa_db::write_session_file(&session_path, &PersistedSession::for_profile(profile))?;

        let mut runtime = DbRuntime::new(&store, session).with_session_path(session_path.clone());
        runtime.logout()?;

        assert!(!runtime.session().is_signed_in());
        assert!(!session_path.exists());
        Ok(())
    }

    struct FailingStore {
        calls: Cell<usize>,
    }

    impl FailingStore {
        fn fail<T>(&self, what: &str) -> Result<T> {
            self.calls.set(self.calls.get() + 1);
            Err(anyhow!("connection refused").context(what.to_owned()))
        }
    }

    impl OrderRepository for FailingStore {
        fn list_orders(&self, _filter: &StatusFilter) -> Result<OrderListing> {
            self.fail("list orders")
        }

        fn get_order(&self, _order_id: OrderId) -> Result<Order> {
            self.fail("get order")
        }

        fn list_order_items(&self, _order_id: OrderId) -> Result<Vec<OrderItem>> {
            self.fail("list order items")
        }

        fn create_order(&self, _order: &NewOrder, _items: &[NewOrderItem]) -> Result<OrderId> {
            self.fail("insert order")
        }

        fn update_order_status(&self, _order_id: OrderId, _status: OrderStatus) -> Result<()> {
            self.fail("update order")
        }
    }

    impl ExpenseRepository for FailingStore {
        fn list_recent_expenses(&self, _limit: usize) -> Result<Vec<Expense>> {
            self.fail("list expenses")
        }

        fn create_expense(&self, _expense: &NewExpense) -> Result<ExpenseId> {
            self.fail("insert expense")
        }

        fn delete_expense(&self, _expense_id: ExpenseId) -> Result<()> {
            self.fail("delete expense")
        }
    }

    #[test]
    fn store_failures_surface_as_literal_query_errors() {
        let store = FailingStore {
            calls: Cell::new(0),
        };
        let session = Session::resolve(
            None,
            PersistedSession::parse(r#"{"user": {"id": 4, "user_metadata": {}}}"#).ok(),
            OffsetDateTime::UNIX_EPOCH,
        );
        let mut runtime = DbRuntime::new(&store, session);

        assert_eq!(
            runtime.load_orders(&StatusFilter::All),
            Err(ActionError::query("list orders: connection refused"))
        );
        assert_eq!(
            runtime.delete_expense(ExpenseId::new(9)),
            Err(ActionError::query("delete expense: connection refused"))
        );
        assert_eq!(store.calls.get(), 2);
    }

    #[test]
    fn validation_failure_skips_a_failing_store() {
        let store = FailingStore {
            calls: Cell::new(0),
        };
        let session = Session::resolve(
            None,
            PersistedSession::parse(r#"{"user": {"id": 4}}"#).ok(),
            OffsetDateTime::UNIX_EPOCH,
        );
        let mut runtime = DbRuntime::new(&store, session);

        let blank = FormPayload::Expense(ExpenseFormInput::default());
        assert_eq!(
            runtime.submit_form(&blank),
            Err(ActionError::validation(MISSING_FIELDS_MESSAGE))
        );
        assert_eq!(store.calls.get(), 0);
    }
}
