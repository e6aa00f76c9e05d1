// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use xpresa_app::{
    ExpenseFormInput, OrderFormInput, OrderStatus, PaymentAccount, PersistedSession, ProfileId,
    StatusFilter,
};
use xpresa_db::{
    ExpenseRepository, NewExpense, NewOrder, NewOrderItem, OrderRepository, ProfileRepository,
    Store, load_session_file, remove_session_file, validate_db_path, write_session_file,
};
use xpresa_testkit::{OrderDraft, OrderFaker, fixture_datetime, temp_db_path, temp_session_path};

fn bootstrapped() -> Result<(Store, ProfileId)> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let seller = store.create_profile(Some("Alejandra Ruiz"))?;
    Ok((store, seller))
}

fn insert_draft(store: &Store, seller: ProfileId, draft: &OrderDraft) -> Result<xpresa_app::OrderId> {
    let order = NewOrder {
        vendedor_id: seller,
        customer_name: Some(draft.customer_name.clone()),
        customer_email: None,
        payment_account: Some(draft.payment_account),
        anticipo_cents: draft.anticipo_cents,
        total_cents: draft.total_cents,
        status: draft.status,
        notes: None,
    };
    let items = draft
        .items
        .iter()
        .map(|item| NewOrderItem {
            product_name: item.product_name.clone(),
            size: Some(item.size.clone()),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
        })
        .collect::<Vec<_>>();
    store.create_order(&order, &items)
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/xpresa.db").is_ok());
}

#[test]
fn open_creates_database_file() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    let store = Store::open(&path)?;
    store.bootstrap()?;
    assert!(path.exists());
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let (store, _) = bootstrapped()?;

    store.raw_connection().execute_batch(
        "
        DROP TABLE expenses;
        CREATE TABLE expenses (
          id INTEGER PRIMARY KEY,
          description TEXT NOT NULL,
          vendedor_id INTEGER NOT NULL,
          created_at TEXT NOT NULL
        );
        ",
    )?;

    let err = store
        .bootstrap()
        .expect_err("schema validation should fail");
    let message = err.to_string();
    assert!(message.contains("table `expenses` is missing required columns"));
    assert!(message.contains("amount_cents"));
    assert!(message.contains("account"));
    Ok(())
}

#[test]
fn bootstrap_rejects_foreign_database() -> Result<()> {
    let store = Store::open_memory()?;
    store
        .raw_connection()
        .execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY);")?;
    let err = store.bootstrap().expect_err("foreign schema should fail");
    assert!(err.to_string().contains("missing required table `profiles`"));
    Ok(())
}

#[test]
fn list_orders_filters_by_status_and_counts_everything() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(11);
    for status in [
        OrderStatus::Quoted,
        OrderStatus::Pending,
        OrderStatus::Pending,
        OrderStatus::Shipped,
    ] {
        insert_draft(&store, seller, &faker.order_with_status(status))?;
    }

    let pending = store.list_orders(&StatusFilter::Status(OrderStatus::Pending))?;
    assert_eq!(pending.orders.len(), 2);
    assert!(
        pending
            .orders
            .iter()
            .all(|order| order.status == OrderStatus::Pending)
    );
    assert_eq!(pending.counts.quoted, 1);
    assert_eq!(pending.counts.pending, 2);
    assert_eq!(pending.counts.paid, 0);
    assert_eq!(pending.counts.shipped, 1);

    let all = store.list_orders(&StatusFilter::All)?;
    assert_eq!(all.orders.len(), 4);
    assert_eq!(all.counts, pending.counts);
    Ok(())
}

#[test]
fn list_orders_with_no_matches_still_reports_counts() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(12);
    insert_draft(&store, seller, &faker.order_with_status(OrderStatus::Quoted))?;

    let shipped = store.list_orders(&StatusFilter::Status(OrderStatus::Shipped))?;
    assert!(shipped.orders.is_empty());
    assert_eq!(shipped.counts.total(), 1);
    Ok(())
}

#[test]
fn unrecognized_filter_matches_nothing() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(13);
    insert_draft(&store, seller, &faker.order())?;

    let listing = store.list_orders(&StatusFilter::Unrecognized("devuelto".to_owned()))?;
    assert!(listing.orders.is_empty());
    assert_eq!(listing.counts.total(), 1);
    Ok(())
}

#[test]
fn list_orders_is_newest_first_with_id_tiebreaker() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(14);
    let first = insert_draft(&store, seller, &faker.order())?;
    let second = insert_draft(&store, seller, &faker.order())?;
    let third = insert_draft(&store, seller, &faker.order())?;

    store.raw_connection().execute(
        "UPDATE orders SET created_at = ? WHERE id IN (?, ?)",
        rusqlite::params![fixture_datetime(), first.get(), second.get()],
    )?;
    store.raw_connection().execute(
        "UPDATE orders SET created_at = ? WHERE id = ?",
        rusqlite::params!["2026-01-05T08:00:00Z", third.get()],
    )?;

    let ids = store
        .list_orders(&StatusFilter::All)?
        .orders
        .into_iter()
        .map(|order| order.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![second, first, third]);
    Ok(())
}

#[test]
fn same_second_rows_sort_by_fraction_not_text() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(21);
    let stamps = [
        ("2026-03-01T10:00:00Z", "whole"),
        ("2026-03-01T10:00:00.5Z", "half"),
        ("2026-03-01T10:00:00.51Z", "later"),
    ];
    for (stamp, name) in stamps {
        let mut draft = faker.order();
        draft.customer_name = name.to_owned();
        let order_id = insert_draft(&store, seller, &draft)?;
        store.raw_connection().execute(
            "UPDATE orders SET created_at = ? WHERE id = ?",
            rusqlite::params![stamp, order_id.get()],
        )?;

        let expense = faker.expense();
        let expense_id = store.create_expense(&NewExpense {
            description: name.to_owned(),
            amount_cents: expense.amount_cents,
            account: expense.account,
            vendedor_id: seller,
        })?;
        store.raw_connection().execute(
            "UPDATE expenses SET created_at = ? WHERE id = ?",
            rusqlite::params![stamp, expense_id.get()],
        )?;
    }

    let names = store
        .list_orders(&StatusFilter::All)?
        .orders
        .into_iter()
        .filter_map(|order| order.customer_name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["later", "half", "whole"]);

    let descriptions = store
        .list_recent_expenses(20)?
        .into_iter()
        .map(|expense| expense.description)
        .collect::<Vec<_>>();
    assert_eq!(descriptions, vec!["later", "half", "whole"]);
    Ok(())
}

#[test]
fn written_timestamps_have_fixed_width() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(22);
    for _ in 0..5 {
        insert_draft(&store, seller, &faker.order())?;
    }

    let mut statement = store
        .raw_connection()
        .prepare("SELECT created_at FROM orders ORDER BY id")?;
    let stamps = statement
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    assert_eq!(stamps.len(), 5);
    for stamp in &stamps {
        assert_eq!(stamp.len(), "2026-03-01T10:00:00.000000000Z".len(), "{stamp}");
        assert!(stamp.ends_with('Z'), "{stamp}");
    }
    Ok(())
}

#[test]
fn create_order_stores_items_and_numbers_orders() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(15);
    let draft = faker.order_with_status(OrderStatus::Pending);

    let first = insert_draft(&store, seller, &draft)?;
    let second = insert_draft(&store, seller, &faker.order())?;

    let order = store.get_order(first)?;
    assert_eq!(order.temp_id, 1);
    assert_eq!(store.get_order(second)?.temp_id, 2);
    assert_eq!(order.vendedor_id, seller);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_cents, draft.total_cents);

    let items = store.list_order_items(first)?;
    assert_eq!(items.len(), draft.items.len());
    let subtotal = items.iter().map(|item| item.subtotal_cents()).sum::<i64>();
    assert_eq!(subtotal, draft.total_cents);
    Ok(())
}

#[test]
fn create_order_rolls_back_when_an_item_is_rejected() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let order = NewOrder::from_form(
        &OrderFormInput {
            customer_name: "Gimnasio Fuerza".to_owned(),
            customer_email: String::new(),
            payment_account: None,
            anticipo_cents: 0,
            total_cents: 10_000,
            status: OrderStatus::Quoted,
            notes: "  ".to_owned(),
        },
        seller,
    );
    assert_eq!(order.notes, None);

    let bad_item = NewOrderItem {
        product_name: "Gorra".to_owned(),
        size: None,
        quantity: 0,
        unit_price_cents: 10_000,
    };
    assert!(store.create_order(&order, &[bad_item]).is_err());
    assert!(store.list_orders(&StatusFilter::All)?.orders.is_empty());
    Ok(())
}

#[test]
fn update_order_status_moves_counts() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(16);
    let order_id = insert_draft(&store, seller, &faker.order_with_status(OrderStatus::Paid))?;

    store.update_order_status(order_id, OrderStatus::Shipped)?;
    let counts = store.list_orders(&StatusFilter::All)?.counts;
    assert_eq!(counts.paid, 0);
    assert_eq!(counts.shipped, 1);

    let missing = store
        .update_order_status(xpresa_app::OrderId::new(999), OrderStatus::Shipped)
        .expect_err("unknown order should fail");
    assert!(missing.to_string().contains("not found"));
    Ok(())
}

#[test]
fn expenses_are_listed_newest_first_and_limited() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let mut faker = OrderFaker::new(17);
    let mut ids = Vec::new();
    for _ in 0..25 {
        let draft = faker.expense();
        ids.push(store.create_expense(&NewExpense {
            description: draft.description,
            amount_cents: draft.amount_cents,
            account: draft.account,
            vendedor_id: seller,
        })?);
    }
    store.raw_connection().execute(
        "UPDATE expenses SET created_at = ?",
        rusqlite::params![fixture_datetime()],
    )?;

    let recent = store.list_recent_expenses(20)?;
    assert_eq!(recent.len(), 20);
    assert_eq!(recent[0].id, ids[24]);
    assert_eq!(recent[19].id, ids[5]);
    Ok(())
}

#[test]
fn create_expense_from_form_and_delete() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let form = ExpenseFormInput {
        description: " Hilo para bordado ".to_owned(),
        amount_cents: Some(42_500),
        account: Some(PaymentAccount::Efectivo),
    };
    let expense_id = store.create_expense(&NewExpense::from_form(&form, seller)?)?;

    let listed = store.list_recent_expenses(20)?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].description, "Hilo para bordado");
    assert_eq!(listed[0].account, PaymentAccount::Efectivo);

    store.delete_expense(expense_id)?;
    assert!(store.list_recent_expenses(20)?.is_empty());
    assert!(store.delete_expense(expense_id).is_err());
    Ok(())
}

#[test]
fn create_expense_rejects_non_positive_amount() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let error = store
        .create_expense(&NewExpense {
            description: "Papel".to_owned(),
            amount_cents: 0,
            account: PaymentAccount::Proveedores,
            vendedor_id: seller,
        })
        .expect_err("zero amount should fail");
    assert!(error.to_string().contains("positive"));
    Ok(())
}

#[test]
fn get_profile_returns_none_for_unknown_id() -> Result<()> {
    let (store, seller) = bootstrapped()?;
    let profile = store.get_profile(seller)?.expect("seller exists");
    assert_eq!(profile.full_name.as_deref(), Some("Alejandra Ruiz"));
    assert_eq!(store.get_profile(ProfileId::new(404))?, None);
    Ok(())
}

#[test]
fn seed_demo_data_covers_every_status() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let seller = store.seed_demo_data()?;

    let listing = store.list_orders(&StatusFilter::All)?;
    for status in OrderStatus::ALL {
        assert!(listing.counts.get(status) > 0, "status {}", status.as_str());
    }
    assert!(!store.list_recent_expenses(20)?.is_empty());
    assert_eq!(seller.full_name.as_deref(), Some("Alejandra Ruiz"));
    Ok(())
}

#[test]
fn session_file_round_trip_and_removal() -> Result<()> {
    let (_dir, path) = temp_session_path()?;
    assert_eq!(load_session_file(&path)?, None);

    let session = PersistedSession::parse(r#"{"user":{"id":5,"user_metadata":{"full_name":"Beto"}}}"#)?;
    write_session_file(&path, &session)?;
    assert_eq!(load_session_file(&path)?, Some(session));

    assert!(remove_session_file(&path)?);
    assert!(!remove_session_file(&path)?);
    assert_eq!(load_session_file(&path)?, None);
    Ok(())
}

#[test]
fn malformed_session_file_is_treated_as_absent() -> Result<()> {
    let (_dir, path) = temp_session_path()?;
    std::fs::write(&path, "{\"user\":")?;
    assert_eq!(load_session_file(&path)?, None);
    Ok(())
}
