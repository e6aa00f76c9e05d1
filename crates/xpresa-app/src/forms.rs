// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ActionError, FormKind, MISSING_FIELDS_MESSAGE, OrderStatus, PaymentAccount};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpenseFormInput {
    pub description: String,
    pub amount_cents: Option<i64>,
    pub account: Option<PaymentAccount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFormInput {
    pub customer_name: String,
    pub customer_email: String,
    pub payment_account: Option<PaymentAccount>,
    pub anticipo_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Expense(ExpenseFormInput),
    Order(OrderFormInput),
}

impl FormPayload {
    pub fn blank_for(kind: FormKind) -> Self {
        match kind {
            FormKind::Expense => Self::Expense(ExpenseFormInput::default()),
            FormKind::Order => Self::Order(OrderFormInput {
                customer_name: String::new(),
                customer_email: String::new(),
                payment_account: None,
                anticipo_cents: 0,
                total_cents: 0,
                status: OrderStatus::Quoted,
                notes: String::new(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        match self {
            Self::Expense(expense) => expense.validate(),
            Self::Order(order) => order.validate(),
        }
    }
}

impl ExpenseFormInput {
    /// All three fields are required and the amount must be positive.
    pub fn validate(&self) -> Result<(), ActionError> {
        let has_amount = matches!(self.amount_cents, Some(cents) if cents > 0);
        if self.description.trim().is_empty() || !has_amount || self.account.is_none() {
            return Err(ActionError::validation(MISSING_FIELDS_MESSAGE));
        }
        Ok(())
    }
}

impl OrderFormInput {
    pub fn validate(&self) -> Result<(), ActionError> {
        if self.customer_name.trim().is_empty() {
            return Err(ActionError::validation(
                "El nombre del cliente es obligatorio",
            ));
        }
        if self.total_cents <= 0 {
            return Err(ActionError::validation("El total debe ser mayor a cero"));
        }
        if self.anticipo_cents < 0 {
            return Err(ActionError::validation("El anticipo no puede ser negativo"));
        }
        if self.anticipo_cents > self.total_cents {
            return Err(ActionError::validation(
                "El anticipo no puede ser mayor al total",
            ));
        }
        let email = self.customer_email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(ActionError::validation("El correo del cliente no es válido"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ExpenseFormInput, FormPayload, OrderFormInput};
    use crate::{ActionError, FormKind, OrderStatus, PaymentAccount};

    fn expense() -> ExpenseFormInput {
        ExpenseFormInput {
            description: "Tinta para sublimar".to_owned(),
            amount_cents: Some(85_000),
            account: Some(PaymentAccount::Efectivo),
        }
    }

    fn order() -> OrderFormInput {
        OrderFormInput {
            customer_name: "Club Deportivo Norte".to_owned(),
            customer_email: "compras@cdnorte.mx".to_owned(),
            payment_account: Some(PaymentAccount::XpresaHsbc),
            anticipo_cents: 100_000,
            total_cents: 350_000,
            status: OrderStatus::Pending,
            notes: String::new(),
        }
    }

    #[test]
    fn blank_forms_match_their_kind() {
        assert!(matches!(
            FormPayload::blank_for(FormKind::Expense),
            FormPayload::Expense(_)
        ));
        assert!(matches!(
            FormPayload::blank_for(FormKind::Order),
            FormPayload::Order(_)
        ));
    }

    #[test]
    fn blank_expense_reports_missing_fields() {
        let error = FormPayload::blank_for(FormKind::Expense)
            .validate()
            .expect_err("blank expense is invalid");
        assert_eq!(error.to_string(), "Por favor completa todos los campos");
        assert!(matches!(error, ActionError::Validation(_)));
    }

    #[test]
    fn expense_requires_each_field() {
        let cases = [
            ExpenseFormInput {
                description: "   ".to_owned(),
                ..expense()
            },
            ExpenseFormInput {
                amount_cents: Some(0),
                ..expense()
            },
            ExpenseFormInput {
                amount_cents: Some(-100),
                ..expense()
            },
            ExpenseFormInput {
                amount_cents: None,
                ..expense()
            },
            ExpenseFormInput {
                account: None,
                ..expense()
            },
        ];
        for input in cases {
            assert!(
                matches!(input.validate(), Err(ActionError::Validation(_))),
                "{input:?}"
            );
        }
        assert!(expense().validate().is_ok());
    }

    #[test]
    fn order_validation_rejects_non_positive_total() {
        let payload = FormPayload::Order(OrderFormInput {
            total_cents: 0,
            anticipo_cents: 0,
            ..order()
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn order_advance_cannot_exceed_total() {
        let input = OrderFormInput {
            anticipo_cents: 400_000,
            ..order()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn order_email_is_optional_but_checked() {
        let without = OrderFormInput {
            customer_email: String::new(),
            ..order()
        };
        assert!(without.validate().is_ok());

        let malformed = OrderFormInput {
            customer_email: "compras".to_owned(),
            ..order()
        };
        assert!(malformed.validate().is_err());
    }
}
