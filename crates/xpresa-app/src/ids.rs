// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row ids as assigned by the store. Display renders the bare number.
macro_rules! row_id {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                pub const fn new(value: i64) -> Self {
                    Self(value)
                }

                pub const fn get(self) -> i64 {
                    self.0
                }
            }

            impl From<i64> for $name {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

row_id!(ProfileId, OrderId, OrderItemId, ExpenseId);

#[cfg(test)]
mod tests {
    use super::{OrderId, ProfileId};

    #[test]
    fn ids_serialize_as_bare_numbers() -> serde_json::Result<()> {
        assert_eq!(serde_json::to_string(&OrderId::new(42))?, "42");
        let profile: ProfileId = serde_json::from_str("7")?;
        assert_eq!(profile, ProfileId::from(7));
        assert_eq!(profile.to_string(), "7");
        Ok(())
    }
}
