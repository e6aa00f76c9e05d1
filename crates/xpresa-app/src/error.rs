// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

pub const SESSION_ABSENT_MESSAGE: &str = "No hay sesión activa";
pub const MISSING_FIELDS_MESSAGE: &str = "Por favor completa todos los campos";

/// Failure of a user-initiated action. The `Display` text is what the UI
/// shows; none of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{0}")]
    Query(String),
    #[error("{0}")]
    Validation(String),
    #[error("No hay sesión activa")]
    SessionAbsent,
}

impl ActionError {
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
