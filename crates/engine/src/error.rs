//! The module contains the errors the engine can return.
//!
//! Every failing engine operation leaves the store unchanged: the surrounding
//! database transaction is dropped without being committed.
//!
//! - [`Validation`] bad input shape or range, never retried.
//! - [`KeyNotFound`] the entity does not exist or is not visible to the caller.
//! - [`InsufficientFunds`] a debit would drive a wallet below zero.
//! - [`GoalCompleted`] / [`Overfunding`] goal funding rules.
//! - [`Conflict`] a concurrent update was detected; safe to retry.
//! - [`Database`] store failure.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`GoalCompleted`]: EngineError::GoalCompleted
//!  [`Overfunding`]: EngineError::Overfunding
//!  [`Conflict`]: EngineError::Conflict
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

use crate::MoneyCents;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Goal already completed: {0}")]
    GoalCompleted(String),
    #[error("Overfunding: requested {requested}, at most {remaining} can be added")]
    Overfunding {
        requested: MoneyCents,
        remaining: MoneyCents,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::GoalCompleted(a), Self::GoalCompleted(b)) => a == b,
            (
                Self::Overfunding {
                    requested: r1,
                    remaining: m1,
                },
                Self::Overfunding {
                    requested: r2,
                    remaining: m2,
                },
            ) => r1 == r2 && m1 == m2,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
