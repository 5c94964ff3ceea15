use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeErrorKind {
    InsufficientFunds,
    InvalidAmount,
    InvalidStateTransition,
    NotPending,
    OwnerMismatch,
    Unauthorized,
    SelfExchange,
    AlreadyCollected,
    DuplicatePending,
    Expired,
    NotDue,
    NotFound,
    Arithmetic,
    Internal,
}

impl ExchangeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeErrorKind::InsufficientFunds => "insufficient_funds",
            ExchangeErrorKind::InvalidAmount => "invalid_amount",
            ExchangeErrorKind::InvalidStateTransition => "invalid_state_transition",
            ExchangeErrorKind::NotPending => "not_pending",
            ExchangeErrorKind::OwnerMismatch => "owner_mismatch",
            ExchangeErrorKind::Unauthorized => "unauthorized",
            ExchangeErrorKind::SelfExchange => "self_exchange",
            ExchangeErrorKind::AlreadyCollected => "already_collected",
            ExchangeErrorKind::DuplicatePending => "duplicate_pending",
            ExchangeErrorKind::Expired => "expired",
            ExchangeErrorKind::NotDue => "not_due",
            ExchangeErrorKind::NotFound => "not_found",
            ExchangeErrorKind::Arithmetic => "arithmetic",
            ExchangeErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ExchangeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precondition failure raised by the ledger, the state machine or the
/// completion engine. Every kind is terminal: the caller re-fetches state and
/// re-decides instead of retrying the same call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeError {
    pub kind: ExchangeErrorKind,
    pub message: String,
}

impl ExchangeError {
    pub fn new(kind: ExchangeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExchangeError {}

pub fn insufficient_funds(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::InsufficientFunds, message)
}

pub fn invalid_amount(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::InvalidAmount, message)
}

pub fn invalid_state_transition(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::InvalidStateTransition, message)
}

pub fn not_pending(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::NotPending, message)
}

pub fn owner_mismatch(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::OwnerMismatch, message)
}

pub fn unauthorized(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::Unauthorized, message)
}

pub fn self_exchange(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::SelfExchange, message)
}

pub fn already_collected(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::AlreadyCollected, message)
}

pub fn duplicate_pending(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::DuplicatePending, message)
}

pub fn expired(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::Expired, message)
}

pub fn not_due(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::NotDue, message)
}

pub fn not_found(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::NotFound, message)
}

pub fn arithmetic_error(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::Arithmetic, message)
}

pub fn internal_error(message: impl Into<String>) -> ExchangeError {
    ExchangeError::new(ExchangeErrorKind::Internal, message)
}
