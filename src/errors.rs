//! Error taxonomy for the round engine.
//!
//! Bet rejections are reported to the caller with a specific reason and
//! leave no state behind. Storage failures are surfaced to bet callers and
//! swallowed-with-logging inside the scheduler loop, which retries on the
//! next tick.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failure surfaced by a storage backend.
///
/// Backends must never silently drop a write; every failed operation maps
/// onto one of these variants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage write failed: {0}")]
    WriteFailed(String),

    #[error("storage read failed: {0}")]
    ReadFailed(String),
}

/// Why a bet was rejected.
#[derive(Debug, Error)]
pub enum BetError {
    #[error("bet number {0} is outside the allowed range 1-10")]
    InvalidNumber(u8),

    #[error("bet amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    #[error("player not found: {0}")]
    UnknownPlayer(String),

    #[error("no betting round is currently open")]
    NoActiveRound,

    #[error("player already placed a bet in this round")]
    DuplicateBet,

    #[error("insufficient balance: have {balance}, bet requires {requested}")]
    InsufficientBalance {
        balance: Decimal,
        requested: Decimal,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a player registration was rejected.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("nickname already exists: {0}")]
    NicknameTaken(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
