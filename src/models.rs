//! Ledger data model: players, rounds and bets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle phase of a betting round.
///
/// Phases only advance forward: Open -> Closed -> Settled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Bets are being accepted.
    Open,
    /// The betting window expired; settlement has not completed yet.
    Closed,
    /// Outcome drawn and payouts applied. Terminal.
    Settled,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Open => write!(f, "open"),
            RoundPhase::Closed => write!(f, "closed"),
            RoundPhase::Settled => write!(f, "settled"),
        }
    }
}

/// One timed betting-and-settlement cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Round {
    pub id: Uuid,
    pub phase: RoundPhase,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    /// Drawn at the Closed -> Settled transition, immutable afterwards.
    pub winning_number: Option<u8>,
}

impl Round {
    /// Start a fresh round accepting bets.
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: RoundPhase::Open,
            opened_at: now,
            closed_at: None,
            settled_at: None,
            winning_number: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.phase == RoundPhase::Open
    }

    /// Whole seconds since the round opened.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.opened_at).num_seconds()
    }
}

/// A registered player and their currency position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: Uuid,
    pub nickname: String,
    /// Never negative; debited on bet acceptance, credited on winning settlement.
    pub balance: Decimal,
    /// Monotonically non-decreasing accumulator of settlement credits.
    pub total_winnings: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(nickname: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname: nickname.into(),
            balance: initial_balance,
            total_winnings: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Remove an accepted stake from the balance.
    ///
    /// The caller must have verified `amount <= balance` inside the same
    /// exclusive section that commits the bet.
    pub fn debit_stake(&mut self, amount: Decimal) {
        self.balance -= amount;
    }

    /// Return a stake whose bet record could not be committed.
    pub fn refund_stake(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    /// Credit a settlement payout to both the balance and the winnings total.
    pub fn credit_winnings(&mut self, amount: Decimal) {
        self.balance += amount;
        self.total_winnings += amount;
    }
}

/// A single wager recorded against a round.
///
/// `payout` and `is_winner` stay unset until the round settles, then are
/// written exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bet {
    pub id: Uuid,
    pub player_id: Uuid,
    /// Denormalised for winner broadcasts.
    pub nickname: String,
    pub round_id: Uuid,
    pub number: u8,
    pub amount: Decimal,
    pub payout: Option<Decimal>,
    pub is_winner: Option<bool>,
    pub placed_at: DateTime<Utc>,
}

impl Bet {
    pub fn new(player: &Player, round_id: Uuid, number: u8, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: player.id,
            nickname: player.nickname.clone(),
            round_id,
            number,
            amount,
            payout: None,
            is_winner: None,
            placed_at: Utc::now(),
        }
    }

    /// Whether settlement has already written this bet's outcome.
    pub fn is_settled(&self) -> bool {
        self.payout.is_some()
    }
}
