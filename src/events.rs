//! Lifecycle and bet broadcasts.
//!
//! The engine only needs a one-way publish capability; delivery failure must
//! never abort a tick or a bet placement, so publishing is infallible from
//! the caller's point of view.

use crate::models::{Round, RoundPhase};
use crate::settlement::WinnerPayout;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Event published by the engine, tagged by logical topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Round phase and countdown update.
    State {
        round_id: Uuid,
        phase: RoundPhase,
        seconds_remaining: u64,
        betting_open: bool,
    },
    /// Settlement outcome for one round.
    RoundResult {
        round_id: Uuid,
        winning_number: u8,
        settled_at: DateTime<Utc>,
        winners: Vec<WinnerPayout>,
    },
    /// A bet was accepted into the open round.
    BetPlaced {
        round_id: Uuid,
        nickname: String,
        number: u8,
        amount: Decimal,
        placed_at: DateTime<Utc>,
    },
}

impl GameEvent {
    /// Logical topic the event belongs to.
    pub fn topic(&self) -> &'static str {
        match self {
            GameEvent::State { .. } => "game-state",
            GameEvent::RoundResult { .. } => "round-results",
            GameEvent::BetPlaced { .. } => "bets",
        }
    }

    /// State snapshot for a round with the given countdown.
    pub(crate) fn state(round: &Round, seconds_remaining: u64) -> Self {
        GameEvent::State {
            round_id: round.id,
            phase: round.phase,
            seconds_remaining,
            betting_open: round.is_open(),
        }
    }
}

/// One-way publish capability the engine depends on.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: GameEvent);
}

/// Event sink over a tokio broadcast channel.
///
/// Subscribers can come and go; publishing with no receivers is not an
/// error, and lagging receivers drop old events rather than blocking the
/// engine.
pub struct BroadcastSink {
    tx: broadcast::Sender<GameEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: GameEvent) {
        // Send fails only when no receiver is subscribed; fire-and-forget.
        let _ = self.tx.send(event);
    }
}

/// Sink that drops everything, for tests and headless embedding.
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: GameEvent) {}
}
