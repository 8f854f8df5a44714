//! Tenspot - timed number-wager round engine
//!
//! Repeating betting rounds on the numbers 1-10: a round opens, accepts one
//! bet per player during a fixed window, then closes, draws a uniform
//! winning number and pays matching stakes at a fixed 9.9x multiplier.
//!
//! The crate is the round lifecycle and settlement core. Transport,
//! registration and durable persistence sit behind the [`storage`],
//! [`events`] and directory boundaries; `MemoryStore` and `BroadcastSink`
//! are the in-process implementations used by the binary and the tests.

pub mod config;
pub mod errors;
pub mod events;
pub mod gate;
pub mod lifecycle;
pub mod models;
pub mod settlement;
pub mod storage;

pub use config::EngineConfig;
pub use errors::{BetError, RegisterError, StorageError};
pub use events::{BroadcastSink, EventSink, GameEvent, NullSink};
pub use gate::BettingGate;
pub use lifecycle::{RoundController, RoundSlot};
pub use models::{Bet, Player, Round, RoundPhase};
pub use settlement::{WinnerPayout, NUMBER_MAX, NUMBER_MIN, WIN_MULTIPLIER};
pub use storage::{MemoryStore, PlayerDirectory, RoundStore};
