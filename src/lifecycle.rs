//! Round lifecycle: the timed state machine that opens, closes and settles
//! rounds.
//!
//! A single scheduler loop drives `tick()`; ticks are strictly sequential.
//! The current round lives in a [`RoundSlot`] shared with the betting gate,
//! whose write lock is the exclusive section that keeps bet acceptance and
//! the close/settle transition from interleaving.

use crate::config::EngineConfig;
use crate::errors::StorageError;
use crate::events::{EventSink, GameEvent};
use crate::models::{Round, RoundPhase};
use crate::settlement::{apply_outcome, draw_winning_number, WinnerPayout};
use crate::storage::RoundStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Shared cell holding the round currently exposed to bettors.
///
/// Single writer (the controller's tick, plus the gate's commit section),
/// many readers. Readers always observe a consistent snapshot, never a
/// half-updated round.
pub struct RoundSlot {
    inner: RwLock<Option<Round>>,
}

impl RoundSlot {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Snapshot of the round currently held, if any.
    pub async fn current_round(&self) -> Option<Round> {
        self.inner.read().await.clone()
    }

    /// Exclusive access for phase transitions and bet acceptance.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Option<Round>> {
        self.inner.write().await
    }
}

impl Default for RoundSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the current round and advances it through its phases on a fixed
/// tick.
pub struct RoundController {
    store: Arc<dyn RoundStore>,
    events: Arc<dyn EventSink>,
    slot: Arc<RoundSlot>,
    config: EngineConfig,
}

impl RoundController {
    pub fn new(
        store: Arc<dyn RoundStore>,
        events: Arc<dyn EventSink>,
        slot: Arc<RoundSlot>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            events,
            slot,
            config,
        }
    }

    /// Run the scheduler loop forever.
    pub async fn run(&self) {
        let mut ticker = interval(Duration::from_millis(self.config.tick_interval_ms));
        // A slow tick delays the next one; ticks never overlap or burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Advance the state machine by one tick.
    ///
    /// Never panics and never propagates an error: a failed tick is logged
    /// and the same round is re-evaluated on the next tick.
    pub async fn tick(&self) {
        let mut guard = self.slot.write().await;
        let now = Utc::now();
        if let Err(error) = self.advance(&mut guard, now).await {
            error!(%error, "round tick failed; retrying on next tick");
        }
    }

    /// The round currently held, if any.
    pub async fn current_round(&self) -> Option<Round> {
        self.slot.current_round().await
    }

    /// Seconds left in the betting window; zero when no round is open.
    pub async fn remaining_secs(&self) -> u64 {
        match self.slot.current_round().await {
            Some(round) if round.is_open() => {
                (self.config.betting_window_secs as i64 - round.elapsed_secs(Utc::now())).max(0)
                    as u64
            }
            _ => 0,
        }
    }

    async fn advance(
        &self,
        current: &mut Option<Round>,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        match current {
            // A previous tick failed between closing and settling; retry.
            Some(round) if round.phase == RoundPhase::Closed => self.settle(round, now).await,
            Some(round) if round.is_open() => {
                let elapsed = round.elapsed_secs(now);
                if elapsed >= self.config.betting_window_secs as i64 {
                    self.close(round, now).await?;
                    self.settle(round, now).await
                } else {
                    let remaining = (self.config.betting_window_secs as i64 - elapsed) as u64;
                    self.events.publish(GameEvent::state(round, remaining));
                    Ok(())
                }
            }
            // No round yet, or the held round is settled.
            _ => {
                let round = self.next_round(now).await?;
                let remaining =
                    (self.config.betting_window_secs as i64 - round.elapsed_secs(now)).max(0) as u64;
                self.events.publish(GameEvent::state(&round, remaining));
                *current = Some(round);
                Ok(())
            }
        }
    }

    async fn next_round(&self, now: DateTime<Utc>) -> Result<Round, StorageError> {
        // Adopt a round a previous run left open before minting a new one,
        // so at most one round is ever open system-wide.
        if let Some(existing) = self.store.find_open_round().await? {
            info!(round_id = %existing.id, "adopting open round from storage");
            return Ok(existing);
        }

        let round = Round::open(now);
        self.store.save_round(&round).await?;
        info!(round_id = %round.id, "round opened");
        Ok(round)
    }

    async fn close(&self, round: &mut Round, now: DateTime<Utc>) -> Result<(), StorageError> {
        // Flip the in-memory phase first: once the window has expired no bet
        // may be accepted, even if the write below fails.
        round.phase = RoundPhase::Closed;
        round.closed_at = Some(now);
        info!(round_id = %round.id, "betting closed");
        self.events.publish(GameEvent::state(round, 0));
        self.store.save_round(round).await
    }

    /// Draw the outcome, pay the winners and mark the round settled.
    ///
    /// Safe to re-run on the same round: an already-drawn winning number is
    /// reused rather than re-rolled, already-paid bets are skipped, and a
    /// fully settled round is re-persisted unchanged.
    async fn settle(&self, round: &mut Round, now: DateTime<Utc>) -> Result<(), StorageError> {
        let winning = match round.winning_number {
            Some(n) => n,
            None => {
                let n = draw_winning_number(&mut rand::thread_rng());
                round.winning_number = Some(n);
                n
            }
        };

        let mut bets = self.store.find_bets_by_round(round.id).await?;
        // Only newly settled bets are credited; bets already paid out by an
        // earlier attempt are skipped.
        let newly_won = apply_outcome(&mut bets, winning);

        for bet in &bets {
            self.store.save_bet(bet).await?;
        }
        for winner in &newly_won {
            let mut player = self.store.find_player(winner.player_id).await?.ok_or_else(|| {
                StorageError::ReadFailed(format!(
                    "winner {} vanished during settlement",
                    winner.player_id
                ))
            })?;
            player.credit_winnings(winner.payout);
            self.store.save_player(&player).await?;
        }

        // Commit the terminal phase to memory only after it is durable, so a
        // failed write leaves the round in Closed and the next tick retries.
        let mut settled = round.clone();
        settled.phase = RoundPhase::Settled;
        settled.settled_at.get_or_insert(now);
        self.store.save_round(&settled).await?;
        *round = settled;

        // The broadcast carries every winner of the round, not just the ones
        // this attempt credited.
        let winners: Vec<WinnerPayout> = bets
            .iter()
            .filter(|bet| bet.is_winner == Some(true))
            .map(|bet| WinnerPayout {
                player_id: bet.player_id,
                nickname: bet.nickname.clone(),
                payout: bet.payout.unwrap_or_default(),
            })
            .collect();

        info!(
            round_id = %round.id,
            winning_number = winning,
            winners = winners.len(),
            "round settled"
        );
        self.events.publish(GameEvent::RoundResult {
            round_id: round.id,
            winning_number: winning,
            settled_at: round.settled_at.unwrap_or(now),
            winners,
        });
        self.events.publish(GameEvent::state(round, 0));
        Ok(())
    }
}
