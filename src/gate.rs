//! Bet acceptance: the transactional path from wager request to recorded
//! bet.
//!
//! This is the hottest concurrent path in the engine. Everything that must
//! not race — duplicate check, balance check, debit, bet creation — runs
//! under the round slot's write lock, the same exclusive section the
//! controller takes to close a round.

use crate::errors::BetError;
use crate::events::{EventSink, GameEvent};
use crate::lifecycle::RoundSlot;
use crate::models::Bet;
use crate::settlement::{NUMBER_MAX, NUMBER_MIN};
use crate::storage::{PlayerDirectory, RoundStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info};

/// Validates and records one bet against the currently open round.
pub struct BettingGate {
    store: Arc<dyn RoundStore>,
    players: Arc<dyn PlayerDirectory>,
    events: Arc<dyn EventSink>,
    slot: Arc<RoundSlot>,
}

impl BettingGate {
    pub fn new(
        store: Arc<dyn RoundStore>,
        players: Arc<dyn PlayerDirectory>,
        events: Arc<dyn EventSink>,
        slot: Arc<RoundSlot>,
    ) -> Self {
        Self {
            store,
            players,
            events,
            slot,
        }
    }

    /// Accept a wager: debit the stake and record the bet, atomically with
    /// respect to any other placement and to the round's close transition.
    ///
    /// Rejections leave no state behind and name the reason.
    pub async fn place_bet(
        &self,
        nickname: &str,
        number: u8,
        amount: Decimal,
    ) -> Result<Bet, BetError> {
        if !(NUMBER_MIN..=NUMBER_MAX).contains(&number) {
            return Err(BetError::InvalidNumber(number));
        }
        if amount <= Decimal::ZERO {
            return Err(BetError::InvalidAmount(amount));
        }

        let guard = self.slot.write().await;
        let round = match guard.as_ref() {
            Some(round) if round.is_open() => round.clone(),
            _ => return Err(BetError::NoActiveRound),
        };

        // Re-read the player under the lock so the balance check can never
        // run against a stale snapshot.
        let mut player = self
            .players
            .find_player_by_nickname(nickname)
            .await?
            .ok_or_else(|| BetError::UnknownPlayer(nickname.to_string()))?;

        if self.store.find_bet(player.id, round.id).await?.is_some() {
            return Err(BetError::DuplicateBet);
        }
        if player.balance < amount {
            return Err(BetError::InsufficientBalance {
                balance: player.balance,
                requested: amount,
            });
        }

        player.debit_stake(amount);
        self.store.save_player(&player).await?;

        let bet = Bet::new(&player, round.id, number, amount);
        if let Err(write_error) = self.store.save_bet(&bet).await {
            // The stake must not vanish with the failed bet record.
            player.refund_stake(amount);
            if let Err(refund_error) = self.store.save_player(&player).await {
                error!(%refund_error, nickname, "stake refund failed after bet write failure");
            }
            return Err(write_error.into());
        }

        info!(nickname, number, %amount, round_id = %round.id, "bet accepted");
        self.events.publish(GameEvent::BetPlaced {
            round_id: round.id,
            nickname: bet.nickname.clone(),
            number: bet.number,
            amount: bet.amount,
            placed_at: bet.placed_at,
        });
        Ok(bet)
    }
}
