//! Storage boundary for rounds, bets and players.
//!
//! The engine depends on the traits only; `MemoryStore` is the in-process
//! implementation used by the binary and the test suite. A database-backed
//! implementation would satisfy the same contracts with row-level isolation.

use crate::errors::{RegisterError, StorageError};
use crate::models::{Bet, Player, Round};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Persistence operations the round engine requires.
///
/// Every failure surfaces as a [`StorageError`]; a write is either durable
/// or reported, never dropped.
#[async_trait]
pub trait RoundStore: Send + Sync {
    async fn save_round(&self, round: &Round) -> Result<(), StorageError>;
    async fn save_bet(&self, bet: &Bet) -> Result<(), StorageError>;
    async fn save_player(&self, player: &Player) -> Result<(), StorageError>;
    async fn find_open_round(&self) -> Result<Option<Round>, StorageError>;
    async fn find_player(&self, player_id: Uuid) -> Result<Option<Player>, StorageError>;
    async fn find_bet(
        &self,
        player_id: Uuid,
        round_id: Uuid,
    ) -> Result<Option<Bet>, StorageError>;
    async fn find_bets_by_round(&self, round_id: Uuid) -> Result<Vec<Bet>, StorageError>;
}

/// Read-only player lookup owned by the registration subsystem.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn find_player_by_nickname(
        &self,
        nickname: &str,
    ) -> Result<Option<Player>, StorageError>;
}

/// Concurrent in-memory store backing both engine boundaries.
pub struct MemoryStore {
    rounds: DashMap<Uuid, Round>,
    bets: DashMap<Uuid, Bet>,
    /// (player_id, round_id) -> bet id, the one-bet-per-round index.
    bet_index: DashMap<(Uuid, Uuid), Uuid>,
    players: DashMap<Uuid, Player>,
    nicknames: DashMap<String, Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rounds: DashMap::new(),
            bets: DashMap::new(),
            bet_index: DashMap::new(),
            players: DashMap::new(),
            nicknames: DashMap::new(),
        }
    }

    /// Register a new player with a unique nickname and an opening balance.
    pub fn register_player(
        &self,
        nickname: &str,
        initial_balance: Decimal,
    ) -> Result<Player, RegisterError> {
        match self.nicknames.entry(nickname.to_string()) {
            Entry::Occupied(_) => Err(RegisterError::NicknameTaken(nickname.to_string())),
            Entry::Vacant(slot) => {
                let player = Player::new(nickname, initial_balance);
                slot.insert(player.id);
                self.players.insert(player.id, player.clone());
                Ok(player)
            }
        }
    }

    /// Players ordered by lifetime winnings, highest first.
    pub fn top_winners(&self, limit: usize) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.iter().map(|p| p.value().clone()).collect();
        players.sort_by(|a, b| b.total_winnings.cmp(&a.total_winnings));
        players.truncate(limit);
        players
    }

    /// Snapshot of every stored round, for inspection and tests.
    pub fn rounds(&self) -> Vec<Round> {
        self.rounds.iter().map(|r| r.value().clone()).collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoundStore for MemoryStore {
    async fn save_round(&self, round: &Round) -> Result<(), StorageError> {
        self.rounds.insert(round.id, round.clone());
        Ok(())
    }

    async fn save_bet(&self, bet: &Bet) -> Result<(), StorageError> {
        self.bet_index
            .insert((bet.player_id, bet.round_id), bet.id);
        self.bets.insert(bet.id, bet.clone());
        Ok(())
    }

    async fn save_player(&self, player: &Player) -> Result<(), StorageError> {
        self.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn find_open_round(&self) -> Result<Option<Round>, StorageError> {
        Ok(self
            .rounds
            .iter()
            .find(|r| r.value().is_open())
            .map(|r| r.value().clone()))
    }

    async fn find_player(&self, player_id: Uuid) -> Result<Option<Player>, StorageError> {
        Ok(self.players.get(&player_id).map(|p| p.value().clone()))
    }

    async fn find_bet(
        &self,
        player_id: Uuid,
        round_id: Uuid,
    ) -> Result<Option<Bet>, StorageError> {
        let Some(bet_id) = self.bet_index.get(&(player_id, round_id)).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.bets.get(&bet_id).map(|b| b.value().clone()))
    }

    async fn find_bets_by_round(&self, round_id: Uuid) -> Result<Vec<Bet>, StorageError> {
        let mut bets: Vec<Bet> = self
            .bets
            .iter()
            .filter(|b| b.value().round_id == round_id)
            .map(|b| b.value().clone())
            .collect();
        // Placement order, with the id as a tiebreak for equal timestamps.
        bets.sort_by(|a, b| a.placed_at.cmp(&b.placed_at).then(a.id.cmp(&b.id)));
        Ok(bets)
    }
}

#[async_trait]
impl PlayerDirectory for MemoryStore {
    async fn find_player_by_nickname(
        &self,
        nickname: &str,
    ) -> Result<Option<Player>, StorageError> {
        let Some(player_id) = self.nicknames.get(nickname).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.players.get(&player_id).map(|p| p.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoundPhase;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn registration_enforces_unique_nicknames() {
        let store = MemoryStore::new();

        let alice = store.register_player("alice", dec!(1000)).expect("first");
        assert_eq!(alice.balance, dec!(1000));

        let dup = store.register_player("alice", dec!(5));
        assert!(matches!(dup, Err(RegisterError::NicknameTaken(_))));

        let found = store
            .find_player_by_nickname("alice")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.id, alice.id);
    }

    #[tokio::test]
    async fn find_open_round_skips_settled_rounds() {
        let store = MemoryStore::new();

        let mut settled = Round::open(Utc::now());
        settled.phase = RoundPhase::Settled;
        store.save_round(&settled).await.expect("save");
        assert!(store.find_open_round().await.expect("find").is_none());

        let open = Round::open(Utc::now());
        store.save_round(&open).await.expect("save");
        let found = store.find_open_round().await.expect("find").expect("open");
        assert_eq!(found.id, open.id);
    }

    #[tokio::test]
    async fn bet_pair_index_finds_the_players_bet() {
        let store = MemoryStore::new();
        let player = store.register_player("bob", dec!(100)).expect("register");
        let round = Round::open(Utc::now());
        store.save_round(&round).await.expect("save");

        assert!(store
            .find_bet(player.id, round.id)
            .await
            .expect("find")
            .is_none());

        let bet = Bet::new(&player, round.id, 4, dec!(25));
        store.save_bet(&bet).await.expect("save");

        let found = store
            .find_bet(player.id, round.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.id, bet.id);
        assert_eq!(found.number, 4);
    }

    #[tokio::test]
    async fn bets_by_round_come_back_in_placement_order() {
        let store = MemoryStore::new();
        let round = Round::open(Utc::now());
        store.save_round(&round).await.expect("save");

        let mut ids = Vec::new();
        for i in 0..5u8 {
            let player = store
                .register_player(&format!("p{i}"), dec!(100))
                .expect("register");
            let mut bet = Bet::new(&player, round.id, i + 1, dec!(10));
            bet.placed_at = Utc::now() + chrono::Duration::milliseconds(i64::from(i));
            store.save_bet(&bet).await.expect("save");
            ids.push(bet.id);
        }

        let bets = store.find_bets_by_round(round.id).await.expect("find");
        assert_eq!(bets.iter().map(|b| b.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn top_winners_orders_by_lifetime_winnings() {
        let store = MemoryStore::new();
        for (nick, winnings) in [("low", dec!(10)), ("high", dec!(500)), ("mid", dec!(99))] {
            let mut player = store.register_player(nick, dec!(0)).expect("register");
            player.credit_winnings(winnings);
            store.players.insert(player.id, player);
        }

        let top = store.top_winners(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].nickname, "high");
        assert_eq!(top[1].nickname, "mid");
    }
}
