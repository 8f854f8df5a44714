//! Headless engine runner: in-memory store, broadcast events, demo bettors.

use rand::Rng;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tenspot::{
    BettingGate, BroadcastSink, EngineConfig, MemoryStore, RoundController, RoundSlot,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::default();
    let store = Arc::new(MemoryStore::new());
    let events = Arc::new(BroadcastSink::new(1024));
    let slot = Arc::new(RoundSlot::new());

    let controller = Arc::new(RoundController::new(
        store.clone(),
        events.clone(),
        slot.clone(),
        config,
    ));
    let gate = Arc::new(BettingGate::new(
        store.clone(),
        store.clone(),
        events.clone(),
        slot,
    ));

    // Demo players so the rounds have someone to pay.
    for (nickname, balance) in [("alice", dec!(1000)), ("bob", dec!(500))] {
        let player = store.register_player(nickname, balance)?;
        info!(nickname = %player.nickname, balance = %player.balance, "player registered");
    }

    // Mirror every published event into the log.
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            info!(topic = event.topic(), ?event, "published");
        }
    });

    // Demo bettors wager a random number every few seconds; duplicate-bet
    // and no-round rejections are part of normal operation here.
    for nickname in ["alice", "bob"] {
        let gate = gate.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(4)).await;
                let number = rand::thread_rng().gen_range(1..=10);
                if let Err(error) = gate.place_bet(nickname, number, dec!(10)).await {
                    info!(nickname, %error, "bet rejected");
                }
            }
        });
    }

    let runner = controller.clone();
    tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    let top = store.top_winners(5);
    for player in top {
        info!(
            nickname = %player.nickname,
            balance = %player.balance,
            total_winnings = %player.total_winnings,
            "final standings"
        );
    }
    Ok(())
}
