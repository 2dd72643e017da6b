// Shared builders for integration tests.
#![allow(dead_code)]

use tokio::sync::broadcast;

use arena_server::game::{ArenaTuning, Game};
use arena_server::util::time::ManualClock;
use arena_server::ws::{Codec, Message};

// Game on a manual clock starting at zero, with a fixed spawn seed.
pub fn manual_game(seed: u64) -> (Game, ManualClock, broadcast::Receiver<Message>) {
    let clock = ManualClock::new(0);
    let (tx, rx) = broadcast::channel(4096);
    let game = Game::new(ArenaTuning::default(), tx)
        .with_clock(clock.clone())
        .with_seed(seed);
    (game, clock, rx)
}

// Everything broadcast so far, in order.
pub fn drain(rx: &mut broadcast::Receiver<Message>) -> Vec<Message> {
    let mut out = Vec::new();
    while let Ok(message) = rx.try_recv() {
        out.push(message);
    }
    out
}

// Messages as they would appear on the wire.
pub fn encode_all(messages: &[Message]) -> Vec<String> {
    let codec = Codec::default();
    messages
        .iter()
        .map(|m| codec.encode(m).expect("server messages always encode"))
        .collect()
}
