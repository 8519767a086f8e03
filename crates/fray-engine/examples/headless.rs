//! Fray headless run: a 2×2 world with agents and wandering players.
//!
//! Demonstrates:
//!   1. Loading a world layout and server config from JSON
//!   2. Building a LockstepServer
//!   3. Connecting players through ChannelSink
//!   4. Stepping and reading per-zone tick metrics
//!
//! Run with:
//!   RUST_LOG=fray_engine=info cargo run --example headless

use crossbeam_channel::Receiver;
use fray_core::{CharacterClass, CharacterSelection, InputState, MoveKeys, ServerMessage};
use fray_engine::{ChannelSink, LockstepServer, ServerConfig, ZoneInput};
use fray_space::{WorldLayout, WorldTopology};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const LAYOUT: &str = r#"{
    "void": "void",
    "zoneTiles": 32,
    "regions": { "meadow": 1, "marsh": 2, "ridge": 3, "ruins": 4 },
    "grid": [["meadow", "marsh"], ["ridge", "ruins"]]
}"#;

const CONFIG: &str = r#"{
    "tickRateHz": 10,
    "seed": 2024,
    "population": [
        { "profile": "easy", "count": 4, "respawnIntervalMs": 5000 },
        { "zone": 4, "profile": "hard", "count": 2 }
    ]
}"#;

const TICKS: u64 = 600;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let layout = WorldLayout::from_json(LAYOUT)?;
    let topology = WorldTopology::from_layout(&layout)?;
    let config = ServerConfig::from_json(CONFIG)?;
    let mut server = LockstepServer::new(config, topology)?;

    let classes = [
        CharacterClass::Guardian,
        CharacterClass::Ravager,
        CharacterClass::Mystic,
    ];
    let mut clients: Vec<(fray_core::PlayerId, Receiver<Vec<ServerMessage>>)> = Vec::new();
    for class in classes {
        let (tx, rx) = crossbeam_channel::bounded(TICKS as usize);
        let id = server
            .coordinator()
            .spawn(CharacterSelection { class }, Box::new(ChannelSink::new(tx)))?;
        clients.push((id, rx));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let directions = [MoveKeys::UP, MoveKeys::DOWN, MoveKeys::LEFT, MoveKeys::RIGHT];
    let mut migrations = 0;
    let mut strikes = 0;
    for tick in 0..TICKS {
        if tick % 20 == 0 {
            for (id, _) in &clients {
                let keys = directions[rng.random_range(0..directions.len())];
                let input = InputState {
                    movement: MoveKeys::from_bits(keys),
                    action: rng.random_bool(0.2),
                };
                if let Err(e) = server.coordinator().route(ZoneInput { player: *id, input }) {
                    eprintln!("input for {id} rejected: {e}");
                }
            }
        }
        let step = server.step_sync();
        migrations += step.migrations.len();
        strikes += step.zones.iter().map(|(_, m)| m.strikes).sum::<u32>();
    }

    println!("ran {TICKS} ticks ({} ms simulated)", server.now_ms());
    println!("migrations: {migrations}, strikes: {strikes}");
    for (id, rx) in &clients {
        let batches: Vec<_> = rx.try_iter().collect();
        let deaths = batches
            .iter()
            .flatten()
            .filter(|m| m.type_name() == "playerDeath")
            .count();
        let zone = server
            .coordinator()
            .player_zone(*id)
            .map_or_else(|| "gone".to_string(), |z| z.to_string());
        println!(
            "player {id}: {} batches, {deaths} deaths, now in zone {zone}",
            batches.len()
        );
    }
    Ok(())
}
