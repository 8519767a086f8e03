//! Benchmark profiles for the Fray world server.
//!
//! - [`reference_profile`]: 3×3 world, mixed agent tiers in every zone
//! - [`populated_server`]: the reference profile with connected players
//!   walking in deterministic directions

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use fray_core::{
    CharacterClass, CharacterSelection, InputState, MoveKeys, PlayerId, ServerMessage, ZoneId,
};
use fray_engine::{
    ClientSink, LockstepServer, PopulationEntry, ServerConfig, TransportError, ZoneInput,
};
use fray_space::WorldTopology;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Zone side used by the profiles, in pixels.
pub const ZONE_SIZE: f32 = 2048.0;

/// A sink that accepts and discards every batch.
pub struct DiscardSink;

impl ClientSink for DiscardSink {
    fn send_batch(&mut self, batch: &[ServerMessage]) -> Result<(), TransportError> {
        std::hint::black_box(batch);
        Ok(())
    }
}

/// A 3×3 world with 6 easy, 3 medium and 1 hard agent per zone.
pub fn reference_profile(seed: u64) -> (ServerConfig, WorldTopology) {
    let grid = (0..3u32)
        .map(|r| (0..3u32).map(|c| ZoneId(r * 3 + c + 1)).collect())
        .collect();
    let topology = WorldTopology::new(grid, ZONE_SIZE).expect("reference grid is valid");
    let config = ServerConfig {
        seed,
        population: vec![
            PopulationEntry::everywhere("easy", 6),
            PopulationEntry::everywhere("medium", 3),
            PopulationEntry::everywhere("hard", 1),
        ],
        ..Default::default()
    };
    (config, topology)
}

/// The reference profile with `players` players connected and moving.
pub fn populated_server(seed: u64, players: usize) -> (LockstepServer, Vec<PlayerId>) {
    let (config, topology) = reference_profile(seed);
    let server = LockstepServer::new(config, topology).expect("reference config is valid");
    let ids = (0..players)
        .map(|_| {
            server
                .coordinator()
                .spawn(
                    CharacterSelection {
                        class: CharacterClass::Guardian,
                    },
                    Box::new(DiscardSink),
                )
                .expect("spawn zone exists")
        })
        .collect();
    (server, ids)
}

/// Give every player a new seeded direction.
pub fn scatter(server: &LockstepServer, players: &[PlayerId], seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for &player in players {
        let bits = rng.random_range(0..16u8);
        let input = InputState {
            movement: MoveKeys::from_bits(bits),
            action: rng.random_bool(0.1),
        };
        // A full inbox only drops this input.
        let _ = server.coordinator().route(ZoneInput { player, input });
    }
}
