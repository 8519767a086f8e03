//! Realtime server: one thread per zone plus a migrator.
//!
//! # Architecture
//!
//! ```text
//! Network readers        Zone threads (N)             Migrator
//!     |                       |                          |
//!     |--route()------------->| inbox.drain()            |
//!     |  [bounded inbox]      | tick(now)                |
//!     |                       | board.publish(snap)      |
//!     |                       |--TickReport------------->| apply_report()
//!     |                       | park(budget - elapsed)   |   lock both zones
//!     |                       |                          |   evict / admit
//! ```
//!
//! A zone thread holds only its own zone lock while ticking. The
//! migrator takes two zone locks in id order, so a migration waits for
//! both zones to be between ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use fray_core::Progression;
use fray_space::WorldTopology;
use tracing::{info, warn};

use crate::config::{ConfigError, ServerConfig};
use crate::coordinator::Coordinator;
use crate::rules::Rules;
use crate::tick_thread::{MigratorState, ZoneThreadState};

// ── ShutdownReport ───────────────────────────────────────────────

/// Timing and join results from [`RealtimeServer::shutdown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Wall-clock time for the whole shutdown.
    pub total_ms: u64,
    /// Zone threads that joined cleanly.
    pub zones_joined: usize,
    /// Ticks run across all zone threads.
    pub ticks: u64,
    /// Whether the migrator joined cleanly.
    pub migrator_joined: bool,
    /// Migrations applied over the server's lifetime.
    pub migrations: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Stopped,
}

// ── RealtimeServer ───────────────────────────────────────────────

/// Server whose zones tick on their own threads at the configured rate.
///
/// Shutdown happens on [`shutdown`](Self::shutdown) or on drop.
pub struct RealtimeServer {
    coordinator: Arc<Coordinator>,
    shutdown_flag: Arc<AtomicBool>,
    zone_threads: Vec<JoinHandle<u64>>,
    migrator: Option<JoinHandle<u64>>,
    state: ShutdownState,
}

impl RealtimeServer {
    /// Validate `config`, build every zone and start the threads.
    pub fn new(config: ServerConfig, topology: WorldTopology) -> Result<Self, ConfigError> {
        Self::start(Rules::new(config, topology)?)
    }

    /// Like [`new`](Self::new) with a custom level curve.
    pub fn with_progression(
        config: ServerConfig,
        topology: WorldTopology,
        progression: Arc<dyn Progression>,
    ) -> Result<Self, ConfigError> {
        Self::start(Rules::with_progression(config, topology, progression)?)
    }

    /// Start from already validated rules.
    pub fn start(rules: Rules) -> Result<Self, ConfigError> {
        let coordinator = Arc::new(Coordinator::new(rules)?);
        let mut server = Self {
            coordinator: Arc::clone(&coordinator),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            zone_threads: Vec::new(),
            migrator: None,
            state: ShutdownState::Running,
        };

        let (tx, rx) = crossbeam_channel::unbounded();
        let migrator = MigratorState::new(Arc::clone(&coordinator), rx);
        server.migrator = Some(
            thread::Builder::new()
                .name("fray-migrate".into())
                .spawn(move || migrator.run())
                .map_err(spawn_failed)?,
        );

        let clock = Instant::now();
        for zone in coordinator.zone_ids() {
            let state = ZoneThreadState::new(
                zone,
                Arc::clone(&coordinator),
                clock,
                tx.clone(),
                Arc::clone(&server.shutdown_flag),
            );
            let handle = thread::Builder::new()
                .name(format!("fray-zone-{zone}"))
                .spawn(move || state.run())
                .map_err(spawn_failed)?;
            server.zone_threads.push(handle);
        }
        // The migrator exits once every zone thread drops its sender.
        drop(tx);

        info!(
            zones = server.zone_threads.len(),
            tick_ms = coordinator.rules().tick_interval_ms,
            "realtime server started"
        );
        Ok(server)
    }

    /// Connection, routing and zone access.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Whether the zone threads are still running.
    pub fn is_running(&self) -> bool {
        self.state == ShutdownState::Running
    }

    /// Close the coordinator, stop every zone thread, then the
    /// migrator.
    ///
    /// From here on the coordinator answers spawns, inputs and respawns
    /// with [`SubmitError::ShutDown`](crate::SubmitError::ShutDown).
    /// Zones finish the tick they are in; reports already produced are
    /// still applied. Calling this twice is harmless.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Stopped {
            return ShutdownReport {
                migrator_joined: true,
                ..Default::default()
            };
        }
        let start = Instant::now();

        self.coordinator.close();
        self.shutdown_flag.store(true, Ordering::Release);
        for handle in &self.zone_threads {
            handle.thread().unpark();
        }
        let mut zones_joined = 0;
        let mut ticks = 0;
        for handle in self.zone_threads.drain(..) {
            match handle.join() {
                Ok(n) => {
                    zones_joined += 1;
                    ticks += n;
                }
                Err(_) => warn!("zone thread panicked"),
            }
        }

        // The migrator drains the remaining reports once the last zone
        // thread has dropped its sender.
        let (migrator_joined, migrations) = match self.migrator.take().map(JoinHandle::join) {
            Some(Ok(n)) => (true, n),
            Some(Err(_)) => {
                warn!("migrator thread panicked");
                (false, 0)
            }
            None => (true, 0),
        };

        self.state = ShutdownState::Stopped;
        let report = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            zones_joined,
            ticks,
            migrator_joined,
            migrations,
        };
        info!(
            total_ms = report.total_ms,
            zones = zones_joined,
            ticks,
            migrations,
            "realtime server stopped"
        );
        report
    }
}

impl Drop for RealtimeServer {
    fn drop(&mut self) {
        if self.state != ShutdownState::Stopped {
            self.shutdown();
        }
    }
}

fn spawn_failed(e: std::io::Error) -> ConfigError {
    ConfigError::ThreadSpawnFailed {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fray_core::ZoneId;
    use std::time::Duration;

    fn topology() -> WorldTopology {
        WorldTopology::new(vec![vec![ZoneId(1), ZoneId(2)]], 500.0).unwrap()
    }

    #[test]
    fn zones_tick_and_shut_down() {
        let config = ServerConfig {
            tick_rate_hz: 100.0,
            ..Default::default()
        };
        let mut server = RealtimeServer::new(config, topology()).unwrap();
        assert!(server.is_running());
        let deadline = Instant::now() + Duration::from_secs(5);
        while server.coordinator().board().publish_count() < 4 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        let report = server.shutdown();
        assert!(!server.is_running());
        assert_eq!(report.zones_joined, 2);
        assert!(report.migrator_joined);
        assert!(report.ticks >= 4);
        assert_eq!(server.shutdown().zones_joined, 0);
    }

    #[test]
    fn shutdown_refuses_further_input() {
        let mut server = RealtimeServer::new(ServerConfig::default(), topology()).unwrap();
        struct Null;
        impl crate::sink::ClientSink for Null {
            fn send_batch(
                &mut self,
                _: &[fray_core::ServerMessage],
            ) -> Result<(), crate::sink::TransportError> {
                Ok(())
            }
        }
        let selection = fray_core::CharacterSelection::default();
        let id = server.coordinator().spawn(selection, Box::new(Null)).unwrap();
        server.shutdown();

        let input = crate::inbox::ZoneInput {
            player: id,
            input: fray_core::InputState::default(),
        };
        assert_eq!(
            server.coordinator().route(input),
            Err(crate::SubmitError::ShutDown)
        );
        assert_eq!(
            server.coordinator().spawn(selection, Box::new(Null)).unwrap_err(),
            crate::SubmitError::ShutDown
        );
        assert_eq!(server.coordinator().player_count(), 1);
    }

    #[test]
    fn drop_without_shutdown_joins_threads() {
        let server = RealtimeServer::new(ServerConfig::default(), topology()).unwrap();
        drop(server);
    }
}
