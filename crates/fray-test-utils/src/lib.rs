//! Test sinks and fixtures for Fray development.
//!
//! [`RecordingSink`] keeps every batch a client would have received;
//! [`FailingSink`] simulates a client that goes away. The fixture
//! functions build small topologies and quiet configs so scenario tests
//! only spell out what they care about.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use fray_core::{CharacterClass, CharacterSelection, InputState, MoveKeys, ServerMessage, ZoneId};
use fray_engine::{ClientSink, ServerConfig, TransportError};
use fray_space::WorldTopology;

// ── Sinks ────────────────────────────────────────────────────────

/// A sink that records every batch. Clones share the same record, so
/// the test keeps one clone and hands the other to the server.
#[derive(Clone, Default)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<Vec<ServerMessage>>>>,
    closed: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A boxed clone for handing to the server.
    pub fn boxed(&self) -> Box<dyn ClientSink> {
        Box::new(self.clone())
    }

    /// All batches received so far.
    pub fn batches(&self) -> Vec<Vec<ServerMessage>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent batch, or an empty one.
    pub fn last_batch(&self) -> Vec<ServerMessage> {
        self.batches().pop().unwrap_or_default()
    }

    /// Every message received, flattened in order.
    pub fn messages(&self) -> Vec<ServerMessage> {
        self.batches().into_iter().flatten().collect()
    }

    /// Messages whose envelope type is `type_name`.
    pub fn of_type(&self, type_name: &str) -> Vec<ServerMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.type_name() == type_name)
            .collect()
    }

    /// How many messages of `type_name` arrived.
    pub fn count(&self, type_name: &str) -> usize {
        self.of_type(type_name).len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Whether the server closed this sink.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl ClientSink for RecordingSink {
    fn send_batch(&mut self, batch: &[ServerMessage]) -> Result<(), TransportError> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// A sink that accepts `ok_batches` batches and then reports the client
/// as disconnected.
#[derive(Clone)]
pub struct FailingSink {
    remaining: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl FailingSink {
    /// Fail on the first batch.
    pub fn immediately() -> Self {
        Self::after(0)
    }

    /// Accept `ok_batches` batches, then fail.
    pub fn after(ok_batches: usize) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(ok_batches)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn boxed(&self) -> Box<dyn ClientSink> {
        Box::new(self.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl ClientSink for FailingSink {
    fn send_batch(&mut self, _batch: &[ServerMessage]) -> Result<(), TransportError> {
        let ok = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if ok {
            Ok(())
        } else {
            Err(TransportError::Disconnected)
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

// ── Topologies ───────────────────────────────────────────────────

/// `cols` zones in a single row, numbered from 1.
pub fn line_topology(cols: u32, zone_size: f32) -> WorldTopology {
    grid_topology(1, cols, zone_size)
}

/// A full `rows × cols` grid, numbered from 1 in row-major order.
pub fn grid_topology(rows: u32, cols: u32, zone_size: f32) -> WorldTopology {
    let grid = (0..rows)
        .map(|r| (0..cols).map(|c| ZoneId(r * cols + c + 1)).collect())
        .collect();
    WorldTopology::new(grid, zone_size).expect("fixture grid is valid")
}

/// An L-shaped world: zones 1, 2 on top, zone 3 bottom-left and a void
/// cell bottom-right.
pub fn l_topology(zone_size: f32) -> WorldTopology {
    WorldTopology::new(
        vec![vec![ZoneId(1), ZoneId(2)], vec![ZoneId(3), ZoneId::VOID]],
        zone_size,
    )
    .expect("fixture grid is valid")
}

// ── Configs and inputs ───────────────────────────────────────────

/// Default rules with no agent population and a fixed seed.
pub fn quiet_config() -> ServerConfig {
    ServerConfig {
        seed: 7,
        population: Vec::new(),
        ..Default::default()
    }
}

pub fn selection(class: CharacterClass) -> CharacterSelection {
    CharacterSelection { class }
}

pub fn guardian() -> CharacterSelection {
    selection(CharacterClass::Guardian)
}

/// Key state holding the `MoveKeys` bits in `keys`.
pub fn keys(keys: u8) -> InputState {
    InputState {
        movement: MoveKeys::from_bits(keys),
        action: false,
    }
}

/// The action key with no movement.
pub fn action() -> InputState {
    InputState {
        movement: MoveKeys::default(),
        action: true,
    }
}
