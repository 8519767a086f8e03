//! The outbound transport seam.
//!
//! A [`ClientSink`] accepts one batch of messages per tick for one
//! client. Implementations must never block for long: a zone flushes
//! every player's batch from inside its tick, and a sink that cannot
//! take the batch right away reports an error, which the zone treats
//! as the client being gone.

use crossbeam_channel::{Sender, TrySendError};
use fray_core::{MessageError, ServerMessage};
use std::io::Write;
use thiserror::Error;

/// Why a batch could not be delivered.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The client's connection is gone.
    #[error("client disconnected")]
    Disconnected,
    /// The client is not keeping up and its buffer is full.
    #[error("client outbound buffer full")]
    Backpressure,
    /// The underlying write failed.
    #[error("write failed: {reason}")]
    Write {
        /// I/O error text.
        reason: String,
    },
    /// A message could not be encoded.
    #[error(transparent)]
    Encode(#[from] MessageError),
}

/// Per-client outbound channel.
pub trait ClientSink: Send {
    /// Deliver one tick's batch, best effort and without waiting.
    fn send_batch(&mut self, batch: &[ServerMessage]) -> Result<(), TransportError>;

    /// Close the connection. Called at most once, after which the sink
    /// is dropped.
    fn close(&mut self) {}
}

impl<S: ClientSink + ?Sized> ClientSink for Box<S> {
    fn send_batch(&mut self, batch: &[ServerMessage]) -> Result<(), TransportError> {
        (**self).send_batch(batch)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

// ── ChannelSink ──────────────────────────────────────────────────

/// Hands batches to a connection writer thread over a bounded channel.
///
/// A full channel means the writer is behind; the batch is refused
/// rather than queued.
pub struct ChannelSink {
    tx: Option<Sender<Vec<ServerMessage>>>,
}

impl ChannelSink {
    /// Wrap the sending half of the writer's channel.
    pub fn new(tx: Sender<Vec<ServerMessage>>) -> Self {
        Self { tx: Some(tx) }
    }
}

impl ClientSink for ChannelSink {
    fn send_batch(&mut self, batch: &[ServerMessage]) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Disconnected)?;
        tx.try_send(batch.to_vec()).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Backpressure,
            TrySendError::Disconnected(_) => TransportError::Disconnected,
        })
    }

    fn close(&mut self) {
        // Dropping the sender lets the writer thread observe the hang-up.
        self.tx = None;
    }
}

// ── JsonLinesSink ────────────────────────────────────────────────

/// Writes each message as one JSON envelope per line.
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ClientSink for JsonLinesSink<W> {
    fn send_batch(&mut self, batch: &[ServerMessage]) -> Result<(), TransportError> {
        for msg in batch {
            let line = msg.to_json()?;
            writeln!(self.out, "{line}").map_err(|e| TransportError::Write {
                reason: e.to_string(),
            })?;
        }
        self.out.flush().map_err(|e| TransportError::Write {
            reason: e.to_string(),
        })
    }
}
