//! Bounded per-zone inbound queue.
//!
//! Network readers push decoded input through an [`InboxSender`]; the
//! zone drains its [`Inbox`] once at the start of every tick. Producers
//! never wait: when the queue is full the newest input is dropped and
//! logged.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use fray_core::{InputState, MessageError, PlayerId, ZoneId};
use thiserror::Error;
use tracing::warn;

/// One player's input, addressed to the zone that owns the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneInput {
    /// Addressed player.
    pub player: PlayerId,
    /// Key state at send time.
    pub input: InputState,
}

/// Why an inbound message was not accepted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// No zone owns this player.
    #[error("unknown player {player}")]
    UnknownPlayer {
        /// The player the message was addressed to.
        player: PlayerId,
    },
    /// The owning zone's inbox is full; the message was dropped.
    #[error("zone {zone} inbox full")]
    InboxFull {
        /// The zone whose inbox overflowed.
        zone: ZoneId,
    },
    /// The addressed zone does not exist.
    #[error("unknown zone {zone}")]
    UnknownZone {
        /// The requested zone.
        zone: ZoneId,
    },
    /// The message did not decode.
    #[error(transparent)]
    Malformed(#[from] MessageError),
    /// The server has shut down.
    #[error("server has shut down")]
    ShutDown,
}

/// Producer handle for one zone's inbox. Cheap to clone.
#[derive(Clone, Debug)]
pub struct InboxSender {
    zone: ZoneId,
    tx: Sender<ZoneInput>,
}

impl InboxSender {
    /// Zone this sender feeds.
    pub fn zone_id(&self) -> ZoneId {
        self.zone
    }

    /// Queue `input` without blocking.
    pub fn submit(&self, input: ZoneInput) -> Result<(), SubmitError> {
        self.tx.try_send(input).map_err(|e| match e {
            TrySendError::Full(dropped) => {
                warn!(zone = %self.zone, player = %dropped.player, "inbox full, dropping input");
                SubmitError::InboxFull { zone: self.zone }
            }
            TrySendError::Disconnected(_) => SubmitError::ShutDown,
        })
    }
}

/// Consumer side, owned by the zone.
#[derive(Debug)]
pub struct Inbox {
    zone: ZoneId,
    rx: Receiver<ZoneInput>,
    tx: Sender<ZoneInput>,
    capacity: usize,
}

impl Inbox {
    /// Create an inbox holding at most `capacity` inputs.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`ServerConfig::validate`]
    /// rejects that before any zone is built.
    ///
    /// [`ServerConfig::validate`]: crate::config::ServerConfig::validate
    pub fn new(zone: ZoneId, capacity: usize) -> Self {
        assert!(capacity > 0, "Inbox capacity must be at least 1");
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            zone,
            rx,
            tx,
            capacity,
        }
    }

    /// A new producer handle.
    pub fn sender(&self) -> InboxSender {
        InboxSender {
            zone: self.zone,
            tx: self.tx.clone(),
        }
    }

    /// Take every queued input, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = ZoneInput> + '_ {
        self.rx.try_iter()
    }

    /// Inputs currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Maximum queued inputs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
