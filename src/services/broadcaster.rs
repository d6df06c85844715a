//! Fan-out of "state changed" pulses to every connected live viewer.
//!
//! Each viewer owns a small bounded queue. A broadcast walks the registry
//! once with `try_send`, so a slow or dead viewer never blocks the write that
//! triggered it:
//! - queue full: the viewer already has a pulse pending, nothing to add
//! - queue closed: the viewer went away and is dropped from the registry
//!
//! Registration, removal and the broadcast walk all go through the same
//! `DashMap`, so a concurrent connect or disconnect cannot observe a
//! half-removed viewer.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::debug;
use uuid::Uuid;

/// Text frame sent to viewers. Carries no diff; viewers re-fetch.
pub const PULSE_TEXT: &str = "update";

const VIEWER_QUEUE_DEPTH: usize = 4;

/// Opaque invalidation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse;

pub type ViewerId = Uuid;

#[derive(Clone, Default)]
pub struct Broadcaster {
    viewers: Arc<DashMap<ViewerId, Sender<Pulse>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a viewer and hand back the queue its connection should drain.
    pub fn register(&self) -> (ViewerId, Receiver<Pulse>) {
        let (tx, rx) = mpsc::channel(VIEWER_QUEUE_DEPTH);
        let id = Uuid::new_v4();
        self.viewers.insert(id, tx);
        debug!(viewer_id = %id, viewers = self.viewers.len(), "viewer connected");
        (id, rx)
    }

    /// Returns false if the viewer was already gone.
    pub fn unregister(&self, id: ViewerId) -> bool {
        let removed = self.viewers.remove(&id).is_some();
        if removed {
            debug!(viewer_id = %id, viewers = self.viewers.len(), "viewer disconnected");
        }
        removed
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Signal every registered viewer. Returns how many viewers were reached.
    pub fn broadcast(&self) -> usize {
        let mut reached = 0;
        self.viewers.retain(|id, tx| match tx.try_send(Pulse) {
            Ok(()) => {
                reached += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(viewer_id = %id, "viewer already has a pending pulse");
                reached += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(viewer_id = %id, "dropping closed viewer");
                false
            }
        });
        reached
    }
}
