// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message hub.
//!
//! Transport-facing object registry: external workers address progress
//! messages to a task identity; the hub enqueues them for the scheduler
//! thread, so all proxy mutation happens in tick context. Messages whose
//! target is not registered go to the dead-letter log.
//!
//! The manager registers each proxy on creation and deregisters it
//! atomically with retirement (the hub is its [`ProxyDirectory`]).

use parking_lot::Mutex;
use rota_core::{Priority, TaskId};
use rota_engine::ProxyDirectory;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One inbound progress message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: TaskId,
    pub priority: Priority,
    pub message: String,
}

/// Registry of live task identities plus the inbound message queue.
pub struct MessageHub {
    registry: Arc<Mutex<HashSet<TaskId>>>,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl MessageHub {
    /// Create the hub and the receiver the event pump drains.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                registry: Arc::new(Mutex::new(HashSet::new())),
                tx,
            }),
            rx,
        )
    }

    /// A cloneable sender handle for transport listeners.
    pub fn client(&self) -> HubClient {
        HubClient {
            registry: Arc::clone(&self.registry),
            tx: self.tx.clone(),
        }
    }

    pub fn is_registered(&self, id: &TaskId) -> bool {
        self.registry.lock().contains(id)
    }
}

impl ProxyDirectory for MessageHub {
    fn register(&self, id: &TaskId) {
        self.registry.lock().insert(id.clone());
    }

    fn deregister(&self, id: &TaskId) {
        self.registry.lock().remove(id);
    }
}

/// Sender handle used by whatever delivers remote messages.
#[derive(Clone)]
pub struct HubClient {
    registry: Arc<Mutex<HashSet<TaskId>>>,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl HubClient {
    /// Enqueue a progress message for the addressed task. Returns false
    /// (and dead-letters the message) when the target no longer exists.
    pub fn incoming(&self, id: &TaskId, priority: Priority, message: &str) -> bool {
        if !self.registry.lock().contains(id) {
            tracing::warn!("DEAD LETTER: [{}] {}", id, message);
            return false;
        }
        let envelope = Envelope {
            id: id.clone(),
            priority,
            message: message.to_string(),
        };
        if self.tx.send(envelope).is_err() {
            tracing::warn!("DEAD LETTER (pump gone): [{}] {}", id, message);
            return false;
        }
        true
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
