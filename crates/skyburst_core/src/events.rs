//! # Scene Event Stream
//!
//! Lifecycle notifications flowing from the simulation core to whatever
//! consumes it for drawing:
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │    World    │─────>│    Scene    │─────>│  Renderer   │
//! │  (physics)  │      │   Channel   │      │  (bridge)   │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Bounded crossbeam channel, non-blocking sends. When the consumer falls
//! behind, events are dropped rather than stalling the frame.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use skyburst_shared::Vec3;

use crate::profile::FireworkKind;

/// Events the core emits as entities enter and leave the scene.
///
/// These are the renderer's cue to create or dispose drawable resources;
/// positions and opacities travel separately through the frame views.
#[derive(Clone, Debug)]
pub enum SceneEvent {
    /// A rocket entered the scene.
    RocketLaunched {
        /// Host-side rocket identity.
        rocket_id: u64,
        /// The kind it will burst into.
        kind: FireworkKind,
        /// Launch position (continuous).
        position: Vec3,
    },

    /// A rocket crossed its trigger height and left the scene.
    RocketExploded {
        /// Host-side rocket identity.
        rocket_id: u64,
        /// Snapped position at the moment of detonation.
        position: Vec3,
    },

    /// A detonation produced a new particle batch.
    BatchSpawned {
        /// Host-side batch identity.
        batch_id: u64,
        /// The kind that burst.
        kind: FireworkKind,
        /// Snapped detonation point.
        origin: Vec3,
        /// Particles in the batch, fixed for its life.
        particle_count: usize,
    },

    /// A batch faded below the opacity threshold and left the scene.
    BatchRetired {
        /// Host-side batch identity.
        batch_id: u64,
    },

    /// The simulation was stopped and every live entity released.
    Cleared,
}

/// Channel pair carrying [`SceneEvent`]s.
pub struct SceneEventBus {
    sender: Sender<SceneEvent>,
    receiver: Receiver<SceneEvent>,
}

impl SceneEventBus {
    /// Creates a bus holding at most `capacity` in-flight events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// A sender handle; clone for multiple producers.
    #[must_use]
    pub fn sender(&self) -> SceneEventSender {
        SceneEventSender {
            sender: self.sender.clone(),
        }
    }

    /// A receiver handle; clone for multiple consumers.
    #[must_use]
    pub fn receiver(&self) -> SceneEventReceiver {
        SceneEventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Producer half of the scene channel.
#[derive(Clone)]
pub struct SceneEventSender {
    sender: Sender<SceneEvent>,
}

impl SceneEventSender {
    /// Sends without blocking. Returns `false` when the event was dropped
    /// (full channel or no consumer left).
    #[inline]
    pub fn send(&self, event: SceneEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half of the scene channel.
#[derive(Clone)]
pub struct SceneEventReceiver {
    receiver: Receiver<SceneEvent>,
}

impl SceneEventReceiver {
    /// Drains all pending events without blocking.
    #[inline]
    #[must_use]
    pub fn drain(&self) -> Vec<SceneEvent> {
        let mut events = Vec::with_capacity(self.receiver.len());
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Receives one event without blocking.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<SceneEvent> {
        self.receiver.try_recv().ok()
    }

    /// Pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_drain() {
        let bus = SceneEventBus::new(16);
        let sender = bus.sender();
        let receiver = bus.receiver();

        assert!(sender.send(SceneEvent::BatchRetired { batch_id: 9 }));
        assert!(sender.send(SceneEvent::Cleared));

        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SceneEvent::BatchRetired { batch_id: 9 }));
        assert_eq!(receiver.pending_count(), 0);
    }

    #[test]
    fn test_full_channel_drops_instead_of_blocking() {
        let bus = SceneEventBus::new(1);
        let sender = bus.sender();
        let _receiver = bus.receiver();

        assert!(sender.send(SceneEvent::Cleared));
        assert!(!sender.send(SceneEvent::Cleared));
    }
}
