//! # Renderer Bridge
//!
//! Headless stand-in for the real renderer. It consumes the scene event
//! stream and keeps one drawable record per live rocket and batch,
//! creating on spawn events and disposing on retire events. Disposal is
//! idempotent: shutdown paths can race last-frame removals, and a double
//! release must be a no-op, never a crash.
//!
//! A real integration would replace the records with GPU-side resources;
//! the lifecycle contract it must follow is exactly the one proven here.

use std::collections::HashMap;

use skyburst_core::{FireworkKind, SceneEvent, SceneEventReceiver};

/// What a drawable record stands in for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawableKind {
    /// A rocket sprite.
    Rocket,
    /// A batch's instanced particle mesh.
    Batch,
}

/// One renderer-side resource record.
#[derive(Debug)]
pub struct Drawable {
    kind: DrawableKind,
    firework: FireworkKind,
    disposed: bool,
}

impl Drawable {
    fn new(kind: DrawableKind, firework: FireworkKind) -> Self {
        Self {
            kind,
            firework,
            disposed: false,
        }
    }

    /// Releases the record's resources. Safe to call repeatedly; only
    /// the first call does anything.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        true
    }

    /// True once released.
    #[inline]
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// What this record stands in for.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> DrawableKind {
        self.kind
    }

    /// The firework kind it draws.
    #[inline]
    #[must_use]
    pub const fn firework(&self) -> FireworkKind {
        self.firework
    }
}

/// Event-driven drawable registry.
pub struct RendererBridge {
    events: SceneEventReceiver,
    rockets: HashMap<u64, Drawable>,
    batches: HashMap<u64, Drawable>,
    created: u64,
    disposed: u64,
}

impl RendererBridge {
    /// Creates a bridge consuming the given event stream.
    #[must_use]
    pub fn new(events: SceneEventReceiver) -> Self {
        Self {
            events,
            rockets: HashMap::new(),
            batches: HashMap::new(),
            created: 0,
            disposed: 0,
        }
    }

    /// Drains pending scene events, applying each to the registry.
    /// Returns how many events were processed.
    pub fn process_events(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.events.try_recv() {
            self.apply(&event);
            processed += 1;
        }
        processed
    }

    fn apply(&mut self, event: &SceneEvent) {
        match *event {
            SceneEvent::RocketLaunched { rocket_id, kind, .. } => {
                self.created += 1;
                self.rockets
                    .insert(rocket_id, Drawable::new(DrawableKind::Rocket, kind));
            }
            SceneEvent::RocketExploded { rocket_id, .. } => {
                self.dispose_from(DrawableKind::Rocket, rocket_id);
            }
            SceneEvent::BatchSpawned { batch_id, kind, .. } => {
                self.created += 1;
                self.batches
                    .insert(batch_id, Drawable::new(DrawableKind::Batch, kind));
            }
            SceneEvent::BatchRetired { batch_id } => {
                self.dispose_from(DrawableKind::Batch, batch_id);
            }
            SceneEvent::Cleared => {
                let ids: Vec<u64> = self.rockets.keys().copied().collect();
                for id in ids {
                    self.dispose_from(DrawableKind::Rocket, id);
                }
                let ids: Vec<u64> = self.batches.keys().copied().collect();
                for id in ids {
                    self.dispose_from(DrawableKind::Batch, id);
                }
            }
        }
    }

    /// Disposes and drops one record. Unknown ids are a no-op.
    fn dispose_from(&mut self, kind: DrawableKind, id: u64) {
        let map = match kind {
            DrawableKind::Rocket => &mut self.rockets,
            DrawableKind::Batch => &mut self.batches,
        };
        if let Some(mut drawable) = map.remove(&id) {
            if drawable.dispose() {
                self.disposed += 1;
            }
        }
    }

    /// Live rocket drawables.
    #[must_use]
    pub fn live_rockets(&self) -> usize {
        self.rockets.len()
    }

    /// Live batch drawables.
    #[must_use]
    pub fn live_batches(&self) -> usize {
        self.batches.len()
    }

    /// Drawables created over the bridge's life.
    #[inline]
    #[must_use]
    pub const fn created_count(&self) -> u64 {
        self.created
    }

    /// Drawables disposed over the bridge's life.
    #[inline]
    #[must_use]
    pub const fn disposed_count(&self) -> u64 {
        self.disposed
    }
}
