//! # World
//!
//! Owns the live entity lists, the selected numeric backend, the profile
//! table and the random stream, and runs the per-frame advance cycle:
//!
//! ```text
//! advance(dt):
//!   1. rockets   - integrate, detect triggers, spawn batches
//!   2. batches   - decay alpha, retire or integrate particles
//! ```
//!
//! Backend slot ids are materialized lazily on an entity's first step and
//! released with the entity; when the last entity of a kind disappears the
//! world issues the backend's explicit bulk clear.
//!
//! All mutation happens on the caller's thread. The world is the single
//! execution context everything shares; nothing here locks.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use skyburst_shared::{BackendKind, ConfigError, SimConfig, Vec3};

use crate::backend::{create_backend, BackendError, NumericBackend};
use crate::batch::ParticleBatch;
use crate::events::{SceneEvent, SceneEventSender};
use crate::profile::FireworkKind;
use crate::rocket::Rocket;

/// Errors raised while bringing a world up.
#[derive(Error, Debug)]
pub enum WorldError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The selected numeric backend could not be constructed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The simulation state for one session.
pub struct World {
    config: SimConfig,
    backend: Box<dyn NumericBackend>,
    rockets: Vec<Rocket>,
    batches: Vec<ParticleBatch>,
    rng: ChaCha8Rng,
    events: SceneEventSender,
    next_rocket_id: u64,
    next_batch_id: u64,
    frame: u64,
}

impl World {
    /// Creates a world with the backend named in the config.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Config`] for an invalid configuration and
    /// [`WorldError::Backend`] when the selected backend cannot come up.
    /// Both are surfaced before any entity exists.
    pub fn new(config: SimConfig, events: SceneEventSender) -> Result<Self, WorldError> {
        config.validate()?;
        let backend = create_backend(&config)?;
        Ok(Self::assemble(config, backend, events))
    }

    /// Creates a world around an explicitly chosen backend.
    ///
    /// This is the hook for a caller that decided to fall back after
    /// [`World::new`] reported the preferred backend unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Config`] for an invalid configuration.
    pub fn with_backend(
        config: SimConfig,
        backend: Box<dyn NumericBackend>,
        events: SceneEventSender,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        Ok(Self::assemble(config, backend, events))
    }

    fn assemble(
        config: SimConfig,
        backend: Box<dyn NumericBackend>,
        events: SceneEventSender,
    ) -> Self {
        Self {
            backend,
            rockets: Vec::new(),
            batches: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            events,
            next_rocket_id: 0,
            next_batch_id: 0,
            frame: 0,
            config,
        }
    }

    /// Launches one rocket, returning its id.
    pub fn launch(&mut self, kind: FireworkKind, position: Vec3) -> u64 {
        let id = self.next_rocket_id;
        self.next_rocket_id += 1;

        let rocket = Rocket::launch(id, kind, position, &self.config, &mut self.rng);
        self.events.send(SceneEvent::RocketLaunched {
            rocket_id: id,
            kind,
            position,
        });
        tracing::debug!(rocket_id = id, kind = ?kind, "rocket launched");
        self.rockets.push(rocket);
        id
    }

    /// Detonates a burst directly at `position`, skipping the ascent.
    ///
    /// This is the same path an exploding rocket takes.
    pub fn detonate(&mut self, kind: FireworkKind, position: Vec3) -> u64 {
        self.spawn_batch(kind, position)
    }

    /// Runs one frame of simulation.
    ///
    /// `dt` is measured in unit frames (1.0 at the reference 60 Hz
    /// refresh); translation scales linearly and opacity decay
    /// exponentially, so variable refresh rates stay consistent.
    pub fn advance(&mut self, dt: f32) {
        self.frame += 1;
        self.advance_rockets(dt);
        self.advance_batches(dt);
    }

    /// Fixed-step convenience: `advance(1.0)`.
    pub fn advance_frame(&mut self) {
        self.advance(1.0);
    }

    fn advance_rockets(&mut self, dt: f32) {
        if self.rockets.is_empty() {
            return;
        }

        let mut i = self.rockets.len();
        while i > 0 {
            i -= 1;
            if !self.step_rocket_at(i, dt) {
                continue;
            }

            if self.rockets[i].should_explode(&self.config) {
                let rocket = self.rockets.remove(i);
                if let Some(backend_id) = rocket.backend_id {
                    self.backend.destroy_rocket(backend_id);
                }
                self.events.send(SceneEvent::RocketExploded {
                    rocket_id: rocket.id,
                    position: rocket.render_position,
                });
                tracing::info!(
                    rocket_id = rocket.id,
                    kind = ?rocket.kind,
                    height = rocket.true_position.component(self.config.up_axis()),
                    "rocket detonated"
                );
                self.spawn_batch(rocket.kind, rocket.render_position);
            }
        }

        if self.rockets.is_empty() {
            self.backend.clear_rockets();
            tracing::debug!("last rocket gone, backend rocket pool cleared");
        }
    }

    /// Steps the rocket at `index`, materializing its backend slot first
    /// if needed. Returns `false` when no step happened this frame.
    fn step_rocket_at(&mut self, index: usize, dt: f32) -> bool {
        let rocket = &mut self.rockets[index];
        let backend_id = match rocket.backend_id {
            Some(backend_id) => backend_id,
            None => match self
                .backend
                .create_rocket(rocket.true_position.to_array(), rocket.velocity.to_array())
            {
                Ok(backend_id) => {
                    rocket.backend_id = Some(backend_id);
                    backend_id
                }
                Err(err) => {
                    // Leave the rocket parked; a slot may free up next frame.
                    tracing::warn!(rocket_id = rocket.id, %err, "no backend slot for rocket");
                    return false;
                }
            },
        };

        let mut true_position = rocket.true_position.to_array();
        let mut render_position = rocket.render_position.to_array();
        if !self
            .backend
            .step_rocket(backend_id, dt, &mut true_position, &mut render_position)
        {
            return false;
        }
        rocket.true_position = Vec3::from_array(true_position);
        rocket.render_position = Vec3::from_array(render_position);
        true
    }

    fn advance_batches(&mut self, dt: f32) {
        if self.batches.is_empty() {
            return;
        }

        let mut i = self.batches.len();
        while i > 0 {
            i -= 1;
            self.batches[i].decay_alpha(self.config.alpha_decay, dt);

            if self.batches[i].is_expired(self.config.alpha_threshold) {
                // Whole-batch retirement: backend slot and render resources
                // go in the same step, no particle update this frame.
                let batch = self.batches.remove(i);
                if let Some(backend_id) = batch.backend_id {
                    self.backend.destroy_batch(backend_id);
                }
                self.events.send(SceneEvent::BatchRetired { batch_id: batch.id });
                tracing::debug!(batch_id = batch.id, "batch retired");
                continue;
            }

            self.step_batch_at(i, dt);
        }

        if self.batches.is_empty() {
            self.backend.clear_batches();
            tracing::debug!("last batch gone, backend batch pool cleared");
        }
    }

    /// Steps the batch at `index`, materializing its backend slot first
    /// if needed.
    fn step_batch_at(&mut self, index: usize, dt: f32) {
        let batch = &mut self.batches[index];
        let backend_id = match batch.backend_id {
            Some(backend_id) => backend_id,
            None => match self
                .backend
                .create_batch(&batch.true_positions, &batch.velocities)
            {
                Ok(backend_id) => {
                    batch.backend_id = Some(backend_id);
                    backend_id
                }
                Err(err) => {
                    tracing::warn!(batch_id = batch.id, %err, "no backend slot for batch");
                    return;
                }
            },
        };

        self.backend.step_batch(
            backend_id,
            dt,
            &mut batch.true_positions,
            &mut batch.velocities,
            &mut batch.render_positions,
        );
    }

    fn spawn_batch(&mut self, kind: FireworkKind, position: Vec3) -> u64 {
        let id = self.next_batch_id;
        self.next_batch_id += 1;

        let batch = ParticleBatch::spawn(id, kind, position, &self.config, &mut self.rng);
        self.events.send(SceneEvent::BatchSpawned {
            batch_id: id,
            kind,
            origin: batch.origin,
            particle_count: batch.particle_count(),
        });
        tracing::info!(
            batch_id = id,
            kind = ?kind,
            particles = batch.particle_count(),
            "batch spawned"
        );
        self.batches.push(batch);
        id
    }

    /// Releases every live entity and resets the backend pools.
    ///
    /// Safe to call repeatedly; releasing an already-empty world is a
    /// no-op apart from the bulk clears.
    pub fn clear(&mut self) {
        for rocket in self.rockets.drain(..) {
            if let Some(backend_id) = rocket.backend_id {
                self.backend.destroy_rocket(backend_id);
            }
        }
        for batch in self.batches.drain(..) {
            if let Some(backend_id) = batch.backend_id {
                self.backend.destroy_batch(backend_id);
            }
        }
        self.backend.clear_rockets();
        self.backend.clear_batches();
        self.events.send(SceneEvent::Cleared);
        tracing::info!("world cleared");
    }

    /// The session configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The engine actually integrating this session. May differ from the
    /// configured kind if the caller fell back explicitly.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Frames advanced so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Live rockets, ascent order oldest first.
    #[must_use]
    pub fn rockets(&self) -> &[Rocket] {
        &self.rockets
    }

    /// Live batches, spawn order oldest first.
    #[must_use]
    pub fn batches(&self) -> &[ParticleBatch] {
        &self.batches
    }

    /// Live rocket count.
    #[must_use]
    pub fn rocket_count(&self) -> usize {
        self.rockets.len()
    }

    /// Live batch count.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Total live particles across all batches.
    #[must_use]
    pub fn live_particles(&self) -> usize {
        self.batches.iter().map(ParticleBatch::particle_count).sum()
    }

    /// Rocket slots currently held in the backend.
    #[must_use]
    pub fn backend_rocket_slots(&self) -> usize {
        self.backend.rocket_count()
    }

    /// Batch slots currently held in the backend.
    #[must_use]
    pub fn backend_batch_slots(&self) -> usize {
        self.backend.batch_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SceneEventBus;
    use skyburst_shared::grid;

    fn world() -> (World, crate::events::SceneEventReceiver) {
        let bus = SceneEventBus::new(1024);
        let world = World::new(SimConfig::default(), bus.sender()).unwrap();
        (world, bus.receiver())
    }

    #[test]
    fn test_invalid_config_is_rejected_before_entities() {
        let bus = SceneEventBus::new(16);
        let config = SimConfig {
            alpha_decay: 2.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            World::new(config, bus.sender()),
            Err(WorldError::Config(_))
        ));
    }

    #[test]
    fn test_launch_emits_event_and_tracks_rocket() {
        let (mut world, receiver) = world();
        let id = world.launch(FireworkKind::Peony, Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(world.rocket_count(), 1);
        assert!(matches!(
            receiver.try_recv(),
            Some(SceneEvent::RocketLaunched { rocket_id, .. }) if rocket_id == id
        ));
    }

    #[test]
    fn test_backend_slot_is_lazy() {
        let (mut world, _receiver) = world();
        world.launch(FireworkKind::Ring, Vec3::ZERO);
        assert_eq!(world.backend_rocket_slots(), 0);

        world.advance_frame();
        assert_eq!(world.backend_rocket_slots(), 1);
    }

    #[test]
    fn test_render_position_tracks_snap_of_true_position() {
        let (mut world, _receiver) = world();
        world.launch(FireworkKind::Willow, Vec3::new(0.13, -1.0, 0.0));

        for _ in 0..10 {
            world.advance_frame();
            let rocket = &world.rockets()[0];
            let grid_size = world.config().grid_size;
            assert_eq!(rocket.render_position.x, grid::snap(rocket.true_position.x, grid_size));
            assert_eq!(rocket.render_position.y, grid::snap(rocket.true_position.y, grid_size));
            assert_eq!(rocket.render_position.z, grid::snap(rocket.true_position.z, grid_size));
        }
    }

    #[test]
    fn test_detonate_spawns_full_batch() {
        let (mut world, receiver) = world();
        world.detonate(FireworkKind::Chrysanthemum, Vec3::new(0.0, 5.0, 0.0));

        assert_eq!(world.batch_count(), 1);
        assert_eq!(world.live_particles(), world.config().particle_count);
        let events = receiver.drain();
        assert!(matches!(
            events.as_slice(),
            [SceneEvent::BatchSpawned { particle_count, .. }]
                if *particle_count == world.config().particle_count
        ));
    }

    #[test]
    fn test_clear_releases_everything_and_notifies() {
        let (mut world, receiver) = world();
        world.launch(FireworkKind::Palm, Vec3::ZERO);
        world.detonate(FireworkKind::Palm, Vec3::ZERO);
        world.advance_frame();
        let _ = receiver.drain();

        world.clear();
        assert_eq!(world.rocket_count(), 0);
        assert_eq!(world.batch_count(), 0);
        assert_eq!(world.backend_rocket_slots(), 0);
        assert_eq!(world.backend_batch_slots(), 0);
        assert!(matches!(receiver.try_recv(), Some(SceneEvent::Cleared)));

        // Clearing an already-empty world is harmless.
        world.clear();
    }
}
