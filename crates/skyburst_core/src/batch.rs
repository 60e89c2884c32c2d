//! # Particle Batches
//!
//! One detonation's worth of particles. The batch owns parallel flat
//! buffers (structure-of-arrays) instead of per-particle objects: cache
//! friendly to iterate, and zero-copy to hand to either numeric backend
//! or to a renderer.
//!
//! The whole batch shares a single `alpha`; all particles fade in
//! lockstep and the batch dies as one unit the first frame `alpha` drops
//! below the retirement threshold. There is no partial removal.

use rand::Rng;
use skyburst_shared::{grid, SimConfig, Vec3};

use crate::backend::BackendId;
use crate::profile::{self, FireworkKind, Rgb};

/// A fixed-size burst of particles sharing one detonation event.
#[derive(Clone, Debug)]
pub struct ParticleBatch {
    /// Host-side identity, unique for the session.
    pub id: u64,
    /// The kind that produced this burst.
    pub kind: FireworkKind,
    /// Snapped detonation point every particle starts from.
    pub origin: Vec3,
    /// Continuous positions, `count * 3` floats, xyz interleaved.
    pub true_positions: Vec<f32>,
    /// Velocities, `count * 3` floats, pulled down by gravity each frame.
    pub velocities: Vec<f32>,
    /// Grid-snapped display positions, `count * 3` floats.
    pub render_positions: Vec<f32>,
    /// Per-particle pastel-shifted colors, fixed at creation.
    pub colors: Vec<Rgb>,
    /// Shared opacity. Monotonically non-increasing over the batch's life.
    pub alpha: f32,
    /// Slot in the numeric backend, materialized on the first step.
    pub backend_id: Option<BackendId>,
    /// Particles in the batch. Fixed for life.
    particle_count: usize,
}

impl ParticleBatch {
    /// Spawns a burst centered at `position` (snapped before use).
    ///
    /// Samples a direction and radius per particle, shapes them through
    /// the kind's velocity law, and gives every particle a pastel
    /// variation of the kind's base color.
    pub fn spawn<R: Rng>(
        id: u64,
        kind: FireworkKind,
        position: Vec3,
        config: &SimConfig,
        rng: &mut R,
    ) -> Self {
        let count = config.particle_count;
        let origin = Vec3::new(
            grid::snap(position.x, config.grid_size),
            grid::snap(position.y, config.grid_size),
            grid::snap(position.z, config.grid_size),
        );

        let base_color = kind.base_color();
        let up = config.up_axis();
        let mut velocities = Vec::with_capacity(count * 3);
        let mut colors = Vec::with_capacity(count);
        for index in 0..count {
            let direction = profile::sample_direction(config.mode, index, count, rng);
            let radius = profile::sample_radius(rng);
            let velocity = kind.velocity(direction, radius, up, rng);
            velocities.extend_from_slice(&velocity.to_array());
            colors.push(base_color.scaled(profile::sample_color_variation(rng)));
        }

        let true_positions = origin.to_array().repeat(count);
        let render_positions = true_positions.clone();

        Self {
            id,
            kind,
            origin,
            true_positions,
            velocities,
            render_positions,
            colors,
            alpha: 1.0,
            backend_id: None,
            particle_count: count,
        }
    }

    /// Particles in the batch. Fixed for the batch's entire life.
    #[inline]
    #[must_use]
    pub const fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Applies one frame of opacity decay.
    ///
    /// Exponentiating by `dt` generalizes the fixed-frame multiply to
    /// variable timesteps; at `dt = 1` it reduces to `alpha *= decay`.
    pub fn decay_alpha(&mut self, decay: f32, dt: f32) {
        self.alpha *= decay.powf(dt);
    }

    /// True once the batch has faded below the retirement threshold.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, threshold: f32) -> bool {
        self.alpha < threshold
    }

    /// Snapped positions as raw bytes for a renderer upload.
    #[must_use]
    pub fn render_position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.render_positions)
    }

    /// Particle colors as raw bytes for a renderer upload.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}
