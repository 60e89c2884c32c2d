//! # Scalar Backend
//!
//! The per-entity reading of the physics contract: one pass over each
//! entity's caller-owned buffers, written the plain way. This is the
//! reference the batched engine is measured against.

use skyburst_shared::{grid, BackendKind, SimConfig};

use super::pool::GenerationalPool;
use super::{BackendError, BackendId, NumericBackend, MAX_BATCH_SLOTS, MAX_ROCKET_SLOTS};

/// Per-rocket state the scalar engine keeps.
struct RocketSlot {
    /// Constant ascent velocity, fixed at registration.
    velocity: [f32; 3],
}

/// Per-batch state the scalar engine keeps.
struct BatchSlot {
    /// Particles in the batch; fixes the expected buffer lengths.
    particle_count: usize,
}

/// Host-language loop over slot structs.
pub struct ScalarBackend {
    grid_size: f32,
    gravity: f32,
    up_index: usize,
    rockets: GenerationalPool<RocketSlot>,
    batches: GenerationalPool<BatchSlot>,
}

impl ScalarBackend {
    /// Creates the engine with the session's tuning values.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            gravity: config.gravity,
            up_index: config.up_axis().index(),
            rockets: GenerationalPool::new(MAX_ROCKET_SLOTS),
            batches: GenerationalPool::new(MAX_BATCH_SLOTS),
        }
    }
}

impl NumericBackend for ScalarBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Scalar
    }

    fn create_rocket(
        &mut self,
        _true_position: [f32; 3],
        velocity: [f32; 3],
    ) -> Result<BackendId, BackendError> {
        self.rockets
            .insert(RocketSlot { velocity })
            .ok_or(BackendError::PoolExhausted {
                kind: "rocket",
                capacity: MAX_ROCKET_SLOTS,
            })
    }

    fn step_rocket(
        &mut self,
        id: BackendId,
        dt: f32,
        true_position: &mut [f32; 3],
        render_position: &mut [f32; 3],
    ) -> bool {
        let Some(slot) = self.rockets.get(id) else {
            return false;
        };
        for axis in 0..3 {
            true_position[axis] += slot.velocity[axis] * dt;
            render_position[axis] = grid::snap(true_position[axis], self.grid_size);
        }
        true
    }

    fn destroy_rocket(&mut self, id: BackendId) {
        let _ = self.rockets.remove(id);
    }

    fn clear_rockets(&mut self) {
        self.rockets.clear();
    }

    fn rocket_count(&self) -> usize {
        self.rockets.len()
    }

    fn create_batch(
        &mut self,
        true_positions: &[f32],
        _velocities: &[f32],
    ) -> Result<BackendId, BackendError> {
        let particle_count = true_positions.len() / 3;
        self.batches
            .insert(BatchSlot { particle_count })
            .ok_or(BackendError::PoolExhausted {
                kind: "batch",
                capacity: MAX_BATCH_SLOTS,
            })
    }

    fn step_batch(
        &mut self,
        id: BackendId,
        dt: f32,
        true_positions: &mut [f32],
        velocities: &mut [f32],
        render_positions: &mut [f32],
    ) -> bool {
        let Some(slot) = self.batches.get(id) else {
            return false;
        };
        debug_assert_eq!(true_positions.len(), slot.particle_count * 3);
        debug_assert_eq!(velocities.len(), slot.particle_count * 3);
        debug_assert_eq!(render_positions.len(), slot.particle_count * 3);

        for i in 0..slot.particle_count {
            let i3 = i * 3;
            velocities[i3 + self.up_index] -= self.gravity * dt;
            for axis in 0..3 {
                true_positions[i3 + axis] += velocities[i3 + axis] * dt;
                render_positions[i3 + axis] =
                    grid::snap(true_positions[i3 + axis], self.grid_size);
            }
        }
        true
    }

    fn destroy_batch(&mut self, id: BackendId) {
        let _ = self.batches.remove(id);
    }

    fn clear_batches(&mut self) {
        self.batches.clear();
    }

    fn batch_count(&self) -> usize {
        self.batches.len()
    }
}
