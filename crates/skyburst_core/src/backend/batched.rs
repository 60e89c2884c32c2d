//! # Batched Backend
//!
//! Plays the compiled-numeric-module role: entity state lives in dense
//! preallocated pools and one fused kernel per entity kind performs
//! gravity, translation and snapping in a single pass over flat `f32`
//! buffers. The pools are sized once at construction, so the per-frame
//! path allocates nothing.

use skyburst_shared::{grid, BackendKind, SimConfig};

use super::pool::GenerationalPool;
use super::{BackendError, BackendId, NumericBackend, MAX_BATCH_SLOTS, MAX_ROCKET_SLOTS};

/// Upper bound on the batch pool, in `f32` elements.
///
/// 16M floats is 64 MiB per pool array; a configuration that needs more
/// than that is refused at construction, not clamped.
const MAX_POOL_FLOATS: usize = 16 * 1024 * 1024;

/// Fused kernels over dense flat buffers.
pub struct BatchedBackend {
    grid_size: f32,
    gravity: f32,
    up_index: usize,
    /// Particles one batch slot holds; fixes the pool stride.
    particle_stride: usize,
    rocket_slots: GenerationalPool<()>,
    rocket_positions: Box<[f32]>,
    rocket_velocities: Box<[f32]>,
    batch_slots: GenerationalPool<usize>,
    batch_positions: Box<[f32]>,
    batch_velocities: Box<[f32]>,
}

impl BatchedBackend {
    /// Creates the engine, preallocating its dense pools.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] when the configured particle
    /// count would blow the pool budget. The error is surfaced before any
    /// entity exists; falling back to the scalar engine is the caller's
    /// explicit decision.
    pub fn new(config: &SimConfig) -> Result<Self, BackendError> {
        let pool_floats = config
            .particle_count
            .checked_mul(MAX_BATCH_SLOTS)
            .and_then(|n| n.checked_mul(3))
            .filter(|&n| n <= MAX_POOL_FLOATS)
            .ok_or_else(|| BackendError::Unavailable {
                reason: format!(
                    "batch pool for {} particles x {} slots exceeds the {} float budget",
                    config.particle_count, MAX_BATCH_SLOTS, MAX_POOL_FLOATS
                ),
            })?;

        Ok(Self {
            grid_size: config.grid_size,
            gravity: config.gravity,
            up_index: config.up_axis().index(),
            particle_stride: config.particle_count,
            rocket_slots: GenerationalPool::new(MAX_ROCKET_SLOTS),
            rocket_positions: vec![0.0; MAX_ROCKET_SLOTS * 3].into_boxed_slice(),
            rocket_velocities: vec![0.0; MAX_ROCKET_SLOTS * 3].into_boxed_slice(),
            batch_slots: GenerationalPool::new(MAX_BATCH_SLOTS),
            batch_positions: vec![0.0; pool_floats].into_boxed_slice(),
            batch_velocities: vec![0.0; pool_floats].into_boxed_slice(),
        })
    }

    /// Pool range for batch slot `index`.
    fn batch_range(&self, index: usize) -> std::ops::Range<usize> {
        let stride = self.particle_stride * 3;
        index * stride..(index + 1) * stride
    }
}

/// Fused integration kernel over one batch's flat buffers.
///
/// Arithmetic and operation order match the scalar engine exactly, so the
/// two backends agree to float precision on the same inputs.
fn integrate_particles(
    positions: &mut [f32],
    velocities: &mut [f32],
    render_out: &mut [f32],
    dt: f32,
    gravity: f32,
    up_index: usize,
    grid_size: f32,
) {
    let particles = positions
        .chunks_exact_mut(3)
        .zip(velocities.chunks_exact_mut(3))
        .zip(render_out.chunks_exact_mut(3));
    for ((pos, vel), out) in particles {
        vel[up_index] -= gravity * dt;
        for axis in 0..3 {
            pos[axis] += vel[axis] * dt;
            out[axis] = grid::snap(pos[axis], grid_size);
        }
    }
}

impl NumericBackend for BatchedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Batched
    }

    fn create_rocket(
        &mut self,
        true_position: [f32; 3],
        velocity: [f32; 3],
    ) -> Result<BackendId, BackendError> {
        let id = self
            .rocket_slots
            .insert(())
            .ok_or(BackendError::PoolExhausted {
                kind: "rocket",
                capacity: MAX_ROCKET_SLOTS,
            })?;
        let base = id.index() as usize * 3;
        self.rocket_positions[base..base + 3].copy_from_slice(&true_position);
        self.rocket_velocities[base..base + 3].copy_from_slice(&velocity);
        Ok(id)
    }

    fn step_rocket(
        &mut self,
        id: BackendId,
        dt: f32,
        true_position: &mut [f32; 3],
        render_position: &mut [f32; 3],
    ) -> bool {
        if !self.rocket_slots.contains(id) {
            return false;
        }
        let base = id.index() as usize * 3;
        for axis in 0..3 {
            self.rocket_positions[base + axis] += self.rocket_velocities[base + axis] * dt;
            true_position[axis] = self.rocket_positions[base + axis];
            render_position[axis] = grid::snap(self.rocket_positions[base + axis], self.grid_size);
        }
        true
    }

    fn destroy_rocket(&mut self, id: BackendId) {
        let _ = self.rocket_slots.remove(id);
    }

    fn clear_rockets(&mut self) {
        self.rocket_slots.clear();
    }

    fn rocket_count(&self) -> usize {
        self.rocket_slots.len()
    }

    fn create_batch(
        &mut self,
        true_positions: &[f32],
        velocities: &[f32],
    ) -> Result<BackendId, BackendError> {
        let particle_count = true_positions.len() / 3;
        if particle_count > self.particle_stride {
            return Err(BackendError::BatchTooLarge {
                count: particle_count,
                capacity: self.particle_stride,
            });
        }
        let id = self
            .batch_slots
            .insert(particle_count)
            .ok_or(BackendError::PoolExhausted {
                kind: "batch",
                capacity: MAX_BATCH_SLOTS,
            })?;
        let base = self.batch_range(id.index() as usize).start;
        self.batch_positions[base..base + particle_count * 3].copy_from_slice(true_positions);
        self.batch_velocities[base..base + particle_count * 3].copy_from_slice(velocities);
        Ok(id)
    }

    fn step_batch(
        &mut self,
        id: BackendId,
        dt: f32,
        true_positions: &mut [f32],
        velocities: &mut [f32],
        render_positions: &mut [f32],
    ) -> bool {
        let Some(&particle_count) = self.batch_slots.get(id) else {
            return false;
        };
        let base = self.batch_range(id.index() as usize).start;
        let floats = particle_count * 3;
        debug_assert_eq!(true_positions.len(), floats);
        debug_assert_eq!(velocities.len(), floats);
        debug_assert_eq!(render_positions.len(), floats);

        let positions = &mut self.batch_positions[base..base + floats];
        let pooled_velocities = &mut self.batch_velocities[base..base + floats];
        integrate_particles(
            positions,
            pooled_velocities,
            render_positions,
            dt,
            self.gravity,
            self.up_index,
            self.grid_size,
        );

        // Write the authoritative pooled state back into the caller's
        // buffers, fused-variant style.
        true_positions.copy_from_slice(positions);
        velocities.copy_from_slice(pooled_velocities);
        true
    }

    fn destroy_batch(&mut self, id: BackendId) {
        let _ = self.batch_slots.remove(id);
    }

    fn clear_batches(&mut self) {
        self.batch_slots.clear();
    }

    fn batch_count(&self) -> usize {
        self.batch_slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> BatchedBackend {
        BatchedBackend::new(&SimConfig::default()).unwrap()
    }

    #[test]
    fn test_construction_refuses_oversized_pool() {
        let config = SimConfig {
            particle_count: MAX_POOL_FLOATS,
            ..SimConfig::default()
        };
        assert!(matches!(
            BatchedBackend::new(&config),
            Err(BackendError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_rocket_state_lives_in_the_pool() {
        let mut backend = backend();
        let id = backend.create_rocket([1.0, 2.0, 0.0], [0.0, 0.5, 0.0]).unwrap();

        let mut true_pos = [0.0; 3];
        let mut render_pos = [0.0; 3];
        assert!(backend.step_rocket(id, 1.0, &mut true_pos, &mut render_pos));

        // Output comes from the pooled state, not the zeroed input buffer.
        assert!((true_pos[0] - 1.0).abs() < 1e-6);
        assert!((true_pos[1] - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_batch_step_writes_back_velocities() {
        let mut backend = backend();
        let count = 4;
        let mut true_positions = vec![0.0; count * 3];
        let mut velocities = vec![0.1; count * 3];
        let mut render_positions = vec![0.0; count * 3];

        let id = backend.create_batch(&true_positions, &velocities).unwrap();
        assert!(backend.step_batch(
            id,
            1.0,
            &mut true_positions,
            &mut velocities,
            &mut render_positions,
        ));

        for i in 0..count {
            // Planar default pulls Y down by GRAVITY.
            assert!((velocities[i * 3 + 1] - 0.05).abs() < 1e-6);
            assert!((velocities[i * 3] - 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_oversized_batch_is_rejected() {
        let config = SimConfig {
            particle_count: 8,
            ..SimConfig::default()
        };
        let mut backend = BatchedBackend::new(&config).unwrap();
        let buffer = vec![0.0; 9 * 3];
        assert!(matches!(
            backend.create_batch(&buffer, &buffer),
            Err(BackendError::BatchTooLarge { count: 9, capacity: 8 })
        ));
    }

    #[test]
    fn test_clear_invalidates_outstanding_ids() {
        let mut backend = backend();
        let id = backend.create_rocket([0.0; 3], [0.0; 3]).unwrap();
        backend.clear_rockets();

        let mut true_pos = [0.0; 3];
        let mut render_pos = [0.0; 3];
        assert!(!backend.step_rocket(id, 1.0, &mut true_pos, &mut render_pos));
        assert_eq!(backend.rocket_count(), 0);
    }
}
