//! # Numeric Backend Abstraction
//!
//! The same physics contract implemented twice:
//!
//! ```text
//! ┌─────────────┐     step_rocket / step_batch      ┌──────────────────┐
//! │   World     │──────────────────────────────────>│  ScalarBackend   │
//! │ (entity     │          (one trait,              ├──────────────────┤
//! │  lists)     │──────────────────────────────────>│  BatchedBackend  │
//! └─────────────┘      selected once per session)   └──────────────────┘
//! ```
//!
//! A step consumes the entity's current state, advances it by `dt` and
//! writes the updated continuous and snapped positions back into the flat
//! buffers the caller already owns. Between `create_*` and `destroy_*` the
//! caller must not mutate those buffers outside of steps; the batched
//! engine keeps its own dense mirror and writes it back on every call.
//!
//! Selection happens exactly once, before the frame driver starts. The
//! update logic never branches on the backend kind.

pub mod batched;
pub mod pool;
pub mod scalar;

pub use batched::BatchedBackend;
pub use pool::GenerationalPool;
pub use scalar::ScalarBackend;

use thiserror::Error;

use skyburst_shared::{BackendKind, SimConfig};

/// Rocket slots a backend preallocates.
pub const MAX_ROCKET_SLOTS: usize = 256;

/// Batch slots a backend preallocates.
pub const MAX_BATCH_SLOTS: usize = 64;

/// Errors surfaced by backend construction and slot allocation.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be brought up. Surfaced before any entity
    /// exists; falling back to another backend is the caller's explicit
    /// choice, never implicit.
    #[error("numeric backend unavailable: {reason}")]
    Unavailable {
        /// Why construction failed.
        reason: String,
    },

    /// No free slot for this entity kind.
    #[error("backend pool exhausted: no free {kind} slot (capacity {capacity})")]
    PoolExhausted {
        /// Entity kind that ran out of slots.
        kind: &'static str,
        /// Total slots of that kind.
        capacity: usize,
    },

    /// A batch was registered with more particles than the backend's
    /// per-slot stride can hold.
    #[error("batch of {count} particles exceeds the backend stride of {capacity}")]
    BatchTooLarge {
        /// Particles in the rejected batch.
        count: usize,
        /// Particles one slot can hold.
        capacity: usize,
    },
}

/// Slot identity in a numeric backend.
///
/// Index and generation packed into 64 bits, in the same shape the entity
/// ids use elsewhere. A stale id (the slot was freed, reused or
/// bulk-cleared since) fails the generation check and every call treats it
/// as a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct BackendId(u64);

impl BackendId {
    /// Creates an id from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// The slot index portion.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

/// One per-frame integration engine.
///
/// Contract shared by both implementations:
/// - `create_*` registers an entity and returns its slot id; the world
///   materializes ids lazily, on an entity's first step.
/// - `step_*` performs one integration step. A stale id returns `false`
///   and touches nothing.
/// - `destroy_*` on a stale or already-freed id is a no-op.
/// - `clear_*` is the explicit bulk reset the world issues when the last
///   tracked entity of that kind is removed; it invalidates every
///   outstanding id at once.
/// - Zero live entities is a valid state, never an error.
pub trait NumericBackend {
    /// Which engine this is.
    fn kind(&self) -> BackendKind;

    /// Registers a rocket with its launch state.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::PoolExhausted`] when every rocket slot is
    /// taken.
    fn create_rocket(
        &mut self,
        true_position: [f32; 3],
        velocity: [f32; 3],
    ) -> Result<BackendId, BackendError>;

    /// Advances one rocket by `dt`, writing the updated continuous
    /// position and its snapped projection into the caller's buffers.
    ///
    /// Returns `false` (and writes nothing) for a stale id.
    fn step_rocket(
        &mut self,
        id: BackendId,
        dt: f32,
        true_position: &mut [f32; 3],
        render_position: &mut [f32; 3],
    ) -> bool;

    /// Releases a rocket slot. Stale ids are a no-op.
    fn destroy_rocket(&mut self, id: BackendId);

    /// Invalidates every rocket slot at once.
    fn clear_rockets(&mut self);

    /// Live rocket slots.
    fn rocket_count(&self) -> usize;

    /// Registers a batch with its spawn-time state. Buffers are
    /// `count * 3` floats, xyz interleaved.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::PoolExhausted`] when every batch slot is
    /// taken, or [`BackendError::BatchTooLarge`] when the batch does not
    /// fit one slot.
    fn create_batch(
        &mut self,
        true_positions: &[f32],
        velocities: &[f32],
    ) -> Result<BackendId, BackendError>;

    /// Advances every particle in a batch by `dt`: gravity on the up
    /// axis, translation, then snapping. Updated velocities, continuous
    /// positions and snapped positions are written into the caller's
    /// buffers.
    ///
    /// Returns `false` (and writes nothing) for a stale id.
    fn step_batch(
        &mut self,
        id: BackendId,
        dt: f32,
        true_positions: &mut [f32],
        velocities: &mut [f32],
        render_positions: &mut [f32],
    ) -> bool;

    /// Releases a batch slot. Stale ids are a no-op.
    fn destroy_batch(&mut self, id: BackendId);

    /// Invalidates every batch slot at once.
    fn clear_batches(&mut self);

    /// Live batch slots.
    fn batch_count(&self) -> usize;
}

/// Constructs the backend selected in the config.
///
/// This is the session's single selection point; call sites hold a
/// `Box<dyn NumericBackend>` and never check the kind again.
///
/// # Errors
///
/// Returns [`BackendError::Unavailable`] when the selected backend cannot
/// be constructed. The caller decides whether to fall back.
pub fn create_backend(config: &SimConfig) -> Result<Box<dyn NumericBackend>, BackendError> {
    match config.backend {
        BackendKind::Scalar => Ok(Box::new(ScalarBackend::new(config))),
        BackendKind::Batched => Ok(Box::new(BatchedBackend::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_id_roundtrip() {
        let id = BackendId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
    }

    #[test]
    fn test_create_backend_honors_selection() {
        let mut config = SimConfig::default();
        config.backend = BackendKind::Scalar;
        assert_eq!(create_backend(&config).unwrap().kind(), BackendKind::Scalar);

        config.backend = BackendKind::Batched;
        assert_eq!(
            create_backend(&config).unwrap().kind(),
            BackendKind::Batched
        );
    }
}
