//! # Simulation Tuning Constants
//!
//! Default values for the per-frame physics. Every one of these can be
//! overridden through [`crate::config::SimConfig`]; the constants exist so
//! tests and integrations agree on the stock behavior.
//!
//! All rates are expressed per unit frame (one frame at the reference
//! 60 Hz refresh). Variable-timestep callers scale them by delta time.

/// Lattice spacing for the pixel-art render positions (world units).
pub const GRID_SIZE: f32 = 0.2;

/// Downward acceleration applied to burst particles (units per frame²).
pub const GRAVITY: f32 = 0.05;

/// Multiplicative opacity decay applied to a batch each unit frame.
pub const ALPHA_DECAY: f32 = 0.96;

/// Opacity below which a whole batch is retired.
pub const ALPHA_THRESHOLD: f32 = 0.05;

/// Particles in one detonation. Fixed for the life of a batch.
pub const PARTICLE_COUNT: usize = 500;

/// How far above its launch point a rocket climbs before detonating.
pub const EXPLOSION_HEIGHT: f32 = 15.0;

/// Half-width of the per-axis lateral jitter applied at launch.
pub const LAUNCH_JITTER: f32 = 0.1;

/// Minimum ascent speed on the up axis (units per frame).
pub const ASCENT_SPEED_BASE: f32 = 0.5;

/// Random spread added on top of [`ASCENT_SPEED_BASE`].
pub const ASCENT_SPEED_SPREAD: f32 = 0.2;

/// Maximum saved launch placements the store accepts.
pub const MAX_PLACEMENTS: usize = 100;

/// Default seed for the simulation's random stream.
///
/// Fixed so that two runs of the same show are identical; integrations
/// that want variety supply their own seed in the config.
pub const RNG_SEED: u64 = 0x534B_5942;
