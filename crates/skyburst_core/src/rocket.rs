//! # Rocket Lifecycle
//!
//! A rocket is the ascending stage of a firework. Its state machine has
//! exactly two states, Ascending and Exploding, and the second is
//! terminal: the instant the trigger fires the rocket is replaced by one
//! particle batch and released.
//!
//! The continuous `true_position` is the authoritative physics state;
//! `render_position` is its grid-snapped projection and is display-only.
//! Snapping never feeds back into integration.

use rand::Rng;
use skyburst_shared::{constants, grid, SimConfig, SimMode, Vec3};

use crate::backend::BackendId;
use crate::profile::FireworkKind;

/// One ascending projectile.
#[derive(Clone, Debug)]
pub struct Rocket {
    /// Host-side identity, unique for the session.
    pub id: u64,
    /// The kind it bursts into.
    pub kind: FireworkKind,
    /// Continuous physics position. Never snapped.
    pub true_position: Vec3,
    /// Grid-snapped display position.
    pub render_position: Vec3,
    /// Constant velocity, fixed at launch.
    pub velocity: Vec3,
    /// Up-axis coordinate of the launch point; the explosion trigger is
    /// measured against this baseline.
    pub launch_reference: f32,
    /// Slot in the numeric backend, materialized on the first step.
    pub backend_id: Option<BackendId>,
}

impl Rocket {
    /// Launches a rocket at an exact world position.
    ///
    /// The ascent speed is randomized on the up axis; lateral axes get a
    /// small jitter so simultaneous launches fan out. In planar mode the
    /// Z axis stays untouched, keeping the whole flight in the X-Y plane.
    pub fn launch<R: Rng>(
        id: u64,
        kind: FireworkKind,
        position: Vec3,
        config: &SimConfig,
        rng: &mut R,
    ) -> Self {
        let velocity = match config.mode {
            SimMode::Planar => Vec3::new(lateral_jitter(rng), ascent_speed(rng), 0.0),
            SimMode::Volumetric => {
                Vec3::new(lateral_jitter(rng), lateral_jitter(rng), ascent_speed(rng))
            }
        };

        Self {
            id,
            kind,
            true_position: position,
            render_position: snap_vec(position, config.grid_size),
            velocity,
            launch_reference: position.component(config.up_axis()),
            backend_id: None,
        }
    }

    /// True once the rocket has climbed its full ascent distance above
    /// the launch point. The same convention holds in both modes: the
    /// trigger compares the up-axis continuous position against
    /// `launch_reference + explosion_height`.
    #[inline]
    #[must_use]
    pub fn should_explode(&self, config: &SimConfig) -> bool {
        self.true_position.component(config.up_axis())
            >= self.launch_reference + config.explosion_height
    }
}

/// Randomized ascent speed on the up axis.
fn ascent_speed<R: Rng>(rng: &mut R) -> f32 {
    constants::ASCENT_SPEED_BASE + rng.gen::<f32>() * constants::ASCENT_SPEED_SPREAD
}

/// Small centered jitter for the lateral axes.
fn lateral_jitter<R: Rng>(rng: &mut R) -> f32 {
    (rng.gen::<f32>() - 0.5) * constants::LAUNCH_JITTER
}

/// Snaps each axis independently.
fn snap_vec(v: Vec3, grid_size: f32) -> Vec3 {
    Vec3::new(
        grid::snap(v.x, grid_size),
        grid::snap(v.y, grid_size),
        grid::snap(v.z, grid_size),
    )
}
