//! # SKYBURST
//!
//! Interactive pixel-art fireworks: place launch points, fire the whole
//! lineup, watch rockets climb and burst into grid-snapped particles.
//!
//! This crate is the integration layer around [`skyburst_core`]: the
//! saved-placement store the input layer writes, the cooperative frame
//! driver, and a headless renderer bridge that proves the resource
//! lifecycle contract a real renderer must follow.

pub mod bridge;
pub mod driver;
pub mod placements;

pub use bridge::{Drawable, DrawableKind, RendererBridge};
pub use driver::{
    DriverBuilder, DriverConfig, DriverError, FrameDriver, FrameStats, FrameStatsAccumulator,
    LaunchIntent, LaunchQueue,
};
pub use placements::{PlacementStore, SavedPlacement};
