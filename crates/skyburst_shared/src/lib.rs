//! # SKYBURST Shared
//!
//! Common types used by the simulation core and its integrations.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - Any GPU or window-related crate
//! - The simulation core itself
//!
//! If you need drawable types, put them in the integration crate.

pub mod config;
pub mod constants;
pub mod grid;
pub mod math;

pub use config::{BackendKind, ConfigError, SimConfig, SimMode};
pub use grid::snap;
pub use math::{Axis, Vec3};
