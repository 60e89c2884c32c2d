//! # Simulation Configuration
//!
//! All externally-overridable constants in one struct, loadable from a
//! TOML file and validated once at startup. Validation fails fast: a bad
//! value is a hard error before any entity exists, never a silent clamp.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::math::Axis;

/// Errors raised by [`SimConfig::validate`] and the TOML loaders.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The lattice spacing must be strictly positive.
    #[error("grid_size must be positive, got {0}")]
    NonPositiveGridSize(f32),

    /// A batch must contain at least one particle.
    #[error("particle_count must be at least 1")]
    ZeroParticleCount,

    /// Opacity decay must stay within `(0, 1]`.
    #[error("alpha_decay must be in (0, 1], got {0}")]
    DecayOutOfRange(f32),

    /// The retirement threshold must stay within `(0, 1)`.
    #[error("alpha_threshold must be in (0, 1), got {0}")]
    ThresholdOutOfRange(f32),

    /// Rockets must climb a positive distance before detonating.
    #[error("explosion_height must be positive, got {0}")]
    NonPositiveExplosionHeight(f32),

    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file was not valid TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Camera/world mode the simulation runs in.
///
/// The mode fixes the "up" axis for gravity, ascent and the explosion
/// trigger, and selects how burst directions are sampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimMode {
    /// Orthographic 2D view: up is +Y, bursts disperse on a planar angle.
    #[default]
    Planar,
    /// Free 3D view: up is +Z, bursts disperse over the unit sphere.
    Volumetric,
}

impl SimMode {
    /// The axis gravity, ascent and the explosion trigger act on.
    #[inline]
    #[must_use]
    pub const fn up_axis(self) -> Axis {
        match self {
            Self::Planar => Axis::Y,
            Self::Volumetric => Axis::Z,
        }
    }
}

/// Which numeric engine integrates the per-frame physics.
///
/// Selected once, before the frame driver starts. Switching while
/// entities are live has undefined slot mapping; the driver requires a
/// full stop/start to change it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Per-entity loop over slot structs.
    #[default]
    Scalar,
    /// Fused kernels over dense flat buffers.
    Batched,
}

/// The full set of tunables for one simulation session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Lattice spacing for render positions.
    pub grid_size: f32,
    /// Downward acceleration per unit frame.
    pub gravity: f32,
    /// Multiplicative opacity decay per unit frame.
    pub alpha_decay: f32,
    /// Opacity below which a batch is retired.
    pub alpha_threshold: f32,
    /// Particles per detonation.
    pub particle_count: usize,
    /// Climb distance above the launch point before detonation.
    pub explosion_height: f32,
    /// Seed for the deterministic random stream.
    pub rng_seed: u64,
    /// Camera/world mode.
    pub mode: SimMode,
    /// Numeric engine selection.
    pub backend: BackendKind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: constants::GRID_SIZE,
            gravity: constants::GRAVITY,
            alpha_decay: constants::ALPHA_DECAY,
            alpha_threshold: constants::ALPHA_THRESHOLD,
            particle_count: constants::PARTICLE_COUNT,
            explosion_height: constants::EXPLOSION_HEIGHT,
            rng_seed: constants::RNG_SEED,
            mode: SimMode::Planar,
            backend: BackendKind::Scalar,
        }
    }
}

impl SimConfig {
    /// Checks every tunable against its legal range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered. Values are never
    /// clamped into range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_size > 0.0) {
            return Err(ConfigError::NonPositiveGridSize(self.grid_size));
        }
        if self.particle_count == 0 {
            return Err(ConfigError::ZeroParticleCount);
        }
        if !(self.alpha_decay > 0.0 && self.alpha_decay <= 1.0) {
            return Err(ConfigError::DecayOutOfRange(self.alpha_decay));
        }
        if !(self.alpha_threshold > 0.0 && self.alpha_threshold < 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(self.alpha_threshold));
        }
        if !(self.explosion_height > 0.0) {
            return Err(ConfigError::NonPositiveExplosionHeight(
                self.explosion_height,
            ));
        }
        Ok(())
    }

    /// Parses and validates a config from TOML text.
    ///
    /// Missing keys fall back to the stock constants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML or an out-of-range value.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on I/O failure, malformed TOML or an
    /// out-of-range value.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The axis gravity and the explosion trigger act on.
    #[inline]
    #[must_use]
    pub const fn up_axis(&self) -> Axis {
        self.mode.up_axis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_grid() {
        let config = SimConfig {
            grid_size: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveGridSize(_))
        ));
    }

    #[test]
    fn test_rejects_decay_outside_unit_interval() {
        for bad in [0.0, -0.5, 1.1] {
            let config = SimConfig {
                alpha_decay: bad,
                ..SimConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::DecayOutOfRange(_))),
                "decay {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_zero_particles() {
        let config = SimConfig {
            particle_count: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroParticleCount)
        ));
    }

    #[test]
    fn test_rejects_nan_grid() {
        let config = SimConfig {
            grid_size: f32::NAN,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_partial_override() {
        let config = SimConfig::from_toml_str(
            r#"
            gravity = 0.1
            mode = "volumetric"
            backend = "batched"
            "#,
        )
        .unwrap();

        assert_eq!(config.gravity, 0.1);
        assert_eq!(config.mode, SimMode::Volumetric);
        assert_eq!(config.backend, BackendKind::Batched);
        // Untouched keys keep the stock defaults
        assert_eq!(config.grid_size, constants::GRID_SIZE);
        assert_eq!(config.particle_count, constants::PARTICLE_COUNT);
    }

    #[test]
    fn test_toml_rejects_invalid_value() {
        let result = SimConfig::from_toml_str("alpha_decay = 1.5");
        assert!(matches!(result, Err(ConfigError::DecayOutOfRange(_))));
    }

    #[test]
    fn test_up_axis_follows_mode() {
        assert_eq!(SimMode::Planar.up_axis(), Axis::Y);
        assert_eq!(SimMode::Volumetric.up_axis(), Axis::Z);
    }
}
