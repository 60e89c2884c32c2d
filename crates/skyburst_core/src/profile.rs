//! # Firework Type Profiles
//!
//! Each kind is a static recipe: a display name, a pastel base color and a
//! velocity law that shapes the burst. Profiles are immutable and shared by
//! every rocket and batch of that kind; the only side effect of evaluating
//! one is consuming the caller's random stream.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use serde::{Deserialize, Serialize};
use skyburst_shared::{Axis, SimMode, Vec3};

/// Radius of the ring shape in world units.
const RING_RADIUS: f32 = 2.5;

/// Fixed dispersion speed of the ring shape. Radius samples are ignored.
const RING_SPEED: f32 = RING_RADIUS * 0.2;

/// Linear RGB color, each channel in `[0, 1]`.
///
/// `Pod` so color buffers can be handed to a renderer as raw bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Rgb {
    /// Creates a color from raw channel values.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Scales all three channels by one factor.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

/// Softens an 8-bit RGB triple into the pastel range.
///
/// Maps `[0, 255]` to `[0.4, 1.0]` per channel, so even a black input stays
/// visibly bright against the night background.
#[must_use]
fn pastel(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(
        f32::from(r) / 255.0 * 0.6 + 0.4,
        f32::from(g) / 255.0 * 0.6 + 0.4,
        f32::from(b) / 255.0 * 0.6 + 0.4,
    )
}

/// The six built-in firework kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FireworkKind {
    /// Round, evenly filled burst.
    Peony,
    /// Denser, faster-spreading sphere.
    Chrysanthemum,
    /// Damped horizontal spread with a downward droop.
    Willow,
    /// Thin shell at one fixed speed.
    Ring,
    /// Fronds directed upward, narrow at the base.
    Palm,
    /// Burst split into three discrete speed bands.
    MultiBreak,
}

impl FireworkKind {
    /// Every kind, in selection-menu order.
    pub const ALL: [Self; 6] = [
        Self::Peony,
        Self::Chrysanthemum,
        Self::Willow,
        Self::Ring,
        Self::Palm,
        Self::MultiBreak,
    ];

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Peony => "Peony",
            Self::Chrysanthemum => "Chrysanthemum",
            Self::Willow => "Willow",
            Self::Ring => "Ring",
            Self::Palm => "Palm",
            Self::MultiBreak => "Multi-Break",
        }
    }

    /// One-line description for selection menus.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Peony => "Round burst with an even spread",
            Self::Chrysanthemum => "Dense spherical burst",
            Self::Willow => "Drooping trails like willow branches",
            Self::Ring => "A single expanding ring",
            Self::Palm => "Rising fronds like a palm tree",
            Self::MultiBreak => "Staged burst in three speed bands",
        }
    }

    /// Pastel base color; per-particle variation is applied on top.
    #[must_use]
    pub fn base_color(self) -> Rgb {
        match self {
            Self::Peony => pastel(255, 107, 107),
            Self::Chrysanthemum => pastel(78, 205, 196),
            Self::Willow => pastel(255, 230, 109),
            Self::Ring => pastel(149, 225, 211),
            Self::Palm => pastel(243, 129, 129),
            Self::MultiBreak => pastel(170, 150, 218),
        }
    }

    /// Computes one particle's initial velocity.
    ///
    /// `direction` must be unit length (see [`sample_direction`]); `radius`
    /// comes from [`sample_radius`]. The up axis matters to the shaped
    /// kinds: willow overrides the up component downward, palm upward.
    pub fn velocity<R: Rng>(self, direction: Vec3, radius: f32, up: Axis, rng: &mut R) -> Vec3 {
        match self {
            Self::Peony => direction * (radius * (0.4 + rng.gen::<f32>() * 0.3)),
            Self::Chrysanthemum => direction * (radius * (0.5 + rng.gen::<f32>() * 0.4)),
            Self::Willow => {
                let speed = radius * (0.3 + rng.gen::<f32>() * 0.4);
                let mut v = direction * (speed * 0.3);
                *v.component_mut(up) =
                    -direction.component(up).abs() * speed * (0.6 + rng.gen::<f32>() * 0.4);
                v
            }
            Self::Ring => direction * RING_SPEED,
            Self::Palm => {
                let speed = radius * (0.3 + rng.gen::<f32>() * 0.4);
                let mut v = direction * (speed * 0.4);
                *v.component_mut(up) =
                    direction.component(up).abs() * speed * (0.5 + rng.gen::<f32>() * 0.3);
                v
            }
            Self::MultiBreak => {
                let band = rng.gen_range(0..3_u8);
                direction * (radius * (0.3 + f32::from(band) * 0.25))
            }
        }
    }
}

/// Draws the burst direction for particle `index` of `count`.
///
/// Planar mode spaces particles evenly around the circle, which is what
/// keeps the flat shapes (ring especially) clean. Volumetric mode samples
/// the unit sphere uniformly via `phi = acos(2u - 1)`, `theta = 2*pi*v`;
/// naive angle pairs would cluster at the poles.
#[allow(clippy::cast_precision_loss)]
pub fn sample_direction<R: Rng>(mode: SimMode, index: usize, count: usize, rng: &mut R) -> Vec3 {
    match mode {
        SimMode::Planar => {
            let theta = std::f32::consts::TAU * index as f32 / count as f32;
            Vec3::new(theta.cos(), theta.sin(), 0.0)
        }
        SimMode::Volumetric => {
            let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
            let theta = std::f32::consts::TAU * rng.gen::<f32>();
            Vec3::new(
                phi.sin() * theta.cos(),
                phi.sin() * theta.sin(),
                phi.cos(),
            )
        }
    }
}

/// Draws a burst radius, uniform in `[0.5, 1.0]`.
pub fn sample_radius<R: Rng>(rng: &mut R) -> f32 {
    rng.gen::<f32>() * 0.5 + 0.5
}

/// Draws the per-particle pastel variation factor, uniform in `[0.7, 1.0]`.
pub fn sample_color_variation<R: Rng>(rng: &mut R) -> f32 {
    0.7 + rng.gen::<f32>() * 0.3
}
