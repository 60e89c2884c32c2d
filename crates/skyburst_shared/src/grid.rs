//! Lattice snapping for the pixel-art look.
//!
//! Physics runs on continuous coordinates; only the drawn position is
//! quantized. Snapping must never feed back into integration or the
//! quantization error accumulates into visible drift.

/// Snaps a continuous coordinate to the nearest lattice point.
///
/// Applied independently per axis; never mixes axes.
///
/// # Arguments
///
/// * `value` - The continuous coordinate
/// * `grid_size` - The lattice spacing (must be positive)
#[inline]
#[must_use]
pub fn snap(value: f32, grid_size: f32) -> f32 {
    (value / grid_size).round() * grid_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_rounds_to_nearest() {
        assert_eq!(snap(0.29, 0.2), 0.2);
        assert_eq!(snap(0.31, 0.2), 0.4);
        assert_eq!(snap(-0.29, 0.2), -0.2);
        assert_eq!(snap(0.0, 0.2), 0.0);
    }

    #[test]
    fn test_snap_idempotent() {
        for i in -1000..1000 {
            #[allow(clippy::cast_precision_loss)]
            let value = i as f32 * 0.0173;
            let once = snap(value, 0.2);
            assert_eq!(snap(once, 0.2), once, "snap not idempotent at {value}");
        }
    }

    #[test]
    fn test_snap_unit_grid_is_round() {
        assert_eq!(snap(3.49, 1.0), 3.0);
        assert_eq!(snap(3.5, 1.0), 4.0);
    }
}
