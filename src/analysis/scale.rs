//! Magnitude to perceptual [0, 1] scaling.

/// Maps squared bin magnitudes onto [0, 1] through a dB scale.
///
/// `floor_db` maps to 0.0 and 0 dB maps to 1.0, linearly in between and
/// clamped outside.
#[derive(Debug, Clone, Copy)]
pub struct DecibelScale {
    floor_db: f32,
    epsilon: f64,
}

impl DecibelScale {
    pub fn new(floor_db: f32, epsilon: f64) -> Self {
        Self { floor_db, epsilon }
    }

    /// `10·log10(|X|² + ε)`
    pub fn to_decibels(&self, magnitude_sq: f64) -> f32 {
        (10.0 * (magnitude_sq + self.epsilon).log10()) as f32
    }

    pub fn normalize(&self, magnitude_sq: f64) -> f32 {
        let db = self.to_decibels(magnitude_sq);
        ((db - self.floor_db) / -self.floor_db).clamp(0.0, 1.0)
    }
}

impl Default for DecibelScale {
    fn default() -> Self {
        Self::new(-60.0, 1e-12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_db_maps_to_one() {
        let scale = DecibelScale::default();
        assert_abs_diff_eq!(scale.normalize(1.0), 1.0, epsilon = 1e-6);
        // Louder than 0 dB clamps
        assert_eq!(scale.normalize(100.0), 1.0);
    }

    #[test]
    fn test_floor_maps_to_zero() {
        let scale = DecibelScale::default();
        assert_abs_diff_eq!(scale.normalize(1e-6), 0.0, epsilon = 1e-5);
        assert_eq!(scale.normalize(1e-9), 0.0);
        // Silence stays finite thanks to epsilon
        assert_abs_diff_eq!(scale.to_decibels(0.0), -120.0, epsilon = 1e-3);
        assert_eq!(scale.normalize(0.0), 0.0);
    }

    #[test]
    fn test_midpoint_is_linear_in_db() {
        let scale = DecibelScale::default();
        // -30 dB sits halfway between floor and 0 dB
        assert_abs_diff_eq!(scale.normalize(1e-3), 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_monotonic_in_magnitude() {
        let scale = DecibelScale::default();
        let mut previous = scale.normalize(0.0);
        let mut magnitude_sq = 1e-10;
        while magnitude_sq < 1e4 {
            let value = scale.normalize(magnitude_sq);
            assert!(value >= previous);
            previous = value;
            magnitude_sq *= 1.5;
        }
    }
}
