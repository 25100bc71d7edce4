//! Raised-cosine (Hamming) analysis window.

use std::f64::consts::PI;

/// Window coefficient `0.54 - 0.46·cos(2πi/(N-1))`
pub fn raised_cosine(index: usize, size: usize) -> f64 {
    if size < 2 {
        return 1.0;
    }
    0.54 - 0.46 * (2.0 * PI * index as f64 / (size - 1) as f64).cos()
}

/// Precompute the whole window once at startup
pub fn raised_cosine_table(size: usize) -> Vec<f64> {
    (0..size).map(|i| raised_cosine(i, size)).collect()
}
