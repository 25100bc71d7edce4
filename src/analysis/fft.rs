//! In-place radix-2 FFT.
//!
//! Decimation-in-frequency Cooley-Tukey: `log2(N)` butterfly passes whose
//! twiddles come from a recurrence (each pass squares the previous pass's
//! base root, each butterfly group multiplies by it), then one bit-reversal
//! pass into natural order, then scaling by `1/sqrt(N)`.

use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Transform `data` in place. `data.len()` must be a power of two.
pub fn fft_in_place(data: &mut [Complex64]) {
    let n = data.len();
    debug_assert!(n.is_power_of_two(), "FFT length must be a power of two");
    if n < 2 {
        return;
    }

    butterflies(data);
    bit_reverse_permute(data);

    let scale = 1.0 / (n as f64).sqrt();
    for value in data.iter_mut() {
        *value *= scale;
    }
}

fn butterflies(data: &mut [Complex64]) {
    let n = data.len();
    let theta = PI / n as f64;
    // exp(-iπ/N); squared before the first pass gives the N-point root
    let mut base = Complex64::new(theta.cos(), -theta.sin());

    let mut half = n;
    while half > 1 {
        let span = half;
        half >>= 1;
        base = base * base;

        let mut twiddle = Complex64::new(1.0, 0.0);
        for offset in 0..half {
            let mut a = offset;
            while a < n {
                let b = a + half;
                let diff = data[a] - data[b];
                data[a] += data[b];
                data[b] = diff * twiddle;
                a += span;
            }
            twiddle *= base;
        }
    }
}

fn bit_reverse_permute(data: &mut [Complex64]) {
    let n = data.len();
    let bits = n.trailing_zeros();
    for a in 0..n {
        let b = a.reverse_bits() >> (usize::BITS - bits);
        if b > a {
            data.swap(a, b);
        }
    }
}
