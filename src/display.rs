//! Terminal bar display over the published spectrum.
//!
//! Bins are grouped into bars on a power curve so the low end gets more
//! bars than the high end. Each bar follows its average with an exponential
//! smoother, and a slower "smeared" follower trails the smoothed value.
//! While a bar falls, its smeared level is drawn as a dim ghost glyph.

use std::ops::Range;

use crate::params::DisplayConfig;

/// Glyphs from quietest to loudest
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// ANSI dim on/off around ghost glyphs
const GHOST_ON: &str = "\x1b[2m";
const GHOST_OFF: &str = "\x1b[0m";

/// Smoothed bars derived from spectrum frames
pub struct BarDisplay {
    config: DisplayConfig,
    /// Bin range averaged into each bar (may be empty at the top end)
    ranges: Vec<Range<usize>>,
    smoothed: Vec<f32>,
    smeared: Vec<f32>,
}

impl BarDisplay {
    /// Precompute bar ranges for spectra of `bin_count` values
    pub fn new(config: DisplayConfig, bin_count: usize) -> Self {
        let ranges = bar_ranges(
            config.bucket_count,
            bin_count,
            config.curve_exponent,
            config.min_bin,
        );
        let bars = ranges.len();
        Self {
            config,
            ranges,
            smoothed: vec![0.0; bars],
            smeared: vec![0.0; bars],
        }
    }

    /// Fold one spectrum into the bars; `dt` is seconds since the last update
    pub fn update(&mut self, spectrum: &[f32], dt: f32) {
        let smooth_k = (self.config.smoothness * dt).min(1.0);
        let smear_k = (self.config.smearedness * dt).min(1.0);

        for (bar, range) in self.ranges.iter().enumerate() {
            let bins = spectrum.get(range.clone()).unwrap_or(&[]);
            let value = if bins.is_empty() {
                0.0
            } else {
                bins.iter().sum::<f32>() / bins.len() as f32
            };

            self.smoothed[bar] += (value - self.smoothed[bar]) * smooth_k;
            self.smeared[bar] += (self.smoothed[bar] - self.smeared[bar]) * smear_k;
        }
    }

    pub fn smoothed(&self) -> &[f32] {
        &self.smoothed
    }

    pub fn smeared(&self) -> &[f32] {
        &self.smeared
    }

    /// One glyph per bar. A bar whose smeared level is above its smoothed
    /// level is drawn dim at the smeared height.
    pub fn render_line(&self) -> String {
        let mut line = String::with_capacity(self.smoothed.len() * 4);
        for (&smooth, &smear) in self.smoothed.iter().zip(self.smeared.iter()) {
            let bar = level_index(smooth);
            let ghost = level_index(smear);
            if ghost > bar {
                line.push_str(GHOST_ON);
                line.push(LEVELS[ghost]);
                line.push_str(GHOST_OFF);
            } else {
                line.push(LEVELS[bar]);
            }
        }
        line
    }
}

fn level_index(value: f32) -> usize {
    let top = LEVELS.len() - 1;
    let index = (value.clamp(0.0, 1.0) * top as f32).round() as usize;
    index.min(top)
}

/// Bar `b` of `bars` covers bins
/// `[floor((b/bars)^curve * bins), floor(((b+1)/bars)^curve * bins))`, starting
/// no lower than `min_bin`, at least one bin wide and clipped to `bins`
fn bar_ranges(bars: usize, bins: usize, curve: f32, min_bin: usize) -> Vec<Range<usize>> {
    (0..bars)
        .map(|bar| {
            let t_start = bar as f32 / bars as f32;
            let t_end = (bar + 1) as f32 / bars as f32;

            let start = ((t_start.powf(curve) * bins as f32) as usize).max(min_bin);
            let mut end = (t_end.powf(curve) * bins as f32) as usize;
            if end <= start {
                end = start + 1;
            }
            start..end.min(bins)
        })
        .collect()
}
