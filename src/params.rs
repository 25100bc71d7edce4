//! Parameter definitions with units and documented defaults.

mod analysis;
mod display;

pub use analysis::{AnalysisConfig, StarvationPolicy};
pub use display::DisplayConfig;
