//! Neonwave library - real-time audio spectrum pipeline
//!
//! Audio samples flow through a wait-free SPSC queue into a dedicated
//! analysis thread, which publishes normalized spectra through a triple
//! buffer that the renderer polls without ever blocking.

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod display;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod transport;
