//! Dedicated analysis thread and its cancellation token.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use super::analyzer::{AnalyzerStats, SpectrumAnalyzer, StepOutcome};

/// Shared one-way stop flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Runs [`SpectrumAnalyzer::step`] on its own thread until cancelled.
///
/// The token is checked between cycles only; a cycle in progress always
/// completes. Dropping the loop cancels and joins it.
pub struct AnalysisLoop {
    token: CancellationToken,
    handle: Option<thread::JoinHandle<AnalyzerStats>>,
}

impl AnalysisLoop {
    /// Spawn the analysis thread
    pub fn spawn(mut analyzer: SpectrumAnalyzer, token: CancellationToken) -> io::Result<Self> {
        Self::spawn_with(token, move |token| {
            log::debug!("Analysis thread started");
            while !token.is_cancelled() {
                if analyzer.step() == StepOutcome::Skipped {
                    thread::yield_now();
                }
            }
            analyzer.stats()
        })
    }

    fn spawn_with<F>(token: CancellationToken, body: F) -> io::Result<Self>
    where
        F: FnOnce(CancellationToken) -> AnalyzerStats + Send + 'static,
    {
        let thread_token = token.clone();
        let handle = thread::Builder::new()
            .name("spectrum-analysis".to_string())
            .spawn(move || body(thread_token))?;

        Ok(Self {
            token,
            handle: Some(handle),
        })
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Wait for the thread to exit after the token has been cancelled
    /// elsewhere. Blocks indefinitely if nobody cancels.
    pub fn join(mut self) -> thread::Result<AnalyzerStats> {
        self.join_inner()
    }

    /// Cancel and wait for the current cycle to finish
    pub fn shutdown(mut self) -> thread::Result<AnalyzerStats> {
        self.token.cancel();
        self.join_inner()
    }

    fn join_inner(&mut self) -> thread::Result<AnalyzerStats> {
        let stats = match self.handle.take() {
            Some(handle) => handle.join()?,
            None => AnalyzerStats::default(),
        };
        log::info!(
            "Analysis stopped after {} cycles ({} fresh, {} stale, {} skipped)",
            stats.cycles,
            stats.fresh,
            stats.stale,
            stats.skipped
        );
        Ok(stats)
    }
}

impl Drop for AnalysisLoop {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.token.cancel();
            if self.join_inner().is_err() {
                log::error!("Analysis thread panicked");
            }
        }
    }
}
