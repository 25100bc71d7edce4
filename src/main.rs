//! Neonwave - a neon bar spectrum of whatever is playing
//!
//! Plays a WAV file or test tone (or listens to the capture device), analyzes
//! it on a dedicated thread and draws the spectrum as a line of bars.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use neonwave::analysis::CancellationToken;
use neonwave::audio::AudioSystem;
use neonwave::cli::Args;
use neonwave::display::BarDisplay;
use neonwave::pipeline::SpectrumPipeline;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let analysis_config = args.analysis_config();
    let display_config = args.display_config();
    analysis_config
        .validate()
        .context("Invalid analysis settings")?;
    display_config.validate().context("Invalid display settings")?;
    let run_limit = args.run_limit().context("Invalid --duration")?;

    let mut pipeline =
        SpectrumPipeline::start(&analysis_config).context("Failed to start analysis")?;
    let producer = pipeline
        .take_producer()
        .context("Sample queue producer already taken")?;

    let source = args.source();
    let audio = AudioSystem::start(&source, producer)
        .with_context(|| format!("Failed to start audio source {:?}", source))?;
    log::info!(
        "Playing {} ({} Hz per bin)",
        audio.description(),
        analysis_config.bin_to_hz(1, audio.sample_rate_hz())
    );

    let quit = spawn_quit_listener()?;
    let frame_interval = Duration::from_secs_f32(display_config.frame_interval_s());
    let mut bars = BarDisplay::new(display_config, analysis_config.bin_count());

    if !args.quiet {
        println!("Press Enter to quit");
    }

    let start = Instant::now();
    let mut last_frame = start;
    let mut stdout = io::stdout();
    loop {
        if quit.is_cancelled() || run_limit.is_some_and(|limit| start.elapsed() >= limit) {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        // Keeps the previous spectrum when nothing new was published
        let reader = pipeline.reader_mut();
        reader.acquire_latest();
        bars.update(&reader[..], dt);

        if !args.quiet {
            write!(stdout, "\r{}", bars.render_line())?;
            stdout.flush()?;
        }

        thread::sleep(frame_interval);
    }
    if !args.quiet {
        println!();
    }

    // Stop the producer before the consumer
    drop(audio);
    let stats = pipeline
        .shutdown()
        .map_err(|_| anyhow::anyhow!("Analysis thread panicked"))?;
    println!(
        "Analyzed {} cycles: {} fresh, {} stale, {} skipped",
        stats.cycles, stats.fresh, stats.stale, stats.skipped
    );

    Ok(())
}

/// Cancel the returned token when a line arrives on stdin
fn spawn_quit_listener() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let listener = token.clone();
    thread::Builder::new()
        .name("quit-listener".to_string())
        .spawn(move || {
            let mut line = String::new();
            // Closed stdin leaves the run to --duration
            if let Ok(1..) = io::stdin().lock().read_line(&mut line) {
                listener.cancel();
            }
        })
        .context("Failed to spawn quit listener")?;
    Ok(token)
}
