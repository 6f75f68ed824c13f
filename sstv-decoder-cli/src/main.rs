mod wav;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{
    Context,
    Result,
};
use sstv_decoder::{
    DecodeOptions,
    Samples,
    SyncStrategy,
    decode_scottie1,
};
use tracing_subscriber::EnvFilter;

/// Decode a Scottie 1 SSTV frame from a WAV capture into a PNG image.
#[derive(Debug, Parser)]
struct Args {
    /// Input WAV file: mono, 16-bit PCM, 44.1 kHz.
    input: PathBuf,

    /// Output PNG path.
    output: PathBuf,

    /// Sync-locator strategy.
    #[arg(long, value_enum, default_value = "hough")]
    strategy: Strategy,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Strategy {
    Hough,
    Tracker,
}

impl From<Strategy> for SyncStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Hough => SyncStrategy::Hough,
            Strategy::Tracker => SyncStrategy::Tracker,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let samples = wav::read_mono_i16(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let options = DecodeOptions {
        strategy: args.strategy.into(),
        ..DecodeOptions::default()
    };
    let frame = decode_scottie1(Samples::new(&samples), options);

    tracing::info!(
        receiving = frame.receiving,
        synced_lines = frame.sync_positions.as_ref().map(|p| p.len()),
        "decode complete"
    );

    frame
        .image
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    Ok(())
}
