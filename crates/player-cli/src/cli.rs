use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "player", version)]
pub struct Args {
    /// Audio files to queue at startup
    pub paths: Vec<PathBuf>,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Use a specific output device by substring match
    #[arg(long)]
    pub device: Option<String>,

    /// Initial volume in percent (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,

    /// Frames decoded per chunk (also the skip/stop reaction granularity)
    #[arg(long)]
    pub chunk_frames: Option<usize>,

    /// Output buffer target in seconds
    #[arg(long)]
    pub buffer_seconds: Option<f32>,

    /// How long shutdown waits for the render thread, in milliseconds
    #[arg(long)]
    pub shutdown_timeout_ms: Option<u64>,

    /// Shuffle the queue after loading it
    #[arg(long)]
    pub shuffle: bool,

    /// TOML config file; command-line flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
}
