// SPDX-License-Identifier: GPL-3.0-or-later

//! Command-line arguments for `mixid`.

use std::path::PathBuf;

use clap::Parser;
use mixid_config::AppConfig;

/// Identify tracks in any DJ mix
#[derive(Parser, Debug)]
#[command(
    name = "mixid",
    version,
    about = "Identify tracks in any DJ mix",
    after_help = "Requirements:\n  ffmpeg    Audio processing (brew install ffmpeg)\n  yt-dlp    URL downloads (brew install yt-dlp)"
)]
pub struct Cli {
    /// Local audio file or URL (SoundCloud, Mixcloud, YouTube, ...)
    #[arg(value_name = "FILE_OR_URL")]
    pub input: String,

    /// Time between scan points in seconds (default: 30)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub step: Option<u64>,

    /// Sample length sent for recognition in seconds (default: 18)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub segment: Option<u64>,

    /// Skip to this position before scanning, in seconds (default: 0)
    #[arg(long, value_name = "SECONDS")]
    pub start: Option<u64>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Give up on a rate-limited segment instead of backing off
    #[arg(long)]
    pub no_retry: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose logging (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Command-line flags win over file and environment settings.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(step) = self.step {
            config.scan.step_secs = step;
        }
        if let Some(segment) = self.segment {
            config.scan.segment_secs = segment;
        }
        if let Some(start) = self.start {
            config.scan.start_secs = start;
        }
        if self.no_retry {
            config.recognition.retry.max_retries = 0;
        }
    }

    pub fn log_level(&self, config: &AppConfig) -> String {
        match (self.quiet, self.verbose) {
            (true, _) => "warn".to_string(),
            (false, 0) => config.telemetry.log_level.clone(),
            (false, 1) => "debug".to_string(),
            (false, _) => "trace".to_string(),
        }
    }
}
