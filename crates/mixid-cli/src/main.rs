// SPDX-License-Identifier: GPL-3.0-or-later
mod cli;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mixid_audio::{is_remote, FfmpegTools, Tooling, YtDlpDownloader};
use mixid_config::{load as load_config, AppConfig};
use mixid_domain::ScanConfig;
use mixid_output::{write_all, OutputPaths};
use mixid_recognition::{AuddClient, Delay, Recognizer, RetryPolicy, TokioDelay};
use mixid_scanner::Scanner;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    init_tracing(&cli.log_level(&config));

    let scan_config = ScanConfig::new(
        config.scan.step_secs,
        config.scan.segment_secs,
        config.scan.start_secs,
    )
    .context("invalid scan settings")?;

    let tooling = Tooling::detect(
        &config.tools.ffmpeg,
        &config.tools.ffprobe,
        &config.tools.yt_dlp,
    );
    if !tooling.can_decode() {
        bail!("ffmpeg is required. Install: brew install ffmpeg");
    }

    let file = resolve_input(&cli.input, &config, tooling).await?;
    if !file.is_file() {
        bail!("File not found: {}", file.display());
    }

    let scanner = build_scanner(&config)?;
    let result = scanner
        .scan_file(&file, &scan_config)
        .await
        .with_context(|| format!("scan of {} failed", file.display()))?;

    if result.is_empty() {
        println!("\nNo tracks identified.");
        return Ok(());
    }

    let audio_filename = file_name(&file);
    println!("{}", report::tracklist(&result, &audio_filename));

    let paths = OutputPaths::for_audio(&file);
    write_all(&result, &paths, &audio_filename)?;

    println!("\nOutput:");
    println!("   {}", paths.txt.display());
    println!("   {}", paths.cue.display());
    println!("   {}", paths.json.display());

    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Local paths pass through; URLs are downloaded into the working directory.
async fn resolve_input(input: &str, config: &AppConfig, tooling: Tooling) -> Result<PathBuf> {
    if !is_remote(input) {
        return Ok(PathBuf::from(input));
    }

    if !tooling.can_download() {
        bail!("yt-dlp is required for URL downloads. Install: brew install yt-dlp");
    }

    println!("\nDownloading...\n   {}\n", input);
    let downloader = YtDlpDownloader::new(&config.tools.yt_dlp)
        .title_timeout(Duration::from_secs(config.tools.title_timeout_secs))
        .download_timeout(Duration::from_secs(config.tools.download_timeout_secs));
    let dir = std::env::current_dir().context("cannot determine working directory")?;

    let file = downloader
        .download(input, &dir)
        .await
        .context("Download failed. Check the URL and try again.")?;

    let size = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
    println!("{} ({})\n", file_name(&file), report::file_size(size));
    info!(target: "cli", file = ?file, "download complete");
    Ok(file)
}

fn build_scanner(config: &AppConfig) -> Result<Scanner<FfmpegTools, AuddClient>> {
    let mut builder = AuddClient::builder()
        .base_url(&config.recognition.base_url)
        .timeout(Duration::from_secs(config.recognition.timeout_secs));
    if let Some(token) = &config.recognition.api_token {
        builder = builder.api_token(token);
    }
    let client = builder.build().context("failed to create recognition client")?;

    let policy = RetryPolicy::new(
        config.recognition.retry.max_retries,
        Duration::from_secs(config.recognition.retry.base_delay_secs),
    );
    let delay: Arc<dyn Delay> = Arc::new(TokioDelay);
    let recognizer = Recognizer::new(client, policy, delay.clone());

    Ok(Scanner::new(
        FfmpegTools::new(&config.tools.ffmpeg, &config.tools.ffprobe),
        recognizer,
        delay,
        config.scan.politeness_delay(),
    ))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name(Path::new("/music/sets/closing.mp3")), "closing.mp3");
    }

    #[test]
    fn scanner_builds_from_default_config() {
        assert!(build_scanner(&AppConfig::default()).is_ok());
    }

    #[test]
    fn scanner_rejects_bad_recognition_url() {
        let mut config = AppConfig::default();
        config.recognition.base_url = "not a url".to_string();
        assert!(build_scanner(&config).is_err());
    }

    #[tokio::test]
    async fn local_input_passes_through() {
        let tooling = Tooling {
            ffmpeg: true,
            ffprobe: true,
            yt_dlp: false,
        };
        let path = resolve_input("set.mp3", &AppConfig::default(), tooling)
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("set.mp3"));
    }

    #[tokio::test]
    async fn url_without_downloader_fails() {
        let tooling = Tooling {
            ffmpeg: true,
            ffprobe: true,
            yt_dlp: false,
        };
        let err = resolve_input("https://soundcloud.com/dj/set", &AppConfig::default(), tooling)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("yt-dlp"));
    }
}
