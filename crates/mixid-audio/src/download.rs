// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::ffmpeg::stderr_tail;
use crate::{has_command, AudioError, Result};

const FALLBACK_TITLE: &str = "downloaded-mix";
const MAX_TITLE_LEN: usize = 80;
const ALTERNATE_EXTENSIONS: [&str; 5] = ["webm", "opus", "m4a", "ogg", "wav"];

/// Whether the input names a remote recording rather than a local file.
pub fn is_remote(input: &str) -> bool {
    let lower = input.get(..8).unwrap_or(input).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Fetches remote mixes as audio files with `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    binary: String,
    title_timeout: Duration,
    download_timeout: Duration,
}

impl YtDlpDownloader {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            title_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(600),
        }
    }

    pub fn title_timeout(mut self, duration: Duration) -> Self {
        self.title_timeout = duration;
        self
    }

    pub fn download_timeout(mut self, duration: Duration) -> Self {
        self.download_timeout = duration;
        self
    }

    /// Download `url` into `output_dir` and return the local audio file.
    #[instrument(skip(self, output_dir), fields(dir = ?output_dir))]
    pub async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        if !has_command(&self.binary) {
            return Err(AudioError::MissingTool(self.binary.clone()));
        }

        let title = self.fetch_title(url).await;
        let template = output_dir.join(format!("{}.%(ext)s", title));
        info!(target: "audio", %title, "downloading remote mix");

        let mut command = Command::new(&self.binary);
        command
            .args(["-x", "--audio-format", "mp3", "--audio-quality", "0", "-o"])
            .arg(&template)
            .args(["--no-playlist", "--progress", "--newline"])
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let status = match timeout(self.download_timeout, command.status()).await {
            Ok(status) => status.map_err(|source| AudioError::Spawn {
                tool: self.binary.clone(),
                source,
            })?,
            Err(_) => {
                return Err(AudioError::Timeout {
                    tool: self.binary.clone(),
                    secs: self.download_timeout.as_secs(),
                })
            }
        };

        if !status.success() {
            warn!(target: "audio", %status, "yt-dlp reported failure, looking for output anyway");
        }

        locate_download(output_dir, &title)
    }

    /// Best-effort title lookup used to name the downloaded file.
    async fn fetch_title(&self, url: &str) -> String {
        let mut command = Command::new(&self.binary);
        command
            .args(["--print", "title", "--no-download"])
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match timeout(self.title_timeout, command.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                sanitize_title(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(Ok(output)) => {
                debug!(target: "audio", stderr = %stderr_tail(&output.stderr), "title lookup failed");
                FALLBACK_TITLE.to_string()
            }
            Ok(Err(err)) => {
                debug!(target: "audio", error = %err, "title lookup could not start");
                FALLBACK_TITLE.to_string()
            }
            Err(_) => {
                debug!(target: "audio", "title lookup timed out");
                FALLBACK_TITLE.to_string()
            }
        }
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

/// Turn a remote title into a safe file stem.
pub fn sanitize_title(raw: &str) -> String {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();

    let slug = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    let slug: String = slug.chars().take(MAX_TITLE_LEN).collect();
    if slug.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        slug
    }
}

/// Find the file yt-dlp produced for `title`, preferring mp3.
pub fn locate_download(output_dir: &Path, title: &str) -> Result<PathBuf> {
    std::iter::once("mp3")
        .chain(ALTERNATE_EXTENSIONS)
        .map(|ext| output_dir.join(format!("{}.{}", title, ext)))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| AudioError::DownloadMissing(output_dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_remote_inputs() {
        assert!(is_remote("https://soundcloud.com/dj/set-name"));
        assert!(is_remote("HTTP://example.com/mix"));
        assert!(!is_remote("my-mix.mp3"));
        assert!(!is_remote("/music/https-mix.mp3"));
        assert!(!is_remote("ftp://example.com/mix.mp3"));
    }

    #[test]
    fn sanitizes_titles() {
        assert_eq!(
            sanitize_title("Boiler Room: Ben UFO @ London (2019)\n"),
            "boiler-room-ben-ufo-london-2019"
        );
        assert_eq!(sanitize_title("  a__b -- c  "), "a__b----c");
        assert_eq!(sanitize_title("!!!"), FALLBACK_TITLE);
    }

    #[test]
    fn truncates_long_titles() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_title(&long).len(), MAX_TITLE_LEN);
    }

    #[test]
    fn locates_preferred_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("set.opus"), b"opus").unwrap();
        assert_eq!(
            locate_download(dir.path(), "set").unwrap(),
            dir.path().join("set.opus")
        );

        std::fs::write(dir.path().join("set.mp3"), b"mp3").unwrap();
        assert_eq!(
            locate_download(dir.path(), "set").unwrap(),
            dir.path().join("set.mp3")
        );
    }

    #[test]
    fn missing_download_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            locate_download(dir.path(), "set"),
            Err(AudioError::DownloadMissing(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_fails_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = YtDlpDownloader::new("mixid-no-such-yt-dlp");
        let err = downloader
            .download("https://example.com/mix", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AudioError::MissingTool(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_timeout_stops_the_child() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = dir.path().join("fake-yt-dlp");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nif [ \"$1\" = \"--print\" ]; then echo slow set; exit 0; fi\nsleep 2\ntouch '{}'\n",
                marker.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let downloader = YtDlpDownloader::new(script.to_string_lossy())
            .download_timeout(Duration::from_millis(300));
        let err = downloader
            .download("https://example.com/mix", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AudioError::Timeout { .. }), "unexpected error: {:?}", err);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists());
    }
}
