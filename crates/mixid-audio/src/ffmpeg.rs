// SPDX-License-Identifier: GPL-3.0-or-later

//! FFmpeg-backed probing and segment extraction.
//!
//! Segments are written as raw PCM ready for recognition:
//!
//! - mono
//! - 16 kHz
//! - signed 16-bit little-endian, no container

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use mixid_domain::SegmentRequest;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::{AudioError, Result};

/// Collaborator that reads the source recording.
#[async_trait]
pub trait SegmentExtractor: Send + Sync {
    /// Total duration of the recording in seconds.
    async fn probe_duration(&self, source: &Path) -> Result<f64>;

    /// Write one window of `source` to `out` as raw mono 16 kHz s16le PCM.
    async fn extract(&self, source: &Path, segment: SegmentRequest, out: &Path) -> Result<()>;
}

#[async_trait]
impl<T: SegmentExtractor + ?Sized> SegmentExtractor for Arc<T> {
    async fn probe_duration(&self, source: &Path) -> Result<f64> {
        (**self).probe_duration(source).await
    }

    async fn extract(&self, source: &Path, segment: SegmentRequest, out: &Path) -> Result<()> {
        (**self).extract(source, segment, out).await
    }
}

/// `ffprobe` / `ffmpeg` invoked as child processes.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegTools {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl SegmentExtractor for FfmpegTools {
    #[instrument(skip_all, fields(file = ?source))]
    async fn probe_duration(&self, source: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(source)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AudioError::Spawn {
                tool: self.ffprobe.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AudioError::ToolFailed {
                tool: self.ffprobe.clone(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let duration = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!(target: "audio", duration, "probed duration");
        Ok(duration)
    }

    #[instrument(skip_all, fields(position = segment.position_secs, length = segment.duration_secs))]
    async fn extract(&self, source: &Path, segment: SegmentRequest, out: &Path) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-ss")
            .arg(segment.position_secs.to_string())
            .arg("-t")
            .arg(segment.duration_secs.to_string())
            .arg("-i")
            .arg(source)
            .args(["-ac", "1", "-ar", "16000", "-f", "s16le", "-acodec", "pcm_s16le"])
            .arg(out)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| AudioError::Spawn {
                tool: self.ffmpeg.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AudioError::ToolFailed {
                tool: self.ffmpeg.clone(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        debug!(target: "audio", "segment extracted");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Read `format.duration` from `ffprobe -print_format json -show_format`.
pub fn parse_probe_output(json: &str) -> Result<f64> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| AudioError::InvalidProbeOutput(e.to_string()))?;

    let raw = probe
        .format
        .duration
        .ok_or_else(|| AudioError::InvalidProbeOutput("missing format.duration".to_string()))?;

    let duration: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AudioError::InvalidProbeOutput(format!("invalid duration '{}'", raw)))?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(AudioError::InvalidProbeOutput(format!(
            "invalid duration '{}'",
            raw
        )));
    }

    Ok(duration)
}

pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(3);
    lines[start..].join(" | ")
}
