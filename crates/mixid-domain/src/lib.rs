// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Scan Input
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanConfigError {
    #[error("step must be greater than zero")]
    ZeroStep,
    #[error("segment length must be greater than zero")]
    ZeroSegment,
}

/// Sampling parameters for one scan, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub step_secs: u64,
    pub segment_secs: u64,
    pub start_secs: u64,
}

impl ScanConfig {
    pub fn new(step_secs: u64, segment_secs: u64, start_secs: u64) -> Result<Self, ScanConfigError> {
        if step_secs == 0 {
            return Err(ScanConfigError::ZeroStep);
        }
        if segment_secs == 0 {
            return Err(ScanConfigError::ZeroSegment);
        }
        Ok(Self {
            step_secs,
            segment_secs,
            start_secs,
        })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step_secs: 30,
            segment_secs: 18,
            start_secs: 0,
        }
    }
}

/// A local recording ready to be scanned. Owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAudio {
    pub path: PathBuf,
    pub duration_secs: f64,
}

impl SourceAudio {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            duration_secs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// One window of the recording to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRequest {
    pub position_secs: u64,
    pub duration_secs: u64,
}

// ============================================================================
// Recognition Results
// ============================================================================

/// A track identified in one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub year: Option<String>,
}

impl Match {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            year: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Two matches name the same track when title and artist agree.
    pub fn same_track(&self, other: &Match) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

/// A track start in the final tracklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub timestamp: String,
    pub position_sec: u64,
    pub title: String,
    pub artist: String,
    #[serde(with = "empty_as_none", default)]
    pub album: Option<String>,
    #[serde(with = "empty_as_none", default)]
    pub year: Option<String>,
}

impl TrackEntry {
    pub fn new(position_sec: u64, found: &Match) -> Self {
        Self {
            timestamp: format_timestamp(position_sec as f64),
            position_sec,
            title: found.title.clone(),
            artist: found.artist.clone(),
            album: found.album.clone(),
            year: found.year.clone(),
        }
    }

    pub fn same_track(&self, other: &TrackEntry) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

/// Outcome of a full scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub tracks: Vec<TrackEntry>,
    pub duration: f64,
    pub segments_scanned: usize,
    /// Adjacent repeats dropped by the final dedupe pass.
    pub duplicates_removed: usize,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Format seconds as `H:MM:SS`, or `MM:SS` under an hour.
pub fn format_timestamp(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Absent album/year travel as empty strings in persisted documents.
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}
