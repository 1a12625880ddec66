// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use mixid_audio::AudioError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Failures that end a scan. Per-segment problems never surface here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to probe source duration: {0}")]
    Probe(#[source] AudioError),

    #[error("failed to create scratch directory: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("source is no longer readable: {}", .0.display())]
    SourceUnreadable(PathBuf),
}
