// SPDX-License-Identifier: GPL-3.0-or-later

//! External audio tooling: duration probing, segment extraction and remote
//! retrieval, all delegated to command-line tools (`ffprobe`, `ffmpeg`, `yt-dlp`).

pub mod download;
pub mod error;
pub mod ffmpeg;
pub mod tooling;

pub use download::{is_remote, YtDlpDownloader};
pub use error::{AudioError, Result};
pub use ffmpeg::{FfmpegTools, SegmentExtractor};
pub use tooling::{has_command, Tooling};
