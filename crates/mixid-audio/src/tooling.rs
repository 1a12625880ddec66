// SPDX-License-Identifier: GPL-3.0-or-later

use std::env;
use std::path::Path;

use tracing::debug;

/// Whether `command` resolves to a file, either directly or through `PATH`.
pub fn has_command(command: &str) -> bool {
    let direct = Path::new(command);
    if direct.components().count() > 1 {
        return direct.is_file();
    }

    let Some(paths) = env::var_os("PATH") else {
        return false;
    };

    env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(command);
        candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
    })
}

/// Availability of the external tools the scan pipeline relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tooling {
    pub ffmpeg: bool,
    pub ffprobe: bool,
    pub yt_dlp: bool,
}

impl Tooling {
    pub fn detect(ffmpeg: &str, ffprobe: &str, yt_dlp: &str) -> Self {
        let tooling = Self {
            ffmpeg: has_command(ffmpeg),
            ffprobe: has_command(ffprobe),
            yt_dlp: has_command(yt_dlp),
        };
        debug!(target: "audio", ?tooling, "detected external tooling");
        tooling
    }

    /// Decoding needs both ffmpeg and ffprobe.
    pub fn can_decode(&self) -> bool {
        self.ffmpeg && self.ffprobe
    }

    pub fn can_download(&self) -> bool {
        self.yt_dlp
    }
}
