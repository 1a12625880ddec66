// SPDX-License-Identifier: GPL-3.0-or-later

//! Tracklist artifacts written next to the scanned recording:
//! a paste-friendly text list, a CUE sheet, and a JSON document.

pub mod cue;
pub mod error;
pub mod json;
pub mod txt;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use mixid_domain::ScanResult;
use tracing::info;

pub use cue::render_cue;
pub use error::{OutputError, Result};
pub use json::{parse_json, render_json, TracklistDocument};
pub use txt::render_txt;

/// Where the three artifacts for one recording go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub txt: PathBuf,
    pub cue: PathBuf,
    pub json: PathBuf,
}

impl OutputPaths {
    /// Derive artifact paths from the audio path with its extension removed.
    pub fn for_audio(audio: &Path) -> Self {
        let base = audio.with_extension("");
        Self {
            txt: suffixed(&base, "_tracklist.txt"),
            cue: suffixed(&base, ".cue"),
            json: suffixed(&base, "_tracklist.json"),
        }
    }
}

fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write text, CUE and JSON artifacts for `result`.
pub fn write_all(result: &ScanResult, paths: &OutputPaths, audio_filename: &str) -> Result<()> {
    write_file(&paths.txt, render_txt(&result.tracks))?;
    write_file(&paths.cue, render_cue(&result.tracks, &paths.cue, audio_filename))?;

    let document = TracklistDocument::from_result(result, audio_filename);
    write_file(&paths.json, render_json(&document)?)?;

    info!(target: "output", txt = ?paths.txt, cue = ?paths.cue, json = ?paths.json, "tracklist written");
    Ok(())
}

fn write_file(path: &Path, contents: String) -> Result<()> {
    fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}
