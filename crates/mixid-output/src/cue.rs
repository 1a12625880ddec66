// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt::Write;
use std::path::Path;

use mixid_domain::TrackEntry;

/// CUE sheet with one `TRACK` per entry. Frames are always `00`.
pub fn render_cue(tracks: &[TrackEntry], cue_path: &Path, audio_filename: &str) -> String {
    let title = cue_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().replace(|c: char| c == '-' || c == '_', " "))
        .unwrap_or_default();

    let mut cue = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(cue, "REM GENRE DJ Mix");
    let _ = writeln!(cue, "TITLE \"{}\"", title);
    let _ = writeln!(cue, "FILE \"{}\" MP3", audio_filename);

    for (i, track) in tracks.iter().enumerate() {
        let _ = writeln!(cue, "  TRACK {:02} AUDIO", i + 1);
        let _ = writeln!(cue, "    TITLE \"{}\"", track.title);
        let _ = writeln!(cue, "    PERFORMER \"{}\"", track.artist);
        let _ = writeln!(cue, "    INDEX 01 {}", cue_index(track.position_sec));
    }

    cue
}

/// `MM:SS:00`; minutes are not wrapped into hours.
fn cue_index(position_sec: u64) -> String {
    format!("{:02}:{:02}:00", position_sec / 60, position_sec % 60)
}
