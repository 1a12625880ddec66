// SPDX-License-Identifier: GPL-3.0-or-later
use mixid_domain::TrackEntry;

/// One `artist - title timestamp` line per track.
pub fn render_txt(tracks: &[TrackEntry]) -> String {
    let mut out = String::new();
    for track in tracks {
        out.push_str(&format!("{} - {} {}\n", track.artist, track.title, track.timestamp));
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}
