// SPDX-License-Identifier: GPL-3.0-or-later
use mixid_domain::ScanResult;

const RULE_WIDTH: usize = 50;

/// Human-readable tracklist printed after a scan.
pub fn tracklist(result: &ScanResult, name: &str) -> String {
    let rule = "─".repeat(RULE_WIDTH);
    let mut lines = vec![String::new(), rule.clone(), format!("TRACKLIST — {}", name), rule.clone()];

    for (i, track) in result.tracks.iter().enumerate() {
        let album = track
            .album
            .as_deref()
            .map(|album| format!(" [{}]", album))
            .unwrap_or_default();
        lines.push(format!(
            "{:>2}. [{}] {} — {}{}",
            i + 1,
            track.timestamp,
            track.artist,
            track.title,
            album
        ));
    }

    if result.duplicates_removed > 0 {
        lines.push(String::new());
        lines.push(format!("{} duplicate(s) removed", result.duplicates_removed));
    }
    lines.push(rule);
    lines.join("\n")
}

/// Size in megabytes with one decimal, e.g. `12.3 MB`.
pub fn file_size(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}
