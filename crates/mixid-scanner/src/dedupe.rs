// SPDX-License-Identifier: GPL-3.0-or-later
use mixid_domain::TrackEntry;

/// Drop entries that repeat the previous retained entry's title and artist.
pub fn dedupe(mut tracks: Vec<TrackEntry>) -> Vec<TrackEntry> {
    tracks.dedup_by(|current, retained| current.same_track(retained));
    tracks
}
