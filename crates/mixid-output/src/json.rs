// SPDX-License-Identifier: GPL-3.0-or-later
use mixid_domain::{ScanResult, TrackEntry};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted JSON tracklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracklistDocument {
    pub source: String,
    pub duration: f64,
    pub segments_scanned: usize,
    pub tracks: Vec<TrackEntry>,
}

impl TracklistDocument {
    pub fn from_result(result: &ScanResult, source: &str) -> Self {
        Self {
            source: source.to_string(),
            duration: result.duration,
            segments_scanned: result.segments_scanned,
            tracks: result.tracks.clone(),
        }
    }
}

pub fn render_json(document: &TracklistDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub fn parse_json(json: &str) -> Result<TracklistDocument> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixid_domain::Match;

    fn document() -> TracklistDocument {
        let result = ScanResult {
            tracks: vec![
                TrackEntry::new(
                    0,
                    &Match::new("Higher State of Consciousness", "Josh Wink")
                        .with_album("Higher State of Consciousness")
                        .with_year("1995"),
                ),
                TrackEntry::new(3690, &Match::new("Rej", "Âme")),
            ],
            duration: 4012.5,
            segments_scanned: 133,
            duplicates_removed: 2,
        };
        TracklistDocument::from_result(&result, "peak-time.mp3")
    }

    #[test]
    fn round_trips_tracks_and_metadata() {
        let original = document();
        let parsed = parse_json(&render_json(&original).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn uses_documented_field_names() {
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&document()).unwrap()).unwrap();
        assert_eq!(value["source"], "peak-time.mp3");
        assert_eq!(value["segments_scanned"], 133);
        let second = &value["tracks"][1];
        assert_eq!(second["timestamp"], "1:01:30");
        assert_eq!(second["position_sec"], 3690);
        assert_eq!(second["album"], "");
        assert_eq!(second["year"], "");
        assert!(value.get("duplicates_removed").is_none());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse_json("{\"source\": 1}").is_err());
    }
}
