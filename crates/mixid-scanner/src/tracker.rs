// SPDX-License-Identifier: GPL-3.0-or-later
use mixid_domain::{Match, TrackEntry};

/// What recognition said about one scheduled position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Matched(Match),
    NoMatch,
    Failed,
}

/// How the tracker handled an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A new track started here and an entry was appended.
    NewTrack,
    /// Same track as the last accepted match; treated as continuation.
    Repeat,
    /// Gap (no match or failure); the next match starts fresh.
    Reset,
}

/// Turns per-segment outcomes into track starts, absorbing crossfade bounce.
///
/// Scoped to a single scan.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    last_accepted: Option<Match>,
    entries: Vec<TrackEntry>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the outcome for `position_sec`. Positions must be non-decreasing.
    pub fn observe(&mut self, position_sec: u64, outcome: SegmentOutcome) -> Decision {
        debug_assert!(self
            .entries
            .last()
            .map_or(true, |last| last.position_sec <= position_sec));

        match outcome {
            SegmentOutcome::Failed | SegmentOutcome::NoMatch => {
                self.last_accepted = None;
                Decision::Reset
            }
            SegmentOutcome::Matched(found) => {
                if self
                    .last_accepted
                    .as_ref()
                    .is_some_and(|last| last.same_track(&found))
                {
                    return Decision::Repeat;
                }
                self.entries.push(TrackEntry::new(position_sec, &found));
                self.last_accepted = Some(found);
                Decision::NewTrack
            }
        }
    }

    pub fn into_entries(self) -> Vec<TrackEntry> {
        self.entries
    }
}
