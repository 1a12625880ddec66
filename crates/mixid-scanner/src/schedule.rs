// SPDX-License-Identifier: GPL-3.0-or-later
use mixid_domain::{ScanConfig, SegmentRequest};

/// Sample positions across a recording of known duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    duration: f64,
    step: u64,
    segment: u64,
    start: u64,
}

impl Schedule {
    pub fn new(duration_secs: f64, config: &ScanConfig) -> Self {
        Self {
            duration: duration_secs,
            step: config.step_secs,
            segment: config.segment_secs,
            start: config.start_secs,
        }
    }

    /// `start, start + step, ...` while the whole segment fits in the recording.
    /// Each call starts over from the first position.
    pub fn positions(&self) -> Positions {
        Positions {
            next: Some(self.start),
            step: self.step,
            segment: self.segment,
            duration: self.duration,
        }
    }

    pub fn requests(&self) -> impl Iterator<Item = SegmentRequest> + '_ {
        self.positions().map(|position_secs| SegmentRequest {
            position_secs,
            duration_secs: self.segment,
        })
    }

    /// `floor((duration - segment) / step) + 1`, ignoring the start offset.
    /// Only used for progress display.
    pub fn total_segments(&self) -> usize {
        if self.step == 0 || !self.duration.is_finite() {
            return 0;
        }
        let span = self.duration - self.segment as f64;
        if span < 0.0 {
            return 0;
        }
        (span / self.step as f64).floor() as usize + 1
    }
}

#[derive(Debug, Clone)]
pub struct Positions {
    next: Option<u64>,
    step: u64,
    segment: u64,
    duration: f64,
}

impl Iterator for Positions {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.step == 0 {
            return None;
        }
        let position = self.next?;
        let end = position.checked_add(self.segment)?;
        if end as f64 > self.duration {
            self.next = None;
            return None;
        }
        self.next = position.checked_add(self.step);
        Some(position)
    }
}
