// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mixid_audio::SegmentExtractor;
use mixid_domain::{format_timestamp, ScanConfig, ScanResult, SegmentRequest, SourceAudio};
use mixid_recognition::{Delay, RecognitionService, Recognizer};
use tracing::{info, instrument, warn};

use crate::dedupe::dedupe;
use crate::error::{Result, ScanError};
use crate::schedule::Schedule;
use crate::scratch::ScratchDir;
use crate::tracker::{Decision, SegmentOutcome, TransitionTracker};

/// Drives the scan: schedule, extract, recognize, track, dedupe.
///
/// Segments are processed strictly one after another.
pub struct Scanner<E, S> {
    extractor: E,
    recognizer: Recognizer<S>,
    delay: Arc<dyn Delay>,
    politeness_delay: Duration,
}

impl<E, S> Scanner<E, S>
where
    E: SegmentExtractor,
    S: RecognitionService,
{
    pub fn new(
        extractor: E,
        recognizer: Recognizer<S>,
        delay: Arc<dyn Delay>,
        politeness_delay: Duration,
    ) -> Self {
        Self {
            extractor,
            recognizer,
            delay,
            politeness_delay,
        }
    }

    /// Probe the file's duration, then scan it.
    pub async fn scan_file(&self, path: &Path, config: &ScanConfig) -> Result<ScanResult> {
        let duration = self
            .extractor
            .probe_duration(path)
            .await
            .map_err(ScanError::Probe)?;
        self.scan(&SourceAudio::new(path, duration), config).await
    }

    #[instrument(skip_all, fields(file = %source.file_name()))]
    pub async fn scan(&self, source: &SourceAudio, config: &ScanConfig) -> Result<ScanResult> {
        let schedule = Schedule::new(source.duration_secs, config);
        let total = schedule.total_segments();
        let scratch = ScratchDir::new()?;

        info!(
            target: "scanner",
            duration = %format_timestamp(source.duration_secs),
            step = config.step_secs,
            segment = config.segment_secs,
            start = config.start_secs,
            total,
            "starting scan"
        );

        let mut tracker = TransitionTracker::new();
        let mut scanned = 0usize;
        let mut pace_next = false;

        for request in schedule.requests() {
            scanned += 1;
            let position = format_timestamp(request.position_secs as f64);
            let progress = progress_percent(scanned, total);

            let segment = scratch.segment_file();
            let extracted = self
                .extractor
                .extract(source.path(), request, segment.path())
                .await;
            let pcm = match extracted {
                Ok(()) => segment.read().await,
                Err(err) => {
                    drop(segment);
                    self.ensure_source_readable(source).await?;
                    warn!(target: "scanner", %position, progress, error = %err, "extraction failed, skipping segment");
                    continue;
                }
            };
            let pcm = match pcm {
                Ok(pcm) => pcm,
                Err(err) => {
                    warn!(target: "scanner", %position, progress, error = %err, "segment unreadable, skipping");
                    continue;
                }
            };

            if pace_next {
                self.delay.wait(self.politeness_delay).await;
            }
            let outcome = self.recognize(&pcm, request, &position, progress).await;
            pace_next = true;

            match tracker.observe(request.position_secs, outcome.clone()) {
                Decision::NewTrack => {
                    if let SegmentOutcome::Matched(found) = &outcome {
                        info!(target: "scanner", %position, progress, artist = %found.artist, title = %found.title, "new track");
                    }
                }
                Decision::Repeat => {
                    if let SegmentOutcome::Matched(found) = &outcome {
                        info!(target: "scanner", %position, progress, artist = %found.artist, title = %found.title, "same track continues");
                    }
                }
                Decision::Reset => {}
            }
        }

        let raw = tracker.into_entries();
        let emitted = raw.len();
        let tracks = dedupe(raw);
        let duplicates_removed = emitted - tracks.len();

        info!(
            target: "scanner",
            segments = scanned,
            tracks = tracks.len(),
            duplicates_removed,
            "scan finished"
        );

        Ok(ScanResult {
            tracks,
            duration: source.duration_secs,
            segments_scanned: scanned,
            duplicates_removed,
        })
    }

    async fn recognize(
        &self,
        pcm: &[u8],
        request: SegmentRequest,
        position: &str,
        progress: u32,
    ) -> SegmentOutcome {
        match self.recognizer.recognize(pcm).await {
            Ok(Some(found)) => SegmentOutcome::Matched(found),
            Ok(None) => {
                info!(target: "scanner", %position, progress, "no match");
                SegmentOutcome::NoMatch
            }
            Err(err) => {
                warn!(
                    target: "scanner",
                    %position,
                    progress,
                    offset = request.position_secs,
                    error = %err,
                    "recognition failed"
                );
                SegmentOutcome::Failed
            }
        }
    }

    /// Extraction failures are skips unless the source itself has gone away.
    async fn ensure_source_readable(&self, source: &SourceAudio) -> Result<()> {
        match tokio::fs::metadata(source.path()).await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(target: "scanner", path = ?source.path(), error = %err, "source disappeared during scan");
                Err(ScanError::SourceUnreadable(source.path.clone()))
            }
        }
    }
}

fn progress_percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round() as u32
}
