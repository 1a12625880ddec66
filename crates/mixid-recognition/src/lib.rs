// SPDX-License-Identifier: GPL-3.0-or-later

//! Track recognition against an external audio-recognition service.
//!
//! This crate provides:
//! - The `RecognitionService` seam and an HTTP client for AudD-compatible APIs
//! - Classification of rate-limited responses (HTML pages served under load)
//! - A `Recognizer` that retries rate-limited segments with exponential backoff
//! - An injectable `Delay` so timed waits can be replaced in tests

pub mod audd;
pub mod delay;
pub mod error;
pub mod recognizer;

pub use audd::{AuddClient, AuddClientBuilder};
pub use delay::{Delay, TokioDelay};
#[cfg(any(test, feature = "test-util"))]
pub use delay::RecordingDelay;
pub use error::{RecognitionError, Result};
pub use recognizer::{RecognitionService, Recognizer, RetryPolicy};
