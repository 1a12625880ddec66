// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecognitionError>;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    /// The service answered with something other than a structured reply,
    /// typically an HTML page served while throttling.
    #[error("Rate limited by recognition service: {0}")]
    RateLimited(String),

    #[error("Still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("Recognition API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RecognitionError {
    /// Whether this failure should be retried with backoff.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RecognitionError::RateLimited(_))
    }
}
