// SPDX-License-Identifier: GPL-3.0-or-later
pub mod dedupe;
pub mod error;
pub mod scanner;
pub mod schedule;
pub mod scratch;
pub mod tracker;

pub use dedupe::dedupe;
pub use error::{Result, ScanError};
pub use scanner::Scanner;
pub use schedule::Schedule;
pub use tracker::{Decision, SegmentOutcome, TransitionTracker};
