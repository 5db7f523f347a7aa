// src/error.rs
// Typed failure taxonomy for the feed pipelines.
//
// `Parse` is per-event and is swallowed at the smallest granularity (the
// offending event is dropped, the batch continues). `Upstream` is a
// recoverable per-source fetch failure. `Aggregation` means every source an
// endpoint requires was unavailable and is surfaced to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unparseable timestamp: {0:?}")]
    Parse(String),

    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("{0}")]
    Aggregation(String),
}
