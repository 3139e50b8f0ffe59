use thiserror::Error;

pub mod batch;
pub mod commands;
pub mod destination;
pub mod novelty;
pub mod orchestrator;
pub mod provider;
pub mod recency;
pub mod track;

/// Closed set of failure kinds the sync core knows how to react to.
///
/// `Transient` and `Malformed` failures are swallowed at the smallest
/// granularity (one source, one batch, one item) after being logged.
/// `Persistence` ends the current category and `Fatal` ends the run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    #[error("Transient remote failure")]
    Transient,
    #[error("Malformed item")]
    Malformed,
    #[error("Persistence failure")]
    Persistence,
    #[error("Fatal precondition failure")]
    Fatal,
}

pub type SyncResult<T> = error_stack::Result<T, SyncError>;

#[cfg(test)]
pub mod testing;
