use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Failure to read a host kernel interface.
///
/// This is the only error kind the snapshot queries surface: either the
/// backing interface answered and the snapshot is complete, or it did not
/// and the caller gets this. Individual processes that vanish during a
/// listing are not errors; they are counted in
/// [`ProcessListing::skipped`](crate::snapshot::ProcessListing::skipped).
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A kernel statistics or enumeration call could not be completed.
    /// `call` names the interface that failed; `source` carries the OS
    /// error or kernel return code.
    #[error("resource unavailable: {call}: {source}")]
    ResourceUnavailable {
        call: &'static str,
        #[source]
        source: io::Error,
    },
}

impl SnapshotError {
    pub(crate) fn unavailable(call: &'static str, source: io::Error) -> Self {
        tracing::debug!(call, error = %source, "host query failed");
        SnapshotError::ResourceUnavailable { call, source }
    }
}
