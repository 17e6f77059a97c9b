//! The host-facing query surface.

use crate::error::Result;
use crate::snapshot::{CpuSnapshot, MemorySnapshot, ProcessListing};

/// A source of point-in-time host resource snapshots.
///
/// One implementation exists per host family; callers depend only on this
/// trait so no host-specific call surface leaks into consuming code, and
/// tests can substitute deterministic providers. Every query is a
/// synchronous single-shot read with no shared state, so a provider may be
/// handed to any number of concurrent callers.
pub trait SnapshotProvider {
    /// System-wide physical memory statistics.
    ///
    /// All-or-nothing: any failure of the backing kernel query is
    /// [`ResourceUnavailable`](crate::error::SnapshotError), never a
    /// partially filled or zeroed record.
    fn memory(&self) -> Result<MemorySnapshot>;

    /// Aggregate CPU tick counters for the whole host, summed across
    /// cores. Per-core breakdowns are out of scope.
    fn cpu(&self) -> Result<CpuSnapshot>;

    /// One pass over the live process table.
    ///
    /// Fails only when the initial id enumeration cannot produce a list.
    /// Individual processes that exit or refuse inspection mid-walk are
    /// absent from the result and counted in
    /// [`ProcessListing::skipped`]. A live table cannot be read
    /// atomically, so some churn is expected on every call.
    fn processes(&self) -> Result<ProcessListing>;
}
