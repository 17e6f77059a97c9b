//! Point-in-time host resource snapshots.
//!
//! `hostsnap` answers three questions about the machine it runs on, each
//! with one synchronous pass over the host's kernel interfaces:
//!
//! - how physical memory is distributed right now ([`MemorySnapshot`])
//! - how many CPU ticks the host has accumulated since boot
//!   ([`CpuSnapshot`])
//! - which processes are resident and what they have consumed
//!   ([`ProcessListing`])
//!
//! Callers talk to the [`SnapshotProvider`] trait; [`HostProvider`] is
//! the implementation backed by the running host's kernel family (mach
//! and libproc on macOS, procfs on Linux). Every record is an immutable
//! value owned by the caller. Nothing is cached or retried; sampling
//! cadence and history belong to the caller.
//!
//! ```no_run
//! use hostsnap::{HostProvider, SnapshotProvider};
//!
//! fn main() -> hostsnap::Result<()> {
//!     let provider = HostProvider::new();
//!     let memory = provider.memory()?;
//!     println!("pressure {:.1}%", memory.pressure);
//!     for process in provider.processes()?.processes {
//!         println!("{:>7}  {:>14}  {}", process.pid, process.memory_bytes, process.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod host;
pub mod provider;
pub mod report;
pub mod snapshot;

pub use error::{Result, SnapshotError};
pub use host::HostProvider;
pub use provider::SnapshotProvider;
pub use snapshot::{
    CpuSnapshot, MIN_RESIDENT_BYTES, MemorySnapshot, PageCounts, ProcessListing, ProcessSnapshot,
    RawProcess, UNKNOWN_PROCESS_NAME,
};
