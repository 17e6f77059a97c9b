//! Host family backends.
//!
//! One submodule per supported kernel family, selected at compile time.
//! Each backend exposes the same three free functions and stays private;
//! [`HostProvider`] is the only way in.

use crate::error::Result;
use crate::provider::SnapshotProvider;
use crate::snapshot::{CpuSnapshot, MemorySnapshot, ProcessListing};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
use linux as host_impl;
#[cfg(target_os = "macos")]
use macos as host_impl;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
compile_error!("hostsnap supports macOS and Linux hosts only");

/// Snapshot provider backed by the running host's kernel interfaces.
///
/// Stateless: every call reads the kernel afresh and returns an
/// independent record, so a single value can serve concurrent callers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostProvider;

impl HostProvider {
    pub fn new() -> Self {
        HostProvider
    }
}

impl SnapshotProvider for HostProvider {
    fn memory(&self) -> Result<MemorySnapshot> {
        host_impl::memory_snapshot()
    }

    fn cpu(&self) -> Result<CpuSnapshot> {
        host_impl::cpu_snapshot()
    }

    fn processes(&self) -> Result<ProcessListing> {
        host_impl::process_listing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MIN_RESIDENT_BYTES;

    #[test]
    fn live_memory_snapshot_is_consistent() {
        let memory = HostProvider::new().memory().expect("memory snapshot");
        assert!(memory.total > 0);
        assert_eq!(
            memory.used,
            memory.active + memory.inactive + memory.wired + memory.compressed
        );
        assert!(memory.pressure > 0.0);
    }

    #[test]
    fn live_cpu_ticks_are_populated() {
        let cpu = HostProvider::new().cpu().expect("cpu snapshot");
        assert!(cpu.total() > 0);
    }

    #[test]
    fn live_listing_honors_the_resident_floor() {
        let listing = HostProvider::new().processes().expect("process listing");
        assert!(!listing.processes.is_empty());
        for process in &listing.processes {
            assert!(process.pid > 0);
            assert!(process.memory_bytes >= MIN_RESIDENT_BYTES);
            assert!(!process.name.is_empty());
        }
    }
}
