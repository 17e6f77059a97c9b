//! Snapshot records and the pure derivations behind them.
//!
//! Everything in this module is kernel-free: the host families hand in raw
//! counters and paths, and this module turns them into the records callers
//! receive. Records are plain owned values; nothing here caches state
//! between calls.

use serde::Serialize;

/// Resident-set floor below which a process is excluded from listings.
pub const MIN_RESIDENT_BYTES: u64 = 1024 * 1024;

/// Display name used when an executable path cannot be resolved.
pub const UNKNOWN_PROCESS_NAME: &str = "Unknown";

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// System-wide physical memory statistics at one instant.
///
/// All byte fields are multiples of the host page size read in the same
/// pass, so consumers can recover page counts exactly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemorySnapshot {
    /// Physical memory installed, in bytes.
    pub total: u64,
    pub free: u64,
    pub active: u64,
    pub inactive: u64,
    /// Pages pinned in memory (unevictable).
    pub wired: u64,
    /// Pages held by the memory compressor, in their compressed home.
    pub compressed: u64,
    /// `active + inactive + wired + compressed`.
    pub used: u64,
    /// `used / total * 100`. Deliberately unclamped: the page counters and
    /// the total come from separate kernel reads, so the ratio can
    /// transiently exceed 100 when the kernel moves pages between them.
    pub pressure: f64,
}

/// Kernel page counters backing a [`MemorySnapshot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageCounts {
    pub free: u64,
    pub active: u64,
    pub inactive: u64,
    pub wired: u64,
    pub compressed: u64,
}

impl MemorySnapshot {
    /// Build a snapshot from raw page counters.
    ///
    /// `total` is the installed physical memory in bytes; the page counters
    /// are scaled by `page_size`. Returns `None` when the total is zero or
    /// any scaled counter overflows `u64`, both impossible readings that
    /// callers must surface as acquisition failures rather than zeroed
    /// records.
    pub fn from_page_counts(total: u64, counts: PageCounts, page_size: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let free = counts.free.checked_mul(page_size)?;
        let active = counts.active.checked_mul(page_size)?;
        let inactive = counts.inactive.checked_mul(page_size)?;
        let wired = counts.wired.checked_mul(page_size)?;
        let compressed = counts.compressed.checked_mul(page_size)?;
        let used = active
            .checked_add(inactive)?
            .checked_add(wired)?
            .checked_add(compressed)?;
        Some(MemorySnapshot {
            total,
            free,
            active,
            inactive,
            wired,
            compressed,
            used,
            pressure: used as f64 / total as f64 * 100.0,
        })
    }
}

/// Aggregate CPU tick counters accumulated since boot, summed across all
/// cores. Tick length is a host unit; only ratios of deltas are portable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CpuSnapshot {
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub nice: u64,
}

impl CpuSnapshot {
    /// Sum of all four counters.
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.nice)
    }

    /// Busy share of the interval between `earlier` and `self`, as a
    /// percentage in `0.0..=100.0`. Returns `None` when no ticks elapsed.
    /// Counter regressions saturate to zero rather than wrapping.
    pub fn usage_since(&self, earlier: &CpuSnapshot) -> Option<f32> {
        let busy = self
            .user
            .saturating_sub(earlier.user)
            .saturating_add(self.system.saturating_sub(earlier.system))
            .saturating_add(self.nice.saturating_sub(earlier.nice));
        let idle = self.idle.saturating_sub(earlier.idle);
        let total = busy.saturating_add(idle);
        if total == 0 {
            return None;
        }
        Some(busy as f32 / total as f32 * 100.0)
    }
}

/// One process's resident memory and cumulative CPU accounting.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    pub pid: u32,
    /// Final segment of the executable path, or [`UNKNOWN_PROCESS_NAME`]
    /// when the path could not be resolved. Never empty.
    pub name: String,
    /// Resident set size in bytes.
    pub memory_bytes: u64,
    /// `memory_bytes / 1_048_576.0`, kept alongside the byte value for
    /// consumers that want the scaled form without re-deriving it.
    #[serde(rename = "memoryMB")]
    pub memory_mb: f64,
    /// Cumulative user plus system time in the host's own unit. Comparable
    /// between snapshots on one host, not across hosts.
    pub cpu_time: u64,
}

impl ProcessSnapshot {
    /// Assemble one record from a raw sample. Pure derivation; the
    /// resident floor is applied by [`collect_processes`], not here.
    pub fn from_raw(pid: u32, raw: RawProcess) -> Self {
        ProcessSnapshot {
            pid,
            name: display_name(raw.exe_path.as_deref()),
            memory_bytes: raw.resident_bytes,
            memory_mb: raw.resident_bytes as f64 / BYTES_PER_MIB,
            cpu_time: raw.cpu_time,
        }
    }
}

/// Raw per-process sample produced by a host family before assembly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawProcess {
    /// Absolute executable path, when the host could resolve one.
    pub exe_path: Option<String>,
    /// Resident set size in bytes.
    pub resident_bytes: u64,
    /// Cumulative user plus system time in the host's tick unit.
    pub cpu_time: u64,
}

/// Result of one pass over the live process table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProcessListing {
    /// Surviving records, in host enumeration order. No ordering is
    /// imposed here; sorting is a presentation concern.
    pub processes: Vec<ProcessSnapshot>,
    /// Ids whose detail query failed between enumeration and inspection.
    /// Those processes exited or refused inspection; on a live table this
    /// is expected churn, not an error.
    pub skipped: usize,
}

/// Derive a display name from an executable path: the last non-empty path
/// segment. Missing or degenerate paths yield the sentinel, never an empty
/// string.
pub fn display_name(exe_path: Option<&str>) -> String {
    let Some(path) = exe_path else {
        return UNKNOWN_PROCESS_NAME.to_string();
    };
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map_or_else(|| UNKNOWN_PROCESS_NAME.to_string(), str::to_string)
}

/// Shared listing loop for every host family.
///
/// Walks `pids` in order, asking `inspect` for a raw sample per id. The
/// id-0 kernel sentinel is passed over without inspection. A `None` sample
/// counts toward `skipped`; samples below [`MIN_RESIDENT_BYTES`] are
/// dropped without counting. Enumeration order is preserved.
pub fn collect_processes<I, F>(pids: I, mut inspect: F) -> ProcessListing
where
    I: IntoIterator<Item = u32>,
    F: FnMut(u32) -> Option<RawProcess>,
{
    let mut processes = Vec::new();
    let mut skipped = 0usize;

    for pid in pids {
        if pid == 0 {
            continue;
        }
        let Some(raw) = inspect(pid) else {
            skipped += 1;
            continue;
        };
        if raw.resident_bytes < MIN_RESIDENT_BYTES {
            continue;
        }
        processes.push(ProcessSnapshot::from_raw(pid, raw));
    }

    tracing::debug!(kept = processes.len(), skipped, "assembled process listing");

    ProcessListing { processes, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(bytes: u64) -> RawProcess {
        RawProcess {
            exe_path: Some("/usr/bin/thing".to_string()),
            resident_bytes: bytes,
            cpu_time: 0,
        }
    }

    #[test]
    fn memory_snapshot_scales_and_sums_page_counts() {
        let counts = PageCounts {
            free: 100,
            active: 40,
            inactive: 30,
            wired: 20,
            compressed: 10,
        };
        let snapshot = MemorySnapshot::from_page_counts(4_096_000, counts, 4096).unwrap();
        assert_eq!(snapshot.total, 4_096_000);
        assert_eq!(snapshot.free, 409_600);
        assert_eq!(snapshot.active, 163_840);
        assert_eq!(snapshot.inactive, 122_880);
        assert_eq!(snapshot.wired, 81_920);
        assert_eq!(snapshot.compressed, 40_960);
        assert_eq!(snapshot.used, 409_600);
        assert_eq!(snapshot.pressure, 10.0);
    }

    #[test]
    fn memory_snapshot_rejects_zero_total() {
        assert!(MemorySnapshot::from_page_counts(0, PageCounts::default(), 4096).is_none());
    }

    #[test]
    fn memory_snapshot_rejects_counter_overflow() {
        let counts = PageCounts {
            free: u64::MAX,
            ..PageCounts::default()
        };
        assert!(MemorySnapshot::from_page_counts(1024, counts, 4096).is_none());
    }

    #[test]
    fn pressure_can_exceed_one_hundred() {
        let counts = PageCounts {
            active: 3,
            ..PageCounts::default()
        };
        let snapshot = MemorySnapshot::from_page_counts(8192, counts, 4096).unwrap();
        assert_eq!(snapshot.pressure, 150.0);
    }

    #[test]
    fn display_name_takes_the_last_path_segment() {
        assert_eq!(display_name(Some("/usr/sbin/mDNSResponder")), "mDNSResponder");
        assert_eq!(display_name(Some("/opt/app/bin/")), "bin");
        assert_eq!(display_name(Some("launchd")), "launchd");
    }

    #[test]
    fn display_name_falls_back_to_the_sentinel() {
        assert_eq!(display_name(None), UNKNOWN_PROCESS_NAME);
        assert_eq!(display_name(Some("")), UNKNOWN_PROCESS_NAME);
        assert_eq!(display_name(Some("///")), UNKNOWN_PROCESS_NAME);
    }

    #[test]
    fn from_raw_derives_the_scaled_size() {
        let snapshot = ProcessSnapshot::from_raw(42, raw(3 * 1024 * 1024));
        assert_eq!(snapshot.pid, 42);
        assert_eq!(snapshot.name, "thing");
        assert_eq!(snapshot.memory_bytes, 3 * 1024 * 1024);
        assert_eq!(snapshot.memory_mb, 3.0);
    }

    #[test]
    fn collect_skips_pid_zero_without_counting_it() {
        let listing = collect_processes([0, 7], |pid| {
            assert_ne!(pid, 0, "the kernel sentinel must never be inspected");
            Some(raw(2 * 1024 * 1024))
        });
        assert_eq!(listing.processes.len(), 1);
        assert_eq!(listing.processes[0].pid, 7);
        assert_eq!(listing.skipped, 0);
    }

    #[test]
    fn collect_counts_vanished_processes() {
        let listing = collect_processes([1, 2, 3], |pid| {
            (pid != 2).then(|| raw(2 * 1024 * 1024))
        });
        let pids: Vec<u32> = listing.processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 3]);
        assert_eq!(listing.skipped, 1);
    }

    #[test]
    fn collect_applies_the_resident_floor_inclusively() {
        let listing = collect_processes([1, 2], |pid| match pid {
            1 => Some(raw(MIN_RESIDENT_BYTES)),
            _ => Some(raw(MIN_RESIDENT_BYTES - 1)),
        });
        assert_eq!(listing.processes.len(), 1);
        assert_eq!(listing.processes[0].pid, 1);
        assert_eq!(listing.skipped, 0, "filtered processes are not failures");
    }

    #[test]
    fn collect_preserves_enumeration_order() {
        let listing = collect_processes([9, 3, 7, 1], |_| Some(raw(2 * 1024 * 1024)));
        let pids: Vec<u32> = listing.processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![9, 3, 7, 1]);
    }

    #[test]
    fn usage_since_reports_the_busy_share() {
        let earlier = CpuSnapshot { user: 100, system: 50, idle: 800, nice: 0 };
        let later = CpuSnapshot { user: 130, system: 60, idle: 860, nice: 0 };
        let usage = later.usage_since(&earlier).unwrap();
        assert!((usage - 40.0).abs() < 1e-5);
    }

    #[test]
    fn usage_since_is_none_when_no_ticks_elapsed() {
        let ticks = CpuSnapshot { user: 1, system: 2, idle: 3, nice: 4 };
        assert_eq!(ticks.usage_since(&ticks), None);
    }

    #[test]
    fn usage_since_saturates_counter_regressions() {
        let earlier = CpuSnapshot { user: 500, system: 500, idle: 500, nice: 500 };
        let later = CpuSnapshot { user: 10, system: 10, idle: 600, nice: 10 };
        assert_eq!(later.usage_since(&earlier), Some(0.0));
    }
}
