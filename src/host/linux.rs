//! Linux backend: procfs and sysconf reads.
//!
//! The field mapping mirrors the page-state model the records expose:
//! active and inactive sum their anon and file node counters, wired maps
//! to unevictable pages, and compressed to zswap residency on kernels
//! that export it (zero elsewhere). Byte values are pages times one page
//! size read per call, so alignment holds on this family too.

use std::collections::HashMap;
use std::fs;
use std::io;

use crate::error::{Result, SnapshotError};
use crate::snapshot::{
    CpuSnapshot, MemorySnapshot, PageCounts, ProcessListing, RawProcess, collect_processes,
};

pub fn memory_snapshot() -> Result<MemorySnapshot> {
    let page_size = sysconf_u64(libc::_SC_PAGESIZE, "sysconf(_SC_PAGESIZE)")?;
    let total_pages = sysconf_u64(libc::_SC_PHYS_PAGES, "sysconf(_SC_PHYS_PAGES)")?;
    let contents = fs::read_to_string("/proc/vmstat")
        .map_err(|err| SnapshotError::unavailable("/proc/vmstat", err))?;
    let counters = parse_vmstat(&contents);

    let counts = PageCounts {
        free: counter(&counters, "nr_free_pages"),
        active: counter(&counters, "nr_active_anon") + counter(&counters, "nr_active_file"),
        inactive: counter(&counters, "nr_inactive_anon") + counter(&counters, "nr_inactive_file"),
        wired: counter(&counters, "nr_unevictable"),
        compressed: counter(&counters, "nr_zswapped"),
    };

    MemorySnapshot::from_page_counts(
        total_pages.saturating_mul(page_size),
        counts,
        page_size,
    )
    .ok_or_else(|| {
        SnapshotError::unavailable(
            "sysconf(_SC_PHYS_PAGES)",
            io::Error::other("zero physical memory reported"),
        )
    })
}

pub fn cpu_snapshot() -> Result<CpuSnapshot> {
    let contents = fs::read_to_string("/proc/stat")
        .map_err(|err| SnapshotError::unavailable("/proc/stat", err))?;
    parse_cpu_line(&contents).ok_or_else(|| {
        SnapshotError::unavailable("/proc/stat", io::Error::other("malformed cpu line"))
    })
}

pub fn process_listing() -> Result<ProcessListing> {
    let page_size = sysconf_u64(libc::_SC_PAGESIZE, "sysconf(_SC_PAGESIZE)")?;
    let entries =
        fs::read_dir("/proc").map_err(|err| SnapshotError::unavailable("/proc", err))?;

    let mut pids = Vec::new();
    for entry in entries.flatten() {
        if let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() {
            pids.push(pid);
        }
    }

    Ok(collect_processes(pids, |pid| inspect_pid(pid, page_size)))
}

fn sysconf_u64(name: libc::c_int, call: &'static str) -> Result<u64> {
    let value = unsafe { libc::sysconf(name) };
    if value <= 0 {
        return Err(SnapshotError::unavailable(call, io::Error::last_os_error()));
    }
    Ok(value as u64)
}

fn parse_vmstat(contents: &str) -> HashMap<&str, u64> {
    let mut counters = HashMap::new();
    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(key), Some(value)) = (parts.next(), parts.next())
            && let Ok(value) = value.parse::<u64>()
        {
            counters.insert(key, value);
        }
    }
    counters
}

fn counter(counters: &HashMap<&str, u64>, key: &str) -> u64 {
    counters.get(key).copied().unwrap_or(0)
}

/// First line of /proc/stat: `cpu  user nice system idle ...`.
fn parse_cpu_line(stat: &str) -> Option<CpuSnapshot> {
    let line = stat.lines().next()?;
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let user = fields.next()?.parse().ok()?;
    let nice = fields.next()?.parse().ok()?;
    let system = fields.next()?.parse().ok()?;
    let idle = fields.next()?.parse().ok()?;
    Some(CpuSnapshot { user, system, idle, nice })
}

/// Sample one pid from procfs. Any read failure means the process exited
/// or refused inspection; the caller counts it and moves on.
fn inspect_pid(pid: u32, page_size: u64) -> Option<RawProcess> {
    let statm = fs::read_to_string(format!("/proc/{pid}/statm")).ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;

    let stat = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let cpu_time = parse_stat_cpu_time(&stat)?;

    // Unreadable for other users' processes and kernel threads; those
    // records keep the sentinel name.
    let exe_path = fs::read_link(format!("/proc/{pid}/exe"))
        .ok()
        .map(|path| path.to_string_lossy().into_owned());

    Some(RawProcess {
        exe_path,
        resident_bytes: resident_pages.saturating_mul(page_size),
        cpu_time,
    })
}

/// utime + stime from /proc/<pid>/stat. The comm field may itself contain
/// spaces and parens, so fields are counted after the last `)`.
fn parse_stat_cpu_time(stat: &str) -> Option<u64> {
    let after_comm = stat.rfind(')')? + 1;
    let fields: Vec<&str> = stat[after_comm..].split_whitespace().collect();
    // After comm: state(0) ppid(1) ... utime(11) stime(12).
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some(utime + stime)
}
