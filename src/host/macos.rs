//! Darwin backend: mach host statistics, sysctl, and libproc.

use std::io;
use std::mem;
use std::ptr;

use libproc::libproc::proc_pid::{pidinfo, pidpath};
use libproc::libproc::task_info::TaskAllInfo;
use libproc::processes::{ProcFilter, pids_by_type};

use crate::error::{Result, SnapshotError};
use crate::snapshot::{
    CpuSnapshot, MemorySnapshot, PageCounts, ProcessListing, RawProcess, collect_processes,
};

type MachPortT = libc::c_uint;
type KernReturnT = libc::c_int;
type NaturalT = libc::c_uint;

const KERN_SUCCESS: KernReturnT = 0;
const HOST_VM_INFO64: libc::c_int = 4;
const HOST_CPU_LOAD_INFO: libc::c_int = 3;

const CPU_STATE_USER: usize = 0;
const CPU_STATE_SYSTEM: usize = 1;
const CPU_STATE_IDLE: usize = 2;
const CPU_STATE_NICE: usize = 3;
const CPU_STATE_MAX: usize = 4;

/// mach/vm_statistics.h `vm_statistics64_data_t`. Field order and widths
/// must match the kernel struct exactly; the counts are in pages.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
struct VmStatistics64 {
    free_count: NaturalT,
    active_count: NaturalT,
    inactive_count: NaturalT,
    wire_count: NaturalT,
    zero_fill_count: u64,
    reactivations: u64,
    pageins: u64,
    pageouts: u64,
    faults: u64,
    cow_faults: u64,
    lookups: u64,
    hits: u64,
    purges: u64,
    purgeable_count: NaturalT,
    speculative_count: NaturalT,
    decompressions: u64,
    compressions: u64,
    swapins: u64,
    swapouts: u64,
    compressor_page_count: NaturalT,
    throttled_count: NaturalT,
    external_page_count: NaturalT,
    internal_page_count: NaturalT,
    total_uncompressed_pages_in_compressor: u64,
}

/// mach/host_info.h `host_cpu_load_info_data_t`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
struct HostCpuLoadInfo {
    cpu_ticks: [NaturalT; CPU_STATE_MAX],
}

unsafe extern "C" {
    fn mach_host_self() -> MachPortT;
    fn host_statistics64(
        host: MachPortT,
        flavor: libc::c_int,
        info: *mut libc::c_int,
        count: *mut NaturalT,
    ) -> KernReturnT;
    fn host_statistics(
        host: MachPortT,
        flavor: libc::c_int,
        info: *mut libc::c_int,
        count: *mut NaturalT,
    ) -> KernReturnT;
}

pub fn memory_snapshot() -> Result<MemorySnapshot> {
    let mut stats = VmStatistics64::default();
    let mut count = info_count::<VmStatistics64>();
    let kr = unsafe {
        host_statistics64(
            mach_host_self(),
            HOST_VM_INFO64,
            &mut stats as *mut VmStatistics64 as *mut libc::c_int,
            &mut count,
        )
    };
    if kr != KERN_SUCCESS {
        return Err(SnapshotError::unavailable("host_statistics64", kern_error(kr)));
    }

    let page_size = sysctl_u64(c"hw.pagesize", "sysctl(hw.pagesize)")?;
    let total = sysctl_u64(c"hw.memsize", "sysctl(hw.memsize)")?;

    let counts = PageCounts {
        free: u64::from(stats.free_count),
        active: u64::from(stats.active_count),
        inactive: u64::from(stats.inactive_count),
        wired: u64::from(stats.wire_count),
        compressed: u64::from(stats.compressor_page_count),
    };

    MemorySnapshot::from_page_counts(total, counts, page_size).ok_or_else(|| {
        SnapshotError::unavailable(
            "sysctl(hw.memsize)",
            io::Error::other("zero physical memory reported"),
        )
    })
}

pub fn cpu_snapshot() -> Result<CpuSnapshot> {
    let mut load = HostCpuLoadInfo::default();
    let mut count = info_count::<HostCpuLoadInfo>();
    let kr = unsafe {
        host_statistics(
            mach_host_self(),
            HOST_CPU_LOAD_INFO,
            &mut load as *mut HostCpuLoadInfo as *mut libc::c_int,
            &mut count,
        )
    };
    if kr != KERN_SUCCESS {
        return Err(SnapshotError::unavailable("host_statistics", kern_error(kr)));
    }
    Ok(CpuSnapshot {
        user: u64::from(load.cpu_ticks[CPU_STATE_USER]),
        system: u64::from(load.cpu_ticks[CPU_STATE_SYSTEM]),
        idle: u64::from(load.cpu_ticks[CPU_STATE_IDLE]),
        nice: u64::from(load.cpu_ticks[CPU_STATE_NICE]),
    })
}

pub fn process_listing() -> Result<ProcessListing> {
    let pids = pids_by_type(ProcFilter::All).map_err(|err| {
        SnapshotError::unavailable("proc_listpids", io::Error::other(err.to_string()))
    })?;
    Ok(collect_processes(pids, inspect_pid))
}

/// Sample one pid via libproc. A failed task query means the process
/// exited or refused inspection; a failed path lookup only loses the
/// display name.
fn inspect_pid(pid: u32) -> Option<RawProcess> {
    let info = pidinfo::<TaskAllInfo>(pid as i32, 0).ok()?;
    let exe_path = pidpath(pid as i32).ok();
    Some(RawProcess {
        exe_path,
        resident_bytes: info.ptinfo.pti_resident_size,
        cpu_time: info.ptinfo.pti_total_user + info.ptinfo.pti_total_system,
    })
}

/// Element count the mach info calls expect: the struct size in
/// `integer_t` units.
fn info_count<T>() -> NaturalT {
    (mem::size_of::<T>() / mem::size_of::<libc::c_int>()) as NaturalT
}

fn kern_error(kr: KernReturnT) -> io::Error {
    io::Error::other(format!("kern_return_t {kr}"))
}

fn sysctl_u64(name: &std::ffi::CStr, call: &'static str) -> Result<u64> {
    let mut value: u64 = 0;
    let mut len = mem::size_of::<u64>();
    let rc = unsafe {
        libc::sysctlbyname(
            name.as_ptr(),
            &mut value as *mut u64 as *mut libc::c_void,
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(SnapshotError::unavailable(call, io::Error::last_os_error()));
    }
    Ok(value)
}
