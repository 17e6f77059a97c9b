//! Report assembly: gather the three snapshot queries over the provider
//! interface and render them as text or JSON.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::format::{format_bytes, format_ticks, truncate_name};
use crate::provider::SnapshotProvider;
use crate::snapshot::{CpuSnapshot, MemorySnapshot, ProcessSnapshot};

const NAME_COLUMN_WIDTH: usize = 40;

/// Presentation-side ordering for the process table. The listing itself
/// keeps host enumeration order; sorting happens only when rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Memory,
    Cpu,
    Pid,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "memory" => Some(SortKey::Memory),
            "cpu" => Some(SortKey::Cpu),
            "pid" => Some(SortKey::Pid),
            _ => None,
        }
    }
}

/// One full gathering of the three snapshot queries.
#[derive(Clone, Debug, Serialize)]
pub struct HostReport {
    pub memory: MemorySnapshot,
    pub cpu: CpuSnapshot,
    pub processes: Vec<ProcessSnapshot>,
    /// Ids that vanished between enumeration and inspection.
    pub skipped: usize,
}

impl HostReport {
    /// Run all three queries against `provider`. A memory or CPU failure
    /// aborts the report; per-process churn is already absorbed into
    /// `skipped` by the listing itself.
    pub fn gather(provider: &dyn SnapshotProvider) -> Result<Self> {
        let memory = provider.memory()?;
        let cpu = provider.cpu()?;
        let listing = provider.processes()?;
        Ok(HostReport {
            memory,
            cpu,
            processes: listing.processes,
            skipped: listing.skipped,
        })
    }

    /// Order the process table for display and drop everything beyond
    /// `top`. Memory and CPU orders are descending, pid ascending.
    pub fn sort_and_truncate(&mut self, key: SortKey, top: usize) {
        match key {
            SortKey::Memory => self
                .processes
                .sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes)),
            SortKey::Cpu => self.processes.sort_by(|a, b| b.cpu_time.cmp(&a.cpu_time)),
            SortKey::Pid => self.processes.sort_by_key(|p| p.pid),
        }
        self.processes.truncate(top);
    }

    /// Render the aligned text report. `cpu_usage` is the busy share
    /// derived from the previous watch tick, when one exists.
    pub fn render_text(&self, cpu_usage: Option<f32>) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "memory   total {}   used {} (pressure {:.1}%)",
            format_bytes(self.memory.total),
            format_bytes(self.memory.used),
            self.memory.pressure,
        );
        let _ = writeln!(
            out,
            "         free {}   active {}   inactive {}   wired {}   compressed {}",
            format_bytes(self.memory.free),
            format_bytes(self.memory.active),
            format_bytes(self.memory.inactive),
            format_bytes(self.memory.wired),
            format_bytes(self.memory.compressed),
        );

        let _ = write!(
            out,
            "cpu      user {}   system {}   idle {}   nice {}",
            format_ticks(self.cpu.user),
            format_ticks(self.cpu.system),
            format_ticks(self.cpu.idle),
            format_ticks(self.cpu.nice),
        );
        if let Some(usage) = cpu_usage {
            let _ = write!(out, "   busy {usage:.1}%");
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "processes  {} shown, {} skipped",
            self.processes.len(),
            self.skipped,
        );
        let _ = writeln!(out, "{:>7}  {:>10}  {:>12}  NAME", "PID", "MEMORY", "CPU TICKS");
        for process in &self.processes {
            let _ = writeln!(
                out,
                "{:>7}  {:>10}  {:>12}  {}",
                process.pid,
                format_bytes(process.memory_bytes),
                format_ticks(process.cpu_time),
                truncate_name(&process.name, NAME_COLUMN_WIDTH),
            );
        }

        out
    }
}
