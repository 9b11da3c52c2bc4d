//! Process working-set probe used by the benchmark harness.

/// Resident-set figures for the current process, in bytes. All zero when the
/// platform offers no cheap way to read them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessMemoryInfo {
    pub working_set_bytes: usize,
    pub peak_working_set_bytes: usize,
}

pub fn process_memory_info() -> ProcessMemoryInfo {
    #[cfg(target_os = "linux")]
    {
        match std::fs::read_to_string("/proc/self/status") {
            Ok(status) => parse_proc_status(&status),
            Err(e) => {
                tracing::debug!(error = %e, "cannot read /proc/self/status");
                ProcessMemoryInfo::default()
            }
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        ProcessMemoryInfo::default()
    }
}

/// Extracts `VmRSS` and `VmHWM` (reported in kB) from `/proc/<pid>/status`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_proc_status(status: &str) -> ProcessMemoryInfo {
    let field = |name: &str| -> usize {
        status
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<usize>().ok())
            .map_or(0, |kb| kb * 1024)
    };
    ProcessMemoryInfo {
        working_set_bytes: field("VmRSS:"),
        peak_working_set_bytes: field("VmHWM:"),
    }
}
