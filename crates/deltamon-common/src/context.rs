//! Host-wide facts, queried once at startup.
//!
//! Nothing in the engines reads global state directly: whoever needs the core
//! count or host name receives a [`SystemContext`]. Tests build one by hand.

use std::fmt;
use std::path::PathBuf;
use sysinfo::System;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemContext {
    pub host_name: String,
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub user_name: String,
    pub working_dir: PathBuf,
    pub pid: u32,
    /// Logical cores, hyper-threads included.
    pub core_count: usize,
    pub uptime_secs: u64,
}

impl SystemContext {
    /// Query the running host.
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        let core_count = match system.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };

        let pid = sysinfo::get_current_pid()
            .map(|pid| pid.as_u32())
            .unwrap_or_else(|_| std::process::id());

        let user_name = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            host_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            os_name: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            os_version: System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
            user_name,
            working_dir: std::env::current_dir().unwrap_or_default(),
            pid,
            core_count,
            uptime_secs: System::uptime(),
        }
    }

    /// A context with fixed values and the given core count.
    pub fn fixed(core_count: usize) -> Self {
        Self {
            host_name: "localhost".to_string(),
            os_name: "Linux".to_string(),
            os_version: String::new(),
            kernel_version: String::new(),
            user_name: "deltamon".to_string(),
            working_dir: PathBuf::from("/"),
            pid: 1,
            core_count,
            uptime_secs: 0,
        }
    }
}

impl fmt::Display for SystemContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System")?;
        writeln!(f, "  User: {}", self.user_name)?;
        writeln!(f, "  Cwd: {}", self.working_dir.display())?;
        writeln!(f, "  PID: {}", self.pid)?;
        writeln!(f, "  Kernel: {}", self.kernel_version)?;
        writeln!(f, "  Distribution: {} {}", self.os_name, self.os_version)?;
        writeln!(f, "  Hostname: {}", self.host_name)?;
        writeln!(f, "  Uptime (sec): {}", self.uptime_secs)?;
        write!(f, "  Cores: {}", self.core_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_reports_at_least_one_core() {
        let ctx = SystemContext::detect();
        assert!(ctx.core_count >= 1);
        assert!(ctx.pid > 0);
    }

    #[test]
    fn display_lists_every_fact() {
        let ctx = SystemContext::fixed(4);
        let text = ctx.to_string();
        assert!(text.starts_with("System\n"));
        assert!(text.contains("Hostname: localhost"));
        assert!(text.ends_with("Cores: 4"));
    }
}
