use serde::{Deserialize, Serialize};

/// Aggregate health of one probe run, ordered so that folding with `max`
/// can only escalate: OK < WARNING < CRITICAL < UNKNOWN.
///
/// UNKNOWN sits above CRITICAL because no classification rule ever
/// contributes it; it is reserved for the no-data case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Process exit status under the monitoring-plugin convention.
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }

    /// Terminate the process with the matching plugin exit status.
    pub fn exit(self) -> ! {
        std::process::exit(self.exit_code())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
