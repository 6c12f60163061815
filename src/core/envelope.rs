use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::core::status::Severity;

/// Machine-readable envelope for one probe run. The plain plugin line is
/// carried in `report` so consumers of either format see the same text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeEnvelope {
    pub ok: bool,
    pub probe: String,
    pub severity: Severity,
    /// Legacy report word; differs from `severity` in the no-data case.
    pub status_word: String,
    pub exit_code: i32,
    pub ts: String,
    pub duration_ms: u64,
    pub has_data: bool,
    pub findings: Vec<String>,
    pub report: String,
    pub utility: UtilityInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<ProbeFault>,
}

/// How the vendor utility was (or would have been) invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityInfo {
    pub binary: String,
    pub controller: u32,
    pub use_sudo: bool,
    pub timeout_ms: u64,
}

/// Invocation failure information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeFault {
    pub kind: String,
    pub message: String,
}

impl ProbeEnvelope {
    pub fn new(
        probe: &str,
        severity: Severity,
        status_word: &str,
        has_data: bool,
        findings: Vec<String>,
        report: String,
        utility: UtilityInfo,
        duration_ms: u64,
    ) -> Self {
        Self {
            ok: severity == Severity::Ok,
            probe: probe.to_string(),
            severity,
            status_word: status_word.to_string(),
            exit_code: severity.exit_code(),
            ts: Utc::now().to_rfc3339(),
            duration_ms,
            has_data,
            findings,
            report,
            utility,
            fault: None,
        }
    }

    pub fn with_fault(mut self, fault: ProbeFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Serialize to JSON (pretty or compact)
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if pretty {
            serde_json::to_string_pretty(self).map_err(|e| anyhow!("JSON serialization error: {}", e))
        } else {
            serde_json::to_string(self).map_err(|e| anyhow!("JSON serialization error: {}", e))
        }
    }
}

impl UtilityInfo {
    pub fn new(binary: &str, controller: u32, use_sudo: bool, timeout_ms: u64) -> Self {
        Self {
            binary: binary.to_string(),
            controller,
            use_sudo,
            timeout_ms,
        }
    }
}

impl ProbeFault {
    pub fn new(kind: &str, message: &str) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }
}

/// Utility to measure execution time
pub struct Timer {
    start: SystemTime,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: SystemTime::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start
            .elapsed()
            .unwrap_or_default()
            .as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
