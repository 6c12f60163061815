use crate::core::status::Severity;
use crate::probe::extract::FieldEvent;

/// Synthetic finding used when all three queries produced nothing.
pub const NO_DATA_FINDING: &str = "No output from arcconf!";

/// Battery runtime thresholds, in minutes.
const BATTERY_TIME_CRITICAL_MIN: u32 = 720;
const BATTERY_TIME_WARNING_MIN: u32 = 1440;

/// Battery capacity thresholds, in percent.
const BATTERY_CAPACITY_CRITICAL_PCT: u32 = 25;
const BATTERY_CAPACITY_WARNING_PCT: u32 = 50;

/// Aggregate of one probe run: severity folded event by event, findings in
/// encounter order, plus the latched critical/warning flags that drive the
/// legacy report-word precedence.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    severity: Severity,
    saw_critical: bool,
    saw_warning: bool,
    findings: Vec<String>,
    has_data: bool,
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationResult {
    pub fn new() -> Self {
        Self {
            severity: Severity::Ok,
            saw_critical: false,
            saw_warning: false,
            findings: Vec::new(),
            has_data: false,
        }
    }

    /// Result for a run where the utility itself could not be queried:
    /// UNKNOWN with the failure as the only finding, distinct from the
    /// no-data case.
    pub fn invocation_failure(message: &str) -> Self {
        Self {
            severity: Severity::Unknown,
            saw_critical: false,
            saw_warning: false,
            findings: vec![message.to_string()],
            has_data: false,
        }
    }

    /// Fold one event into the aggregate. Events must arrive in stream
    /// order; severity only escalates, except for the "Ready" legacy rule.
    pub fn fold(&mut self, event: FieldEvent) {
        match event {
            FieldEvent::LogicalDeviceStatus { index, state } => {
                if state != "Optimal" {
                    self.critical();
                }
                self.push_finding(format!(
                    "Logical Device: {} {}",
                    fmt_index(index),
                    state
                ));
            }
            FieldEvent::ControllerStatus { state } => {
                if state != "Optimal" {
                    self.critical();
                }
                self.push_finding(format!("Controller: {}", state));
            }
            FieldEvent::DefunctDiskCount { count } => {
                if count > 0 {
                    self.critical();
                    self.push_finding(format!("Defunct drives: {}", count));
                }
            }
            FieldEvent::DegradedSummary { failed, degraded } => {
                if failed > 0 {
                    self.critical();
                    self.push_finding(format!("Failed drives: {}", failed));
                }
                if degraded > 0 {
                    self.critical();
                    self.push_finding(format!("Degraded drives: {}", degraded));
                }
            }
            FieldEvent::BatteryStatus { state } => {
                // An absent BBU is not a fault; suppress entirely.
                if state == "Not Installed" {
                    return;
                }
                if state == "Charging" {
                    self.warn_if_not_critical();
                } else if !state.contains("Optimal") {
                    self.critical();
                }
                self.push_finding(format!("Battery Status: {}", state));
            }
            FieldEvent::BatteryOvertemp { is_over } => {
                if is_over {
                    self.critical();
                }
                self.push_finding(format!(
                    "Battery Overtemp: {}",
                    if is_over { "Yes" } else { "No" }
                ));
            }
            FieldEvent::BatteryCapacityPercent { percent } => {
                if percent < BATTERY_CAPACITY_CRITICAL_PCT {
                    self.critical();
                } else if percent < BATTERY_CAPACITY_WARNING_PCT {
                    self.warn_if_not_critical();
                }
                self.push_finding(format!("Battery Capacity: {}%", percent));
            }
            FieldEvent::BatteryTimeRemaining {
                days,
                hours,
                minutes,
            } => {
                let total = days * 1440 + hours * 60 + minutes;
                if total < BATTERY_TIME_CRITICAL_MIN {
                    self.critical();
                } else if total < BATTERY_TIME_WARNING_MIN {
                    self.warn_if_not_critical();
                }
                if total < 60 {
                    self.push_finding(format!("Battery Time: {}mins", total));
                } else {
                    self.push_finding(format!("Battery Time: {}hours", total / 60));
                }
            }
            FieldEvent::PhysicalDeviceState { index, state } => {
                if state == "Ready" {
                    // Legacy quirk kept on purpose: "Ready" assigns WARNING
                    // even over a prior CRITICAL exit status. The report
                    // word still honors the latched critical flag.
                    self.severity = Severity::Warning;
                    self.saw_warning = true;
                } else if state != "Online" {
                    self.critical();
                }
                self.push_finding(format!("Device: {} {}", fmt_index(index), state));
            }
        }
    }

    /// Seal the run: with no findings at all, the result is forced to the
    /// no-data UNKNOWN state.
    pub fn finalize(mut self) -> Self {
        if self.findings.is_empty() {
            self.has_data = false;
            self.severity = Severity::Unknown;
            self.findings.push(NO_DATA_FINDING.to_string());
        }
        self
    }

    fn critical(&mut self) {
        self.severity = self.severity.max(Severity::Critical);
        self.saw_critical = true;
    }

    fn warn_if_not_critical(&mut self) {
        if self.severity < Severity::Critical {
            self.severity = self.severity.max(Severity::Warning);
            self.saw_warning = true;
        }
    }

    fn push_finding(&mut self, finding: String) {
        self.findings.push(finding);
        self.has_data = true;
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn findings(&self) -> &[String] {
        &self.findings
    }

    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn exit_code(&self) -> i32 {
        self.severity.exit_code()
    }

    /// Report word under the legacy precedence: critical beats warning even
    /// when both occurred, and no-data is never reported as OK.
    pub fn report_word(&self) -> &'static str {
        if self.severity == Severity::Ok {
            "OK"
        } else if self.saw_critical {
            "CRITICAL"
        } else if self.saw_warning {
            "WARNING"
        } else {
            "CRITICAL"
        }
    }

    /// pnp4nagios-style performance value; follows the report word.
    pub fn perfdata(&self) -> i32 {
        match self.report_word() {
            "OK" => 0,
            "WARNING" => 1,
            _ => 2,
        }
    }

    /// The single plugin report line.
    pub fn render(&self, probe: &str) -> String {
        format!(
            "{} {}: {} | raiddata={}",
            probe,
            self.report_word(),
            self.findings.join(", "),
            self.perfdata()
        )
    }
}

fn fmt_index(index: Option<u32>) -> String {
    index.map(|i| i.to_string()).unwrap_or_default()
}
