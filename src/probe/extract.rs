use anyhow::Result;
use regex::{Captures, Regex};

/// One typed record extracted from a single line of arcconf output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    LogicalDeviceStatus { index: Option<u32>, state: String },
    ControllerStatus { state: String },
    DefunctDiskCount { count: u32 },
    DegradedSummary { failed: u32, degraded: u32 },
    BatteryStatus { state: String },
    BatteryOvertemp { is_over: bool },
    BatteryCapacityPercent { percent: u32 },
    BatteryTimeRemaining { days: u32, hours: u32, minutes: u32 },
    PhysicalDeviceState { index: Option<u32>, state: String },
}

/// The three GETCONFIG sections the probe reads, in query order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    LogicalDevice,
    Adapter,
    PhysicalDevice,
}

impl QueryKind {
    /// The section argument passed to `arcconf GETCONFIG`.
    pub fn arg(self) -> &'static str {
        match self {
            QueryKind::LogicalDevice => "LD",
            QueryKind::Adapter => "AD",
            QueryKind::PhysicalDevice => "PD",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PatternKind {
    LogicalIndex,
    LogicalState,
    ControllerState,
    DefunctCount,
    DegradedCounts,
    BatteryState,
    BatteryOvertemp,
    BatteryCapacity,
    BatteryTime,
    DeviceIndex,
    DeviceState,
}

/// Scans one query stream line by line. Index lines ("Logical device
/// number N", "Device #N") only update the pairing context; status lines
/// produce events carrying the most recently seen index.
pub struct LineScanner {
    table: Vec<(Regex, PatternKind)>,
    current_index: Option<u32>,
}

impl LineScanner {
    /// Build the ordered pattern table for one stream. First match wins;
    /// unmatched lines are ignored.
    pub fn new(kind: QueryKind) -> Result<Self> {
        let patterns: &[(&str, PatternKind)] = match kind {
            QueryKind::LogicalDevice => &[
                (r"^Logical device number ([0-9]+)", PatternKind::LogicalIndex),
                (
                    r"^\s*Status of logical device\s*:\s*(.*)$",
                    PatternKind::LogicalState,
                ),
            ],
            QueryKind::Adapter => &[
                (
                    r"^\s*Controller Status\s*:\s*(.*)$",
                    PatternKind::ControllerState,
                ),
                (
                    r"^\s*Defunct disk drive count\s*:\s*([0-9]+)",
                    PatternKind::DefunctCount,
                ),
                (
                    r"^\s*Logical devices/Failed/Degraded\s*:\s*([0-9]+)/([0-9]+)/([0-9]+)",
                    PatternKind::DegradedCounts,
                ),
                (r"^\s*Status\s*:\s*(.*)$", PatternKind::BatteryState),
                (
                    r"^\s*Over temperature\s*:\s*(.*)$",
                    PatternKind::BatteryOvertemp,
                ),
                (
                    r"^\s*Capacity remaining\s*:\s*([0-9]+)\s*percent",
                    PatternKind::BatteryCapacity,
                ),
                (
                    r"^\s*Time remaining \(at current draw\)\s*:\s*([0-9]+) days, ([0-9]+) hours, ([0-9]+) minutes",
                    PatternKind::BatteryTime,
                ),
            ],
            QueryKind::PhysicalDevice => &[
                (r"^\s*Device\s*#([0-9]+)\s*$", PatternKind::DeviceIndex),
                (r"^\s*State\s*:\s*(.*)$", PatternKind::DeviceState),
            ],
        };

        let mut table = Vec::with_capacity(patterns.len());
        for &(pattern, kind) in patterns {
            table.push((Regex::new(pattern)?, kind));
        }
        Ok(Self {
            table,
            current_index: None,
        })
    }

    /// Extract all events from one query stream.
    pub fn scan(&mut self, text: &str) -> Vec<FieldEvent> {
        text.lines().filter_map(|line| self.scan_line(line)).collect()
    }

    /// Extract zero or one event from a single line.
    pub fn scan_line(&mut self, line: &str) -> Option<FieldEvent> {
        let (kind, caps) = self
            .table
            .iter()
            .find_map(|(re, kind)| re.captures(line).map(|caps| (*kind, caps)))?;
        self.apply(kind, &caps)
    }

    fn apply(&mut self, kind: PatternKind, caps: &Captures) -> Option<FieldEvent> {
        match kind {
            // Index lines only update the pairing context. A parse failure
            // (overlong digit run) clears it rather than aborting the scan.
            PatternKind::LogicalIndex | PatternKind::DeviceIndex => {
                self.current_index = caps[1].parse().ok();
                None
            }
            PatternKind::LogicalState => Some(FieldEvent::LogicalDeviceStatus {
                index: self.current_index,
                state: trim_state(&caps[1]),
            }),
            PatternKind::ControllerState => Some(FieldEvent::ControllerStatus {
                state: trim_state(&caps[1]),
            }),
            PatternKind::DefunctCount => {
                let count = caps[1].parse().ok()?;
                Some(FieldEvent::DefunctDiskCount { count })
            }
            PatternKind::DegradedCounts => {
                // First group is the logical-device count; unused.
                let failed = caps[2].parse().ok()?;
                let degraded = caps[3].parse().ok()?;
                Some(FieldEvent::DegradedSummary { failed, degraded })
            }
            PatternKind::BatteryState => Some(FieldEvent::BatteryStatus {
                state: trim_state(&caps[1]),
            }),
            PatternKind::BatteryOvertemp => Some(FieldEvent::BatteryOvertemp {
                is_over: trim_state(&caps[1]) != "No",
            }),
            PatternKind::BatteryCapacity => {
                let percent = caps[1].parse().ok()?;
                Some(FieldEvent::BatteryCapacityPercent { percent })
            }
            PatternKind::BatteryTime => {
                let days = caps[1].parse().ok()?;
                let hours = caps[2].parse().ok()?;
                let minutes = caps[3].parse().ok()?;
                Some(FieldEvent::BatteryTimeRemaining {
                    days,
                    hours,
                    minutes,
                })
            }
            PatternKind::DeviceState => Some(FieldEvent::PhysicalDeviceState {
                index: self.current_index,
                state: trim_state(&caps[1]),
            }),
        }
    }
}

/// Vendor status strings come with trailing whitespace and the occasional
/// stray "," or "."; strip those before any comparison.
fn trim_state(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .trim_start()
        .to_string()
}
