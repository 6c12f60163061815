use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::probe::extract::QueryKind;

/// Where the vendor ships arcconf when it is not on PATH.
pub const DEFAULT_ARCCONF: &str = "/usr/sbin/arcconf";
pub const SUDO: &str = "/usr/bin/sudo";

/// Event log arcconf drops in the working directory on every run.
pub const ARTIFACT_LOG: &str = "UcliEvt.log";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const POLL_INTERVAL_MS: u64 = 25;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("arcconf not found on PATH or at /usr/sbin/arcconf")]
    NotFound,
    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },
    #[error("{command} exited with status {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },
}

impl InvocationError {
    /// Stable kind string for the JSON envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            InvocationError::NotFound => "not_found",
            InvocationError::Launch { .. } => "launch",
            InvocationError::Timeout { .. } => "timeout",
            InvocationError::Failed { .. } => "exit_status",
        }
    }
}

/// Locates and runs the vendor arcconf utility, one GETCONFIG section per
/// call, each under a bounded timeout.
pub struct Arcconf {
    binary: PathBuf,
    controller: u32,
    use_sudo: bool,
    timeout: Duration,
}

impl Arcconf {
    /// Resolve the binary: explicit path, PATH lookup, then the vendor's
    /// install location.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, InvocationError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Ok(found) = which::which("arcconf") {
            return Ok(found);
        }
        let fallback = Path::new(DEFAULT_ARCCONF);
        if fallback.exists() {
            return Ok(fallback.to_path_buf());
        }
        Err(InvocationError::NotFound)
    }

    pub fn new(binary: PathBuf, controller: u32, use_sudo: bool, timeout_ms: u64) -> Self {
        let timeout = if timeout_ms == 0 {
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        } else {
            Duration::from_millis(timeout_ms)
        };
        Self {
            binary,
            controller,
            use_sudo,
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn controller(&self) -> u32 {
        self.controller
    }

    pub fn use_sudo(&self) -> bool {
        self.use_sudo
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Full argv for one query, sudo wrapper included. Running through sudo
    /// matches the usual monitoring deployment; it needs a sudoers entry
    /// like:
    ///   nagios ALL=(root) NOPASSWD: /usr/sbin/arcconf GETCONFIG *
    pub fn command_line(&self, kind: QueryKind) -> Vec<String> {
        let mut argv = Vec::new();
        if self.use_sudo {
            argv.push(SUDO.to_string());
        }
        argv.push(self.binary.display().to_string());
        argv.push("GETCONFIG".to_string());
        argv.push(self.controller.to_string());
        argv.push(kind.arg().to_string());
        argv
    }

    /// Run one query and capture stdout. The child is killed once the
    /// timeout expires; a hung arcconf must not hang the whole probe.
    pub fn run_query(&self, kind: QueryKind) -> Result<String, InvocationError> {
        let argv = self.command_line(kind);
        let rendered = argv.join(" ");
        log::debug!("running {}", rendered);

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| InvocationError::Launch {
                command: rendered.clone(),
                source: e,
            })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(InvocationError::Timeout {
                            command: rendered,
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }
                    thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
                }
                Err(e) => {
                    let _ = child.kill();
                    return Err(InvocationError::Launch {
                        command: rendered,
                        source: e,
                    });
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| InvocationError::Launch {
                command: rendered.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InvocationError::Failed {
                command: rendered,
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.lines().next().unwrap_or("").to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Remove the event log arcconf leaves behind; absence or failure is fine.
pub fn cleanup_artifact_log() {
    match std::fs::remove_file(ARTIFACT_LOG) {
        Ok(()) => log::debug!("removed {}", ARTIFACT_LOG),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove {}: {}", ARTIFACT_LOG, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_with_sudo() {
        let arcconf = Arcconf::new(PathBuf::from("/usr/sbin/arcconf"), 1, true, 30_000);
        assert_eq!(
            arcconf.command_line(QueryKind::LogicalDevice),
            vec![
                "/usr/bin/sudo",
                "/usr/sbin/arcconf",
                "GETCONFIG",
                "1",
                "LD"
            ]
        );
    }

    #[test]
    fn test_command_line_without_sudo() {
        let arcconf = Arcconf::new(PathBuf::from("arcconf"), 2, false, 30_000);
        assert_eq!(
            arcconf.command_line(QueryKind::PhysicalDevice),
            vec!["arcconf", "GETCONFIG", "2", "PD"]
        );
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let arcconf = Arcconf::new(PathBuf::from("arcconf"), 1, false, 0);
        assert_eq!(arcconf.timeout_ms(), DEFAULT_TIMEOUT_MS);

        let arcconf = Arcconf::new(PathBuf::from("arcconf"), 1, false, 100);
        assert_eq!(arcconf.timeout_ms(), 100);
    }

    #[test]
    fn test_locate_explicit_path_wins() {
        let path = Arcconf::locate(Some(Path::new("/opt/arcconf"))).unwrap();
        assert_eq!(path, PathBuf::from("/opt/arcconf"));
    }

    #[test]
    fn test_run_query_missing_binary_is_launch_error() {
        let arcconf = Arcconf::new(
            PathBuf::from("/nonexistent/arcconf-test-binary"),
            1,
            false,
            1_000,
        );
        let err = arcconf.run_query(QueryKind::Adapter).unwrap_err();
        assert_eq!(err.kind(), "launch");
    }

    #[test]
    fn test_run_query_nonzero_exit_is_failure() {
        // /bin/false ignores the GETCONFIG args and exits 1.
        let arcconf = Arcconf::new(PathBuf::from("/bin/false"), 1, false, 5_000);
        let err = arcconf.run_query(QueryKind::Adapter).unwrap_err();
        assert_eq!(err.kind(), "exit_status");
        match err {
            InvocationError::Failed { code, .. } => assert_eq!(code, 1),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(InvocationError::NotFound.kind(), "not_found");
        assert_eq!(
            InvocationError::Timeout {
                command: "arcconf GETCONFIG 1 LD".to_string(),
                timeout_ms: 30_000,
            }
            .kind(),
            "timeout"
        );
    }
}
