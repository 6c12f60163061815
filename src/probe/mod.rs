pub mod arcconf;
pub mod classify;
pub mod extract;

pub use arcconf::{Arcconf, InvocationError};
pub use classify::ClassificationResult;
pub use extract::{FieldEvent, LineScanner, QueryKind};

use anyhow::Result;

/// Prefix of the plugin report line.
pub const PROBE_NAME: &str = "AACRAID";

/// The three queries, in the order they are run. Never interleaved; each
/// stream is folded fully before the next query starts.
pub const QUERY_ORDER: [QueryKind; 3] = [
    QueryKind::LogicalDevice,
    QueryKind::Adapter,
    QueryKind::PhysicalDevice,
];

/// Outcome of one probe run: the classification plus the invocation error
/// that aborted it, if any.
pub struct ProbeOutcome {
    pub result: ClassificationResult,
    pub fault: Option<InvocationError>,
}

/// Classify pre-captured output of the three queries. Pure; this is the
/// whole engine, with the process plumbing factored out.
pub fn classify_streams(ld: &str, ad: &str, pd: &str) -> Result<ClassificationResult> {
    let streams = [
        (QueryKind::LogicalDevice, ld),
        (QueryKind::Adapter, ad),
        (QueryKind::PhysicalDevice, pd),
    ];
    let mut result = ClassificationResult::new();
    for (kind, text) in streams {
        let mut scanner = LineScanner::new(kind)?;
        for event in scanner.scan(text) {
            result.fold(event);
        }
    }
    Ok(result.finalize())
}

/// Run the probe end to end: three sequential arcconf queries folded into
/// one classification. The first failed query aborts the run and becomes
/// its own finding.
pub fn run(arcconf: &Arcconf) -> Result<ProbeOutcome> {
    let mut streams = Vec::with_capacity(QUERY_ORDER.len());
    for kind in QUERY_ORDER {
        match arcconf.run_query(kind) {
            Ok(text) => streams.push(text),
            Err(err) => {
                return Ok(ProbeOutcome {
                    result: ClassificationResult::invocation_failure(&err.to_string()),
                    fault: Some(err),
                })
            }
        }
    }
    let result = classify_streams(&streams[0], &streams[1], &streams[2])?;
    Ok(ProbeOutcome {
        result,
        fault: None,
    })
}
