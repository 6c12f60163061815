mod core;
mod probe;

use clap::Parser;
use std::path::PathBuf;

use crate::core::envelope::{ProbeEnvelope, ProbeFault, Timer, UtilityInfo};
use crate::probe::arcconf::{self, Arcconf};
use crate::probe::classify::ClassificationResult;
use crate::probe::{ProbeOutcome, PROBE_NAME};

/// Health probe for Adaptec AACRAID controllers: queries arcconf, folds the
/// device/battery status into one severity, and reports in the
/// monitoring-plugin line and exit-code convention.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Controller number passed to arcconf GETCONFIG
    #[arg(long, default_value_t = 1)]
    controller: u32,

    /// Path to the arcconf binary (default: PATH lookup, then /usr/sbin/arcconf)
    #[arg(long)]
    arcconf: Option<PathBuf>,

    /// Run arcconf directly instead of through sudo
    #[arg(long)]
    no_sudo: bool,

    /// Per-query timeout in milliseconds (0 picks the built-in default)
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Print a JSON envelope of the run instead of the plain plugin line
    #[arg(long)]
    json_pretty: bool,

    /// Keep the UcliEvt.log file arcconf drops in the working directory
    #[arg(long)]
    keep_event_log: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let timer = Timer::new();

    let (outcome, utility) = run_probe(&cli);
    let result = &outcome.result;
    let report = result.render(PROBE_NAME);

    if cli.json_pretty {
        let mut envelope = ProbeEnvelope::new(
            PROBE_NAME,
            result.severity(),
            result.report_word(),
            result.has_data(),
            result.findings().to_vec(),
            report.clone(),
            utility,
            timer.elapsed_ms(),
        );
        if let Some(err) = &outcome.fault {
            envelope = envelope.with_fault(ProbeFault::new(err.kind(), &err.to_string()));
        }
        match envelope.to_json(true) {
            Ok(json) => println!("{}", json),
            // The plugin line is the contract; fall back to it rather than
            // exiting without a report.
            Err(_) => println!("{}", report),
        }
    } else {
        println!("{}", report);
    }

    if !cli.keep_event_log {
        arcconf::cleanup_artifact_log();
    }

    result.severity().exit()
}

/// Locate arcconf and run the three queries. Every failure path still
/// yields a reportable outcome.
fn run_probe(cli: &Cli) -> (ProbeOutcome, UtilityInfo) {
    let binary = match Arcconf::locate(cli.arcconf.as_deref()) {
        Ok(path) => path,
        Err(err) => {
            let utility = UtilityInfo::new("", cli.controller, !cli.no_sudo, cli.timeout_ms);
            let outcome = ProbeOutcome {
                result: ClassificationResult::invocation_failure(&err.to_string()),
                fault: Some(err),
            };
            return (outcome, utility);
        }
    };

    let arcconf = Arcconf::new(binary, cli.controller, !cli.no_sudo, cli.timeout_ms);
    let utility = UtilityInfo::new(
        &arcconf.binary().display().to_string(),
        arcconf.controller(),
        arcconf.use_sudo(),
        arcconf.timeout_ms(),
    );

    let outcome = match probe::run(&arcconf) {
        Ok(outcome) => outcome,
        Err(err) => ProbeOutcome {
            result: ClassificationResult::invocation_failure(&format!("probe error: {:#}", err)),
            fault: None,
        },
    };
    (outcome, utility)
}
