//! # pyprobe - Main Entry Point
//!
//! Parses the command line, samples the target, and prints the report on
//! stdout. Diagnostics and errors go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::{self, BufWriter};

use pyprobe::cli::Args;
use pyprobe::config::RunConfig;
use pyprobe::export::export_run;
use pyprobe::preflight::run_preflight_checks;
use pyprobe::profiling::{RunOutcome, SamplingEngine};
use pyprobe::target::PtraceAttachment;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and -v land here too; clap routes them to stdout
            let _ = e.print();
            std::process::exit(if e.use_stderr() { EXIT_ERROR } else { EXIT_SUCCESS });
        }
    };

    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn run(args: &Args) -> Result<()> {
    let config = RunConfig::try_from(args)?;
    let pid = config.pid;

    run_preflight_checks(pid)?;

    info!(
        "Sampling process {pid} for {:?} every {:?}",
        config.sampler.duration, config.sampler.interval
    );

    // One blocking thread for the whole run; ptrace requests must come from
    // the thread that attached
    let sampler = config.sampler;
    let outcome = tokio::task::spawn_blocking(move || {
        SamplingEngine::new(PtraceAttachment::default(), sampler).run(pid)
    })
    .await
    .context("Sampling thread panicked")??;
    if let RunOutcome::TerminatedEarly(result) = &outcome {
        info!(
            "Process {pid} exited early; printing {} samples collected so far",
            result.samples.len()
        );
    }

    let stdout = io::stdout();
    export_run(outcome.result(), config.sampler.include_timestamps, BufWriter::new(stdout.lock()))
        .context("Failed to write report")?;

    Ok(())
}
