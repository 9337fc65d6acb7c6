//! Run command.

use std::io;
use std::path::{Path, PathBuf};

use lsig::{Driver, EngineKind, Escalation, Verdict};
use rayon::prelude::*;
use tracing::{error, info};

use super::build_config;
use crate::cli::{ContextArgs, EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, ReplayProgress};

enum Replay {
    Done(Verdict),
    Escalated(Box<Escalation>),
    Unreadable(io::Error),
}

/// Handle the `run` command.
pub fn cmd_run(
    paths: &[PathBuf],
    reference: Option<EngineKind>,
    candidate: Option<EngineKind>,
    context: ContextArgs,
    jobs: usize,
) -> i32 {
    let config = match build_config(reference, candidate, context) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return EXIT_FAILURE;
        }
    };

    let files = match collect_inputs(paths) {
        Ok(files) => files,
        Err(e) => {
            error!(error = %e, "failed to list inputs");
            return EXIT_FAILURE;
        }
    };
    if files.is_empty() {
        terminal::warning("no input files found");
        return EXIT_FAILURE;
    }

    let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to start worker pool");
            return EXIT_FAILURE;
        }
    };

    info!(
        inputs = files.len(),
        jobs,
        reference = %config.reference,
        candidate = %config.candidate,
        "replaying inputs"
    );

    let driver = Driver::new(&config);
    let progress = ReplayProgress::new(files.len() as u64);
    let results: Vec<(&PathBuf, Replay)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let replay = replay(&driver, path);
                progress.advance(matches!(replay, Replay::Escalated(_)));
                (path, replay)
            })
            .collect()
    });
    progress.finish();

    let mut interesting = 0usize;
    let mut skipped = 0usize;
    let mut escalated = 0usize;
    let mut unreadable = 0usize;
    for (path, replay) in &results {
        match replay {
            Replay::Done(verdict) => {
                let label = if *verdict == Verdict::Interesting {
                    interesting += 1;
                    "interesting"
                } else {
                    skipped += 1;
                    "skipped"
                };
                terminal::verdict(path, label);
            }
            Replay::Escalated(escalation) => {
                escalated += 1;
                terminal::verdict(path, "escalated");
                terminal::failed("Escalated", &escalation.to_string());
                print!("{}", escalation.report);
            }
            Replay::Unreadable(e) => {
                unreadable += 1;
                error!(error = %e, path = %path.display(), "failed to read input");
            }
        }
    }

    let summary = format!(
        "{} inputs: {interesting} interesting, {skipped} skipped, {escalated} escalated",
        results.len()
    );
    if escalated > 0 || unreadable > 0 {
        terminal::failed("Finished", &summary);
        EXIT_FAILURE
    } else {
        terminal::finished("Finished", &summary);
        EXIT_SUCCESS
    }
}

fn replay(driver: &Driver, path: &Path) -> Replay {
    match std::fs::read(path) {
        Ok(raw) => match driver.run_raw(&raw) {
            Ok(verdict) => Replay::Done(verdict),
            Err(escalation) => Replay::Escalated(escalation),
        },
        Err(e) => Replay::Unreadable(e),
    }
}

/// Expand directories one level deep, keeping files as given.
fn collect_inputs(paths: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    entries.push(entry.path());
                }
            }
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}
