//! Entry point for the external fuzzing engine.

use std::sync::LazyLock;

use tracing::error;

use crate::config::{ConfigError, DiffConfig};
use crate::diff::Driver;

static DRIVER: LazyLock<Driver> = LazyLock::new(|| driver_from(DiffConfig::from_env()));

/// A bad `LSIG_*` variable aborts the run rather than fuzzing other engines.
fn driver_from(config: Result<DiffConfig, ConfigError>) -> Driver {
    match config {
        Ok(config) => Driver::new(&config),
        Err(e) => {
            error!(error = %e, "invalid fuzz configuration");
            panic!("invalid fuzz configuration: {e}");
        }
    }
}

/// Run one raw input through the process-wide driver.
///
/// Returns 0 for skipped inputs and 1 when both engines ran and agreed.
/// Any disagreement or engine panic prints the reproduction report and
/// then panics, which the fuzzing engine records as a crash.
pub fn fuzz_one(raw: &[u8]) -> i32 {
    fuzz_with(&DRIVER, raw)
}

/// [`fuzz_one`] against an explicit driver.
pub fn fuzz_with(driver: &Driver, raw: &[u8]) -> i32 {
    match driver.run_raw(raw) {
        Ok(verdict) => verdict.as_i32(),
        Err(escalation) => {
            error!(
                phase = %escalation.phase,
                kind = escalation.kind.label(),
                "escalating input"
            );
            println!("{}", escalation.report);
            panic!("{escalation}");
        }
    }
}
