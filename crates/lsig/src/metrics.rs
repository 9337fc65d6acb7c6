//! Process-wide counters using metrics-rs.
//!
//! Counters are diagnostics only; nothing in the driver reads them back.
//! Without an installed recorder every call is a no-op.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter,
};
use parking_lot::RwLock;

use crate::diff::{EscalationKind, Phase};
use crate::input::Skip;

// ============================================================================
// Metric descriptions
// ============================================================================

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!("lsig_inputs_total", Unit::Count, "Raw inputs received");
    describe_counter!(
        "lsig_inputs_skipped_total",
        Unit::Count,
        "Inputs that did not decode"
    );
    describe_counter!(
        "lsig_inputs_interesting_total",
        Unit::Count,
        "Inputs on which both engines ran and agreed"
    );
    describe_counter!(
        "lsig_escalations_total",
        Unit::Count,
        "Disagreements and panics found"
    );
    describe_counter!(
        "lsig_panics_caught_total",
        Unit::Count,
        "Engine panics caught at the guard"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

pub fn record_input() {
    counter!("lsig_inputs_total").increment(1);
}

pub fn record_skip(skip: &Skip) {
    counter!("lsig_inputs_skipped_total", "reason" => skip.reason()).increment(1);
}

pub fn record_interesting() {
    counter!("lsig_inputs_interesting_total").increment(1);
}

pub fn record_escalation(phase: Phase, kind: &EscalationKind) {
    counter!(
        "lsig_escalations_total",
        "phase" => phase.as_str(),
        "kind" => kind.label()
    )
    .increment(1);
}

pub fn record_panic_caught(engine: &'static str) {
    counter!("lsig_panics_caught_total", "engine" => engine).increment(1);
}

// ============================================================================
// CLI recorder
// ============================================================================

type CounterMap = RwLock<BTreeMap<String, Arc<AtomicU64>>>;

/// Recorder that keeps counters in memory for a terminal summary.
///
/// Only counters are recorded; gauges and histograms are dropped.
#[derive(Default)]
pub struct CliRecorder {
    counters: Arc<CounterMap>,
}

impl CliRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self) -> CliRecorderHandle {
        CliRecorderHandle {
            counters: Arc::clone(&self.counters),
        }
    }

    /// Install as the global recorder.
    ///
    /// Returns `None` if a recorder is already installed.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = self.handle();
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }
}

/// `name{k=v,...}`, labels in registration order.
fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let name = key_to_string(key);
        if let Some(cell) = self.counters.read().get(&name) {
            return Counter::from_arc(Arc::clone(cell));
        }
        let cell = Arc::clone(self.counters.write().entry(name).or_default());
        Counter::from_arc(cell)
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

/// Reads counters back after the recorder is installed.
pub struct CliRecorderHandle {
    counters: Arc<CounterMap>,
}

impl CliRecorderHandle {
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters
            .read()
            .get(key)
            .map(|cell| cell.load(Ordering::Acquire))
    }

    /// Snapshot of every counter, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.counters
            .read()
            .iter()
            .map(|(key, cell)| (key.clone(), cell.load(Ordering::Acquire)))
            .collect()
    }

    /// Write the counter table.
    pub fn write_summary(&self, out: &mut impl Write) -> io::Result<()> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return writeln!(out, "no counters recorded");
        }
        let width = snapshot.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        writeln!(out, "\ncounters:")?;
        for (key, value) in &snapshot {
            writeln!(out, "  {key:<width$}  {value:>8}")?;
        }
        Ok(())
    }

    /// Print the counter table to stdout.
    pub fn print_summary(&self) {
        let _ = self.write_summary(&mut io::stdout().lock());
    }
}

#[cfg(test)]
mod tests {
    use metrics::Label;

    use super::*;

    #[test]
    fn test_key_to_string() {
        let key = Key::from_name("lsig_inputs_total");
        assert_eq!(key_to_string(&key), "lsig_inputs_total");

        let key = Key::from_parts(
            "lsig_escalations_total",
            vec![Label::new("phase", "check"), Label::new("kind", "panic")],
        );
        assert_eq!(
            key_to_string(&key),
            "lsig_escalations_total{phase=check,kind=panic}"
        );
    }

    #[test]
    fn test_recorder_counts() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_input();
            record_input();
            record_skip(&Skip::Empty);
            record_escalation(
                Phase::Eval,
                &EscalationKind::PassMismatch {
                    reference: true,
                    candidate: false,
                },
            );
        });

        assert_eq!(handle.get_counter("lsig_inputs_total"), Some(2));
        assert_eq!(
            handle.get_counter("lsig_inputs_skipped_total{reason=empty}"),
            Some(1)
        );
        assert_eq!(
            handle.get_counter("lsig_escalations_total{phase=eval,kind=pass_mismatch}"),
            Some(1)
        );
        assert_eq!(handle.snapshot().len(), 3);
    }

    #[test]
    fn test_write_summary() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();

        let mut out = Vec::new();
        handle.write_summary(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no counters recorded\n");

        metrics::with_local_recorder(&recorder, || {
            record_interesting();
            record_panic_caught("stepper");
        });
        let mut out = Vec::new();
        handle.write_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "counters:");
        assert!(lines[2].starts_with("  lsig_inputs_interesting_total"));
        assert!(lines[2].ends_with("       1"));
        assert!(lines[3].starts_with("  lsig_panics_caught_total{engine=stepper}"));
    }
}
