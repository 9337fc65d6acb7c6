//! The differential driver.
//!
//! For each input both engines are checked, the check results compared,
//! and only then both engines evaluate and those results are compared.
//! Within a phase the comparison is tiered: panics first, then whether
//! each side failed at all, then the cost or pass value.

use lsig_eval::{ContextProfile, Engine, EvalError, EvalParams};
use tracing::{debug, trace, warn};

use super::{EscalationKind, Escalation, Failure, Finding, Outcome, Phase, guarded};
use crate::config::DiffConfig;
use crate::input::{FuzzInput, decode};
use crate::metrics;
use crate::report::Report;

/// Signal returned to the fuzzing engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Input did not decode; nothing ran.
    Uninteresting,
    /// Both engines ran and agreed.
    Interesting,
}

impl Verdict {
    /// libFuzzer-style return value.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Uninteresting => 0,
            Self::Interesting => 1,
        }
    }
}

/// Reference and candidate results for one phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseRecord<T> {
    pub reference: Outcome<T>,
    pub candidate: Outcome<T>,
}

/// Everything the driver observed for one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub check: PhaseRecord<u64>,
    /// `None` when the check phase already produced a finding.
    pub eval: Option<PhaseRecord<bool>>,
    pub finding: Option<Finding>,
}

struct Side {
    engine: &'static dyn Engine,
    profile: ContextProfile,
}

/// Runs a reference and a candidate engine side by side.
pub struct Driver {
    reference: Side,
    candidate: Side,
}

impl Driver {
    pub fn new(config: &DiffConfig) -> Self {
        Self::with_engines(
            config.reference.engine(),
            config.reference_profile.clone(),
            config.candidate.engine(),
            config.candidate_profile.clone(),
        )
    }

    /// Compare arbitrary engines.
    pub fn with_engines(
        reference: &'static dyn Engine,
        reference_profile: ContextProfile,
        candidate: &'static dyn Engine,
        candidate_profile: ContextProfile,
    ) -> Self {
        Self {
            reference: Side {
                engine: reference,
                profile: reference_profile,
            },
            candidate: Side {
                engine: candidate,
                profile: candidate_profile,
            },
        }
    }

    pub fn reference(&self) -> &'static dyn Engine {
        self.reference.engine
    }

    pub fn candidate(&self) -> &'static dyn Engine {
        self.candidate.engine
    }

    /// Whether both sides can evaluate against one context.
    fn shares_context(&self) -> bool {
        self.reference.engine.name() == self.candidate.engine.name()
            && self.reference.profile == self.candidate.profile
    }

    /// Decode a raw input and run it.
    pub fn run_raw(&self, raw: &[u8]) -> Result<Verdict, Box<Escalation>> {
        metrics::record_input();
        match decode(raw) {
            Ok(input) => self.run(&input),
            Err(skip) => {
                metrics::record_skip(&skip);
                trace!(%skip, "skipping input");
                Ok(Verdict::Uninteresting)
            }
        }
    }

    /// Run a decoded input, escalating on any disagreement or panic.
    pub fn run(&self, input: &FuzzInput) -> Result<Verdict, Box<Escalation>> {
        let observation = self.execute(input);
        match observation.finding {
            None => {
                metrics::record_interesting();
                debug!(
                    cost = observation.check.reference.value,
                    check_failed = observation.check.reference.is_err(),
                    "engines agree"
                );
                Ok(Verdict::Interesting)
            }
            Some(Finding { phase, kind }) => {
                metrics::record_escalation(phase, &kind);
                let report = Report::new(self.reference.engine, input);
                Err(Box::new(Escalation {
                    phase,
                    kind,
                    report,
                }))
            }
        }
    }

    /// Run both phases and record every outcome without escalating.
    ///
    /// The eval phase runs only when the check phase produced no finding.
    pub fn execute(&self, input: &FuzzInput) -> Observation {
        let reference_params =
            EvalParams::for_logic_sig(&self.reference.profile, &input.program, &input.args);
        let candidate_params = (!self.shares_context()).then(|| {
            EvalParams::for_logic_sig(&self.candidate.profile, &input.program, &input.args)
        });
        let candidate_params = candidate_params.as_ref().unwrap_or(&reference_params);
        let program = input.program.as_slice();

        let check = PhaseRecord {
            reference: invoke(self.reference.engine, |e| e.check(program, &reference_params)),
            candidate: invoke(self.candidate.engine, |e| e.check(program, candidate_params)),
        };
        if let Some(kind) = self.compare(&check, |reference, candidate| {
            EscalationKind::CostMismatch {
                reference,
                candidate,
            }
        }) {
            return Observation {
                check,
                eval: None,
                finding: Some(Finding {
                    phase: Phase::Check,
                    kind,
                }),
            };
        }

        let eval = PhaseRecord {
            reference: invoke(self.reference.engine, |e| {
                e.evaluate(program, &reference_params)
            }),
            candidate: invoke(self.candidate.engine, |e| e.evaluate(program, candidate_params)),
        };
        let finding = self
            .compare(&eval, |reference, candidate| EscalationKind::PassMismatch {
                reference,
                candidate,
            })
            .map(|kind| Finding {
                phase: Phase::Eval,
                kind,
            });

        Observation {
            check,
            eval: Some(eval),
            finding,
        }
    }

    fn compare<T: Copy + PartialEq>(
        &self,
        record: &PhaseRecord<T>,
        value_mismatch: impl FnOnce(T, T) -> EscalationKind,
    ) -> Option<EscalationKind> {
        let sides = [
            (self.reference.engine.name(), &record.reference),
            (self.candidate.engine.name(), &record.candidate),
        ];
        for (engine, outcome) in sides {
            if let Some(Failure::Panic(info)) = &outcome.failure {
                return Some(EscalationKind::Panic {
                    engine,
                    info: info.clone(),
                });
            }
        }

        if record.reference.is_err() != record.candidate.is_err() {
            return Some(EscalationKind::NilnessMismatch {
                reference: record.reference.error_text(),
                candidate: record.candidate.error_text(),
            });
        }

        if !record.reference.is_err() && record.reference.value != record.candidate.value {
            return Some(value_mismatch(
                record.reference.value,
                record.candidate.value,
            ));
        }
        None
    }
}

/// Call into an engine behind the panic guard.
fn invoke<T: Default>(
    engine: &'static dyn Engine,
    call: impl FnOnce(&dyn Engine) -> Result<T, EvalError>,
) -> Outcome<T> {
    match guarded(|| call(engine)) {
        Ok(result) => Outcome::from_result(result),
        Err(info) => {
            metrics::record_panic_caught(engine.name());
            warn!(engine = engine.name(), panic = %info, "engine panicked");
            Outcome::panicked(info)
        }
    }
}
