//! Differential execution of two engines.

mod driver;
mod escalation;
mod guard;
mod outcome;

pub use driver::{Driver, Observation, PhaseRecord, Verdict};
pub use escalation::{Escalation, EscalationKind, Finding, Phase};
pub use guard::guarded;
pub use outcome::{Failure, Outcome, PanicInfo};
