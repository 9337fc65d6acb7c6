//! Driver behavior against real and scripted engines.

use lsig::{
    ContextProfile, DiffConfig, Driver, Engine, EngineKind, EscalationKind, EvalError,
    EvalParams, Failure, FuzzInput, MAX_INPUT_LEN, Outcome, Phase, TxnType, Verdict, fuzz_with,
};
use lsig_isa::{OP_ADD, OP_ARG_0, OP_EQ, OP_LEN, OP_MUL, OP_TXN, ProgramBuilder, TxnField};
use parking_lot::Mutex;
use proptest::prelude::*;

/// Engine whose answers are fixed up front.
struct Scripted {
    name: &'static str,
    check: Result<u64, EvalError>,
    eval: Result<bool, EvalError>,
}

impl Engine for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self, _program: &[u8], _params: &EvalParams) -> Result<u64, EvalError> {
        self.check.clone()
    }

    fn evaluate(&self, _program: &[u8], _params: &EvalParams) -> Result<bool, EvalError> {
        self.eval.clone()
    }
}

/// Engine that panics in one phase.
struct Panicking {
    in_check: bool,
}

impl Engine for Panicking {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn check(&self, _program: &[u8], _params: &EvalParams) -> Result<u64, EvalError> {
        assert!(!self.in_check, "checker blew up");
        Ok(1)
    }

    fn evaluate(&self, _program: &[u8], _params: &EvalParams) -> Result<bool, EvalError> {
        let empty: &[u8] = &[];
        Ok(empty[3] == 0)
    }
}

/// Engine that logs each phase it is asked to run.
struct Recording {
    calls: Mutex<Vec<&'static str>>,
}

impl Engine for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn check(&self, _program: &[u8], _params: &EvalParams) -> Result<u64, EvalError> {
        self.calls.lock().push("check");
        Ok(1)
    }

    fn evaluate(&self, _program: &[u8], _params: &EvalParams) -> Result<bool, EvalError> {
        self.calls.lock().push("eval");
        Ok(true)
    }
}

static RECORDING: Recording = Recording {
    calls: Mutex::new(Vec::new()),
};

static AGREEING: Scripted = Scripted {
    name: "agreeing",
    check: Ok(1),
    eval: Ok(true),
};
static CHECK_FAILS: Scripted = Scripted {
    name: "check-fails",
    check: Err(EvalError::FinalType),
    eval: Ok(true),
};
static COSTLY: Scripted = Scripted {
    name: "costly",
    check: Ok(7),
    eval: Ok(true),
};
static REJECTING: Scripted = Scripted {
    name: "rejecting",
    check: Ok(1),
    eval: Ok(false),
};
static EVAL_FAILS: Scripted = Scripted {
    name: "eval-fails",
    check: Ok(1),
    eval: Err(EvalError::FinalType),
};
static PANICS_IN_CHECK: Panicking = Panicking { in_check: true };
static PANICS_IN_EVAL: Panicking = Panicking { in_check: false };

fn pair(reference: &'static dyn Engine, candidate: &'static dyn Engine) -> Driver {
    Driver::with_engines(
        reference,
        ContextProfile::default(),
        candidate,
        ContextProfile::default(),
    )
}

fn simple_input() -> FuzzInput {
    FuzzInput::new(ProgramBuilder::new(3).push_int(1).build().unwrap(), vec![])
}

#[test]
fn test_example_empty_program_is_evaluated() {
    let driver = Driver::new(&DiffConfig::default());
    assert_eq!(driver.run_raw(&[0x00]).unwrap(), Verdict::Interesting);

    let observation = driver.execute(&FuzzInput::default());
    assert_eq!(observation.check.reference, Outcome::from_result(Ok(0)));
    assert_eq!(observation.check.candidate, Outcome::from_result(Ok(0)));
    let eval = observation.eval.unwrap();
    let rejected = Outcome {
        value: false,
        failure: None,
    };
    assert_eq!(eval.reference, rejected);
    assert_eq!(eval.candidate, rejected);
    assert_eq!(observation.finding, None);
}

#[test]
fn test_example_one_arg_input() {
    let program = ProgramBuilder::new(3)
        .op(OP_ARG_0)
        .op(OP_LEN)
        .push_int(2)
        .op(OP_EQ)
        .build()
        .unwrap();
    let mut raw = vec![0x01, 0x00, 0x02, 0xaa, 0xbb];
    raw.extend_from_slice(&program);

    let decoded = lsig::decode(&raw).unwrap();
    assert_eq!(decoded.args, vec![vec![0xaa, 0xbb]]);
    assert_eq!(decoded.program, program);

    let driver = Driver::new(&DiffConfig::default());
    assert_eq!(driver.run_raw(&raw).unwrap(), Verdict::Interesting);
    let observation = driver.execute(&decoded);
    let eval = observation.eval.unwrap();
    assert!(eval.reference.value);
    assert!(eval.candidate.value);
}

#[test]
fn test_example_truncated_arg_is_skipped() {
    let driver = Driver::new(&DiffConfig::default());
    assert_eq!(fuzz_with(&driver, &[0x01, 0xff, 0xff]), 0);
}

#[test]
fn test_oversized_input_is_skipped() {
    let driver = pair(&PANICS_IN_CHECK, &AGREEING);
    assert_eq!(fuzz_with(&driver, &vec![0u8; MAX_INPUT_LEN + 1]), 0);
}

#[test]
fn test_nilness_mismatch_before_cost() {
    let driver = pair(&AGREEING, &CHECK_FAILS);
    let observation = driver.execute(&simple_input());
    let finding = observation.finding.unwrap();
    assert_eq!(finding.phase, Phase::Check);
    assert_eq!(
        finding.kind,
        EscalationKind::NilnessMismatch {
            reference: None,
            candidate: Some(EvalError::FinalType.to_string()),
        }
    );
    assert!(observation.eval.is_none());

    let escalation = driver.run(&simple_input()).unwrap_err();
    assert!(escalation.to_string().starts_with("check error nilness not equal! <nil> != "));
}

#[test]
fn test_cost_mismatch() {
    let driver = pair(&AGREEING, &COSTLY);
    let escalation = driver.run(&simple_input()).unwrap_err();
    assert_eq!(escalation.phase, Phase::Check);
    assert_eq!(
        escalation.kind,
        EscalationKind::CostMismatch {
            reference: 1,
            candidate: 7,
        }
    );
    assert_eq!(escalation.to_string(), "costs not equal! 1 != 7");
}

#[test]
fn test_pass_mismatch() {
    let driver = pair(&AGREEING, &REJECTING);
    let escalation = driver.run(&simple_input()).unwrap_err();
    assert_eq!(escalation.phase, Phase::Eval);
    assert_eq!(escalation.to_string(), "success not equal! true != false");
}

#[test]
fn test_eval_nilness_mismatch() {
    let driver = pair(&EVAL_FAILS, &AGREEING);
    let escalation = driver.run(&simple_input()).unwrap_err();
    assert_eq!(escalation.phase, Phase::Eval);
    assert!(matches!(
        escalation.kind,
        EscalationKind::NilnessMismatch {
            reference: Some(_),
            candidate: None,
        }
    ));
}

#[test]
fn test_both_failing_agree() {
    let driver = pair(&CHECK_FAILS, &CHECK_FAILS);
    assert_eq!(driver.run(&simple_input()).unwrap(), Verdict::Interesting);
}

#[test]
fn test_check_panic_escalates() {
    let driver = pair(&AGREEING, &PANICS_IN_CHECK);
    let observation = driver.execute(&simple_input());
    assert!(matches!(
        observation.check.candidate.failure,
        Some(Failure::Panic(_))
    ));
    assert!(observation.eval.is_none());
    match observation.finding.unwrap().kind {
        EscalationKind::Panic { engine, info } => {
            assert_eq!(engine, "panicking");
            assert!(info.message.contains("checker blew up"));
        }
        other => panic!("unexpected finding {other:?}"),
    }
}

#[test]
fn test_eval_panic_escalates_on_reference_side() {
    let driver = pair(&PANICS_IN_EVAL, &PANICS_IN_EVAL);
    let escalation = driver.run(&simple_input()).unwrap_err();
    assert_eq!(escalation.phase, Phase::Eval);
    assert!(matches!(escalation.kind, EscalationKind::Panic { .. }));
    assert!(escalation.to_string().starts_with("panicking panicked during eval: "));
}

#[test]
fn test_check_phase_completes_before_eval() {
    let driver = pair(&RECORDING, &RECORDING);
    assert_eq!(driver.run(&simple_input()).unwrap(), Verdict::Interesting);
    assert_eq!(*RECORDING.calls.lock(), ["check", "check", "eval", "eval"]);
}

#[test]
fn test_execute_is_repeatable() {
    let driver = Driver::new(&DiffConfig::default());
    let input = FuzzInput::new(
        ProgramBuilder::new(3)
            .push_int(6)
            .push_int(7)
            .op(OP_MUL)
            .push_int(42)
            .op(OP_EQ)
            .build()
            .unwrap(),
        vec![vec![1, 2, 3]],
    );
    assert_eq!(driver.execute(&input), driver.execute(&input));
}

#[test]
fn test_report_attached_to_escalation() {
    let driver = pair(&AGREEING, &COSTLY);
    let input = FuzzInput::new(vec![0x03, 0x81, 0x01], vec![vec![0xaa]]);
    let escalation = driver.run(&input).unwrap_err();
    let report = escalation.report.to_string();
    assert!(report.contains("program bytes: 038101"));
    assert!(report.contains("program args: 1"));
    assert!(report.contains("arg 0: aa"));
}

#[test]
#[should_panic(expected = "costs not equal")]
fn test_fuzz_with_panics_on_escalation() {
    let driver = pair(&AGREEING, &COSTLY);
    let raw = FuzzInput::new(vec![0x03, 0x81, 0x01], vec![])
        .to_bytes()
        .unwrap();
    fuzz_with(&driver, &raw);
}

#[test]
fn test_differing_txn_types_surface_as_mismatch() {
    let config = DiffConfig::default()
        .with_engines(EngineKind::Stepper, EngineKind::Lowered)
        .with_txn_types(TxnType::Payment, TxnType::ApplicationCall);
    let driver = Driver::new(&config);
    let input = FuzzInput::new(
        ProgramBuilder::new(3)
            .op_u8(OP_TXN, TxnField::TypeEnum.id())
            .push_int(1)
            .op(OP_EQ)
            .build()
            .unwrap(),
        vec![],
    );
    let escalation = driver.run(&input).unwrap_err();
    assert_eq!(escalation.phase, Phase::Eval);
    assert_eq!(
        escalation.kind,
        EscalationKind::PassMismatch {
            reference: true,
            candidate: false,
        }
    );
}

#[test]
fn test_differing_profiles_surface_as_mismatch() {
    let mut config = DiffConfig::default().with_engines(EngineKind::Stepper, EngineKind::Stepper);
    config.candidate_profile.logic_sig_max_cost = 1;
    let driver = Driver::new(&config);
    let input = FuzzInput::new(
        ProgramBuilder::new(3)
            .push_int(1)
            .push_int(1)
            .op(OP_ADD)
            .build()
            .unwrap(),
        vec![],
    );
    let escalation = driver.run(&input).unwrap_err();
    assert!(matches!(
        escalation.kind,
        EscalationKind::NilnessMismatch {
            reference: None,
            candidate: Some(_),
        }
    ));
}

proptest! {
    #[test]
    fn prop_oversized_inputs_short_circuit(extra in 1usize..64, fill in any::<u8>()) {
        let driver = pair(&PANICS_IN_CHECK, &PANICS_IN_EVAL);
        let raw = vec![fill; MAX_INPUT_LEN + extra];
        prop_assert_eq!(fuzz_with(&driver, &raw), 0);
    }

    #[test]
    fn prop_zero_args_keeps_whole_tail(program in proptest::collection::vec(any::<u8>(), 0..128)) {
        let mut raw = vec![0x00];
        raw.extend_from_slice(&program);
        let decoded = lsig::decode(&raw).unwrap();
        prop_assert!(decoded.args.is_empty());
        prop_assert_eq!(decoded.program, program);
    }

    #[test]
    fn prop_truncated_arg_skips(declared in 1u16.., available in 0usize..64) {
        let available = available.min(usize::from(declared) - 1);
        let mut raw = vec![0x01];
        raw.extend_from_slice(&declared.to_be_bytes());
        raw.extend(std::iter::repeat_n(0xee, available));
        let driver = pair(&PANICS_IN_CHECK, &PANICS_IN_EVAL);
        prop_assert_eq!(fuzz_with(&driver, &raw), 0);
    }

    #[test]
    fn prop_default_engines_never_escalate(
        body in proptest::collection::vec(any::<u8>(), 0..48),
        version in 1u8..=5,
        arg in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let mut program = vec![version];
        program.extend_from_slice(&body);
        let driver = Driver::new(&DiffConfig::default());
        let result = driver.run(&FuzzInput::new(program, vec![arg]));
        prop_assert!(result.is_ok(), "{}", result.unwrap_err());
    }
}
