//! Both engines must agree on every program; these tests run each case
//! through both and check the shared result.

use lsig_eval::{
    ContextProfile, Engine, EngineKind, EvalError, EvalParams, Ledger, Lowered, Stepper,
};
use lsig_isa::{
    OP_ADD, OP_ARG_0, OP_ARG_1, OP_ASSERT, OP_B, OP_BITLEN, OP_BNZ, OP_CALLSUB, OP_COVER, OP_DIV,
    OP_DUP, OP_EQ, OP_EXTRACT, OP_EXTRACT_UINT16, OP_GLOBAL, OP_GTXN, OP_LEN, OP_MULW, OP_NOT,
    OP_POP, OP_RETSUB, OP_RETURN, OP_SHA256, OP_SHL, OP_SQRT, OP_SUB, OP_SUBSTRING, OP_TXN,
    OP_UNCOVER, ProgramBuilder,
};
use proptest::prelude::*;

fn params() -> EvalParams {
    EvalParams::for_logic_sig(&ContextProfile::default(), &[], &[vec![0xaa, 0xbb]])
}

fn eval_both(program: &[u8], params: &EvalParams) -> Result<bool, EvalError> {
    let stepper = Stepper.evaluate(program, params);
    let lowered = Lowered.evaluate(program, params);
    assert_eq!(stepper, lowered, "engines disagree on {program:02x?}");
    stepper
}

fn check_both(program: &[u8], params: &EvalParams) -> Result<u64, EvalError> {
    let stepper = Stepper.check(program, params);
    let lowered = Lowered.check(program, params);
    assert_eq!(stepper, lowered, "checkers disagree on {program:02x?}");
    stepper
}

fn eval(builder: ProgramBuilder) -> Result<bool, EvalError> {
    eval_both(&builder.build().unwrap(), &params())
}

#[test]
fn test_empty_program() {
    assert_eq!(check_both(&[], &params()), Ok(0));
    assert_eq!(eval_both(&[], &params()), Ok(false));
}

#[test]
fn test_final_stack() {
    assert_eq!(eval(ProgramBuilder::new(3).push_int(1)), Ok(true));
    assert_eq!(eval(ProgramBuilder::new(3).push_int(0)), Ok(false));
    assert_eq!(
        eval(ProgramBuilder::new(3).push_int(1).push_int(1)),
        Err(EvalError::FinalStack { len: 2 })
    );
    assert_eq!(
        eval(ProgramBuilder::new(3).push_bytes(b"x")),
        Err(EvalError::FinalType)
    );
    // Only the version prefix: nothing on the stack at the end.
    assert_eq!(
        eval_both(&[0x01], &params()),
        Err(EvalError::FinalStack { len: 0 })
    );
}

#[test]
fn test_arithmetic_errors() {
    let overflow = ProgramBuilder::new(3)
        .push_int(u64::MAX)
        .push_int(1)
        .op(OP_ADD);
    assert!(matches!(eval(overflow), Err(EvalError::Overflow { .. })));

    let underflow = ProgramBuilder::new(3).push_int(0).push_int(1).op(OP_SUB);
    assert!(matches!(eval(underflow), Err(EvalError::Underflow { .. })));

    let div = ProgramBuilder::new(3).push_int(1).push_int(0).op(OP_DIV);
    assert!(matches!(eval(div), Err(EvalError::DivideByZero { .. })));

    let empty = ProgramBuilder::new(1).op(OP_ADD);
    assert!(matches!(eval(empty), Err(EvalError::StackUnderflow { .. })));

    let mixed = ProgramBuilder::new(3).push_int(1).push_bytes(b"a").op(OP_ADD);
    assert!(matches!(
        eval(mixed),
        Err(EvalError::TypeMismatch {
            expected: "uint64",
            ..
        })
    ));
}

#[test]
fn test_mulw_pushes_high_then_low() {
    let program = ProgramBuilder::new(3)
        .push_int(u64::MAX)
        .push_int(2)
        .op(OP_MULW)
        .push_int(u64::MAX - 1)
        .op(OP_EQ)
        .op(OP_ASSERT)
        .push_int(1)
        .op(OP_EQ);
    assert_eq!(eval(program), Ok(true));
}

#[test]
fn test_backward_branch_loop() {
    let program = ProgramBuilder::new(4)
        .push_int(5)
        .label("loop")
        .push_int(1)
        .op(OP_SUB)
        .op(OP_DUP)
        .branch(OP_BNZ, "loop")
        .op(OP_NOT);
    assert_eq!(eval(program), Ok(true));
}

#[test]
fn test_subroutines() {
    let program = ProgramBuilder::new(4)
        .branch(OP_CALLSUB, "sub")
        .push_int(2)
        .op(OP_EQ)
        .op(OP_RETURN)
        .label("sub")
        .push_int(2)
        .op(OP_RETSUB);
    assert_eq!(eval(program), Ok(true));

    let stray = ProgramBuilder::new(4).push_int(1).op(OP_RETSUB);
    assert!(matches!(
        eval(stray),
        Err(EvalError::RetsubWithoutCall { .. })
    ));

    let recurse = ProgramBuilder::new(4)
        .label("again")
        .branch(OP_CALLSUB, "again");
    assert!(matches!(eval(recurse), Err(EvalError::CallDepth { .. })));
}

#[test]
fn test_args_and_fields() {
    let arg = ProgramBuilder::new(3)
        .op(OP_ARG_0)
        .op(OP_LEN)
        .push_int(2)
        .op(OP_EQ);
    assert_eq!(eval(arg), Ok(true));

    let missing = ProgramBuilder::new(3).op(OP_ARG_1);
    assert!(matches!(
        eval(missing),
        Err(EvalError::ArgIndex {
            index: 1,
            count: 1,
            ..
        })
    ));

    let sender = ProgramBuilder::new(3)
        .op_u8(OP_TXN, 0)
        .op(OP_LEN)
        .push_int(32)
        .op(OP_EQ);
    assert_eq!(eval(sender), Ok(true));

    let gtxn = ProgramBuilder::new(3).op_u8x2(OP_GTXN, 1, 0);
    assert!(matches!(
        eval(gtxn),
        Err(EvalError::GroupIndex {
            index: 1,
            size: 1,
            ..
        })
    ));
}

#[test]
fn test_ledger_fields() {
    let program = ProgramBuilder::new(3)
        .op_u8(OP_GLOBAL, 6)
        .build()
        .unwrap();
    assert!(matches!(
        eval_both(&program, &params()),
        Err(EvalError::LedgerUnavailable { field: "Round", .. })
    ));

    let mut params = params();
    params.ledger = Some(Ledger {
        round: 7,
        latest_timestamp: 0,
    });
    assert_eq!(eval_both(&program, &params), Ok(true));
}

#[test]
fn test_cost_limits() {
    let mut params = params();
    params.proto.logic_sig_max_cost = 100;
    let mut builder = ProgramBuilder::new(4).push_bytes(b"x");
    for _ in 0..3 {
        builder = builder.op(OP_SHA256);
    }
    builder = builder.op(OP_POP).push_int(1);
    let program = builder.build().unwrap();

    assert_eq!(check_both(&program, &params), Ok(1 + 3 * 35 + 1 + 1));
    assert!(matches!(
        eval_both(&program, &params),
        Err(EvalError::CostExceeded { max: 100, .. })
    ));

    let spin = ProgramBuilder::new(4).label("top").branch(OP_B, "top");
    assert!(matches!(
        eval(spin),
        Err(EvalError::CostExceeded { .. })
    ));
}

#[test]
fn test_stack_overflow() {
    let program = ProgramBuilder::new(4)
        .label("top")
        .push_int(1)
        .branch(OP_B, "top");
    assert!(matches!(eval(program), Err(EvalError::StackOverflow { .. })));
}

#[test]
fn test_cover_and_uncover() {
    let uncover = ProgramBuilder::new(5)
        .push_int(1)
        .push_int(2)
        .push_int(3)
        .op_u8(OP_UNCOVER, 2)
        .push_int(1)
        .op(OP_EQ)
        .op(OP_ASSERT)
        .push_int(3)
        .op(OP_EQ)
        .op(OP_ASSERT)
        .push_int(2)
        .op(OP_EQ);
    assert_eq!(eval(uncover), Ok(true));

    let cover = ProgramBuilder::new(5)
        .push_int(1)
        .push_int(2)
        .push_int(3)
        .op_u8(OP_COVER, 2)
        .push_int(2)
        .op(OP_EQ)
        .op(OP_ASSERT)
        .push_int(1)
        .op(OP_EQ)
        .op(OP_ASSERT)
        .push_int(3)
        .op(OP_EQ);
    assert_eq!(eval(cover), Ok(true));

    let too_deep = ProgramBuilder::new(5).push_int(1).op_u8(OP_COVER, 1);
    assert!(matches!(
        eval(too_deep),
        Err(EvalError::DepthOutOfRange { depth: 1, .. })
    ));
}

#[test]
fn test_byte_slicing() {
    let extract = ProgramBuilder::new(5)
        .push_bytes(b"hello")
        .op_u8x2(OP_EXTRACT, 1, 3)
        .push_bytes(b"ell")
        .op(OP_EQ);
    assert_eq!(eval(extract), Ok(true));

    let to_end = ProgramBuilder::new(5)
        .push_bytes(b"hello")
        .op_u8x2(OP_EXTRACT, 2, 0)
        .push_bytes(b"llo")
        .op(OP_EQ);
    assert_eq!(eval(to_end), Ok(true));

    let uint16 = ProgramBuilder::new(5)
        .push_bytes(&[0x01, 0x02, 0x03])
        .push_int(1)
        .op(OP_EXTRACT_UINT16)
        .push_int(0x0203)
        .op(OP_EQ);
    assert_eq!(eval(uint16), Ok(true));

    let out_of_range = ProgramBuilder::new(3)
        .push_bytes(b"ab")
        .op_u8x2(OP_SUBSTRING, 1, 5);
    assert!(matches!(
        eval(out_of_range),
        Err(EvalError::RangeOutOfBounds {
            start: 1,
            end: 5,
            len: 2,
            ..
        })
    ));
}

#[test]
fn test_bit_ops() {
    let program = ProgramBuilder::new(4)
        .push_int(1)
        .push_int(10)
        .op(OP_SHL)
        .op(OP_SQRT)
        .push_int(32)
        .op(OP_EQ)
        .op(OP_ASSERT)
        .push_bytes(&[0x00, 0x0f, 0xff])
        .op(OP_BITLEN)
        .push_int(12)
        .op(OP_EQ);
    assert_eq!(eval(program), Ok(true));

    let shift = ProgramBuilder::new(4).push_int(1).push_int(64).op(OP_SHL);
    assert!(matches!(
        eval(shift),
        Err(EvalError::ShiftTooLarge { amount: 64, .. })
    ));
}

#[test]
fn test_malformed_programs() {
    // Opcode 0xff is unassigned.
    assert!(matches!(
        eval_both(&[0x01, 0xff], &params()),
        Err(EvalError::Decode(_))
    ));
    assert!(matches!(
        check_both(&[0x01, 0xff], &params()),
        Err(EvalError::Decode(_))
    ));

    // bnz into the middle of the following pushint.
    let misaligned = [0x03, OP_BNZ, 0x00, 0x01, 0x81, 0x01];
    assert!(matches!(
        eval_both(&misaligned, &params()),
        Err(EvalError::MisalignedBranch { target: 5, .. })
    ));

    let mut params = params();
    params.proto.logic_sig_version = 3;
    assert!(matches!(
        eval_both(&[0x04, 0x81, 0x01], &params),
        Err(EvalError::VersionTooHigh { version: 4, max: 3 })
    ));
}

#[test]
fn test_engine_kinds_dispatch() {
    let program = ProgramBuilder::new(3).push_int(9).build().unwrap();
    for kind in EngineKind::ALL {
        assert_eq!(kind.engine().evaluate(&program, &params()), Ok(true));
        assert_eq!(kind.engine().check(&program, &params()), Ok(1));
        assert!(
            kind.engine()
                .disassemble(&program)
                .unwrap()
                .starts_with("#pragma version 3")
        );
    }
}

proptest! {
    #[test]
    fn prop_engines_agree(version in 1u8..=5, body in prop::collection::vec(any::<u8>(), 0..48)) {
        let mut program = vec![version];
        program.extend_from_slice(&body);
        let params = params();
        prop_assert_eq!(Stepper.check(&program, &params), Lowered.check(&program, &params));
        prop_assert_eq!(Stepper.evaluate(&program, &params), Lowered.evaluate(&program, &params));
    }
}
