//! End-to-end scenarios against the public `compile` entry point (§8).

use ivy_compiler::ast::{Clause, ClauseParam, ClauseRequirement, Contract, ContractParam, Expression, Statement};
use ivy_compiler::opcode::Opcode;
use ivy_compiler::types::{HashAlgorithm, Type};
use pretty_assertions::assert_eq;

fn var(name: &str) -> Expression {
    Expression::VarRef {
        name: name.to_string(),
    }
}

fn call(function: &str, args: Vec<Expression>) -> Expression {
    Expression::Call {
        function: function.to_string(),
        args,
    }
}

#[test]
fn s1_trivial_lock() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![ContractParam {
            name: "p".to_string(),
            typ: Type::Integer,
        }],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Lock {
                locked: var("v"),
                program: var("p"),
                index: 0,
            }],
        }],
    };
    let result = ivy_compiler::compile(&mut contract, &[]).unwrap();
    assert_eq!(
        result.program,
        vec![
            0x01, // INT64(0) -> small-int byte for 0
            Opcode::PushData.byte(),
            0,
            0,
            0,
            0, // empty data push
            Opcode::Amount.byte(),
            Opcode::Asset.byte(),
            0x02, // INT64(1)
            Opcode::Dup.byte(),
            Opcode::CheckOutput.byte(),
            Opcode::Verify.byte(),
        ]
    );
    assert_eq!(result.clause_info[0].value_info[0].name, "v");
    assert_eq!(result.clause_info[0].value_info[0].program.as_deref(), Some("p"));
}

#[test]
fn s2_trivial_unlock() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Unlock { value: var("v") }],
        }],
    };
    let result = ivy_compiler::compile(&mut contract, &[]).unwrap();
    assert_eq!(result.program, vec![Opcode::True.byte()]);
    assert_eq!(result.clause_info[0].value_info, vec![ivy_compiler::result::ValueInfo {
        name: "v".to_string(),
        program: None,
        asset: None,
        amount: None,
    }]);
}

#[test]
fn s3_two_clause_selector() {
    // `p` has to be referenced somewhere or the unused-contract-param check
    // rejects this before dispatch is reached; a trivial self-comparison
    // keeps both clause bodies symmetric.
    let self_eq_p = Statement::Verify {
        expr: Expression::Binary {
            op: "==".to_string(),
            left: Box::new(var("p")),
            right: Box::new(var("p")),
        },
    };
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![ContractParam {
            name: "p".to_string(),
            typ: Type::Integer,
        }],
        clauses: vec![
            Clause {
                name: "a".to_string(),
                params: vec![],
                reqs: vec![],
                statements: vec![self_eq_p.clone(), Statement::Unlock { value: var("v") }],
            },
            Clause {
                name: "b".to_string(),
                params: vec![],
                reqs: vec![],
                statements: vec![self_eq_p, Statement::Unlock { value: var("v") }],
            },
        ],
    };
    let result = ivy_compiler::compile(&mut contract, &[]).unwrap();
    // prologue: INT64(1); ROLL; JUMPIF target1
    assert_eq!(result.program[0], 0x02); // INT64(1)
    assert_eq!(result.program[1], Opcode::Roll.byte());
    assert_eq!(
        result.program.iter().filter(|&&b| b == Opcode::JumpIf.byte()).count(),
        1
    );
    assert_eq!(
        result.program.iter().filter(|&&b| b == Opcode::Jump.byte()).count(),
        1
    );
    assert_eq!(
        result.program.iter().filter(|&&b| b == Opcode::Verify.byte()).count(),
        2
    );
}

#[test]
fn s4_time_bound_records_maxtimes_only() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![ClauseParam {
                name: "t".to_string(),
                typ: Type::Time,
            }],
            reqs: vec![],
            statements: vec![
                Statement::Verify {
                    expr: call("before", vec![var("t")]),
                },
                Statement::Unlock { value: var("v") },
            ],
        }],
    };
    let result = ivy_compiler::compile(&mut contract, &[]).unwrap();
    assert_eq!(result.clause_info[0].mintimes, Vec::<String>::new());
    assert_eq!(result.clause_info[0].maxtimes, vec!["t".to_string()]);
}

#[test]
fn s5_multisig_emits_expected_tail() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![
                ClauseParam {
                    name: "pk1".to_string(),
                    typ: Type::PublicKey,
                },
                ClauseParam {
                    name: "pk2".to_string(),
                    typ: Type::PublicKey,
                },
                ClauseParam {
                    name: "pk3".to_string(),
                    typ: Type::PublicKey,
                },
                ClauseParam {
                    name: "sig1".to_string(),
                    typ: Type::Signature,
                },
                ClauseParam {
                    name: "sig2".to_string(),
                    typ: Type::Signature,
                },
            ],
            reqs: vec![],
            statements: vec![
                Statement::Verify {
                    expr: call(
                        "checkTxMultiSig",
                        vec![
                            Expression::ListExpr {
                                items: vec![var("pk1"), var("pk2"), var("pk3")],
                            },
                            Expression::ListExpr {
                                items: vec![var("sig1"), var("sig2")],
                            },
                        ],
                    ),
                },
                Statement::Unlock { value: var("v") },
            ],
        }],
    };
    let result = ivy_compiler::compile(&mut contract, &[]).unwrap();
    let tail_start = result
        .program
        .iter()
        .position(|&b| b == Opcode::ToAltStack.byte())
        .unwrap();
    let tail = &result.program[tail_start..];
    assert_eq!(tail.last().copied(), Some(Opcode::Verify.byte()));
    let tx_sig_hash = tail.iter().position(|&b| b == Opcode::TxSigHash.byte()).unwrap();
    let from_alt = tail.iter().position(|&b| b == Opcode::FromAltStack.byte()).unwrap();
    let swap = tail.iter().position(|&b| b == Opcode::Swap.byte()).unwrap();
    let check_multisig = tail.iter().position(|&b| b == Opcode::CheckMultiSig.byte()).unwrap();
    assert!(tx_sig_hash < from_alt);
    assert!(from_alt < swap);
    assert!(swap < check_multisig);
}

#[test]
fn s6_hash_equality_propagates_subtype_and_records_hash_call() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![ContractParam {
            name: "expected".to_string(),
            typ: Type::HashSubtype {
                algorithm: HashAlgorithm::Sha3,
                preimage: Box::new(Type::Bytes),
            },
        }],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![ClauseParam {
                name: "preimage".to_string(),
                typ: Type::Bytes,
            }],
            reqs: vec![],
            statements: vec![
                Statement::Verify {
                    expr: Expression::Binary {
                        op: "==".to_string(),
                        left: Box::new(call("sha3", vec![var("preimage")])),
                        right: Box::new(var("expected")),
                    },
                },
                Statement::Unlock { value: var("v") },
            ],
        }],
    };
    let result = ivy_compiler::compile(&mut contract, &[]).unwrap();
    assert!(result.program.contains(&Opcode::Sha3.byte()));
    assert!(result.program.contains(&Opcode::Equal.byte()));
    assert_eq!(result.clause_info[0].hash_calls.len(), 1);
    assert_eq!(result.clause_info[0].hash_calls[0].name, "sha3");
    assert_eq!(result.clause_info[0].hash_calls[0].arg, "preimage");
    assert_eq!(result.clause_info[0].hash_calls[0].typ, Type::Bytes);
}

#[test]
fn zero_clause_contract_is_rejected() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![],
        clauses: vec![],
    };
    assert!(ivy_compiler::compile(&mut contract, &[]).is_err());
}

#[test]
fn lock_on_requirement_uses_its_expressions_not_amount_asset() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![ContractParam {
            name: "p".to_string(),
            typ: Type::Integer,
        }],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![ClauseRequirement {
                name: "req".to_string(),
                asset_expr: Expression::BytesLiteral { value: vec![0xaa] },
                amount_expr: Expression::IntegerLiteral { value: 10 },
            }],
            statements: vec![
                Statement::Lock {
                    locked: var("req"),
                    program: var("p"),
                    index: 0,
                },
                Statement::Unlock { value: var("v") },
            ],
        }],
    };
    let result = ivy_compiler::compile(&mut contract, &[]).unwrap();
    assert!(!result.program.contains(&Opcode::Amount.byte()));
    assert!(!result.program.contains(&Opcode::Asset.byte()));
    let value_info = &result.clause_info[0].value_info[0];
    assert_eq!(value_info.name, "req");
    assert_eq!(value_info.asset.as_deref(), Some("0xaa"));
    assert_eq!(value_info.amount.as_deref(), Some("10"));
}

#[test]
fn undefined_reference_is_an_error() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![
                Statement::Verify { expr: var("nope") },
                Statement::Unlock { value: var("v") },
            ],
        }],
    };
    assert!(ivy_compiler::compile(&mut contract, &[]).is_err());
}

#[test]
fn equality_between_integer_and_boolean_is_rejected() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![
            ContractParam {
                name: "i".to_string(),
                typ: Type::Integer,
            },
            ContractParam {
                name: "b".to_string(),
                typ: Type::Boolean,
            },
        ],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![
                Statement::Verify {
                    expr: Expression::Binary {
                        op: "==".to_string(),
                        left: Box::new(var("i")),
                        right: Box::new(var("b")),
                    },
                },
                Statement::Unlock { value: var("v") },
            ],
        }],
    };
    assert!(ivy_compiler::compile(&mut contract, &[]).is_err());
}

#[test]
fn idempotent_compilation_of_the_same_contract() {
    let build = || Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![ContractParam {
            name: "p".to_string(),
            typ: Type::Integer,
        }],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Lock {
                locked: var("v"),
                program: var("p"),
                index: 0,
            }],
        }],
    };
    let first = ivy_compiler::compile(&mut build(), &[]).unwrap();
    let second = ivy_compiler::compile(&mut build(), &[]).unwrap();
    assert_eq!(first.program, second.program);
    assert_eq!(first.clause_info[0].value_info, second.clause_info[0].value_info);
}

#[test]
fn instantiation_args_are_emitted_before_params_and_consumed_by_caller_only() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Unlock { value: var("v") }],
        }],
    };
    let args = vec![
        ivy_compiler::ContractArg {
            integer: Some(42),
            ..Default::default()
        },
        ivy_compiler::ContractArg {
            boolean: Some(true),
            ..Default::default()
        },
    ];
    let result = ivy_compiler::compile(&mut contract, &args).unwrap();
    // Args are emitted first, then the (empty, here) param prefix, then the clause body.
    assert_eq!(result.program.last().copied(), Some(Opcode::True.byte()));
}

#[test]
fn malformed_contract_arg_is_an_input_error() {
    let mut contract = Contract {
        name: "T".to_string(),
        value: "v".to_string(),
        params: vec![],
        clauses: vec![Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Unlock { value: var("v") }],
        }],
    };
    let args = vec![ivy_compiler::ContractArg::default()];
    let err = ivy_compiler::compile(&mut contract, &args).unwrap_err();
    assert!(matches!(err, ivy_compiler::CompileError::Arg(_)));
}
