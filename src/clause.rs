//! Clause Compiler (C6, §4.4).

use tracing::debug;

use crate::ast::{Clause, Contract, Expression, Statement};
use crate::builder::Builder;
use crate::checks;
use crate::env::{Environment, Role};
use crate::error::ClauseError;
use crate::expr::{compile_expr, ExprCtx};
use crate::opcode::Opcode;
use crate::result::{ClauseInfo, ParamInfo, ValueInfo};
use crate::stack::Stack;
use crate::types::{BestTypes, Type};

/// Sets each `lock` statement's `index` to its zero-based position among
/// `lock` statements in source order (§4.6).
pub fn assign_indexes(clause: &mut Clause) {
    let mut next_index = 0u32;
    for statement in &mut clause.statements {
        if let Statement::Lock { index, .. } = statement {
            *index = next_index;
            next_index += 1;
        }
    }
}

/// Compiles one clause into a fresh inner builder (§4.3: the outer compiler
/// splices the result raw into the dispatch target it allocated) and
/// assembles its analysis record.
pub fn compile_clause(
    contract: &Contract,
    outer_env: &Environment,
    param_prefix: &Stack,
    clause: &mut Clause,
    best_types: &mut BestTypes,
) -> Result<(Vec<u8>, ClauseInfo), ClauseError> {
    let _span = tracing::debug_span!("compile_clause", clause = %clause.name).entered();

    let mut env = outer_env.child();
    for param in &clause.params {
        env.add(param.name.clone(), Some(param.typ.clone()), Role::ClauseParam)
            .map_err(|source| ClauseError::Env {
                clause: clause.name.clone(),
                source,
            })?;
    }
    for req in &clause.reqs {
        env.add(req.name.clone(), Some(Type::Value), Role::ClauseValue)
            .map_err(|source| ClauseError::Env {
                clause: clause.name.clone(),
                source,
            })?;
    }

    checks::require_all_values_disposed_once(clause, &contract.value)?;
    checks::require_all_params_used_in_clause(clause)?;

    assign_indexes(clause);

    // Clause params are pushed last-declared-topmost, ahead of the
    // inherited contract-param prefix (§4.4 step 6).
    let mut stack = param_prefix.clone();
    for param in &clause.params {
        stack.push(param.name.clone());
    }

    let mut builder = Builder::new();
    let mut mintimes = Vec::new();
    let mut maxtimes = Vec::new();
    let mut hash_calls = Vec::new();
    let mut value_info = Vec::new();

    let statement_count = clause.statements.len();
    for (i, statement) in clause.statements.iter().enumerate() {
        let is_only_statement = statement_count == 1;
        let mut ctx = ExprCtx {
            hash_calls: &mut hash_calls,
            best_types,
        };
        compile_statement(
            statement,
            is_only_statement,
            &clause.name,
            contract,
            &env,
            &mut stack,
            &mut builder,
            &mut mintimes,
            &mut maxtimes,
            &mut ctx,
            &mut value_info,
        )
        .map_err(|source| match source {
            StatementError::Clause(e) => e,
            StatementError::Expr { context, source } => ClauseError::Expr {
                clause: clause.name.clone(),
                context: format!("statement {i}, {context}"),
                source,
            },
        })?;
    }

    debug!(clause = %clause.name, mintimes = ?mintimes, maxtimes = ?maxtimes, "compiled clause");

    let info = ClauseInfo {
        name: clause.name.clone(),
        args: clause
            .params
            .iter()
            .map(|p| ParamInfo {
                name: p.name.clone(),
                typ: p.typ.clone(),
            })
            .collect(),
        value_info,
        mintimes,
        maxtimes,
        hash_calls,
    };
    let bytes = builder.build().map_err(|source| ClauseError::Expr {
        clause: clause.name.clone(),
        context: "finalizing clause bytecode".to_string(),
        source: source.into(),
    })?;
    Ok((bytes, info))
}

/// Either a clause-level error (already fully formed) or a bare expression
/// error still needing the statement's position/context attached by the
/// caller.
enum StatementError {
    Clause(ClauseError),
    Expr {
        context: String,
        source: crate::error::ExprError,
    },
}

impl From<crate::error::ExprError> for StatementError {
    fn from(source: crate::error::ExprError) -> Self {
        StatementError::Expr {
            context: "expression".to_string(),
            source,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_statement(
    statement: &Statement,
    is_only_statement: bool,
    clause_name: &str,
    contract: &Contract,
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    mintimes: &mut Vec<String>,
    maxtimes: &mut Vec<String>,
    ctx: &mut ExprCtx,
    value_info: &mut Vec<ValueInfo>,
) -> Result<(), StatementError> {
    match statement {
        Statement::Verify { expr } => {
            let typ = compile_expr(expr, env, stack, builder, &contract.name, ctx)?;
            if typ != Type::Boolean {
                let source: crate::error::ExprError =
                    crate::error::TypeError::VerifyRequiresBoolean { found: typ }.into();
                return Err(source.into());
            }
            builder.add_op(Opcode::Verify);
            record_time_bound(expr, mintimes, maxtimes);
        }
        Statement::Lock {
            locked,
            program,
            index,
        } => {
            compile_lock(
                locked,
                program,
                *index,
                clause_name,
                contract,
                env,
                stack,
                builder,
                ctx,
                value_info,
            )?;
        }
        Statement::Unlock { value } => {
            if let Expression::VarRef { name } = value {
                value_info.push(ValueInfo {
                    name: name.clone(),
                    program: None,
                    asset: None,
                    amount: None,
                });
            }
            if is_only_statement {
                builder.add_op(Opcode::True);
            }
        }
    }
    Ok(())
}

/// If `expr` is `before(x)`/`after(x)`, records `x`'s textual form into
/// `maxtimes`/`mintimes` respectively (§4.4 `verify` post-processing).
fn record_time_bound(expr: &Expression, mintimes: &mut Vec<String>, maxtimes: &mut Vec<String>) {
    if let Expression::Call { function, args } = expr {
        if args.len() == 1 {
            match function.as_str() {
                "before" => maxtimes.push(args[0].to_string()),
                "after" => mintimes.push(args[0].to_string()),
                _ => {}
            }
        }
    }
}

/// Emits the `CHECKOUTPUT` tuple (§4.4 `lock`), working on a local copy of
/// the stack so the shared clause stack is unaffected for the statement
/// that follows.
#[allow(clippy::too_many_arguments)]
fn compile_lock(
    locked: &Expression,
    program: &Expression,
    index: u32,
    clause_name: &str,
    contract: &Contract,
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    ctx: &mut ExprCtx,
    value_info: &mut Vec<ValueInfo>,
) -> Result<(), StatementError> {
    let mut local_stack = stack.clone();

    builder.add_int64(index as i64);
    builder.add_data(&[]);

    let locked_name = match locked {
        Expression::VarRef { name } => name.clone(),
        other => other.to_string(),
    };

    let (asset_text, amount_text) = if locked_name == contract.value {
        builder.add_op(Opcode::Amount);
        builder.add_op(Opcode::Asset);
        (None, None)
    } else {
        let req = contract
            .clauses
            .iter()
            .flat_map(|c| c.reqs.iter())
            .find(|r| r.name == locked_name)
            .ok_or_else(|| {
                StatementError::Clause(ClauseError::UnknownRequirement {
                    clause: clause_name.to_string(),
                    name: locked_name.clone(),
                })
            })?;
        compile_expr(
            &req.amount_expr,
            env,
            &mut local_stack,
            builder,
            &contract.name,
            ctx,
        )?;
        compile_expr(
            &req.asset_expr,
            env,
            &mut local_stack,
            builder,
            &contract.name,
            ctx,
        )?;
        (
            Some(req.asset_expr.to_string()),
            Some(req.amount_expr.to_string()),
        )
    };

    builder.add_int64(1);
    compile_expr(program, env, &mut local_stack, builder, &contract.name, ctx)?;

    builder.add_op(Opcode::CheckOutput);
    builder.add_op(Opcode::Verify);

    value_info.push(ValueInfo {
        name: locked_name,
        program: Some(program.to_string()),
        asset: asset_text,
        amount: amount_text,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ContractParam;

    fn contract_with_clause(clause: Clause) -> Contract {
        Contract {
            name: "T".to_string(),
            value: "v".to_string(),
            params: vec![],
            clauses: vec![clause],
        }
    }

    #[test]
    fn assign_indexes_numbers_locks_in_source_order() {
        let mut clause = Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Lock {
                locked: Expression::VarRef { name: "v".into() },
                program: Expression::VarRef { name: "p".into() },
                index: 99,
            }],
        };
        assign_indexes(&mut clause);
        match &clause.statements[0] {
            Statement::Lock { index, .. } => assert_eq!(*index, 0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn unlock_only_statement_emits_true() {
        let mut clause = Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Unlock {
                value: Expression::VarRef { name: "v".into() },
            }],
        };
        let contract = contract_with_clause(clause.clone());
        let env = Environment::new();
        let stack = Stack::new();
        let (bytes, info) = compile_clause(&contract, &env, &stack, &mut clause, &mut BestTypes::new()).unwrap();
        assert_eq!(bytes, vec![Opcode::True.byte()]);
        assert_eq!(
            info.value_info,
            vec![ValueInfo {
                name: "v".to_string(),
                program: None,
                asset: None,
                amount: None,
            }]
        );
    }

    #[test]
    fn lock_on_unknown_requirement_fails() {
        let contract = Contract {
            name: "T".to_string(),
            value: "v".to_string(),
            params: vec![ContractParam {
                name: "p".to_string(),
                typ: Type::Integer,
            }],
            clauses: vec![],
        };
        let mut clause = Clause {
            name: "c".to_string(),
            params: vec![],
            reqs: vec![],
            statements: vec![Statement::Lock {
                locked: Expression::VarRef { name: "nope".into() },
                program: Expression::VarRef { name: "p".into() },
                index: 0,
            }],
        };
        let env = Environment::new();
        let stack = Stack::new();
        let err = compile_clause(&contract, &env, &stack, &mut clause, &mut BestTypes::new()).unwrap_err();
        assert!(matches!(err, ClauseError::UnknownRequirement { .. }));
    }

    #[test]
    fn verify_on_non_boolean_expression_fails() {
        let mut clause = Clause {
            name: "c".to_string(),
            params: vec![crate::ast::ClauseParam {
                name: "n".to_string(),
                typ: Type::Integer,
            }],
            reqs: vec![],
            statements: vec![
                Statement::Verify {
                    expr: Expression::VarRef { name: "n".into() },
                },
                Statement::Unlock {
                    value: Expression::VarRef { name: "v".into() },
                },
            ],
        };
        let contract = contract_with_clause(clause.clone());
        let env = Environment::new();
        let stack = Stack::new();
        let err = compile_clause(&contract, &env, &stack, &mut clause, &mut BestTypes::new()).unwrap_err();
        assert!(matches!(
            err,
            ClauseError::Expr {
                source: crate::error::ExprError::Type(crate::error::TypeError::VerifyRequiresBoolean { .. }),
                ..
            }
        ));
    }
}
