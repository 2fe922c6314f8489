//! Contract Compiler (C7, §4.3).
//!
//! Seeds the top-level environment, runs the contract-wide structural
//! checks, emits the instantiation args, and then either compiles the
//! contract's single clause directly or arranges the multi-clause selector
//! dispatch before splicing each clause's bytecode in.

use tracing::debug;

use crate::ast::{Clause, Contract, ResolvedArg};
use crate::builder::{Builder, JumpTarget};
use crate::checks;
use crate::clause::compile_clause;
use crate::env::{Environment, Role};
use crate::error::ContractError;
use crate::keywords;
use crate::opcode::Opcode;
use crate::result::{ClauseInfo, CompileResult, ParamInfo};
use crate::stack::Stack;
use crate::types::{BestTypes, Type};

/// Runs the full contract compilation pipeline (§4.3) and assembles the
/// caller-facing [`CompileResult`].
pub fn compile_contract(
    contract: &mut Contract,
    args: &[ResolvedArg],
) -> Result<CompileResult, ContractError> {
    let _span = tracing::debug_span!("compile_contract", contract = %contract.name).entered();

    if contract.clauses.is_empty() {
        return Err(ContractError::EmptyContract);
    }

    let mut env = Environment::new();
    seed_top_environment(&mut env, contract)?;

    checks::prohibit_value_params(contract)?;
    checks::require_all_params_used_in_clauses(contract)?;

    // Taken before any clause mutates its own `Lock` indexes, and used only
    // for read-only lookups (name, value, cross-clause requirement search)
    // while the real clauses are borrowed mutably below.
    let snapshot = contract.clone();

    // Last-declared param is topmost (§4.3 step 4).
    let param_prefix = Stack::from_bottom_up(contract.params.iter().map(|p| p.name.clone()));

    let mut builder = Builder::new();
    for (i, arg) in args.iter().enumerate() {
        emit_arg(&mut builder, arg);
        debug!(index = i, "emitted instantiation arg");
    }

    let mut best_types: BestTypes = contract
        .params
        .iter()
        .map(|p| (p.name.clone(), p.typ.clone()))
        .collect();

    let clause_info = if contract.clauses.len() == 1 {
        let clause = &mut contract.clauses[0];
        let clause_name = clause.name.clone();
        let (bytes, info) = compile_clause(&snapshot, &env, &param_prefix, clause, &mut best_types)
            .map_err(|source| ContractError::Clause {
                clause: clause_name,
                source,
            })?;
        builder.add_raw_bytes(&bytes);
        vec![info]
    } else {
        compile_dispatch(
            &snapshot,
            &env,
            &param_prefix,
            &mut contract.clauses,
            &mut builder,
            &mut best_types,
        )?
    };

    let program = builder.build()?;

    let params = contract
        .params
        .iter()
        .map(|p| ParamInfo {
            name: p.name.clone(),
            typ: best_types.get(&p.name).cloned().unwrap_or_else(|| p.typ.clone()),
        })
        .collect();

    Ok(CompileResult {
        name: contract.name.clone(),
        program,
        value: contract.value.clone(),
        params,
        clause_info,
    })
}

/// Seeds the top-level scope (§4.2): keywords and builtins untyped, the
/// contract itself, each contract param, the contract value, and each
/// clause name. Any collision (including with a keyword/builtin) is a
/// redefinition error — there is no shadowing at the top scope.
fn seed_top_environment(env: &mut Environment, contract: &Contract) -> Result<(), ContractError> {
    for keyword in keywords::KEYWORDS {
        env.add(*keyword, None, Role::Keyword)?;
    }
    for builtin in keywords::builtins() {
        env.add(builtin.name, None, Role::Builtin)?;
    }
    env.add(contract.name.clone(), None, Role::Contract)?;
    for param in &contract.params {
        env.add(param.name.clone(), Some(param.typ.clone()), Role::ContractParam)?;
    }
    env.add(contract.value.clone(), Some(Type::Value), Role::ContractValue)?;
    for clause in &contract.clauses {
        env.add(clause.name.clone(), None, Role::Clause)?;
    }
    Ok(())
}

/// Emits one instantiation arg (§4.3 step 5): booleans as 0/1 integers,
/// integers as-is, byte strings as data pushes. These sit below the
/// contract params at runtime but are never added to the symbolic stack —
/// Ivy expressions have no name to reference them by.
fn emit_arg(builder: &mut Builder, arg: &ResolvedArg) {
    match arg {
        ResolvedArg::Boolean(b) => builder.add_int64(if *b { 1 } else { 0 }),
        ResolvedArg::Integer(n) => builder.add_int64(*n),
        ResolvedArg::Bytes(bytes) => builder.add_data(bytes),
    }
}

/// Arranges the clause-selector dispatch for a multi-clause contract
/// (§4.3 step 7) and compiles each clause into its own target, splicing the
/// raw bytes in. No jumps are ever emitted inside a clause body (§4.4), so
/// relocating the inner builders' absolute offsets is never needed.
fn compile_dispatch(
    snapshot: &Contract,
    env: &Environment,
    param_prefix: &Stack,
    clauses: &mut [Clause],
    builder: &mut Builder,
    best_types: &mut BestTypes,
) -> Result<Vec<ClauseInfo>, ContractError> {
    let n = clauses.len();

    if !param_prefix.is_empty() {
        builder.add_int64(param_prefix.len() as i64);
        builder.add_op(Opcode::Roll);
    }

    let end_target = builder.new_jump_target();
    let clause_targets: Vec<JumpTarget> = (0..n).map(|_| builder.new_jump_target()).collect();
    debug!(clauses = n, "allocated dispatch targets");

    for i in (2..n).rev() {
        builder.add_op(Opcode::Dup);
        builder.add_int64(i as i64);
        builder.add_op(Opcode::NumEqual);
        builder.add_jump_if(clause_targets[i]);
    }
    // The remaining selector copy is 0 or 1; JUMPIF consumes it directly as
    // a boolean without an explicit NUMEQUAL against 1.
    builder.add_jump_if(clause_targets[1]);
    // Falls through into clause 0.

    let mut clause_info = Vec::with_capacity(n);
    for (i, clause) in clauses.iter_mut().enumerate() {
        builder.set_jump_target(clause_targets[i]);
        let clause_name = clause.name.clone();
        let (bytes, info) = compile_clause(snapshot, env, param_prefix, clause, best_types)
            .map_err(|source| ContractError::Clause {
                clause: clause_name,
                source,
            })?;
        builder.add_raw_bytes(&bytes);
        clause_info.push(info);
        if i < n - 1 {
            builder.add_jump(end_target);
        }
    }
    builder.set_jump_target(end_target);

    Ok(clause_info)
}
