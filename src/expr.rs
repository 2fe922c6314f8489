//! Expression Compiler (C5, §4.5).
//!
//! Every public entry point lowers one expression onto the builder and the
//! symbolic stack, and returns the expression's inferred [`Type`]. The
//! stack bookkeeping follows one rule throughout: a sub-expression may push
//! any number of intermediate slots while it's being compiled (needed so
//! that later parts of the *same* expression can resolve references against
//! them), but once the whole expression is done, every slot it added is
//! collapsed back to exactly one — labeled with the expression's own textual
//! form — since nothing outside the expression ever needs to address its
//! intermediate state by name.

use crate::ast::Expression;
use crate::builder::Builder;
use crate::env::Environment;
use crate::error::{EnvError, ExprError, TypeError};
use crate::keywords::{self, Builtin, Operator, ReturnType, UnaryOperator};
use crate::opcode::Opcode;
use crate::result::HashCallInfo;
use crate::stack::Stack;
use crate::types::{BestTypes, Type};

/// The mutable accumulators threaded through a single expression lowering:
/// hash-function call records (§4.5.3) and each contract param's refined
/// `bestType()` (§4.5.1 propagation). Bundled into one struct purely to keep
/// the per-call argument lists from growing every time a new cross-cutting
/// accumulator is added.
pub struct ExprCtx<'a> {
    pub hash_calls: &'a mut Vec<HashCallInfo>,
    pub best_types: &'a mut BestTypes,
}

/// Lowers any expression except a bare [`Expression::ListExpr`], which is
/// only legal as a call argument (§4.5.6) and must go through
/// [`compile_arg`] instead.
pub fn compile_expr(
    expr: &Expression,
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    let base_len = stack.len();
    let typ = match expr {
        Expression::IntegerLiteral { value } => {
            builder.add_int64(*value);
            Type::Integer
        }
        Expression::BytesLiteral { value } => {
            builder.add_data(value);
            Type::Bytes
        }
        Expression::BooleanLiteral { value } => {
            builder.add_op(if *value { Opcode::True } else { Opcode::False });
            Type::Boolean
        }
        Expression::VarRef { name } => compile_ref(name, env, stack, builder)?,
        Expression::ListExpr { .. } => return Err(ExprError::ListOutsideCallContext),
        Expression::Binary { op, left, right } => {
            compile_binary(op, left, right, env, stack, builder, contract_name, ctx)?
        }
        Expression::Unary { op, operand } => {
            compile_unary(op, operand, env, stack, builder, contract_name, ctx)?
        }
        Expression::Call { function, args } => {
            compile_call(function, args, env, stack, builder, contract_name, ctx)?
        }
    };
    stack.truncate(base_len);
    stack.push(expr.to_string());
    Ok(typ)
}

/// Scans the symbolic stack from the top for a slot matching `name`,
/// emitting `DUP`/`OVER`/`PICK` at the resolved depth (§4.5.5). Does not
/// push to `stack` itself — the caller ([`compile_expr`]) collapses every
/// branch to a single pushed slot uniformly.
fn compile_ref(
    name: &str,
    env: &Environment,
    stack: &Stack,
    builder: &mut Builder,
) -> Result<Type, ExprError> {
    let typ = env
        .lookup_type(name)
        .cloned()
        .ok_or_else(|| EnvError::Undefined {
            name: name.to_string(),
        })?;
    let depth = stack
        .depth_of(name)
        .ok_or_else(|| EnvError::Undefined {
            name: name.to_string(),
        })?;
    match depth {
        0 => builder.add_op(Opcode::Dup),
        1 => builder.add_op(Opcode::Over),
        d => {
            builder.add_int64(d as i64);
            builder.add_op(Opcode::Pick);
        }
    }
    Ok(typ)
}

/// Two types unify under `==`/`!=` either because they're identical, or
/// because one is the generic `Hash` and the other a refined hash subtype
/// (§4.5.1 hash-subtype propagation). The refined side is treated as
/// authoritative for the comparison; no environment state is rewritten —
/// the only externally observable effect of propagation is that the
/// comparison typechecks, and that's what this function decides directly.
fn hash_compatible(a: &Type, b: &Type) -> bool {
    matches!(
        (a, b),
        (Type::Hash, Type::HashSubtype { .. }) | (Type::HashSubtype { .. }, Type::Hash)
    )
}

fn binary_result_type(op: &str) -> Type {
    match op {
        "+" | "-" => Type::Integer,
        _ => Type::Boolean,
    }
}

fn typecheck_binary(operator: &Operator, left: &Type, right: &Type) -> Result<(), TypeError> {
    match operator.symbol {
        "==" | "!=" => {
            if *left == Type::Boolean || *right == Type::Boolean {
                return Err(TypeError::BooleanNotAllowed {
                    op: operator.symbol.to_string(),
                });
            }
            if left == right || hash_compatible(left, right) {
                Ok(())
            } else {
                Err(TypeError::Mismatch {
                    expected: left.to_string(),
                    found: right.clone(),
                })
            }
        }
        _ => {
            check_operand(operator.left.as_ref(), left)?;
            check_operand(operator.right.as_ref(), right)?;
            Ok(())
        }
    }
}

fn check_operand(expected: Option<&Type>, found: &Type) -> Result<(), TypeError> {
    match expected {
        None => Ok(()),
        Some(t) if t == found => Ok(()),
        Some(t) => Err(TypeError::Mismatch {
            expected: t.to_string(),
            found: found.clone(),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_binary(
    op: &str,
    left: &Expression,
    right: &Expression,
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    let operator = keywords::find_binary_operator(op)
        .ok_or_else(|| ExprError::UnknownOperator { op: op.to_string() })?;
    let left_type = compile_expr(left, env, stack, builder, contract_name, ctx)?;
    let right_type = compile_expr(right, env, stack, builder, contract_name, ctx)?;
    typecheck_binary(operator, &left_type, &right_type)?;
    if matches!(operator.symbol, "==" | "!=") && hash_compatible(&left_type, &right_type) {
        propagate_hash_type(left, &left_type, &right_type, ctx.best_types);
        propagate_hash_type(right, &right_type, &left_type, ctx.best_types);
    }
    for mnemonic in operator.opcodes {
        builder.add_op(Opcode::resolve(mnemonic)?);
    }
    Ok(binary_result_type(op))
}

/// If `expr` is a direct reference to a contract param currently tracked at
/// the generic `Hash` type, and `other` is a refined subtype, rebinds that
/// param's recorded `bestType()` to the subtype (§4.5.1). A no-op for any
/// other shape of `expr` or any param not at the generic type already.
fn propagate_hash_type(expr: &Expression, self_type: &Type, other_type: &Type, best_types: &mut BestTypes) {
    if *self_type != Type::Hash {
        return;
    }
    if let Expression::VarRef { name } = expr {
        if let Some(tracked) = best_types.get_mut(name) {
            if *tracked == Type::Hash {
                *tracked = other_type.clone();
            }
        }
    }
}

fn unary_result_type(op: &str) -> Type {
    match op {
        "!" => Type::Boolean,
        _ => Type::Integer,
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_unary(
    op: &str,
    operand: &Expression,
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    let operator = keywords::find_unary_operator(op)
        .ok_or_else(|| ExprError::UnknownOperator { op: op.to_string() })?;
    let operand_type = compile_expr(operand, env, stack, builder, contract_name, ctx)?;
    check_unary_operand(operator, &operand_type)?;
    for mnemonic in operator.opcodes {
        builder.add_op(Opcode::resolve(mnemonic)?);
    }
    Ok(unary_result_type(op))
}

fn check_unary_operand(operator: &UnaryOperator, found: &Type) -> Result<(), TypeError> {
    match &operator.operand {
        None => Ok(()),
        Some(t) if t == found => Ok(()),
        Some(t) => Err(TypeError::Mismatch {
            expected: t.to_string(),
            found: found.clone(),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_call(
    function: &str,
    args: &[Expression],
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    if function == "checkTxMultiSig" {
        return compile_check_tx_multisig(args, env, stack, builder, contract_name, ctx);
    }
    if let Some(builtin) = keywords::find_builtin(function) {
        return compile_builtin_call(builtin, args, env, stack, builder, contract_name, ctx);
    }
    if function == contract_name {
        return compile_self_call(args, env, stack, builder, contract_name, ctx);
    }
    Err(ExprError::UnsupportedContractCall {
        name: function.to_string(),
    })
}

#[allow(clippy::too_many_arguments)]
fn compile_builtin_call(
    builtin: &Builtin,
    args: &[Expression],
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    if args.len() != builtin.args.len() {
        return Err(TypeError::ArityMismatch {
            function: builtin.name.to_string(),
            expected: builtin.args.len(),
            found: args.len(),
        }
        .into());
    }
    // Compiled in reverse order (§4.5.3) so the first argument ends up
    // topmost for opcodes that consume it first.
    let mut arg_types: Vec<Type> = Vec::with_capacity(args.len());
    for arg in args.iter().rev() {
        arg_types.push(compile_expr(arg, env, stack, builder, contract_name, ctx)?);
    }
    arg_types.reverse();
    for (expected, found) in builtin.args.iter().zip(arg_types.iter()) {
        if let Some(expected_type) = expected {
            if expected_type != found {
                return Err(TypeError::Mismatch {
                    expected: expected_type.to_string(),
                    found: found.clone(),
                }
                .into());
            }
        }
    }
    for mnemonic in builtin.opcodes {
        builder.add_op(Opcode::resolve(mnemonic)?);
    }
    let return_type = match &builtin.return_type {
        ReturnType::Fixed(t) => t.clone(),
        ReturnType::HashOf(algorithm) => Type::HashSubtype {
            algorithm: *algorithm,
            preimage: Box::new(arg_types[0].clone()),
        },
    };
    // Only sha3/sha256 calls are recorded (§4.5.3); sha1 is not.
    if builtin.name == "sha3" || builtin.name == "sha256" {
        ctx.hash_calls.push(HashCallInfo {
            name: builtin.name.to_string(),
            arg: args[0].to_string(),
            typ: arg_types[0].clone(),
        });
    }
    Ok(return_type)
}

#[allow(clippy::too_many_arguments)]
fn compile_check_tx_multisig(
    args: &[Expression],
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    if args.len() != 2 {
        return Err(TypeError::ArityMismatch {
            function: "checkTxMultiSig".to_string(),
            expected: 2,
            found: args.len(),
        }
        .into());
    }
    let pubkeys_arg = &args[0];
    let sigs_arg = &args[1];

    let sigs_type = compile_arg(sigs_arg, env, stack, builder, contract_name, ctx)?;
    ensure_list_type(&sigs_type)?;
    builder.add_op(Opcode::ToAltStack);
    builder.add_op(Opcode::TxSigHash);
    let pubkeys_type = compile_arg(pubkeys_arg, env, stack, builder, contract_name, ctx)?;
    ensure_list_type(&pubkeys_type)?;
    builder.add_op(Opcode::FromAltStack);
    builder.add_op(Opcode::Swap);
    builder.add_op(Opcode::CheckMultiSig);
    Ok(Type::Boolean)
}

fn ensure_list_type(typ: &Type) -> Result<(), ExprError> {
    match typ {
        Type::List(_) => Ok(()),
        other => Err(TypeError::Mismatch {
            expected: "List".to_string(),
            found: other.clone(),
        }
        .into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_self_call(
    args: &[Expression],
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    builder.add_int64(args.len() as i64);
    builder.add_data(&[]);
    for arg in args.iter().rev() {
        compile_arg(arg, env, stack, builder, contract_name, ctx)?;
        builder.add_op(Opcode::CatPushData);
    }
    builder.add_int64(0);
    builder.add_op(Opcode::CheckPredicate);
    Ok(Type::Boolean)
}

/// The call-argument wrapper that recognizes a bare `listExpr` (§4.5.6)
/// specially; everything else delegates to [`compile_expr`].
pub fn compile_arg(
    expr: &Expression,
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    match expr {
        Expression::ListExpr { items } => {
            compile_list(items, env, stack, builder, contract_name, ctx)
        }
        other => compile_expr(other, env, stack, builder, contract_name, ctx),
    }
}

/// Pushes `items` in reverse order so the first-declared item ends topmost
/// once the trailing count is consumed, then pushes the count (§4.5.6).
/// Net effect: `items.len() + 1` durable slots, which is why this can only
/// be reached through [`compile_arg`] and never through the generic
/// single-slot collapse in [`compile_expr`].
fn compile_list(
    items: &[Expression],
    env: &Environment,
    stack: &mut Stack,
    builder: &mut Builder,
    contract_name: &str,
    ctx: &mut ExprCtx,
) -> Result<Type, ExprError> {
    let mut element_type = None;
    for item in items.iter().rev() {
        let typ = compile_expr(item, env, stack, builder, contract_name, ctx)?;
        element_type.get_or_insert(typ);
    }
    builder.add_int64(items.len() as i64);
    stack.push(format!("<{} item list count>", items.len()));
    Ok(Type::List(Box::new(element_type.unwrap_or(Type::Integer))))
}
