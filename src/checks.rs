//! Structural semantic checks (C4, §4.3 steps 2-3, §4.4 steps 2+4).
//!
//! Per-expression type checking is not a separate pass here: it happens
//! inline as each expression is lowered in `expr.rs`, which is the only
//! place that knows an expression's inferred type. The checks in this
//! module are the ones that need to see a whole clause or contract at
//! once — usage and disposal accounting — rather than one expression at a
//! time.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{Clause, Contract, Expression, Statement};
use crate::error::CheckError;
use crate::types::Type;

/// No contract param may carry the asset-value type (§4.3 step 2).
pub fn prohibit_value_params(contract: &Contract) -> Result<(), CheckError> {
    for param in &contract.params {
        if param.typ == Type::Value {
            return Err(CheckError::ValueTypedContractParam {
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// Every contract param must be referenced somewhere in some clause
/// (§4.3 step 3).
pub fn require_all_params_used_in_clauses(contract: &Contract) -> Result<(), CheckError> {
    let mut used = HashSet::new();
    for clause in &contract.clauses {
        collect_clause_refs(clause, &mut used);
    }
    for param in &contract.params {
        if !used.contains(&param.name) {
            return Err(CheckError::UnusedContractParam {
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// Every param declared on this clause must be referenced somewhere in it
/// (§4.4 step 4).
pub fn require_all_params_used_in_clause(clause: &Clause) -> Result<(), CheckError> {
    let mut used = HashSet::new();
    collect_clause_refs(clause, &mut used);
    for param in &clause.params {
        if !used.contains(&param.name) {
            return Err(CheckError::UnusedClauseParam {
                clause: clause.name.clone(),
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// The contract value and every declared requirement must be disposed of
/// (locked or unlocked) exactly once across the clause's statements
/// (§4.4 step 2).
pub fn require_all_values_disposed_once(
    clause: &Clause,
    contract_value: &str,
) -> Result<(), CheckError> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    counts.insert(contract_value.to_string(), 0);
    for req in &clause.reqs {
        counts.entry(req.name.clone()).or_insert(0);
    }

    for statement in &clause.statements {
        match statement {
            Statement::Lock { locked, .. } => {
                if let Expression::VarRef { name } = locked {
                    *counts.entry(name.clone()).or_insert(0) += 1;
                }
            }
            Statement::Unlock { value } => {
                if let Expression::VarRef { name } = value {
                    *counts.entry(name.clone()).or_insert(0) += 1;
                }
            }
            Statement::Verify { .. } => {}
        }
    }

    for (name, times) in &counts {
        match times {
            1 => {}
            0 => {
                return Err(CheckError::ValueNeverDisposed {
                    clause: clause.name.clone(),
                    name: name.clone(),
                })
            }
            times => {
                return Err(CheckError::ValueDisposedWrongNumberOfTimes {
                    clause: clause.name.clone(),
                    name: name.clone(),
                    times: *times,
                })
            }
        }
    }
    Ok(())
}

fn collect_clause_refs(clause: &Clause, out: &mut HashSet<String>) {
    for req in &clause.reqs {
        collect_expr_refs(&req.asset_expr, out);
        collect_expr_refs(&req.amount_expr, out);
    }
    for statement in &clause.statements {
        match statement {
            Statement::Verify { expr } => collect_expr_refs(expr, out),
            Statement::Lock { locked, program, .. } => {
                collect_expr_refs(locked, out);
                collect_expr_refs(program, out);
            }
            Statement::Unlock { value } => collect_expr_refs(value, out),
        }
    }
}

fn collect_expr_refs(expr: &Expression, out: &mut HashSet<String>) {
    match expr {
        Expression::VarRef { name } => {
            out.insert(name.clone());
        }
        Expression::Binary { left, right, .. } => {
            collect_expr_refs(left, out);
            collect_expr_refs(right, out);
        }
        Expression::Unary { operand, .. } => collect_expr_refs(operand, out),
        Expression::Call { args, .. } => {
            for arg in args {
                collect_expr_refs(arg, out);
            }
        }
        Expression::ListExpr { items } => {
            for item in items {
                collect_expr_refs(item, out);
            }
        }
        Expression::IntegerLiteral { .. }
        | Expression::BytesLiteral { .. }
        | Expression::BooleanLiteral { .. } => {}
    }
}
