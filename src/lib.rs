//! Ivy compiler core: lowers an already-parsed contract AST to bytecode for
//! a stack-machine VM, along with the analysis metadata a wallet or
//! explorer needs to instantiate and spend it (§6.4).
//!
//! The crate has no parser of its own (§6.1): [`ast::Contract`] is the
//! boundary, constructed either by an external front-end or, for the CLI in
//! this crate ([`bin/ivyc`]), deserialized directly from JSON.

pub mod ast;
pub mod builder;
pub mod checks;
pub mod clause;
pub mod contract;
pub mod env;
pub mod error;
pub mod expr;
pub mod keywords;
pub mod opcode;
pub mod result;
pub mod stack;
pub mod types;

use tracing::instrument;

pub use ast::{ClauseParam, ClauseRequirement, Contract, ContractArg, ContractParam, ResolvedArg};
pub use error::CompileError;
pub use result::CompileResult;

/// Resolves each instantiation arg and runs the full compile pipeline
/// (§4.3) over `contract`.
///
/// Malformed args (none or more than one of boolean/integer/bytes) are
/// rejected before the contract compiler ever sees them, so `contract::
/// compile_contract` only ever has to reason about `ResolvedArg`.
#[instrument(skip_all, fields(contract = %contract.name))]
pub fn compile(contract: &mut Contract, args: &[ContractArg]) -> Result<CompileResult, CompileError> {
    let resolved: Vec<ResolvedArg> = args
        .iter()
        .enumerate()
        .map(|(index, arg)| arg.resolve().ok_or(error::ArgError { index }))
        .collect::<Result<_, _>>()?;
    Ok(contract::compile_contract(contract, &resolved)?)
}
