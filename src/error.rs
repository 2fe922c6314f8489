//! Error types, one enum per component per §7, unified under
//! [`CompileError`]. Each layer wraps the one below it with the context
//! (clause name, argument index, …) that the lower layer cannot know about
//! itself, in the style of the teacher's per-module `thiserror` enums
//! (`LinkerError`, `ContractDecoderError`, `HeuristicsError`).

use thiserror::Error;

use crate::types::Type;

/// Bugs, not user input: an unresolvable mnemonic or an unpatched jump
/// target reaching `build()`.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("unknown opcode mnemonic `{mnemonic}`")]
    UnknownMnemonic { mnemonic: String },
    #[error("jump target was never set before build()")]
    UnsetJumpTarget,
}

/// Errors raised by the [`crate::env::Environment`] (C3).
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("`{name}` is already defined in this scope")]
    Redefined { name: String },
    #[error("undefined reference to `{name}`")]
    Undefined { name: String },
}

/// Type-mismatch errors shared by the semantic checks (C4) and expression
/// compiler (C5).
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("expected type {expected}, found {found}")]
    Mismatch { expected: String, found: Type },
    #[error("`{op}` does not accept boolean operands")]
    BooleanNotAllowed { op: String },
    #[error("`{function}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("`verify` requires a Boolean expression, found {found}")]
    VerifyRequiresBoolean { found: Type },
}

/// Errors from the structural semantic checks (C4).
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("contract param `{name}` is never used in any clause")]
    UnusedContractParam { name: String },
    #[error("contract param `{name}` may not have the Value type")]
    ValueTypedContractParam { name: String },
    #[error("clause `{clause}` param `{name}` is never used")]
    UnusedClauseParam { clause: String, name: String },
    #[error(
        "clause `{clause}` disposes of value `{name}` {times} time(s), expected exactly once"
    )]
    ValueDisposedWrongNumberOfTimes {
        clause: String,
        name: String,
        times: usize,
    },
    #[error("clause `{clause}` never disposes of value `{name}`")]
    ValueNeverDisposed { clause: String, name: String },
}

/// Errors from lowering a single expression (C5).
#[derive(Debug, Error)]
pub enum ExprError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error("list expressions are only legal as a call argument")]
    ListOutsideCallContext,
    #[error("unknown operator `{op}`")]
    UnknownOperator { op: String },
    #[error("calling other contracts is not yet supported (`{name}`)")]
    UnsupportedContractCall { name: String },
}

/// Errors from compiling one clause (C6), wrapping [`ExprError`] and
/// [`CheckError`] with the position (statement index, argument index, "left
/// operand of …") the inner layers don't track themselves.
#[derive(Debug, Error)]
pub enum ClauseError {
    #[error("clause `{clause}`, {context}: {source}")]
    Expr {
        clause: String,
        context: String,
        #[source]
        source: ExprError,
    },
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("clause `{clause}`: lock references unknown requirement `{name}`")]
    UnknownRequirement { clause: String, name: String },
    #[error("clause `{clause}`: {source}")]
    Env {
        clause: String,
        #[source]
        source: EnvError,
    },
}

/// Errors from compiling the whole contract (C7), the top of the error
/// hierarchy besides malformed caller input.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("empty contract: a contract must declare at least one clause")]
    EmptyContract,
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error("in clause `{clause}`: {source}")]
    Clause {
        clause: String,
        #[source]
        source: ClauseError,
    },
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// A malformed caller-supplied instantiation argument (§6.5): an element
/// with none or more than one populated variant.
#[derive(Debug, Error)]
#[error("contract argument at index {index} must carry exactly one of boolean/integer/bytes")]
pub struct ArgError {
    pub index: usize,
}

/// The crate-level error type returned by [`crate::compile`].
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Arg(#[from] ArgError),
    #[error(transparent)]
    Contract(#[from] ContractError),
}
