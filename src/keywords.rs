//! Keyword/Builtin tables (A2, §4.2a).
//!
//! The lexer/parser and its keyword/builtin tables are external
//! collaborators the core merely consumes (§4.2, §6.1). No such external
//! crate exists here, so one concrete, fixed instance of these tables is
//! embedded as process-level constants — loaded once, with no lifecycle
//! (§9 "Global state").

use std::sync::OnceLock;

use crate::types::{HashAlgorithm, Type};

/// Reserved words that may never be redefined as a param, contract, or
/// clause name.
pub const KEYWORDS: &[&str] = &[
    "contract", "clause", "verify", "lock", "unlock", "with", "locks", "requires", "and", "if",
    "else", "import",
];

/// A binary operator descriptor (§3 `Operator`). `left`/`right` of `None`
/// mean "any type is accepted here"; `==`/`!=` additionally impose the
/// hash-subtype-propagation / no-booleans rule in `expr.rs`, which the
/// table itself cannot express.
pub struct Operator {
    pub symbol: &'static str,
    pub opcodes: &'static [&'static str],
    pub left: Option<Type>,
    pub right: Option<Type>,
}

/// A unary operator descriptor.
pub struct UnaryOperator {
    pub symbol: &'static str,
    pub opcodes: &'static [&'static str],
    pub operand: Option<Type>,
}

/// How a builtin's return type is determined.
pub enum ReturnType {
    /// Always the same type, independent of the arguments.
    Fixed(Type),
    /// A hash subtype parameterized by the first argument's type (`sha1`,
    /// `sha256`, `sha3`).
    HashOf(HashAlgorithm),
}

/// A builtin function descriptor (§3 `Builtin`). `args` entries of `None`
/// mean "any type is accepted here" (the empty-string wildcard in §3).
pub struct Builtin {
    pub name: &'static str,
    pub opcodes: &'static [&'static str],
    pub args: Vec<Option<Type>>,
    pub return_type: ReturnType,
}

fn binary_operators_table() -> Vec<Operator> {
    vec![
        Operator {
            symbol: "+",
            opcodes: &["ADD"],
            left: Some(Type::Integer),
            right: Some(Type::Integer),
        },
        Operator {
            symbol: "-",
            opcodes: &["SUB"],
            left: Some(Type::Integer),
            right: Some(Type::Integer),
        },
        Operator {
            symbol: "<",
            opcodes: &["LESSTHAN"],
            left: Some(Type::Integer),
            right: Some(Type::Integer),
        },
        Operator {
            symbol: "<=",
            opcodes: &["LESSTHANOREQUAL"],
            left: Some(Type::Integer),
            right: Some(Type::Integer),
        },
        Operator {
            symbol: ">",
            opcodes: &["GREATERTHAN"],
            left: Some(Type::Integer),
            right: Some(Type::Integer),
        },
        Operator {
            symbol: ">=",
            opcodes: &["GREATERTHANOREQUAL"],
            left: Some(Type::Integer),
            right: Some(Type::Integer),
        },
        Operator {
            symbol: "&&",
            opcodes: &["BOOLAND"],
            left: Some(Type::Boolean),
            right: Some(Type::Boolean),
        },
        Operator {
            symbol: "||",
            opcodes: &["BOOLOR"],
            left: Some(Type::Boolean),
            right: Some(Type::Boolean),
        },
        // `==`/`!=` accept any pair of like types (or a Hash/hash-subtype
        // pair); the boolean-rejection and hash-propagation rules live in
        // `expr.rs` since they can't be expressed as a fixed left/right type.
        Operator {
            symbol: "==",
            opcodes: &["EQUAL"],
            left: None,
            right: None,
        },
        Operator {
            symbol: "!=",
            opcodes: &["EQUAL", "NOT"],
            left: None,
            right: None,
        },
    ]
}

fn unary_operators_table() -> Vec<UnaryOperator> {
    vec![
        UnaryOperator {
            symbol: "-",
            opcodes: &["NEGATE"],
            operand: Some(Type::Integer),
        },
        UnaryOperator {
            symbol: "!",
            opcodes: &["NOT"],
            operand: Some(Type::Boolean),
        },
    ]
}

fn builtins_table() -> Vec<Builtin> {
    vec![
        Builtin {
            name: "sha1",
            opcodes: &["SHA1"],
            args: vec![Some(Type::Bytes)],
            return_type: ReturnType::HashOf(HashAlgorithm::Sha1),
        },
        Builtin {
            name: "sha256",
            opcodes: &["SHA256"],
            args: vec![Some(Type::Bytes)],
            return_type: ReturnType::HashOf(HashAlgorithm::Sha256),
        },
        Builtin {
            name: "sha3",
            opcodes: &["SHA3"],
            args: vec![Some(Type::Bytes)],
            return_type: ReturnType::HashOf(HashAlgorithm::Sha3),
        },
        Builtin {
            name: "checkTxSig",
            opcodes: &["TXSIGHASH", "SWAP", "CHECKMULTISIG"],
            args: vec![Some(Type::PublicKey), Some(Type::Signature)],
            return_type: ReturnType::Fixed(Type::Boolean),
        },
        Builtin {
            name: "checkTxMultiSig",
            // Special-cased entirely in expr.rs (§4.5.3); kept here for
            // name/arity recognition and introspection only.
            opcodes: &[
                "TOALTSTACK",
                "TXSIGHASH",
                "FROMALTSTACK",
                "SWAP",
                "CHECKMULTISIG",
            ],
            args: vec![
                Some(Type::List(Box::new(Type::PublicKey))),
                Some(Type::List(Box::new(Type::Signature))),
            ],
            return_type: ReturnType::Fixed(Type::Boolean),
        },
        Builtin {
            name: "before",
            opcodes: &[],
            args: vec![Some(Type::Time)],
            return_type: ReturnType::Fixed(Type::Boolean),
        },
        Builtin {
            name: "after",
            opcodes: &[],
            args: vec![Some(Type::Time)],
            return_type: ReturnType::Fixed(Type::Boolean),
        },
        Builtin {
            name: "concat",
            opcodes: &["CAT"],
            args: vec![Some(Type::Bytes), Some(Type::Bytes)],
            return_type: ReturnType::Fixed(Type::Bytes),
        },
        Builtin {
            name: "len",
            opcodes: &["LEN"],
            args: vec![Some(Type::Bytes)],
            return_type: ReturnType::Fixed(Type::Integer),
        },
    ]
}

static BINARY_OPERATORS: OnceLock<Vec<Operator>> = OnceLock::new();
static UNARY_OPERATORS: OnceLock<Vec<UnaryOperator>> = OnceLock::new();
static BUILTINS: OnceLock<Vec<Builtin>> = OnceLock::new();

pub fn binary_operators() -> &'static [Operator] {
    BINARY_OPERATORS.get_or_init(binary_operators_table)
}

pub fn unary_operators() -> &'static [UnaryOperator] {
    UNARY_OPERATORS.get_or_init(unary_operators_table)
}

pub fn builtins() -> &'static [Builtin] {
    BUILTINS.get_or_init(builtins_table)
}

pub fn find_binary_operator(symbol: &str) -> Option<&'static Operator> {
    binary_operators().iter().find(|op| op.symbol == symbol)
}

pub fn find_unary_operator(symbol: &str) -> Option<&'static UnaryOperator> {
    unary_operators().iter().find(|op| op.symbol == symbol)
}

pub fn find_builtin(name: &str) -> Option<&'static Builtin> {
    builtins().iter().find(|b| b.name == name)
}
