//! The AST contract consumed from the (external) parser.
//!
//! These types are the input to the compiler core. In a full toolchain they
//! would be constructed directly by a parser; since no such parser ships in
//! this crate, they are also `serde`-deserializable so the CLI front-end can
//! accept a JSON encoding of the same shape (see [`crate::cli`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Type;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Contract {
    pub name: String,
    /// Identifier naming the protected asset.
    pub value: String,
    pub params: Vec<ContractParam>,
    pub clauses: Vec<Clause>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContractParam {
    pub name: String,
    pub typ: Type,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClauseParam {
    pub name: String,
    pub typ: Type,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClauseRequirement {
    pub name: String,
    pub asset_expr: Expression,
    pub amount_expr: Expression,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Clause {
    pub name: String,
    pub params: Vec<ClauseParam>,
    #[serde(default)]
    pub reqs: Vec<ClauseRequirement>,
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum Statement {
    Verify { expr: Expression },
    Lock {
        locked: Expression,
        program: Expression,
        /// Assigned by `assign_indexes` during compilation; the parser
        /// leaves this at 0.
        #[serde(default)]
        index: u32,
    },
    Unlock { value: Expression },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum Expression {
    Binary {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: String,
        operand: Box<Expression>,
    },
    Call {
        function: String,
        args: Vec<Expression>,
    },
    VarRef {
        name: String,
    },
    IntegerLiteral {
        value: i64,
    },
    BytesLiteral {
        #[serde(with = "hex_bytes")]
        value: Vec<u8>,
    },
    BooleanLiteral {
        value: bool,
    },
    ListExpr {
        items: Vec<Expression>,
    },
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// One caller-supplied instantiation argument (§3 `ContractArg`, §6.5): a
/// sequence of these is consumed left-to-right before dispatch (§4.3 step
/// 5). Exactly one field must be populated; any other shape is an input
/// error, checked by [`ContractArg::resolve`] rather than at the type level
/// since this must also round-trip through the CLI's JSON encoding.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ContractArg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hex_bytes")]
    pub bytes: Option<Vec<u8>>,
}

/// A [`ContractArg`] after its single-populated-variant shape has been
/// validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedArg {
    Boolean(bool),
    Integer(i64),
    Bytes(Vec<u8>),
}

impl ContractArg {
    /// Returns the single populated variant, or `None` if none or more than
    /// one of `boolean`/`integer`/`bytes` is set.
    pub fn resolve(&self) -> Option<ResolvedArg> {
        match (self.boolean, self.integer, &self.bytes) {
            (Some(b), None, None) => Some(ResolvedArg::Boolean(b)),
            (None, Some(n), None) => Some(ResolvedArg::Integer(n)),
            (None, None, Some(bytes)) => Some(ResolvedArg::Bytes(bytes.clone())),
            _ => None,
        }
    }
}

mod opt_hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let s: Option<String> = Option::deserialize(d)?;
        s.map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

impl fmt::Display for Expression {
    /// Renders the expression the way the parser's `String()`-like method
    /// would: this text is used both as symbolic-stack labels and in the
    /// analysis metadata (mintimes/maxtimes/hash_calls), so it must be
    /// stable and match how a `varRef` to the same sub-expression would be
    /// written by the author.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expression::Unary { op, operand } => write!(f, "({op}{operand})"),
            Expression::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expression::VarRef { name } => write!(f, "{name}"),
            Expression::IntegerLiteral { value } => write!(f, "{value}"),
            Expression::BytesLiteral { value } => write!(f, "0x{}", hex::encode(value)),
            Expression::BooleanLiteral { value } => write!(f, "{value}"),
            Expression::ListExpr { items } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_with_exactly_one_field_resolves() {
        let arg = ContractArg {
            integer: Some(5),
            ..Default::default()
        };
        assert_eq!(arg.resolve(), Some(ResolvedArg::Integer(5)));
    }

    #[test]
    fn arg_with_no_fields_fails_to_resolve() {
        assert_eq!(ContractArg::default().resolve(), None);
    }

    #[test]
    fn arg_with_two_fields_fails_to_resolve() {
        let arg = ContractArg {
            boolean: Some(true),
            integer: Some(1),
            ..Default::default()
        };
        assert_eq!(arg.resolve(), None);
    }
}
