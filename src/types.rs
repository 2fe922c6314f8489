//! Domain type tags used by contract params, clause params, and expressions.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tracks each contract param's most specific inferable type (`bestType()`,
/// §3, §4.5.1). Seeded from the declared types and refined in place whenever
/// hash-subtype propagation resolves a generic `Hash` contract param against
/// a refined subtype used elsewhere in the same contract.
pub type BestTypes = IndexMap<String, Type>;

/// A type tag attached to a parameter or inferred for an expression.
///
/// Hash types are parameterized by the type of their preimage so that
/// `Sha3(Bytes)` and the unparameterized generic `Hash` can be distinguished
/// during equality checks (see the hash-subtype propagation rule).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Boolean,
    Bytes,
    String,
    PublicKey,
    Signature,
    Time,
    Duration,
    /// The asset-value type: an opaque (amount, asset id) pair. Contract
    /// params may never carry this type (see `prohibit_value_params`).
    Value,
    /// The generic, unparameterized hash type.
    Hash,
    /// A hash type refined to the type of its preimage, e.g. `Sha3(Bytes)`.
    HashSubtype {
        algorithm: HashAlgorithm,
        preimage: Box<Type>,
    },
    /// A homogeneous list of items of the given type, only legal as a call
    /// argument (see `listExpr`).
    List(Box<Type>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha3,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "Sha1",
            HashAlgorithm::Sha256 => "Sha256",
            HashAlgorithm::Sha3 => "Sha3",
        }
    }
}

impl Type {
    /// Whether this type is a hash type: either the generic `Hash` or any
    /// `HashSubtype`.
    pub fn is_hash(&self) -> bool {
        matches!(self, Type::Hash | Type::HashSubtype { .. })
    }

    /// Returns the refined hash subtype matching `self`'s algorithm (if any)
    /// with the given preimage type, used by hash-subtype propagation.
    pub fn with_preimage(&self, preimage: Type) -> Type {
        match self {
            Type::HashSubtype { algorithm, .. } => Type::HashSubtype {
                algorithm: *algorithm,
                preimage: Box::new(preimage),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "Integer"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Bytes => write!(f, "Bytes"),
            Type::String => write!(f, "String"),
            Type::PublicKey => write!(f, "PublicKey"),
            Type::Signature => write!(f, "Signature"),
            Type::Time => write!(f, "Time"),
            Type::Duration => write!(f, "Duration"),
            Type::Value => write!(f, "Value"),
            Type::Hash => write!(f, "Hash"),
            Type::HashSubtype { algorithm, preimage } => {
                write!(f, "{}({preimage})", algorithm.name())
            }
            Type::List(item) => write!(f, "List({item})"),
        }
    }
}
