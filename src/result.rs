//! The analysis result returned to callers (§6.4).

use serde::Serialize;

use crate::types::Type;

/// A hash-function call recorded while compiling a clause (§4.5.3).
#[derive(Clone, Debug, Serialize)]
pub struct HashCallInfo {
    pub name: String,
    pub arg: String,
    #[serde(rename = "type")]
    pub typ: Type,
}

/// One of a clause's params, as reported to the caller.
#[derive(Clone, Debug, Serialize)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: Type,
}

/// A value disposed of by a clause, derived from its `lock`/`unlock`
/// statements (§4.3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValueInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

/// One contract clause's compiled analysis.
#[derive(Clone, Debug, Serialize)]
pub struct ClauseInfo {
    pub name: String,
    pub args: Vec<ParamInfo>,
    pub value_info: Vec<ValueInfo>,
    /// Never omitted: an empty list is emitted, not absent (§6.4).
    pub mintimes: Vec<String>,
    pub maxtimes: Vec<String>,
    pub hash_calls: Vec<HashCallInfo>,
}

/// The top-level result of a successful compile (§6.4). The program is
/// hex-encoded on the wire via the same `hex_bytes` convention the AST uses
/// for byte literals.
#[derive(Clone, Debug, Serialize)]
pub struct CompileResult {
    pub name: String,
    #[serde(with = "hex_program")]
    pub program: Vec<u8>,
    pub value: String,
    pub params: Vec<ParamInfo>,
    pub clause_info: Vec<ClauseInfo>,
}

mod hex_program {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }
}
