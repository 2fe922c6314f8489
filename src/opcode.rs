//! Concrete opcode set and assembler (§6.2, §6.3, §4.7).
//!
//! No external assembler crate is available to this repository, so the set
//! of opcodes referenced by the specification is embedded here directly,
//! along with the integer/data push encodings and mnemonic resolution that
//! a real assembler would own. Resolving an unknown mnemonic is an internal
//! error: mnemonics only ever originate from this crate's own operator and
//! builtin tables (`keywords.rs`), never from user input.

use crate::error::InternalError;

/// A single VM opcode, one byte on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Generic length-prefixed data push; used for both `DATA` and the
    /// non-small-integer case of `INT64`.
    PushData = 0x12,
    Roll = 0x13,
    Dup = 0x14,
    Over = 0x15,
    Pick = 0x16,
    NumEqual = 0x17,
    JumpIf = 0x18,
    Jump = 0x19,
    Verify = 0x1a,
    True = 0x1b,
    False = 0x1c,
    Amount = 0x1d,
    Asset = 0x1e,
    CheckOutput = 0x1f,
    CheckPredicate = 0x20,
    CatPushData = 0x21,
    ToAltStack = 0x22,
    FromAltStack = 0x23,
    Swap = 0x24,
    TxSigHash = 0x25,
    CheckMultiSig = 0x26,
    Add = 0x27,
    Sub = 0x28,
    Not = 0x29,
    BoolAnd = 0x2a,
    BoolOr = 0x2b,
    GreaterThan = 0x2c,
    GreaterThanOrEqual = 0x2d,
    LessThan = 0x2e,
    LessThanOrEqual = 0x2f,
    Equal = 0x30,
    Sha3 = 0x31,
    Sha256 = 0x32,
    Sha1 = 0x33,
    Cat = 0x34,
    Len = 0x35,
    Negate = 0x36,
}

impl Opcode {
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Resolves a textual mnemonic (as carried by an `Operator`/`Builtin`
    /// descriptor) to its opcode. Never called with user-controlled text.
    pub fn resolve(mnemonic: &str) -> Result<Opcode, InternalError> {
        Ok(match mnemonic {
            "ROLL" => Opcode::Roll,
            "DUP" => Opcode::Dup,
            "OVER" => Opcode::Over,
            "PICK" => Opcode::Pick,
            "NUMEQUAL" => Opcode::NumEqual,
            "JUMPIF" => Opcode::JumpIf,
            "JUMP" => Opcode::Jump,
            "VERIFY" => Opcode::Verify,
            "TRUE" => Opcode::True,
            "FALSE" => Opcode::False,
            "AMOUNT" => Opcode::Amount,
            "ASSET" => Opcode::Asset,
            "CHECKOUTPUT" => Opcode::CheckOutput,
            "CHECKPREDICATE" => Opcode::CheckPredicate,
            "CATPUSHDATA" => Opcode::CatPushData,
            "TOALTSTACK" => Opcode::ToAltStack,
            "FROMALTSTACK" => Opcode::FromAltStack,
            "SWAP" => Opcode::Swap,
            "TXSIGHASH" => Opcode::TxSigHash,
            "CHECKMULTISIG" => Opcode::CheckMultiSig,
            "ADD" => Opcode::Add,
            "SUB" => Opcode::Sub,
            "NOT" => Opcode::Not,
            "BOOLAND" => Opcode::BoolAnd,
            "BOOLOR" => Opcode::BoolOr,
            "GREATERTHAN" => Opcode::GreaterThan,
            "GREATERTHANOREQUAL" => Opcode::GreaterThanOrEqual,
            "LESSTHAN" => Opcode::LessThan,
            "LESSTHANOREQUAL" => Opcode::LessThanOrEqual,
            "EQUAL" => Opcode::Equal,
            "SHA3" => Opcode::Sha3,
            "SHA256" => Opcode::Sha256,
            "SHA1" => Opcode::Sha1,
            "CAT" => Opcode::Cat,
            "LEN" => Opcode::Len,
            "NEGATE" => Opcode::Negate,
            other => {
                return Err(InternalError::UnknownMnemonic {
                    mnemonic: other.to_string(),
                })
            }
        })
    }
}

/// Lower bound of the dedicated one-byte small-integer push range.
const SMALL_INT_MIN: i64 = -1;
/// Upper bound of the dedicated one-byte small-integer push range.
const SMALL_INT_MAX: i64 = 16;

/// Returns the minimal two's-complement little-endian encoding of `n`, the
/// same canonical numeric encoding used by `PUSHDATA`-backed integers. `0`
/// encodes as the empty byte string.
pub fn minimal_int_bytes(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let mut bytes = n.to_le_bytes().to_vec();
    // Strip redundant sign-extension bytes, keeping at least one byte and
    // preserving the sign bit of the most significant remaining byte.
    while bytes.len() > 1 {
        let last = bytes[bytes.len() - 1];
        let second_last = bytes[bytes.len() - 2];
        let last_is_sign_extension = (last == 0x00 && second_last & 0x80 == 0)
            || (last == 0xff && second_last & 0x80 != 0);
        if last_is_sign_extension {
            bytes.pop();
        } else {
            break;
        }
    }
    bytes
}

/// Assembles a single `INT64` push: either a dedicated one-byte small-int
/// opcode, or a generic minimally-encoded `PUSHDATA`.
pub fn assemble_int64(n: i64) -> Vec<u8> {
    if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(&n) {
        vec![(n - SMALL_INT_MIN) as u8]
    } else {
        assemble_data(&minimal_int_bytes(n))
    }
}

/// Assembles a length-prefixed `DATA` push of arbitrary bytes.
pub fn assemble_data(bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![Opcode::PushData.byte()];
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
    out
}
