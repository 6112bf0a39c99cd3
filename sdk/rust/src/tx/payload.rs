//! Data-driven entry and view function payloads.
//!
//! Every on-chain function is described by a [`FunctionSchema`] row (module
//! address, module name, function name, typed parameters). A single
//! [`PayloadBuilder`] coerces caller-supplied JSON values into typed
//! [`MoveValue`]s against that schema, so no per-function type is needed.
//!
//! ## Type syntax
//! ```text
//! bool | u8 | u16 | u32 | u64 | u128 | u256 | address | signer
//! vector<T> | 0x1::string::String | 0x1::option::Option<T>
//! T0, T1, ...                      (generic type parameters)
//! <addr>::<module>::<Name>[<T,...>] (other structs; not coercible)
//! ```
//!
//! ## Argument coercion (JSON → value)
//! - integers: JSON numbers, or decimal strings (`u64` and wider usually arrive
//!   as strings); `u256` also accepts `0x` hex
//! - `address`: `0x` hex, short forms allowed
//! - `vector<u8>`: `0x` hex string or an array of numbers
//! - `Option<T>`: `null`, a bare value, or `{"vec": []}` / `{"vec": [v]}`

use crate::address::AccountAddress;
use crate::error::{Error, Result};
use crate::utils::bytes::{has_0x, hex_decode, hex_encode};
use crate::utils::cbor;
use ark_ff::BigInt;
use ciborium::value::{Integer, Value as CborValue};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ----------------------------- types -----------------------------------------

/// Fully qualified struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: String,
    pub name: String,
    pub type_args: Vec<MoveType>,
}

/// Parameter or type-argument type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MoveType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    String,
    Vector(Box<MoveType>),
    Option(Box<MoveType>),
    /// Reference to the function's n-th type parameter.
    Generic(u16),
    Struct(StructTag),
}

impl MoveType {
    /// Resolve generic parameters against concrete type arguments.
    fn resolve<'a>(&'a self, type_args: &'a [MoveType]) -> Result<&'a MoveType> {
        match self {
            MoveType::Generic(i) => type_args
                .get(*i as usize)
                .ok_or_else(|| Error::Payload(format!("type parameter T{i} not supplied"))),
            other => Ok(other),
        }
    }

    fn contains_generic(&self) -> bool {
        match self {
            MoveType::Generic(_) => true,
            MoveType::Vector(t) | MoveType::Option(t) => t.contains_generic(),
            MoveType::Struct(s) => s.type_args.iter().any(MoveType::contains_generic),
            _ => false,
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveType::Bool => f.write_str("bool"),
            MoveType::U8 => f.write_str("u8"),
            MoveType::U16 => f.write_str("u16"),
            MoveType::U32 => f.write_str("u32"),
            MoveType::U64 => f.write_str("u64"),
            MoveType::U128 => f.write_str("u128"),
            MoveType::U256 => f.write_str("u256"),
            MoveType::Address => f.write_str("address"),
            MoveType::Signer => f.write_str("signer"),
            MoveType::String => f.write_str("0x1::string::String"),
            MoveType::Vector(t) => write!(f, "vector<{t}>"),
            MoveType::Option(t) => write!(f, "0x1::option::Option<{t}>"),
            MoveType::Generic(i) => write!(f, "T{i}"),
            MoveType::Struct(s) => {
                write!(f, "{}::{}::{}", s.address.to_short_string(), s.module, s.name)?;
                if !s.type_args.is_empty() {
                    let args: Vec<String> = s.type_args.iter().map(|t| t.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for MoveType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_type(s)
    }
}

impl Serialize for MoveType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

fn parse_type(s: &str) -> Result<MoveType> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::Payload("empty type".into()));
    }
    if let Some(open) = s.find('<') {
        if !s.ends_with('>') {
            return Err(Error::Payload(format!("unbalanced type arguments: {s}")));
        }
        let head = s[..open].trim();
        let args = split_top_level(&s[open + 1..s.len() - 1])?
            .into_iter()
            .map(parse_type)
            .collect::<Result<Vec<_>>>()?;
        if head == "vector" {
            return match <[MoveType; 1]>::try_from(args) {
                Ok([inner]) => Ok(MoveType::Vector(Box::new(inner))),
                Err(_) => Err(Error::Payload(format!("vector takes one type argument: {s}"))),
            };
        }
        let tag = parse_struct_head(head, args)?;
        return Ok(classify_struct(tag));
    }
    Ok(match s {
        "bool" => MoveType::Bool,
        "u8" => MoveType::U8,
        "u16" => MoveType::U16,
        "u32" => MoveType::U32,
        "u64" => MoveType::U64,
        "u128" => MoveType::U128,
        "u256" => MoveType::U256,
        "address" => MoveType::Address,
        "signer" | "&signer" => MoveType::Signer,
        _ => {
            if let Some(idx) = s.strip_prefix('T').and_then(|n| n.parse::<u16>().ok()) {
                MoveType::Generic(idx)
            } else {
                classify_struct(parse_struct_head(s, Vec::new())?)
            }
        }
    })
}

fn parse_struct_head(head: &str, type_args: Vec<MoveType>) -> Result<StructTag> {
    let parts: Vec<&str> = head.split("::").collect();
    let [addr, module, name] = parts.as_slice() else {
        return Err(Error::Payload(format!("unknown type: {head}")));
    };
    if module.is_empty() || name.is_empty() {
        return Err(Error::Payload(format!("unknown type: {head}")));
    }
    Ok(StructTag {
        address: AccountAddress::from_str_relaxed(addr)
            .map_err(|e| Error::Payload(format!("type {head}: {e}")))?,
        module: (*module).to_string(),
        name: (*name).to_string(),
        type_args,
    })
}

fn classify_struct(tag: StructTag) -> MoveType {
    if tag.address != AccountAddress::ONE {
        return MoveType::Struct(tag);
    }
    match (tag.module.as_str(), tag.name.as_str(), tag.type_args.as_slice()) {
        ("string", "String", []) => MoveType::String,
        ("option", "Option", [inner]) => MoveType::Option(Box::new(inner.clone())),
        _ => MoveType::Struct(tag),
    }
}

/// Split at commas that are not nested inside `<...>`.
fn split_top_level(s: &str) -> Result<Vec<&str>> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::Payload(format!("unbalanced type arguments: {s}")));
                }
            }
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::Payload(format!("unbalanced type arguments: {s}")));
    }
    out.push(&s[start..]);
    if out.iter().any(|p| p.trim().is_empty()) {
        return Err(Error::Payload(format!("empty type argument in: {s}")));
    }
    Ok(out)
}

// ----------------------------- values ----------------------------------------

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    /// Little-endian.
    U256([u8; 32]),
    Address(AccountAddress),
    String(String),
    /// `vector<u8>`
    Bytes(Vec<u8>),
    Vector(Vec<MoveValue>),
    Option(Option<Box<MoveValue>>),
}

impl MoveValue {
    /// Coerce a JSON value into `ty`.
    pub fn coerce(ty: &MoveType, value: &Value, type_args: &[MoveType]) -> Result<Self> {
        let ty = ty.resolve(type_args)?;
        let mismatch = || Error::Payload(format!("expected {ty}, got {value}"));
        Ok(match ty {
            MoveType::Bool => match value {
                Value::Bool(b) => MoveValue::Bool(*b),
                Value::String(s) if s == "true" => MoveValue::Bool(true),
                Value::String(s) if s == "false" => MoveValue::Bool(false),
                _ => return Err(mismatch()),
            },
            MoveType::U8 => MoveValue::U8(narrow(uint_u128(value, ty)?, ty)?),
            MoveType::U16 => MoveValue::U16(narrow(uint_u128(value, ty)?, ty)?),
            MoveType::U32 => MoveValue::U32(narrow(uint_u128(value, ty)?, ty)?),
            MoveType::U64 => MoveValue::U64(narrow(uint_u128(value, ty)?, ty)?),
            MoveType::U128 => MoveValue::U128(uint_u128(value, ty)?),
            MoveType::U256 => MoveValue::U256(match value {
                Value::Number(n) => {
                    let v = n.as_u64().ok_or_else(mismatch)?;
                    let mut le = [0u8; 32];
                    le[..8].copy_from_slice(&v.to_le_bytes());
                    le
                }
                Value::String(s) => parse_u256(s)?,
                _ => return Err(mismatch()),
            }),
            MoveType::Address => match value {
                Value::String(s) => MoveValue::Address(
                    AccountAddress::from_str_relaxed(s).map_err(|e| Error::Payload(e.to_string()))?,
                ),
                _ => return Err(mismatch()),
            },
            MoveType::String => match value {
                Value::String(s) => MoveValue::String(s.clone()),
                _ => return Err(mismatch()),
            },
            MoveType::Vector(inner) if **inner == MoveType::U8 => match value {
                Value::String(s) => MoveValue::Bytes(if has_0x(s) {
                    hex_decode(s).map_err(|e| Error::Payload(format!("vector<u8>: {e}")))?
                } else {
                    s.as_bytes().to_vec()
                }),
                Value::Array(items) => MoveValue::Bytes(
                    items
                        .iter()
                        .map(|v| narrow::<u8>(uint_u128(v, &MoveType::U8)?, &MoveType::U8))
                        .collect::<Result<Vec<u8>>>()?,
                ),
                _ => return Err(mismatch()),
            },
            MoveType::Vector(inner) => match value {
                Value::Array(items) => MoveValue::Vector(
                    items
                        .iter()
                        .map(|v| MoveValue::coerce(inner, v, type_args))
                        .collect::<Result<Vec<_>>>()?,
                ),
                _ => return Err(mismatch()),
            },
            MoveType::Option(inner) => match value {
                Value::Null => MoveValue::Option(None),
                Value::Object(map) if map.len() == 1 && map.contains_key("vec") => {
                    match map.get("vec").and_then(Value::as_array).map(Vec::as_slice) {
                        Some([]) => MoveValue::Option(None),
                        Some([v]) => {
                            MoveValue::Option(Some(Box::new(MoveValue::coerce(inner, v, type_args)?)))
                        }
                        _ => return Err(mismatch()),
                    }
                }
                v => MoveValue::Option(Some(Box::new(MoveValue::coerce(inner, v, type_args)?))),
            },
            MoveType::Signer => {
                return Err(Error::Payload("signer arguments are supplied by the sender".into()))
            }
            MoveType::Generic(_) | MoveType::Struct(_) => {
                return Err(Error::Payload(format!("cannot build a {ty} argument from JSON")))
            }
        })
    }

    /// Canonical CBOR form. 128/256-bit integers are little-endian byte strings.
    pub fn to_cbor_value(&self) -> CborValue {
        match self {
            MoveValue::Bool(b) => CborValue::Bool(*b),
            MoveValue::U8(v) => CborValue::Integer(Integer::from(*v)),
            MoveValue::U16(v) => CborValue::Integer(Integer::from(*v)),
            MoveValue::U32(v) => CborValue::Integer(Integer::from(*v)),
            MoveValue::U64(v) => cbor::uint(*v),
            MoveValue::U128(v) => cbor::bytes(&v.to_le_bytes()),
            MoveValue::U256(le) => cbor::bytes(le),
            MoveValue::Address(a) => cbor::bytes(a.as_bytes()),
            MoveValue::String(s) => cbor::text(s),
            MoveValue::Bytes(b) => cbor::bytes(b),
            MoveValue::Vector(items) => {
                CborValue::Array(items.iter().map(MoveValue::to_cbor_value).collect())
            }
            MoveValue::Option(v) => {
                CborValue::Array(v.iter().map(|inner| inner.to_cbor_value()).collect())
            }
        }
    }

    /// JSON form accepted by view-function endpoints: wide integers as decimal
    /// strings, bytes as hex, options as `{"vec": [...]}`.
    pub fn to_json(&self) -> Value {
        match self {
            MoveValue::Bool(b) => Value::Bool(*b),
            MoveValue::U8(v) => Value::from(*v),
            MoveValue::U16(v) => Value::from(*v),
            MoveValue::U32(v) => Value::from(*v),
            MoveValue::U64(v) => Value::String(v.to_string()),
            MoveValue::U128(v) => Value::String(v.to_string()),
            MoveValue::U256(le) => Value::String(u256_to_decimal(le)),
            MoveValue::Address(a) => Value::String(a.to_string()),
            MoveValue::String(s) => Value::String(s.clone()),
            MoveValue::Bytes(b) => Value::String(hex_encode(b)),
            MoveValue::Vector(items) => Value::Array(items.iter().map(MoveValue::to_json).collect()),
            MoveValue::Option(v) => serde_json::json!({
                "vec": v.iter().map(|inner| inner.to_json()).collect::<Vec<_>>()
            }),
        }
    }
}

fn uint_u128(value: &Value, ty: &MoveType) -> Result<u128> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| Error::Payload(format!("expected {ty}, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u128>()
            .map_err(|_| Error::Payload(format!("expected {ty}, got {s:?}"))),
        other => Err(Error::Payload(format!("expected {ty}, got {other}"))),
    }
}

fn narrow<T: TryFrom<u128>>(v: u128, ty: &MoveType) -> Result<T> {
    T::try_from(v).map_err(|_| Error::Payload(format!("{v} out of range for {ty}")))
}

/// Decimal or `0x` hex into 32 little-endian bytes.
fn parse_u256(s: &str) -> Result<[u8; 32]> {
    let s = s.trim();
    let overflow = || Error::Payload(format!("{s} out of range for u256"));
    if has_0x(s) {
        let be = hex_decode(s).map_err(|e| Error::Payload(format!("u256: {e}")))?;
        if be.len() > 32 {
            return Err(overflow());
        }
        let mut le = [0u8; 32];
        for (dst, src) in le.iter_mut().zip(be.iter().rev()) {
            *dst = *src;
        }
        return Ok(le);
    }
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Payload(format!("expected u256, got {s:?}")));
    }
    let mut le = [0u8; 32];
    for digit in s.bytes().map(|b| b - b'0') {
        let mut carry = u16::from(digit);
        for byte in le.iter_mut() {
            let acc = u16::from(*byte) * 10 + carry;
            *byte = acc as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return Err(overflow());
        }
    }
    Ok(le)
}

fn u256_to_decimal(le: &[u8; 32]) -> String {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(le.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(buf);
    }
    BigInt::<4>::new(limbs).to_string()
}

// ----------------------------- schema ----------------------------------------

/// Fully qualified function identifier `address::module::function`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
    pub address: AccountAddress,
    pub module: String,
    pub name: String,
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address.to_short_string(), self.module, self.name)
    }
}

impl FromStr for FunctionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = parse_struct_head(s.trim(), Vec::new())?;
        Ok(Self { address: tag.address, module: tag.module, name: tag.name })
    }
}

impl Serialize for FunctionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Entry,
    View,
}

/// One row of the function table.
///
/// `params` excludes the leading `&signer` of entry functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSchema {
    pub module_address: &'static str,
    pub module_name: &'static str,
    pub function_name: &'static str,
    pub kind: FunctionKind,
    pub type_params: u16,
    pub params: &'static [(&'static str, &'static str)],
}

impl FunctionSchema {
    pub fn function_id(&self) -> Result<FunctionId> {
        Ok(FunctionId {
            address: AccountAddress::from_str_relaxed(self.module_address)?,
            module: self.module_name.to_string(),
            name: self.function_name.to_string(),
        })
    }

    /// Parsed parameter types, in declaration order.
    pub fn param_types(&self) -> Result<Vec<MoveType>> {
        self.params
            .iter()
            .map(|(name, ty)| {
                ty.parse::<MoveType>()
                    .map_err(|e| Error::Payload(format!("{}: param {name}: {e}", self.function_name)))
            })
            .collect()
    }

    pub fn builder(&self) -> PayloadBuilder<'_> {
        PayloadBuilder::new(self)
    }
}

// ----------------------------- payloads --------------------------------------

/// Call of an entry function, ready to go into a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFunctionPayload {
    pub function: FunctionId,
    pub type_args: Vec<MoveType>,
    pub args: Vec<MoveValue>,
}

impl EntryFunctionPayload {
    /// `{0: function, 1: [type args], 2: [args]}`
    pub fn to_cbor_value(&self) -> CborValue {
        cbor::int_map(vec![
            (0, cbor::text(&self.function.to_string())),
            (1, CborValue::Array(self.type_args.iter().map(|t| cbor::text(&t.to_string())).collect())),
            (2, CborValue::Array(self.args.iter().map(MoveValue::to_cbor_value).collect())),
        ])
    }
}

impl Serialize for EntryFunctionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("EntryFunctionPayload", 3)?;
        st.serialize_field("function", &self.function)?;
        st.serialize_field("type_arguments", &self.type_args)?;
        let args: Vec<Value> = self.args.iter().map(MoveValue::to_json).collect();
        st.serialize_field("arguments", &args)?;
        st.end()
    }
}

/// Read-only call, sent as the JSON body of a view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFunctionPayload {
    pub function: FunctionId,
    pub type_args: Vec<MoveType>,
    pub args: Vec<MoveValue>,
}

impl ViewFunctionPayload {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "function": self.function.to_string(),
            "type_arguments": self.type_args.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            "arguments": self.args.iter().map(MoveValue::to_json).collect::<Vec<_>>(),
        })
    }
}

impl Serialize for ViewFunctionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Builds payloads for any [`FunctionSchema`].
#[derive(Debug, Clone)]
pub struct PayloadBuilder<'s> {
    schema: &'s FunctionSchema,
    type_args: Vec<String>,
    args: Vec<Value>,
}

impl<'s> PayloadBuilder<'s> {
    pub fn new(schema: &'s FunctionSchema) -> Self {
        Self { schema, type_args: Vec::new(), args: Vec::new() }
    }

    pub fn type_arg(mut self, ty: &str) -> Self {
        self.type_args.push(ty.to_string());
        self
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    fn resolve(&self) -> Result<(FunctionId, Vec<MoveType>, Vec<MoveValue>)> {
        let schema = self.schema;
        if self.type_args.len() != schema.type_params as usize {
            return Err(Error::Payload(format!(
                "{} expects {} type arguments, got {}",
                schema.function_name,
                schema.type_params,
                self.type_args.len()
            )));
        }
        let type_args = self
            .type_args
            .iter()
            .map(|t| t.parse::<MoveType>())
            .collect::<Result<Vec<_>>>()?;
        if let Some(t) = type_args.iter().find(|t| t.contains_generic()) {
            return Err(Error::Payload(format!("type argument {t} is not concrete")));
        }

        let params = schema.param_types()?;
        if self.args.len() != params.len() {
            return Err(Error::Payload(format!(
                "{} expects {} arguments, got {}",
                schema.function_name,
                params.len(),
                self.args.len()
            )));
        }
        let args = params
            .iter()
            .zip(&self.args)
            .zip(schema.params)
            .map(|((ty, v), (name, _))| {
                MoveValue::coerce(ty, v, &type_args)
                    .map_err(|e| Error::Payload(format!("{}: {name}: {e}", schema.function_name)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((schema.function_id()?, type_args, args))
    }

    pub fn build_entry(self) -> Result<EntryFunctionPayload> {
        if self.schema.kind != FunctionKind::Entry {
            return Err(Error::Payload(format!("{} is not an entry function", self.schema.function_name)));
        }
        let (function, type_args, args) = self.resolve()?;
        Ok(EntryFunctionPayload { function, type_args, args })
    }

    pub fn build_view(self) -> Result<ViewFunctionPayload> {
        if self.schema.kind != FunctionKind::View {
            return Err(Error::Payload(format!("{} is not a view function", self.schema.function_name)));
        }
        let (function, type_args, args) = self.resolve()?;
        Ok(ViewFunctionPayload { function, type_args, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_types() {
        let t: MoveType = "vector<0x1::option::Option<u64>>".parse().unwrap();
        assert_eq!(t, MoveType::Vector(Box::new(MoveType::Option(Box::new(MoveType::U64)))));
        assert_eq!(t.to_string(), "vector<0x1::option::Option<u64>>");

        let s: MoveType = "0x0001::string::String".parse().unwrap();
        assert_eq!(s, MoveType::String);

        let coin: MoveType = "0x1::coin::Coin<0x1::aptos_coin::AptosCoin>".parse().unwrap();
        assert_eq!(coin.to_string(), "0x1::coin::Coin<0x1::aptos_coin::AptosCoin>");
        assert_eq!("T1".parse::<MoveType>().unwrap(), MoveType::Generic(1));
    }

    #[test]
    fn rejects_bad_types() {
        for bad in ["", "vector<u8", "vector<u8,u64>", "foo", "0x1::m", "vector<>", "0x1::m::S<u8,>"] {
            assert!(bad.parse::<MoveType>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn coerces_integers_from_numbers_and_strings() {
        assert_eq!(MoveValue::coerce(&MoveType::U8, &json!(255), &[]).unwrap(), MoveValue::U8(255));
        assert!(MoveValue::coerce(&MoveType::U8, &json!(256), &[]).is_err());
        assert_eq!(
            MoveValue::coerce(&MoveType::U64, &json!("18446744073709551615"), &[]).unwrap(),
            MoveValue::U64(u64::MAX)
        );
        assert_eq!(
            MoveValue::coerce(&MoveType::U128, &json!("340282366920938463463374607431768211455"), &[])
                .unwrap(),
            MoveValue::U128(u128::MAX)
        );
        assert!(MoveValue::coerce(&MoveType::U64, &json!(-1), &[]).is_err());
        assert!(MoveValue::coerce(&MoveType::U64, &json!(true), &[]).is_err());
    }

    #[test]
    fn u256_decimal_and_hex_agree() {
        let dec = MoveValue::coerce(&MoveType::U256, &json!("65536"), &[]).unwrap();
        let hex = MoveValue::coerce(&MoveType::U256, &json!("0x010000"), &[]).unwrap();
        assert_eq!(dec, hex);
        assert_eq!(dec.to_json(), json!("65536"));

        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        let v = MoveValue::coerce(&MoveType::U256, &json!(max), &[]).unwrap();
        assert_eq!(v, MoveValue::U256([0xff; 32]));
        assert_eq!(v.to_json(), json!(max));
        let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(MoveValue::coerce(&MoveType::U256, &json!(over), &[]).is_err());
    }

    #[test]
    fn bytes_options_and_generics() {
        let bytes_ty: MoveType = "vector<u8>".parse().unwrap();
        assert_eq!(
            MoveValue::coerce(&bytes_ty, &json!("0xdead"), &[]).unwrap(),
            MoveValue::Bytes(vec![0xde, 0xad])
        );
        assert_eq!(
            MoveValue::coerce(&bytes_ty, &json!([1, 2]), &[]).unwrap(),
            MoveValue::Bytes(vec![1, 2])
        );

        let opt: MoveType = "0x1::option::Option<address>".parse().unwrap();
        assert_eq!(MoveValue::coerce(&opt, &json!(null), &[]).unwrap(), MoveValue::Option(None));
        assert_eq!(MoveValue::coerce(&opt, &json!({"vec": []}), &[]).unwrap(), MoveValue::Option(None));
        assert_eq!(
            MoveValue::coerce(&opt, &json!("0x1"), &[]).unwrap(),
            MoveValue::Option(Some(Box::new(MoveValue::Address(AccountAddress::ONE))))
        );

        let generic = MoveType::Generic(0);
        assert_eq!(
            MoveValue::coerce(&generic, &json!("7"), &[MoveType::U64]).unwrap(),
            MoveValue::U64(7)
        );
        assert!(MoveValue::coerce(&generic, &json!("7"), &[]).is_err());
    }

    const TRANSFER: FunctionSchema = FunctionSchema {
        module_address: "0x1",
        module_name: "coin",
        function_name: "transfer",
        kind: FunctionKind::Entry,
        type_params: 1,
        params: &[("to", "address"), ("amount", "u64")],
    };

    #[test]
    fn builder_checks_arity_and_kind() {
        let p = TRANSFER
            .builder()
            .type_arg("0x1::aptos_coin::AptosCoin")
            .arg("0x2")
            .arg(1000)
            .build_entry()
            .unwrap();
        assert_eq!(p.function.to_string(), "0x1::coin::transfer");
        assert_eq!(p.args[1], MoveValue::U64(1000));

        assert!(TRANSFER.builder().arg("0x2").arg(1).build_entry().is_err());
        assert!(TRANSFER.builder().type_arg("u8").arg("0x2").build_entry().is_err());
        assert!(TRANSFER.builder().type_arg("T0").arg("0x2").arg(1).build_entry().is_err());
        assert!(TRANSFER.builder().type_arg("u8").arg("0x2").arg(1).build_view().is_err());
    }

    #[test]
    fn entry_payload_json_shape() {
        let p = TRANSFER
            .builder()
            .type_arg("0x1::aptos_coin::AptosCoin")
            .args([json!("0x2"), json!("5")])
            .build_entry()
            .unwrap();
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["function"], "0x1::coin::transfer");
        assert_eq!(v["type_arguments"][0], "0x1::aptos_coin::AptosCoin");
        assert_eq!(v["arguments"][1], "5");
    }
}
