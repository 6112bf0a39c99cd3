//! Canonical CBOR helpers.
//!
//! Signing messages and payload arguments are built as explicit
//! [`ciborium::Value`] trees (arrays and integer-keyed maps only, definite
//! lengths), so the encoding is byte-stable across runs and SDKs. Helpers here
//! only serialize; there is no decode path for sign bytes.

use crate::error::Result;
use ciborium::value::{Integer, Value};

/// Encode a value tree to CBOR bytes.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    ciborium::ser::into_writer(value, &mut out)?;
    Ok(out)
}

/// Integer-keyed map with entries in ascending key order.
pub fn int_map(entries: Vec<(u8, Value)>) -> Value {
    let mut entries = entries;
    entries.sort_by_key(|(k, _)| *k);
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::Integer(Integer::from(k)), v))
            .collect(),
    )
}

/// Unsigned integer value.
#[inline]
pub fn uint(v: u64) -> Value {
    Value::Integer(Integer::from(v))
}

/// Byte-string value.
#[inline]
pub fn bytes(b: &[u8]) -> Value {
    Value::Bytes(b.to_vec())
}

/// Text value.
#[inline]
pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_map_orders_keys() {
        let a = int_map(vec![(2, uint(2)), (0, uint(0)), (1, uint(1))]);
        let b = int_map(vec![(0, uint(0)), (1, uint(1)), (2, uint(2))]);
        assert_eq!(to_vec(&a).unwrap(), to_vec(&b).unwrap());
    }

    #[test]
    fn small_values_encode_minimally() {
        // CBOR major type 0, value 5 → single byte 0x05.
        assert_eq!(to_vec(&uint(5)).unwrap(), vec![0x05]);
        // Byte string of length 2 → 0x42 followed by the bytes.
        assert_eq!(to_vec(&bytes(&[0xaa, 0xbb])).unwrap(), vec![0x42, 0xaa, 0xbb]);
    }
}
