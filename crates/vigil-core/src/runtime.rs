//! Typed values read out of the debug target.
//!
//! A [`RuntimeValue`] is the engine's opaque handle for "a value that lives
//! in the debuggee": a register, a variable, or the result of a runtime
//! expression. It carries a [`TypeHandle`] and just enough payload to
//! support retyping, stringification, and character decoding. Values are
//! snapshots; nothing here writes back to the target.

use crate::error::{Result, VigilError};
use crate::types::{TypeHandle, TypeKind};

/// Raw payload of a runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeData
{
    /// Integer payload (registers, integer variables, pointers).
    Int(i128),
    /// Floating point payload.
    Float(f64),
    /// Raw character data (strings, buffers). Decoded as latin-1.
    Bytes(Vec<u8>),
}

/// A typed value snapshotted from the debug target.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeValue
{
    ty: TypeHandle,
    data: RuntimeData,
}

impl RuntimeValue
{
    /// Build a value from a type and payload.
    pub fn new(ty: TypeHandle, data: RuntimeData) -> Self
    {
        Self { ty, data }
    }

    /// Integer value with the default `long` type.
    pub fn from_int(value: i128) -> Self
    {
        Self::new(
            TypeHandle::new("long", TypeKind::Int { signed: true, bits: 64 }),
            RuntimeData::Int(value),
        )
    }

    /// Float value with the default `double` type.
    pub fn from_float(value: f64) -> Self
    {
        Self::new(TypeHandle::new("double", TypeKind::Float { bits: 64 }), RuntimeData::Float(value))
    }

    /// Character data with a `char*` type.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self
    {
        let ty = TypeHandle::new("char", TypeKind::Char { signed: true }).pointer_to();
        Self::new(ty, RuntimeData::Bytes(bytes.into()))
    }

    /// The value's current type.
    pub fn ty(&self) -> &TypeHandle
    {
        &self.ty
    }

    /// The raw payload.
    pub fn data(&self) -> &RuntimeData
    {
        &self.data
    }

    /// Reinterpret the value as `target`.
    ///
    /// Numeric payloads are truncated or extended to the target width and
    /// signedness the way a C cast would; non-numeric combinations keep
    /// their payload and only change the type tag.
    pub fn retype(self, target: TypeHandle) -> Result<Self>
    {
        let data = match (&target.kind, self.data) {
            (TypeKind::Int { signed, bits }, RuntimeData::Int(v)) => {
                RuntimeData::Int(truncate_int(v, *signed, *bits))
            }
            (TypeKind::Int { signed, bits }, RuntimeData::Float(f)) => {
                RuntimeData::Int(truncate_int(f as i128, *signed, *bits))
            }
            (TypeKind::Char { signed }, RuntimeData::Int(v)) => {
                RuntimeData::Int(truncate_int(v, *signed, 8))
            }
            (TypeKind::Pointer(_), RuntimeData::Int(v)) => {
                RuntimeData::Int(truncate_int(v, false, 64))
            }
            (TypeKind::Float { .. }, RuntimeData::Int(v)) => RuntimeData::Float(v as f64),
            (TypeKind::Float { .. }, RuntimeData::Float(f)) => RuntimeData::Float(f),
            (TypeKind::Void, _) => {
                return Err(VigilError::Cast("cannot cast value to void".to_string()));
            }
            (_, data) => data,
        };
        Ok(Self { ty: target, data })
    }

    /// Decode the value's character data as a latin-1 string.
    ///
    /// Byte payloads stop at the first NUL, matching how a debugger reads a
    /// C string. Integer payloads decode only for character types (a single
    /// character); anything else is not string-like.
    pub fn decode_string(&self) -> Result<String>
    {
        match (&self.data, self.ty.is_char_like()) {
            (RuntimeData::Bytes(bytes), _) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Ok(bytes[..end].iter().map(|&b| b as char).collect())
            }
            (RuntimeData::Int(v), true) => {
                let b = (*v as u8) as char;
                Ok(b.to_string())
            }
            _ => Err(VigilError::Cast(format!("value of type {} is not string-like", self.ty.name))),
        }
    }

    /// Native truthiness.
    pub fn truthy(&self) -> bool
    {
        match &self.data {
            RuntimeData::Int(v) => *v != 0,
            RuntimeData::Float(f) => *f != 0.0,
            RuntimeData::Bytes(b) => !b.is_empty(),
        }
    }

    /// Integer view of the payload, if there is one.
    pub fn as_int(&self) -> Option<i128>
    {
        match &self.data {
            RuntimeData::Int(v) => Some(*v),
            RuntimeData::Float(f) => Some(*f as i128),
            RuntimeData::Bytes(_) => None,
        }
    }

    /// Float view of the payload, if there is one.
    pub fn as_float(&self) -> Option<f64>
    {
        match &self.data {
            RuntimeData::Int(v) => Some(*v as f64),
            RuntimeData::Float(f) => Some(*f),
            RuntimeData::Bytes(_) => None,
        }
    }

    /// Display form: pointers in hex, integers in decimal, byte payloads
    /// decoded.
    pub fn render(&self) -> String
    {
        match (&self.ty.kind, &self.data) {
            (TypeKind::Pointer(_), RuntimeData::Int(v)) => format!("0x{:x}", *v as u64),
            (_, RuntimeData::Int(v)) => v.to_string(),
            (_, RuntimeData::Float(f)) => format!("{f}"),
            (_, RuntimeData::Bytes(_)) => self.decode_string().unwrap_or_default(),
        }
    }
}

/// Truncate to `bits` wide, reinterpreting per `signed`.
fn truncate_int(value: i128, signed: bool, bits: u32) -> i128
{
    if bits >= 128 {
        return value;
    }
    let mask = (1u128 << bits) - 1;
    let truncated = (value as u128) & mask;
    if signed && truncated >> (bits - 1) & 1 == 1 {
        (truncated as i128) - (1i128 << bits)
    } else {
        truncated as i128
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::known_type;

    #[test]
    fn test_retype_truncates_like_c()
    {
        let v = RuntimeValue::from_int(-1);
        let uc = v.retype(known_type("uc").unwrap()).unwrap();
        assert_eq!(uc.as_int(), Some(255));

        let v = RuntimeValue::from_int(0x1_0000_00ff);
        let us = v.retype(known_type("us").unwrap()).unwrap();
        assert_eq!(us.as_int(), Some(0xff));
    }

    #[test]
    fn test_retype_unsigned_long_keeps_value()
    {
        let v = RuntimeValue::from_int(123_456);
        let ul = v.retype(known_type("ul").unwrap()).unwrap();
        assert_eq!(ul.as_int(), Some(123_456));
        assert_eq!(ul.render(), "123456");
    }

    #[test]
    fn test_pointer_renders_hex()
    {
        let v = RuntimeValue::from_int(0xdead_beef);
        let p = v.retype(known_type("c").unwrap().pointer_to()).unwrap();
        assert_eq!(p.render(), "0xdeadbeef");
    }

    #[test]
    fn test_decode_string_stops_at_nul()
    {
        let v = RuntimeValue::from_bytes(*b"hi\0rest");
        assert_eq!(v.decode_string().unwrap(), "hi");
    }

    #[test]
    fn test_decode_string_rejects_plain_int()
    {
        let v = RuntimeValue::from_int(65);
        assert!(v.decode_string().is_err());
    }
}
