//! codec - typed view over raw stream payloads.
//!
//! Формат: плоская последовательность little-endian элементов фиксированной ширины,
//! без заголовка. Один элемент -> скаляр, иначе массив. `Bytes` - payload как есть.
//!
//! Pixel payloads support only uint16 and float32 (type codes 5 and 10); uint32 is
//! used by metadata scalars (geometry, counts, type codes).

use anyhow::Result;
use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{TYPE_CODE_F32, TYPE_CODE_U16};
use crate::error::TxrmError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    U16,
    U32,
    F32,
    Bytes,
}

impl Dtype {
    /// Element width in bytes; None for opaque byte strings.
    #[inline]
    pub fn width(self) -> Option<usize> {
        match self {
            Dtype::U16 => Some(2),
            Dtype::U32 | Dtype::F32 => Some(4),
            Dtype::Bytes => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dtype::U16 => "uint16",
            Dtype::U32 => "uint32",
            Dtype::F32 => "float32",
            Dtype::Bytes => "bytes",
        }
    }
}

/// Pixel element kind of image / reference streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelKind {
    U16,
    F32,
}

impl PixelKind {
    /// Resolve a stored type code. Unknown codes are a hard error, never a sentinel.
    pub fn from_type_code(code: u32, what: &'static str) -> Result<Self> {
        match code {
            TYPE_CODE_F32 => Ok(PixelKind::F32),
            TYPE_CODE_U16 => Ok(PixelKind::U16),
            _ => Err(TxrmError::UnsupportedFormat { what, code }.into()),
        }
    }

    pub fn type_code(self) -> u32 {
        match self {
            PixelKind::U16 => TYPE_CODE_U16,
            PixelKind::F32 => TYPE_CODE_F32,
        }
    }

    #[inline]
    pub fn width(self) -> usize {
        match self {
            PixelKind::U16 => 2,
            PixelKind::F32 => 4,
        }
    }
}

fn check_width(bytes: &[u8], width: usize, dtype: Dtype) -> Result<usize> {
    if bytes.len() % width != 0 {
        return Err(TxrmError::type_mismatch(
            dtype.name(),
            format!(
                "payload of {} B is not a multiple of element width {}",
                bytes.len(),
                width
            ),
        )
        .into());
    }
    Ok(bytes.len() / width)
}

pub fn decode_u16s(bytes: &[u8]) -> Result<Vec<u16>> {
    let n = check_width(bytes, 2, Dtype::U16)?;
    let mut out = vec![0u16; n];
    LittleEndian::read_u16_into(bytes, &mut out);
    Ok(out)
}

pub fn decode_u32s(bytes: &[u8]) -> Result<Vec<u32>> {
    let n = check_width(bytes, 4, Dtype::U32)?;
    let mut out = vec![0u32; n];
    LittleEndian::read_u32_into(bytes, &mut out);
    Ok(out)
}

pub fn decode_f32s(bytes: &[u8]) -> Result<Vec<f32>> {
    let n = check_width(bytes, 4, Dtype::F32)?;
    let mut out = vec![0f32; n];
    LittleEndian::read_f32_into(bytes, &mut out);
    Ok(out)
}

/// Discovery predicate: Some only if the payload is whole float32 elements
/// *and* holds exactly `expected` of them. Everything else is a deliberate skip.
pub fn decode_f32s_exact(bytes: &[u8], expected: usize) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 || bytes.len() / 4 != expected {
        return None;
    }
    decode_f32s(bytes).ok()
}

pub fn encode_u16s<'a, I: IntoIterator<Item = &'a u16>>(it: I) -> Vec<u8> {
    let mut out = Vec::new();
    let mut b = [0u8; 2];
    for v in it {
        LittleEndian::write_u16(&mut b, *v);
        out.extend_from_slice(&b);
    }
    out
}

pub fn encode_u32s<'a, I: IntoIterator<Item = &'a u32>>(it: I) -> Vec<u8> {
    let mut out = Vec::new();
    let mut b = [0u8; 4];
    for v in it {
        LittleEndian::write_u32(&mut b, *v);
        out.extend_from_slice(&b);
    }
    out
}

pub fn encode_f32s<'a, I: IntoIterator<Item = &'a f32>>(it: I) -> Vec<u8> {
    let mut out = Vec::new();
    let mut b = [0u8; 4];
    for v in it {
        LittleEndian::write_f32(&mut b, *v);
        out.extend_from_slice(&b);
    }
    out
}

/// Decode a payload as `dtype`.
pub fn decode(bytes: &[u8], dtype: Dtype) -> Result<Value> {
    Ok(match dtype {
        Dtype::Bytes => Value::Bytes(bytes.to_vec()),
        Dtype::U16 => Value::from_u16s(decode_u16s(bytes)?),
        Dtype::U32 => Value::from_u32s(decode_u32s(bytes)?),
        Dtype::F32 => Value::from_f32s(decode_f32s(bytes)?),
    })
}

/// Exact inverse of `decode`: elements in logical (row-major) order.
pub fn encode(v: &Value) -> Vec<u8> {
    match v {
        Value::Bytes(b) => b.clone(),
        Value::U16(x) => x.to_le_bytes().to_vec(),
        Value::U32(x) => x.to_le_bytes().to_vec(),
        Value::F32(x) => x.to_le_bytes().to_vec(),
        Value::U16Array(a) => encode_u16s(a.iter()),
        Value::U32Array(a) => encode_u32s(a.iter()),
        Value::F32Array(a) => encode_f32s(a.iter()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_vs_array_decode() {
        let one = 1234u32.to_le_bytes();
        assert_eq!(decode(&one, Dtype::U32).unwrap(), Value::U32(1234));

        let many = encode_f32s(&[1.0f32, -2.5, 3.25]);
        let v = decode(&many, Dtype::F32).unwrap();
        assert_eq!(v.as_f32_vec().unwrap(), vec![1.0, -2.5, 3.25]);
        assert_eq!(encode(&v), many);
    }

    #[test]
    fn roundtrip_u16_and_f32() {
        let v = Value::from_u16s(vec![0, 1, 65535, 42]);
        assert_eq!(decode(&encode(&v), Dtype::U16).unwrap(), v);

        let f = Value::F32(-0.125);
        assert_eq!(decode(&encode(&f), Dtype::F32).unwrap(), f);
    }

    #[test]
    fn ragged_payload_is_rejected() {
        assert!(decode(&[1, 2, 3], Dtype::F32).is_err());
        assert!(decode(&[1, 2, 3], Dtype::U16).is_err());
        assert_eq!(
            decode(&[1, 2, 3], Dtype::Bytes).unwrap(),
            Value::Bytes(vec![1, 2, 3])
        );
    }

    #[test]
    fn exact_predicate() {
        let b = encode_f32s(&[0.0f32, 1.0, 2.0]);
        assert!(decode_f32s_exact(&b, 3).is_some());
        assert!(decode_f32s_exact(&b, 2).is_none());
        assert!(decode_f32s_exact(&b[..5], 1).is_none());
    }

    #[test]
    fn pixel_kind_resolution() {
        assert_eq!(PixelKind::from_type_code(5, "image").unwrap(), PixelKind::U16);
        assert_eq!(PixelKind::from_type_code(10, "image").unwrap(), PixelKind::F32);
        let err = PixelKind::from_type_code(3, "reference").unwrap_err();
        match err.downcast_ref::<TxrmError>() {
            Some(TxrmError::UnsupportedFormat { code: 3, what }) => assert_eq!(*what, "reference"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
