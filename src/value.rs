//! Value - decoded metadata payload (scalar, n-d numeric array or opaque bytes).

use anyhow::Result;
use ndarray::{Array1, ArrayD, IxDyn};

use crate::codec::Dtype;
use crate::error::TxrmError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bytes(Vec<u8>),
    U16(u16),
    U32(u32),
    F32(f32),
    U16Array(ArrayD<u16>),
    U32Array(ArrayD<u32>),
    F32Array(ArrayD<f32>),
}

impl Value {
    /// Flat f32 vector -> Value; a single element collapses to a scalar (decode rule).
    pub fn from_f32s(v: Vec<f32>) -> Self {
        if v.len() == 1 {
            Value::F32(v[0])
        } else {
            Value::F32Array(Array1::from(v).into_dyn())
        }
    }

    pub fn from_u16s(v: Vec<u16>) -> Self {
        if v.len() == 1 {
            Value::U16(v[0])
        } else {
            Value::U16Array(Array1::from(v).into_dyn())
        }
    }

    pub fn from_u32s(v: Vec<u32>) -> Self {
        if v.len() == 1 {
            Value::U32(v[0])
        } else {
            Value::U32Array(Array1::from(v).into_dyn())
        }
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            Value::Bytes(_) => Dtype::Bytes,
            Value::U16(_) | Value::U16Array(_) => Dtype::U16,
            Value::U32(_) | Value::U32Array(_) => Dtype::U32,
            Value::F32(_) | Value::F32Array(_) => Dtype::F32,
        }
    }

    /// Element count (bytes: payload length; scalar: 1).
    pub fn len(&self) -> usize {
        match self {
            Value::Bytes(b) => b.len(),
            Value::U16(_) | Value::U32(_) | Value::F32(_) => 1,
            Value::U16Array(a) => a.len(),
            Value::U32Array(a) => a.len(),
            Value::F32Array(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Value::Bytes(b) => vec![b.len()],
            Value::U16(_) | Value::U32(_) | Value::F32(_) => Vec::new(),
            Value::U16Array(a) => a.shape().to_vec(),
            Value::U32Array(a) => a.shape().to_vec(),
            Value::F32Array(a) => a.shape().to_vec(),
        }
    }

    /// Integer scalar (u16/u32); type codes, geometry and counts are stored this way.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            Value::U16(v) => Some(*v as u32),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// f32 elements in logical order (scalar -> one element).
    pub fn as_f32_vec(&self) -> Option<Vec<f32>> {
        match self {
            Value::F32(v) => Some(vec![*v]),
            Value::F32Array(a) => Some(a.iter().copied().collect()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Element-wise map over float payloads; other kinds are returned unchanged.
    pub fn map_f32<F: Fn(f32) -> f32>(&self, f: F) -> Value {
        match self {
            Value::F32(v) => Value::F32(f(*v)),
            Value::F32Array(a) => Value::F32Array(a.mapv(|x| f(x))),
            other => other.clone(),
        }
    }

    /// Reshape a numeric value; the element count must be preserved.
    pub fn reshape(self, shape: &[usize]) -> Result<Value> {
        let want: usize = shape.iter().product();
        let have = self.len();
        if want != have {
            return Err(TxrmError::type_mismatch(
                "reshape",
                format!("cannot reshape {} element(s) into {:?}", have, shape),
            )
            .into());
        }
        let dim = IxDyn(shape);
        let out = match self {
            Value::Bytes(_) => {
                return Err(TxrmError::type_mismatch("reshape", "byte strings have no shape").into())
            }
            Value::U16(v) => Value::U16Array(ArrayD::from_shape_vec(dim, vec![v])?),
            Value::U32(v) => Value::U32Array(ArrayD::from_shape_vec(dim, vec![v])?),
            Value::F32(v) => Value::F32Array(ArrayD::from_shape_vec(dim, vec![v])?),
            Value::U16Array(a) => {
                Value::U16Array(ArrayD::from_shape_vec(dim, a.iter().copied().collect())?)
            }
            Value::U32Array(a) => {
                Value::U32Array(ArrayD::from_shape_vec(dim, a.iter().copied().collect())?)
            }
            Value::F32Array(a) => {
                Value::F32Array(ArrayD::from_shape_vec(dim, a.iter().copied().collect())?)
            }
        };
        Ok(out)
    }

    /// JSON rendering for CLI/meta dumps. Bytes are shown as text up to the first NUL.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Value::Bytes(b) => {
                let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
                json!(String::from_utf8_lossy(&b[..end]))
            }
            Value::U16(v) => json!(v),
            Value::U32(v) => json!(v),
            Value::F32(v) => json!(v),
            Value::U16Array(a) => json!(a.iter().copied().collect::<Vec<_>>()),
            Value::U32Array(a) => json!(a.iter().copied().collect::<Vec<_>>()),
            Value::F32Array(a) => json!(a.iter().copied().collect::<Vec<_>>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_element_collapses_to_scalar() {
        assert_eq!(Value::from_f32s(vec![2.5]), Value::F32(2.5));
        assert_eq!(Value::from_u32s(vec![7]).as_u32(), Some(7));
        assert_eq!(Value::from_f32s(vec![1.0, 2.0]).len(), 2);
    }

    #[test]
    fn reshape_checks_element_count() {
        let v = Value::from_f32s((0..6).map(|x| x as f32).collect());
        let r = v.clone().reshape(&[2, 3]).unwrap();
        assert_eq!(r.shape(), vec![2, 3]);
        assert_eq!(r.as_f32_vec(), v.as_f32_vec());
        assert!(v.reshape(&[4, 2]).is_err());
    }
}
