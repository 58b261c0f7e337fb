//! Row payload wire format.
//!
//! A record is `{u16 field_count, u16 null_bitmap_bytes, u8 bitmap[..],
//! field[field_count]}` where each field is `{u8 type_tag, u16 length,
//! u8 payload[length]}`, all little-endian. NULL fields carry length 0
//! and have their bit set in the bitmap. Fixed-width types must encode
//! with their exact payload size.

use crate::catalog::types::DataType;
use crate::config::MAX_RECORD_SIZE;
use crate::error::{Error, Result};

/// One encoded column value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub data_type: DataType,
    pub is_null: bool,
    pub payload: Vec<u8>,
}

impl Field {
    pub fn from_null(declared_type: DataType) -> Field {
        Field {
            data_type: declared_type,
            is_null: true,
            payload: Vec::new(),
        }
    }

    pub fn from_bool(v: bool) -> Field {
        Field {
            data_type: DataType::Boolean,
            is_null: false,
            payload: vec![u8::from(v)],
        }
    }

    pub fn from_i32(v: i32) -> Field {
        Field {
            data_type: DataType::Integer,
            is_null: false,
            payload: v.to_le_bytes().to_vec(),
        }
    }

    pub fn from_i64(v: i64) -> Field {
        Field {
            data_type: DataType::BigInt,
            is_null: false,
            payload: v.to_le_bytes().to_vec(),
        }
    }

    pub fn from_f32(v: f32) -> Field {
        Field {
            data_type: DataType::Float,
            is_null: false,
            payload: v.to_le_bytes().to_vec(),
        }
    }

    pub fn from_f64(v: f64) -> Field {
        Field {
            data_type: DataType::Double,
            is_null: false,
            payload: v.to_le_bytes().to_vec(),
        }
    }

    pub fn from_str(s: &str, declared_type: DataType) -> Field {
        Field {
            data_type: declared_type,
            is_null: false,
            payload: s.as_bytes().to_vec(),
        }
    }

    /// DATE payload: days since 1970-01-01 as i64.
    pub fn from_date(days_since_epoch: i64) -> Field {
        Field {
            data_type: DataType::Date,
            is_null: false,
            payload: days_since_epoch.to_le_bytes().to_vec(),
        }
    }
}

fn bitmap_bytes(field_count: usize) -> usize {
    (field_count + 7) / 8
}

/// Encode fields into a record payload.
pub fn encode(fields: &[Field]) -> Result<Vec<u8>> {
    let count = fields.len();
    if count > u16::MAX as usize {
        return Err(Error::InvalidArgument(format!("too many fields: {count}")));
    }

    let bitmap_len = bitmap_bytes(count);
    let mut bitmap = vec![0u8; bitmap_len];
    for (i, field) in fields.iter().enumerate() {
        if field.is_null {
            if !field.payload.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "null field {i} carries a payload"
                )));
            }
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }

    let mut out = Vec::with_capacity(4 + bitmap_len + count * 4);
    out.extend_from_slice(&(count as u16).to_le_bytes());
    out.extend_from_slice(&(bitmap_len as u16).to_le_bytes());
    out.extend_from_slice(&bitmap);

    for (i, field) in fields.iter().enumerate() {
        out.push(field.data_type as u8);

        let len = if field.is_null {
            0
        } else {
            if field.payload.len() > u16::MAX as usize {
                return Err(Error::RecordTooLarge(field.payload.len()));
            }
            let expected = field.data_type.fixed_size();
            if expected > 0 && field.payload.len() != expected {
                return Err(Error::InvalidArgument(format!(
                    "field {i}: fixed-width {} expects {expected} bytes, got {}",
                    field.data_type,
                    field.payload.len()
                )));
            }
            field.payload.len() as u16
        };

        out.extend_from_slice(&len.to_le_bytes());
        if len > 0 {
            out.extend_from_slice(&field.payload);
        }
        if out.len() > MAX_RECORD_SIZE {
            return Err(Error::RecordTooLarge(out.len()));
        }
    }

    Ok(out)
}

/// Decode a record payload. Returns `None` on any structural
/// inconsistency (truncation, trailing bytes, null with payload).
pub fn decode(data: &[u8]) -> Option<Vec<Field>> {
    let mut pos = 0usize;

    let count = read_u16(data, &mut pos)? as usize;
    let bitmap_len = read_u16(data, &mut pos)? as usize;
    if bitmap_len < bitmap_bytes(count) || pos + bitmap_len > data.len() {
        return None;
    }
    let bitmap = &data[pos..pos + bitmap_len];
    pos += bitmap_len;

    let mut fields = Vec::with_capacity(count);
    for i in 0..count {
        if pos >= data.len() {
            return None;
        }
        let data_type = DataType::from_u8(data[pos])?;
        pos += 1;

        let len = read_u16(data, &mut pos)? as usize;
        if pos + len > data.len() {
            return None;
        }

        let is_null = (bitmap[i / 8] >> (i % 8)) & 1 != 0;
        if is_null && len != 0 {
            return None;
        }

        fields.push(Field {
            data_type,
            is_null,
            payload: data[pos..pos + len].to_vec(),
        });
        pos += len;
    }

    if pos != data.len() {
        return None;
    }
    Some(fields)
}

fn read_u16(data: &[u8], pos: &mut usize) -> Option<u16> {
    if *pos + 2 > data.len() {
        return None;
    }
    let v = u16::from_le_bytes([data[*pos], data[*pos + 1]]);
    *pos += 2;
    Some(v)
}
