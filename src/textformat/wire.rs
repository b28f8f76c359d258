//! Protobuf wire-format codec for dynamic messages.
//!
//! The textformat parser serializes `Any` literal bodies into the outer
//! message's `value` bytes; the analyzer decodes them back before walking
//! the inner message. Unknown field numbers and packed primitive runs are
//! tolerated on decode.

use thiserror::Error;

use crate::schema::{DescriptorPool, FieldId, FieldType, MessageId};

use super::message::{DynamicMessage, FieldValue, Value};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("truncated message")]
    Truncated,
    #[error("varint overflow")]
    VarintOverflow,
    #[error("unsupported wire type {0}")]
    BadWireType(u64),
    #[error("field '{0}': wire type does not match declared type")]
    TypeMismatch(String),
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    #[error("unmatched group end tag")]
    UnmatchedGroup,
}

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_GROUP_START: u64 = 3;
const WIRE_GROUP_END: u64 = 4;
const WIRE_FIXED32: u64 = 5;

/// Serialize a dynamic message, fields in insertion order.
pub fn encode(message: &DynamicMessage, pool: &DescriptorPool) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(message, pool, &mut out);
    out
}

fn encode_into(message: &DynamicMessage, pool: &DescriptorPool, out: &mut Vec<u8>) {
    for (field_id, field_value) in message.set_fields() {
        match field_value {
            FieldValue::Singular(value) => encode_value(field_id, value, pool, out),
            FieldValue::Repeated(values) => {
                for value in values {
                    encode_value(field_id, value, pool, out);
                }
            }
        }
    }
}

fn encode_value(field_id: FieldId, value: &Value, pool: &DescriptorPool, out: &mut Vec<u8>) {
    let field = pool.field(field_id);
    let number = field.number as u64;
    // The declared type decides the encoding; sint and (s)fixed fields
    // share Value variants with their plain counterparts.
    match (field.field_type, value) {
        (FieldType::SInt32, Value::Int32(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, zigzag32(*v));
        }
        (FieldType::SInt64, Value::Int64(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, zigzag64(*v));
        }
        (FieldType::Fixed32, Value::UInt32(v)) => {
            put_tag(out, number, WIRE_FIXED32);
            out.extend_from_slice(&v.to_le_bytes());
        }
        (FieldType::SFixed32, Value::Int32(v)) => {
            put_tag(out, number, WIRE_FIXED32);
            out.extend_from_slice(&v.to_le_bytes());
        }
        (FieldType::Fixed64, Value::UInt64(v)) => {
            put_tag(out, number, WIRE_FIXED64);
            out.extend_from_slice(&v.to_le_bytes());
        }
        (FieldType::SFixed64, Value::Int64(v)) => {
            put_tag(out, number, WIRE_FIXED64);
            out.extend_from_slice(&v.to_le_bytes());
        }
        (_, Value::Int32(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, *v as i64 as u64);
        }
        (_, Value::Int64(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, *v as u64);
        }
        (_, Value::UInt32(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, *v as u64);
        }
        (_, Value::UInt64(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, *v);
        }
        (_, Value::Bool(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, *v as u64);
        }
        (_, Value::Enum(v)) => {
            put_tag(out, number, WIRE_VARINT);
            put_varint(out, *v as i64 as u64);
        }
        (_, Value::Double(v)) => {
            put_tag(out, number, WIRE_FIXED64);
            out.extend_from_slice(&v.to_le_bytes());
        }
        (_, Value::Float(v)) => {
            put_tag(out, number, WIRE_FIXED32);
            out.extend_from_slice(&v.to_le_bytes());
        }
        (_, Value::String(v)) => {
            put_tag(out, number, WIRE_LEN);
            put_varint(out, v.len() as u64);
            out.extend_from_slice(v.as_bytes());
        }
        (_, Value::Bytes(v)) => {
            put_tag(out, number, WIRE_LEN);
            put_varint(out, v.len() as u64);
            out.extend_from_slice(v);
        }
        (_, Value::Message(inner)) => {
            let bytes = encode(inner, pool);
            put_tag(out, number, WIRE_LEN);
            put_varint(out, bytes.len() as u64);
            out.extend_from_slice(&bytes);
        }
    }
}

/// Deserialize `bytes` as an instance of `descriptor`.
pub fn decode(
    bytes: &[u8],
    descriptor: MessageId,
    pool: &DescriptorPool,
) -> Result<DynamicMessage, WireError> {
    let mut cursor = Cursor { bytes, pos: 0 };
    decode_message(&mut cursor, bytes.len(), descriptor, pool)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn done(&self, limit: usize) -> bool {
        self.pos >= limit
    }

    fn varint(&mut self) -> Result<u64, WireError> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let Some(&byte) = self.bytes.get(self.pos) else {
                return Err(WireError::Truncated);
            };
            self.pos += 1;
            if shift >= 64 {
                return Err(WireError::VarintOverflow);
            }
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(n).ok_or(WireError::Truncated)?;
        if end > self.bytes.len() {
            return Err(WireError::Truncated);
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn fixed32(&mut self) -> Result<[u8; 4], WireError> {
        let slice = self.take(4)?;
        Ok([slice[0], slice[1], slice[2], slice[3]])
    }

    fn fixed64(&mut self) -> Result<[u8; 8], WireError> {
        let slice = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(slice);
        Ok(buf)
    }
}

fn decode_message(
    cursor: &mut Cursor,
    limit: usize,
    descriptor: MessageId,
    pool: &DescriptorPool,
) -> Result<DynamicMessage, WireError> {
    let mut message = DynamicMessage::new(descriptor);
    while !cursor.done(limit) {
        let tag = cursor.varint()?;
        let number = (tag >> 3) as i32;
        let wire_type = tag & 7;
        let Some(field_id) = pool.field_by_number(descriptor, number) else {
            skip_value(cursor, wire_type)?;
            continue;
        };
        decode_field(cursor, field_id, wire_type, pool, &mut message)?;
    }
    Ok(message)
}

fn decode_field(
    cursor: &mut Cursor,
    field_id: FieldId,
    wire_type: u64,
    pool: &DescriptorPool,
    message: &mut DynamicMessage,
) -> Result<(), WireError> {
    let field = pool.field(field_id);
    let mismatch = || WireError::TypeMismatch(field.full_name.clone());

    // Packed runs: a length-delimited payload for a repeated numeric field.
    if wire_type == WIRE_LEN && field.is_repeated() && is_packable(field.field_type) {
        let len = cursor.varint()? as usize;
        let limit = cursor.pos.checked_add(len).ok_or(WireError::Truncated)?;
        if limit > cursor.bytes.len() {
            return Err(WireError::Truncated);
        }
        while !cursor.done(limit) {
            let value = decode_scalar(cursor, field.field_type, packed_wire_type(field.field_type))?;
            message.push(field_id, value);
        }
        return Ok(());
    }

    let value = match field.field_type {
        FieldType::String => {
            if wire_type != WIRE_LEN {
                return Err(mismatch());
            }
            let len = cursor.varint()? as usize;
            let bytes = cursor.take(len)?;
            let text = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)?;
            Value::String(text.to_string())
        }
        FieldType::Bytes => {
            if wire_type != WIRE_LEN {
                return Err(mismatch());
            }
            let len = cursor.varint()? as usize;
            Value::Bytes(cursor.take(len)?.to_vec())
        }
        FieldType::Message(inner) => {
            if wire_type != WIRE_LEN {
                return Err(mismatch());
            }
            let len = cursor.varint()? as usize;
            let limit = cursor.pos.checked_add(len).ok_or(WireError::Truncated)?;
            if limit > cursor.bytes.len() {
                return Err(WireError::Truncated);
            }
            let inner_message = decode_message(cursor, limit, inner, pool)?;
            if cursor.pos != limit {
                return Err(WireError::Truncated);
            }
            Value::Message(inner_message)
        }
        scalar => decode_scalar(cursor, scalar, wire_type)?,
    };

    if field.is_repeated() {
        message.push(field_id, value);
    } else {
        message.set(field_id, value);
    }
    Ok(())
}

fn decode_scalar(
    cursor: &mut Cursor,
    field_type: FieldType,
    wire_type: u64,
) -> Result<Value, WireError> {
    Ok(match (field_type, wire_type) {
        (FieldType::Int32, WIRE_VARINT) => Value::Int32(cursor.varint()? as i64 as i32),
        (FieldType::Int64, WIRE_VARINT) => Value::Int64(cursor.varint()? as i64),
        (FieldType::UInt32, WIRE_VARINT) => Value::UInt32(cursor.varint()? as u32),
        (FieldType::UInt64, WIRE_VARINT) => Value::UInt64(cursor.varint()?),
        (FieldType::SInt32, WIRE_VARINT) => Value::Int32(unzigzag(cursor.varint()?) as i32),
        (FieldType::SInt64, WIRE_VARINT) => Value::Int64(unzigzag(cursor.varint()?)),
        (FieldType::Bool, WIRE_VARINT) => Value::Bool(cursor.varint()? != 0),
        (FieldType::Enum(_), WIRE_VARINT) => Value::Enum(cursor.varint()? as i64 as i32),
        (FieldType::Fixed64, WIRE_FIXED64) => Value::UInt64(u64::from_le_bytes(cursor.fixed64()?)),
        (FieldType::SFixed64, WIRE_FIXED64) => Value::Int64(i64::from_le_bytes(cursor.fixed64()?)),
        (FieldType::Double, WIRE_FIXED64) => Value::Double(f64::from_le_bytes(cursor.fixed64()?)),
        (FieldType::Fixed32, WIRE_FIXED32) => Value::UInt32(u32::from_le_bytes(cursor.fixed32()?)),
        (FieldType::SFixed32, WIRE_FIXED32) => Value::Int32(i32::from_le_bytes(cursor.fixed32()?)),
        (FieldType::Float, WIRE_FIXED32) => Value::Float(f32::from_le_bytes(cursor.fixed32()?)),
        _ => return Err(WireError::BadWireType(wire_type)),
    })
}

fn skip_value(cursor: &mut Cursor, wire_type: u64) -> Result<(), WireError> {
    match wire_type {
        WIRE_VARINT => {
            cursor.varint()?;
        }
        WIRE_FIXED64 => {
            cursor.take(8)?;
        }
        WIRE_LEN => {
            let len = cursor.varint()? as usize;
            cursor.take(len)?;
        }
        WIRE_GROUP_START => loop {
            let tag = cursor.varint()?;
            let inner_type = tag & 7;
            if inner_type == WIRE_GROUP_END {
                break;
            }
            skip_value(cursor, inner_type)?;
        },
        WIRE_GROUP_END => return Err(WireError::UnmatchedGroup),
        WIRE_FIXED32 => {
            cursor.take(4)?;
        }
        other => return Err(WireError::BadWireType(other)),
    }
    Ok(())
}

fn is_packable(field_type: FieldType) -> bool {
    !matches!(
        field_type,
        FieldType::String | FieldType::Bytes | FieldType::Message(_)
    )
}

/// Wire type a packed element of this field type uses.
fn packed_wire_type(field_type: FieldType) -> u64 {
    match field_type {
        FieldType::Fixed64 | FieldType::SFixed64 | FieldType::Double => WIRE_FIXED64,
        FieldType::Fixed32 | FieldType::SFixed32 | FieldType::Float => WIRE_FIXED32,
        _ => WIRE_VARINT,
    }
}

fn put_tag(out: &mut Vec<u8>, number: u64, wire_type: u64) {
    put_varint(out, (number << 3) | wire_type);
}

fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn zigzag32(value: i32) -> u64 {
    (((value << 1) ^ (value >> 31)) as u32) as u64
}

fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DescriptorPool, SourceTree, SubstitutionCache};

    fn pool() -> DescriptorPool {
        let mut tree = SourceTree::new();
        tree.add_file(
            "w.proto",
            br#"
            package w;
            message Inner { optional int32 f = 1; }
            message M {
                optional int32 i = 1;
                optional sint32 s = 2;
                optional fixed32 fx = 3;
                optional string name = 4;
                repeated int64 xs = 5;
                optional Inner inner = 6;
                optional double d = 7;
            }
            "#
            .to_vec(),
        )
        .unwrap();
        let mut cache = SubstitutionCache::new();
        DescriptorPool::build(&tree, &["w.proto".to_string()], &[], &mut cache).unwrap()
    }

    #[test]
    fn test_round_trip_mixed_fields() {
        let pool = pool();
        let m = pool.find_message_by_name("w.M").unwrap();
        let inner_desc = pool.find_message_by_name("w.Inner").unwrap();

        let mut msg = DynamicMessage::new(m);
        msg.set(pool.field_by_name(m, "i").unwrap(), Value::Int32(-3));
        msg.set(pool.field_by_name(m, "s").unwrap(), Value::Int32(-7));
        msg.set(pool.field_by_name(m, "fx").unwrap(), Value::UInt32(99));
        msg.set(
            pool.field_by_name(m, "name").unwrap(),
            Value::String("héllo".to_string()),
        );
        let xs = pool.field_by_name(m, "xs").unwrap();
        msg.push(xs, Value::Int64(1));
        msg.push(xs, Value::Int64(-2));
        let mut inner = DynamicMessage::new(inner_desc);
        inner.set(pool.field_by_name(inner_desc, "f").unwrap(), Value::Int32(5));
        msg.set(pool.field_by_name(m, "inner").unwrap(), Value::Message(inner));
        msg.set(pool.field_by_name(m, "d").unwrap(), Value::Double(2.5));

        let bytes = encode(&msg, &pool);
        let decoded = decode(&bytes, m, &pool).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let pool = pool();
        let m = pool.find_message_by_name("w.M").unwrap();
        // Field number 15 (varint), then a known field.
        let mut bytes = vec![0x78, 0x2a];
        bytes.extend_from_slice(&[0x08, 0x07]);
        let decoded = decode(&bytes, m, &pool).unwrap();
        assert_eq!(
            decoded.get(pool.field_by_name(m, "i").unwrap()),
            Some(&Value::Int32(7))
        );
    }

    #[test]
    fn test_packed_repeated_decode() {
        let pool = pool();
        let m = pool.find_message_by_name("w.M").unwrap();
        // xs (field 5) as a packed run: tag 0x2a, len 2, varints 3 and 4.
        let bytes = vec![0x2a, 0x02, 0x03, 0x04];
        let decoded = decode(&bytes, m, &pool).unwrap();
        let xs = pool.field_by_name(m, "xs").unwrap();
        assert_eq!(decoded.field_size(xs), 2);
        assert_eq!(decoded.get_repeated(xs, 1), Some(&Value::Int64(4)));
    }

    #[test]
    fn test_truncated_input_errors() {
        let pool = pool();
        let m = pool.find_message_by_name("w.M").unwrap();
        // String field announces 5 bytes but provides 2.
        let bytes = vec![0x22, 0x05, b'a', b'b'];
        assert_eq!(decode(&bytes, m, &pool), Err(WireError::Truncated));
    }
}
