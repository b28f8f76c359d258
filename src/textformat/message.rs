//! Dynamic messages: reflection-style values for any descriptor.
//!
//! Fields are stored in insertion order so that enumerating set fields
//! (which is how the analyzer discovers extensions) is deterministic.

use indexmap::IndexMap;

use crate::schema::{FieldId, MessageId};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Float(f32),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    /// Enum value by number; names resolve through the descriptor.
    Enum(i32),
    Message(DynamicMessage),
}

impl Value {
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Singular(Value),
    Repeated(Vec<Value>),
}

/// A message instance described entirely by its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: MessageId,
    fields: IndexMap<FieldId, FieldValue>,
}

impl DynamicMessage {
    pub fn new(descriptor: MessageId) -> Self {
        Self {
            descriptor,
            fields: IndexMap::new(),
        }
    }

    pub fn descriptor(&self) -> MessageId {
        self.descriptor
    }

    pub fn is_set(&self, field: FieldId) -> bool {
        self.fields.contains_key(&field)
    }

    /// Number of present values: 0 or 1 for singular fields, the element
    /// count for repeated ones.
    pub fn field_size(&self, field: FieldId) -> usize {
        match self.fields.get(&field) {
            None => 0,
            Some(FieldValue::Singular(_)) => 1,
            Some(FieldValue::Repeated(values)) => values.len(),
        }
    }

    /// Overwrite a singular field.
    pub fn set(&mut self, field: FieldId, value: Value) {
        self.fields.insert(field, FieldValue::Singular(value));
    }

    /// Append to a repeated field.
    pub fn push(&mut self, field: FieldId, value: Value) {
        match self.fields.entry(field).or_insert_with(|| FieldValue::Repeated(Vec::new())) {
            FieldValue::Repeated(values) => values.push(value),
            FieldValue::Singular(_) => {}
        }
    }

    pub fn get(&self, field: FieldId) -> Option<&Value> {
        match self.fields.get(&field)? {
            FieldValue::Singular(value) => Some(value),
            FieldValue::Repeated(_) => None,
        }
    }

    pub fn get_repeated(&self, field: FieldId, index: usize) -> Option<&Value> {
        match self.fields.get(&field)? {
            FieldValue::Repeated(values) => values.get(index),
            FieldValue::Singular(_) => None,
        }
    }

    /// Element access the way the analyzer walks: `None` index = singular.
    pub fn get_element(&self, field: FieldId, index: Option<usize>) -> Option<&Value> {
        match index {
            None => self.get(field),
            Some(i) => self.get_repeated(field, i),
        }
    }

    pub fn get_message(&self, field: FieldId) -> Option<&DynamicMessage> {
        self.get(field)?.as_message()
    }

    pub fn get_repeated_message(&self, field: FieldId, index: usize) -> Option<&DynamicMessage> {
        self.get_repeated(field, index)?.as_message()
    }

    pub fn get_str(&self, field: FieldId) -> Option<&str> {
        match self.get(field)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_bytes(&self, field: FieldId) -> Option<&[u8]> {
        match self.get(field)? {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Set fields in insertion order; this is the reflection walk the
    /// analyzer uses to find extensions.
    pub fn set_fields(&self) -> impl Iterator<Item = (FieldId, &FieldValue)> {
        self.fields.iter().map(|(&id, value)| (id, value))
    }
}
