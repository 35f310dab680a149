//! Field descriptors and field values
//!
//! Static metadata describing a struct shape, plus the owned and borrowed
//! value forms passed through [`Reflect`](super::Reflect).

use std::borrow::Cow;

use crate::protocol::{ProtocolError, ProtocolResult, WireType};

/// Element type of a homogeneous list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    String,
    I32,
}

impl ElementType {
    pub fn wire_type(self) -> WireType {
        match self {
            ElementType::String => WireType::String,
            ElementType::I32 => WireType::I32,
        }
    }
}

/// Declared type of a struct field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    I32,
    List(ElementType),
}

impl FieldType {
    /// Tag written in the field header
    pub fn wire_type(self) -> WireType {
        match self {
            FieldType::String => WireType::String,
            FieldType::I32 => WireType::I32,
            FieldType::List(_) => WireType::List,
        }
    }
}

/// Metadata for one struct field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Ordinal written on the wire, always positive
    pub id: i16,
    /// Name used in error messages
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

impl FieldDescriptor {
    pub const fn required(id: i16, name: &'static str, ty: FieldType) -> Self {
        Self {
            id,
            name,
            ty,
            required: true,
        }
    }

    pub const fn optional(id: i16, name: &'static str, ty: FieldType) -> Self {
        Self {
            id,
            name,
            ty,
            required: false,
        }
    }
}

/// Descriptor set for one struct shape
///
/// Fields are kept in strictly ascending id order, which is also the order
/// they are written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDescriptor {
    name: &'static str,
    fields: Cow<'static, [FieldDescriptor]>,
}

impl StructDescriptor {
    /// Build a descriptor from a static table
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `static` or `const`) if the ids
    /// are not positive and strictly ascending.
    pub const fn from_static(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        let mut i = 0;
        while i < fields.len() {
            assert!(fields[i].id > 0, "field ids must be positive");
            assert!(
                i == 0 || fields[i - 1].id < fields[i].id,
                "field ids must be strictly ascending"
            );
            i += 1;
        }
        Self {
            name,
            fields: Cow::Borrowed(fields),
        }
    }

    /// Build a descriptor at runtime, sorting fields by id
    pub fn new(name: &'static str, mut fields: Vec<FieldDescriptor>) -> ProtocolResult<Self> {
        fields.sort_by_key(|field| field.id);

        if let Some(field) = fields.iter().find(|field| field.id <= 0) {
            return Err(ProtocolError::InvalidDescriptor(format!(
                "{name}.{} has non-positive id {}",
                field.name, field.id
            )));
        }
        if let Some(pair) = fields.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(ProtocolError::InvalidDescriptor(format!(
                "{name}.{} and {name}.{} share id {}",
                pair[0].name, pair[1].name, pair[0].id
            )));
        }

        Ok(Self {
            name,
            fields: Cow::Owned(fields),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index of the field with the given id
    pub fn position(&self, field_id: i16) -> Option<usize> {
        self.fields
            .binary_search_by_key(&field_id, |field| field.id)
            .ok()
    }

    pub fn field(&self, field_id: i16) -> Option<&FieldDescriptor> {
        self.position(field_id).map(|index| &self.fields[index])
    }
}

/// Owned field value produced by decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    I32(i32),
    StringList(Vec<String>),
    I32List(Vec<i32>),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::I32(_) => FieldType::I32,
            FieldValue::StringList(_) => FieldType::List(ElementType::String),
            FieldValue::I32List(_) => FieldType::List(ElementType::I32),
        }
    }
}

/// Borrowed view of a field, handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    String(&'a str),
    I32(i32),
    StringList(&'a [String]),
    I32List(&'a [i32]),
}

impl FieldRef<'_> {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldRef::String(_) => FieldType::String,
            FieldRef::I32(_) => FieldType::I32,
            FieldRef::StringList(_) => FieldType::List(ElementType::String),
            FieldRef::I32List(_) => FieldType::List(ElementType::I32),
        }
    }
}

/// Error for a value whose type disagrees with its descriptor
pub(crate) fn type_mismatch(field: &FieldDescriptor, actual: FieldType) -> ProtocolError {
    let (expected, actual) = match (field.ty, actual) {
        (FieldType::List(expected), FieldType::List(actual)) => {
            (expected.wire_type(), actual.wire_type())
        }
        (expected, actual) => (expected.wire_type(), actual.wire_type()),
    };
    ProtocolError::FieldTypeMismatch {
        field_id: field.id,
        expected,
        actual,
    }
}
