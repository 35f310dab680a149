//! Sample struct shape
//!
//! The fixed shape both encoding paths are measured against:
//!
//! | id | field         | type           |          |
//! |----|---------------|----------------|----------|
//! | 1  | `string`      | string         | required |
//! | 2  | `int`         | i32            | required |
//! | 3  | `string_list` | list\<string\> | required |

mod explicit;

pub use explicit::*;

use serde::{Deserialize, Serialize};

use crate::protocol::{ProtocolError, ProtocolResult};
use crate::reflect::{
    ElementType, FieldDescriptor, FieldRef, FieldType, FieldValue, Reflect, StructDescriptor,
};

pub const STRING_FIELD_ID: i16 = 1;
pub const INT_FIELD_ID: i16 = 2;
pub const STRING_LIST_FIELD_ID: i16 = 3;

const SAMPLE_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor::required(STRING_FIELD_ID, "string", FieldType::String),
    FieldDescriptor::required(INT_FIELD_ID, "int", FieldType::I32),
    FieldDescriptor::required(
        STRING_LIST_FIELD_ID,
        "string_list",
        FieldType::List(ElementType::String),
    ),
];

/// Descriptor table for [`SampleStruct`]
pub static SAMPLE_DESCRIPTOR: StructDescriptor =
    StructDescriptor::from_static("SampleStruct", &SAMPLE_FIELDS);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleStruct {
    pub string: String,
    pub int: i32,
    pub string_list: Vec<String>,
}

impl SampleStruct {
    /// The value the benchmark encodes on every iteration
    pub fn benchmark_value() -> Self {
        Self {
            string: "string".to_string(),
            int: 123,
            string_list: vec!["foo".to_string(), "bar".to_string()],
        }
    }

    pub fn descriptor() -> &'static StructDescriptor {
        &SAMPLE_DESCRIPTOR
    }
}

impl Reflect for SampleStruct {
    fn get_field(&self, field_id: i16) -> Option<FieldRef<'_>> {
        match field_id {
            STRING_FIELD_ID => Some(FieldRef::String(&self.string)),
            INT_FIELD_ID => Some(FieldRef::I32(self.int)),
            STRING_LIST_FIELD_ID => Some(FieldRef::StringList(&self.string_list)),
            _ => None,
        }
    }

    fn set_field(&mut self, field_id: i16, value: FieldValue) -> ProtocolResult<()> {
        match (field_id, value) {
            (STRING_FIELD_ID, FieldValue::String(v)) => self.string = v,
            (INT_FIELD_ID, FieldValue::I32(v)) => self.int = v,
            (STRING_LIST_FIELD_ID, FieldValue::StringList(v)) => self.string_list = v,
            (field_id, value) => {
                return Err(ProtocolError::InvalidDescriptor(format!(
                    "SampleStruct has no {:?} field with id {field_id}",
                    value.field_type()
                )));
            }
        }
        Ok(())
    }
}
