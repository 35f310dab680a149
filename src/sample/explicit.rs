//! Explicit protocol calls for [`SampleStruct`]
//!
//! Field order and types are fixed here rather than looked up, producing the
//! same bytes as the generic path.

use bytes::{Buf, BufMut};

use super::{SampleStruct, INT_FIELD_ID, STRING_FIELD_ID, STRING_LIST_FIELD_ID};
use crate::protocol::{BinaryProtocol, ProtocolError, ProtocolResult, WireType};

pub fn encode_explicit<B: BufMut>(
    protocol: &BinaryProtocol,
    value: &SampleStruct,
    buf: &mut B,
) -> ProtocolResult<()> {
    protocol.write_struct_begin(buf)?;

    protocol.write_field_begin(buf, STRING_FIELD_ID, WireType::String)?;
    protocol.write_string(buf, &value.string)?;
    protocol.write_field_end(buf)?;

    protocol.write_field_begin(buf, INT_FIELD_ID, WireType::I32)?;
    protocol.write_i32(buf, value.int)?;
    protocol.write_field_end(buf)?;

    protocol.write_field_begin(buf, STRING_LIST_FIELD_ID, WireType::List)?;
    protocol.write_list_begin(buf, WireType::String, value.string_list.len())?;
    for item in &value.string_list {
        protocol.write_string(buf, item)?;
    }
    protocol.write_list_end(buf)?;
    protocol.write_field_end(buf)?;

    protocol.write_field_stop(buf)?;
    protocol.write_struct_end(buf)
}

pub fn decode_explicit<B: Buf>(
    protocol: &BinaryProtocol,
    buf: &mut B,
) -> ProtocolResult<SampleStruct> {
    let mut value = SampleStruct::default();
    let (mut has_string, mut has_int, mut has_list) = (false, false, false);

    protocol.read_struct_begin(buf)?;
    loop {
        let (wire_type, field_id) = protocol.read_field_begin(buf)?;
        if wire_type == WireType::Stop {
            break;
        }

        match field_id {
            STRING_FIELD_ID => {
                expect_type(field_id, WireType::String, wire_type)?;
                value.string = protocol.read_string(buf)?;
                has_string = true;
            }
            INT_FIELD_ID => {
                expect_type(field_id, WireType::I32, wire_type)?;
                value.int = protocol.read_i32(buf)?;
                has_int = true;
            }
            STRING_LIST_FIELD_ID => {
                expect_type(field_id, WireType::List, wire_type)?;
                let (element_type, count) = protocol.read_list_begin(buf)?;
                expect_type(field_id, WireType::String, element_type)?;
                value.string_list.clear();
                value.string_list.reserve(count.min(buf.remaining() / 4));
                for _ in 0..count {
                    value.string_list.push(protocol.read_string(buf)?);
                }
                protocol.read_list_end(buf)?;
                has_list = true;
            }
            _ => protocol.skip(buf, wire_type)?,
        }

        protocol.read_field_end(buf)?;
    }
    protocol.read_struct_end(buf)?;

    if !has_string {
        return Err(ProtocolError::MissingRequiredField {
            field_id: STRING_FIELD_ID,
            name: "string",
        });
    }
    if !has_int {
        return Err(ProtocolError::MissingRequiredField {
            field_id: INT_FIELD_ID,
            name: "int",
        });
    }
    if !has_list {
        return Err(ProtocolError::MissingRequiredField {
            field_id: STRING_LIST_FIELD_ID,
            name: "string_list",
        });
    }

    Ok(value)
}

fn expect_type(field_id: i16, expected: WireType, actual: WireType) -> ProtocolResult<()> {
    if expected != actual {
        return Err(ProtocolError::FieldTypeMismatch {
            field_id,
            expected,
            actual,
        });
    }
    Ok(())
}
