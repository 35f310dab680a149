//! Generic encoder/decoder
//!
//! Drives [`BinaryProtocol`] from a [`StructDescriptor`] without any
//! shape-specific code. Field lookup happens per call through [`Reflect`].

use bytes::{Buf, BufMut};

use super::descriptor::type_mismatch;
use super::{
    ElementType, FieldDescriptor, FieldRef, FieldType, FieldValue, Reflect, StructDescriptor,
};
use crate::protocol::{BinaryProtocol, ProtocolError, ProtocolResult, WireType};

/// Encode `value` field by field in descriptor order, then the stop marker
///
/// Optional fields with no data are omitted; required fields with no data
/// fail with [`ProtocolError::MissingRequiredField`].
pub fn encode_generic<T, B>(
    protocol: &BinaryProtocol,
    value: &T,
    descriptor: &StructDescriptor,
    buf: &mut B,
) -> ProtocolResult<()>
where
    T: Reflect + ?Sized,
    B: BufMut,
{
    protocol.write_struct_begin(buf)?;

    for field in descriptor.fields() {
        let Some(data) = value.get_field(field.id) else {
            if field.required {
                return Err(missing(field));
            }
            continue;
        };

        let actual = data.field_type();
        if actual != field.ty {
            return Err(type_mismatch(field, actual));
        }

        protocol.write_field_begin(buf, field.id, field.ty.wire_type())?;
        write_value(protocol, buf, data)?;
        protocol.write_field_end(buf)?;
    }

    protocol.write_field_stop(buf)?;
    protocol.write_struct_end(buf)
}

/// Decode a fresh `T` from the source
pub fn decode_generic<T, B>(
    protocol: &BinaryProtocol,
    descriptor: &StructDescriptor,
    buf: &mut B,
) -> ProtocolResult<T>
where
    T: Reflect + Default,
    B: Buf,
{
    let mut value = T::default();
    decode_generic_into(protocol, descriptor, buf, &mut value)?;
    Ok(value)
}

/// Decode into an existing instance
///
/// Fields absent from the stream keep their current values. Unknown field
/// ids are skipped. On error the instance may be partially updated.
pub fn decode_generic_into<T, B>(
    protocol: &BinaryProtocol,
    descriptor: &StructDescriptor,
    buf: &mut B,
    value: &mut T,
) -> ProtocolResult<()>
where
    T: Reflect + ?Sized,
    B: Buf,
{
    let fields = descriptor.fields();
    let mut seen = SeenFields::new(fields.len());

    protocol.read_struct_begin(buf)?;
    loop {
        let (wire_type, field_id) = protocol.read_field_begin(buf)?;
        if wire_type == WireType::Stop {
            break;
        }

        match descriptor.position(field_id) {
            Some(index) => {
                let field = &fields[index];
                if wire_type != field.ty.wire_type() {
                    return Err(ProtocolError::FieldTypeMismatch {
                        field_id,
                        expected: field.ty.wire_type(),
                        actual: wire_type,
                    });
                }
                let data = read_value(protocol, buf, field)?;
                value.set_field(field_id, data)?;
                seen.insert(index);
            }
            None => {
                tracing::trace!(
                    field_id,
                    %wire_type,
                    shape = descriptor.name(),
                    "skipping unknown field"
                );
                protocol.skip(buf, wire_type)?;
            }
        }

        protocol.read_field_end(buf)?;
    }
    protocol.read_struct_end(buf)?;

    match fields
        .iter()
        .enumerate()
        .find(|(index, field)| field.required && !seen.contains(*index))
    {
        Some((_, field)) => Err(missing(field)),
        None => Ok(()),
    }
}

/// Descriptor positions decoded so far
///
/// Shapes with up to 64 fields use an inline mask; larger ones spill to the heap.
enum SeenFields {
    Mask(u64),
    Spill(Vec<bool>),
}

impl SeenFields {
    fn new(len: usize) -> Self {
        if len <= 64 {
            SeenFields::Mask(0)
        } else {
            SeenFields::Spill(vec![false; len])
        }
    }

    fn insert(&mut self, index: usize) {
        match self {
            SeenFields::Mask(mask) => *mask |= 1u64 << index,
            SeenFields::Spill(flags) => flags[index] = true,
        }
    }

    fn contains(&self, index: usize) -> bool {
        match self {
            SeenFields::Mask(mask) => mask & (1u64 << index) != 0,
            SeenFields::Spill(flags) => flags[index],
        }
    }
}

fn missing(field: &FieldDescriptor) -> ProtocolError {
    ProtocolError::MissingRequiredField {
        field_id: field.id,
        name: field.name,
    }
}

fn write_value<B: BufMut>(
    protocol: &BinaryProtocol,
    buf: &mut B,
    data: FieldRef<'_>,
) -> ProtocolResult<()> {
    match data {
        FieldRef::String(s) => protocol.write_string(buf, s),
        FieldRef::I32(v) => protocol.write_i32(buf, v),
        FieldRef::StringList(items) => {
            protocol.write_list_begin(buf, WireType::String, items.len())?;
            for item in items {
                protocol.write_string(buf, item)?;
            }
            protocol.write_list_end(buf)
        }
        FieldRef::I32List(items) => {
            protocol.write_list_begin(buf, WireType::I32, items.len())?;
            for item in items {
                protocol.write_i32(buf, *item)?;
            }
            protocol.write_list_end(buf)
        }
    }
}

fn read_value<B: Buf>(
    protocol: &BinaryProtocol,
    buf: &mut B,
    field: &FieldDescriptor,
) -> ProtocolResult<FieldValue> {
    match field.ty {
        FieldType::String => Ok(FieldValue::String(protocol.read_string(buf)?)),
        FieldType::I32 => Ok(FieldValue::I32(protocol.read_i32(buf)?)),
        FieldType::List(element) => {
            let (element_type, count) = protocol.read_list_begin(buf)?;
            if element_type != element.wire_type() {
                return Err(ProtocolError::FieldTypeMismatch {
                    field_id: field.id,
                    expected: element.wire_type(),
                    actual: element_type,
                });
            }

            // Every element takes at least 4 bytes
            let capacity = count.min(buf.remaining() / 4);
            let value = match element {
                ElementType::String => {
                    let mut items = Vec::with_capacity(capacity);
                    for _ in 0..count {
                        items.push(protocol.read_string(buf)?);
                    }
                    FieldValue::StringList(items)
                }
                ElementType::I32 => {
                    let mut items = Vec::with_capacity(capacity);
                    for _ in 0..count {
                        items.push(protocol.read_i32(buf)?);
                    }
                    FieldValue::I32List(items)
                }
            };

            protocol.read_list_end(buf)?;
            Ok(value)
        }
    }
}
