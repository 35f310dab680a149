//! Binary protocol codec
//!
//! Primitive write/read operations over caller-owned byte buffers. Every
//! construct is a begin/end pair; the pairs that carry no information
//! (struct, field end, list end) emit zero bytes.

use bytes::{Buf, BufMut};
use thiserror::Error;

use super::{ProtocolConfig, WireType};

/// Nested lists deeper than this are rejected while skipping
const MAX_SKIP_DEPTH: usize = 64;

/// Codec errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEndOfData { needed: usize, remaining: usize },

    #[error("Malformed length prefix: {0}")]
    MalformedLength(i64),

    #[error("Field {field_id} has wire type {actual}, expected {expected}")]
    FieldTypeMismatch {
        field_id: i16,
        expected: WireType,
        actual: WireType,
    },

    #[error("Required field {field_id} ({name}) is missing")]
    MissingRequiredField { field_id: i16, name: &'static str },

    #[error("Unknown wire type: {0:#04x}")]
    UnknownWireType(u8),

    #[error("String is not valid UTF-8")]
    InvalidUtf8,

    #[error("Bad protocol version: {0:#010x}")]
    BadVersion(u32),

    #[error("Unknown message kind: {0}")]
    UnknownMessageKind(u8),

    #[error("Invalid struct descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Thrift-style binary protocol
///
/// Holds only its configuration; the sink or source is passed to every call
/// and never retained.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryProtocol {
    config: ProtocolConfig,
}

impl BinaryProtocol {
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Open a struct; writes nothing
    pub fn write_struct_begin<B: BufMut>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Close a struct; writes nothing, the field stop already ends it
    pub fn write_struct_end<B: BufMut>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Write a field header: type tag, then the 2-byte field id
    pub fn write_field_begin<B: BufMut>(
        &self,
        buf: &mut B,
        field_id: i16,
        wire_type: WireType,
    ) -> ProtocolResult<()> {
        buf.put_u8(wire_type.as_u8());
        buf.put_i16(field_id);
        Ok(())
    }

    /// Close a field; writes nothing
    pub fn write_field_end<B: BufMut>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Terminate the field list of the current struct
    pub fn write_field_stop<B: BufMut>(&self, buf: &mut B) -> ProtocolResult<()> {
        buf.put_u8(WireType::Stop.as_u8());
        Ok(())
    }

    /// Write a list header: element type tag, then the 4-byte count
    ///
    /// Counts above `max_list_len` are rejected, matching the read-side limit.
    pub fn write_list_begin<B: BufMut>(
        &self,
        buf: &mut B,
        element_type: WireType,
        count: usize,
    ) -> ProtocolResult<()> {
        let count = length_prefix(count, self.config.max_list_len)?;
        buf.put_u8(element_type.as_u8());
        buf.put_i32(count);
        Ok(())
    }

    /// Close a list; writes nothing
    pub fn write_list_end<B: BufMut>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Write a 4-byte length, then the UTF-8 bytes
    ///
    /// Strings longer than `max_string_len` bytes are rejected.
    pub fn write_string<B: BufMut>(&self, buf: &mut B, value: &str) -> ProtocolResult<()> {
        let len = length_prefix(value.len(), self.config.max_string_len)?;
        buf.put_i32(len);
        buf.put_slice(value.as_bytes());
        Ok(())
    }

    /// Write a big-endian two's-complement i32
    pub fn write_i32<B: BufMut>(&self, buf: &mut B, value: i32) -> ProtocolResult<()> {
        buf.put_i32(value);
        Ok(())
    }

    /// Open a struct on read; consumes nothing
    pub fn read_struct_begin<B: Buf>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Close a struct on read; consumes nothing
    pub fn read_struct_end<B: Buf>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Read a field header
    ///
    /// Returns `(WireType::Stop, 0)` at the end of the field list; the field
    /// id is not present on the wire in that case.
    pub fn read_field_begin<B: Buf>(&self, buf: &mut B) -> ProtocolResult<(WireType, i16)> {
        let wire_type = read_wire_type(buf)?;
        if wire_type == WireType::Stop {
            return Ok((WireType::Stop, 0));
        }
        ensure(buf, 2)?;
        Ok((wire_type, buf.get_i16()))
    }

    /// Close a field on read; consumes nothing
    pub fn read_field_end<B: Buf>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Read a list header, returning the element type and element count
    pub fn read_list_begin<B: Buf>(&self, buf: &mut B) -> ProtocolResult<(WireType, usize)> {
        let element_type = read_wire_type(buf)?;
        if element_type == WireType::Stop {
            return Err(ProtocolError::UnknownWireType(WireType::Stop.as_u8()));
        }
        ensure(buf, 4)?;
        let count = checked_length(buf.get_i32(), self.config.max_list_len)?;
        Ok((element_type, count))
    }

    /// Close a list on read; consumes nothing
    pub fn read_list_end<B: Buf>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string<B: Buf>(&self, buf: &mut B) -> ProtocolResult<String> {
        ensure(buf, 4)?;
        let len = checked_length(buf.get_i32(), self.config.max_string_len)?;
        ensure(buf, len)?;
        let mut bytes = vec![0u8; len];
        buf.copy_to_slice(&mut bytes);
        String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Read a big-endian two's-complement i32
    pub fn read_i32<B: Buf>(&self, buf: &mut B) -> ProtocolResult<i32> {
        ensure(buf, 4)?;
        Ok(buf.get_i32())
    }

    /// Consume and discard one value of the given type
    pub fn skip<B: Buf>(&self, buf: &mut B, wire_type: WireType) -> ProtocolResult<()> {
        self.skip_nested(buf, wire_type, 0)
    }

    fn skip_nested<B: Buf>(
        &self,
        buf: &mut B,
        wire_type: WireType,
        depth: usize,
    ) -> ProtocolResult<()> {
        match wire_type {
            WireType::Stop => Err(ProtocolError::UnknownWireType(WireType::Stop.as_u8())),
            WireType::I32 => {
                ensure(buf, 4)?;
                buf.advance(4);
                Ok(())
            }
            WireType::String => {
                ensure(buf, 4)?;
                let len = checked_length(buf.get_i32(), self.config.max_string_len)?;
                ensure(buf, len)?;
                buf.advance(len);
                Ok(())
            }
            WireType::List => {
                if depth >= MAX_SKIP_DEPTH {
                    return Err(ProtocolError::DepthLimitExceeded(MAX_SKIP_DEPTH));
                }
                let (element_type, count) = self.read_list_begin(buf)?;
                for _ in 0..count {
                    self.skip_nested(buf, element_type, depth + 1)?;
                }
                self.read_list_end(buf)
            }
        }
    }
}

/// Fail unless at least `needed` bytes remain in the source
pub(crate) fn ensure<B: Buf>(buf: &B, needed: usize) -> ProtocolResult<()> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(ProtocolError::UnexpectedEndOfData { needed, remaining });
    }
    Ok(())
}

fn read_wire_type<B: Buf>(buf: &mut B) -> ProtocolResult<WireType> {
    ensure(buf, 1)?;
    let code = buf.get_u8();
    WireType::from_u8(code).ok_or(ProtocolError::UnknownWireType(code))
}

/// Validate a length or count read off the wire
pub(crate) fn checked_length(raw: i32, limit: usize) -> ProtocolResult<usize> {
    match usize::try_from(raw) {
        Ok(len) if len <= limit => Ok(len),
        _ => Err(ProtocolError::MalformedLength(i64::from(raw))),
    }
}

/// Convert an in-memory length to its 4-byte wire prefix, applying the read limit
pub(crate) fn length_prefix(len: usize, limit: usize) -> ProtocolResult<i32> {
    match i32::try_from(len) {
        Ok(prefix) if len <= limit => Ok(prefix),
        _ => Err(ProtocolError::MalformedLength(
            i64::try_from(len).unwrap_or(i64::MAX),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn protocol() -> BinaryProtocol {
        BinaryProtocol::default()
    }

    #[test]
    fn test_field_header_layout() {
        let p = protocol();
        let mut buf = BytesMut::new();
        p.write_field_begin(&mut buf, 2, WireType::I32).unwrap();
        p.write_i32(&mut buf, -2).unwrap();
        p.write_field_end(&mut buf).unwrap();
        p.write_field_stop(&mut buf).unwrap();

        assert_eq!(&buf[..], &[0x08, 0x00, 0x02, 0xFF, 0xFF, 0xFF, 0xFE, 0x00]);
    }

    #[test]
    fn test_struct_markers_emit_nothing() {
        let p = protocol();
        let mut buf = BytesMut::new();
        p.write_struct_begin(&mut buf).unwrap();
        p.write_list_end(&mut buf).unwrap();
        p.write_struct_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_string_and_list_layout() {
        let p = protocol();
        let mut buf = BytesMut::new();
        p.write_list_begin(&mut buf, WireType::String, 1).unwrap();
        p.write_string(&mut buf, "foo").unwrap();

        assert_eq!(
            &buf[..],
            &[0x0B, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x03, b'f', b'o', b'o']
        );

        let mut src = &buf[..];
        assert_eq!(p.read_list_begin(&mut src).unwrap(), (WireType::String, 1));
        assert_eq!(p.read_string(&mut src).unwrap(), "foo");
        assert!(src.is_empty());
    }

    #[test]
    fn test_empty_string() {
        let p = protocol();
        let mut buf = BytesMut::new();
        p.write_string(&mut buf, "").unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 0]);

        let mut src = &buf[..];
        assert_eq!(p.read_string(&mut src).unwrap(), "");
    }

    #[test]
    fn test_read_field_stop() {
        let p = protocol();
        let mut src: &[u8] = &[0x00, 0xAA];
        assert_eq!(p.read_field_begin(&mut src).unwrap(), (WireType::Stop, 0));
        // The id is never read after a stop
        assert_eq!(src, &[0xAA]);
    }

    #[test]
    fn test_truncated_reads() {
        let p = protocol();

        let mut src: &[u8] = &[0x00, 0x00, 0x01];
        assert_eq!(
            p.read_i32(&mut src),
            Err(ProtocolError::UnexpectedEndOfData { needed: 4, remaining: 3 })
        );

        let mut src: &[u8] = &[0x00, 0x00, 0x00, 0x05, b'a', b'b'];
        assert_eq!(
            p.read_string(&mut src),
            Err(ProtocolError::UnexpectedEndOfData { needed: 5, remaining: 2 })
        );

        let mut src: &[u8] = &[0x0B, 0x00];
        assert!(matches!(
            p.read_field_begin(&mut src),
            Err(ProtocolError::UnexpectedEndOfData { .. })
        ));
    }

    #[test]
    fn test_negative_length() {
        let p = protocol();
        let mut src: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(p.read_string(&mut src), Err(ProtocolError::MalformedLength(-1)));

        let mut src: &[u8] = &[0x08, 0x80, 0x00, 0x00, 0x00];
        assert_eq!(
            p.read_list_begin(&mut src),
            Err(ProtocolError::MalformedLength(i64::from(i32::MIN)))
        );
    }

    #[test]
    fn test_length_over_limit() {
        let p = BinaryProtocol::new(ProtocolConfig {
            max_string_len: 4,
            ..Default::default()
        });
        let mut buf = BytesMut::new();
        protocol().write_string(&mut buf, "hello").unwrap();

        let mut src = &buf[..];
        assert_eq!(p.read_string(&mut src), Err(ProtocolError::MalformedLength(5)));
    }

    #[test]
    fn test_string_write_limit_matches_read_limit() {
        let p = BinaryProtocol::new(ProtocolConfig {
            max_string_len: 4,
            ..Default::default()
        });
        let mut buf = BytesMut::new();
        p.write_string(&mut buf, "four").unwrap();
        let mut src = &buf[..];
        assert_eq!(p.read_string(&mut src).unwrap(), "four");

        let mut buf = BytesMut::new();
        assert_eq!(p.write_string(&mut buf, "fives"), Err(ProtocolError::MalformedLength(5)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_list_count_over_limit() {
        let p = BinaryProtocol::new(ProtocolConfig {
            max_list_len: 2,
            ..Default::default()
        });

        let mut buf = BytesMut::new();
        p.write_list_begin(&mut buf, WireType::I32, 2).unwrap();
        let mut src = &buf[..];
        assert_eq!(p.read_list_begin(&mut src).unwrap(), (WireType::I32, 2));

        let mut buf = BytesMut::new();
        assert_eq!(
            p.write_list_begin(&mut buf, WireType::I32, 3),
            Err(ProtocolError::MalformedLength(3))
        );
        assert!(buf.is_empty());

        // A count written by a more permissive peer is still rejected on read
        let mut src: &[u8] = &[0x08, 0x00, 0x00, 0x00, 0x03];
        assert_eq!(p.read_list_begin(&mut src), Err(ProtocolError::MalformedLength(3)));
    }

    #[test]
    fn test_unknown_wire_type() {
        let p = protocol();
        let mut src: &[u8] = &[0x04, 0x00, 0x01];
        assert_eq!(p.read_field_begin(&mut src), Err(ProtocolError::UnknownWireType(0x04)));
    }

    #[test]
    fn test_invalid_utf8() {
        let p = protocol();
        let mut src: &[u8] = &[0x00, 0x00, 0x00, 0x02, 0xC3, 0x28];
        assert_eq!(p.read_string(&mut src), Err(ProtocolError::InvalidUtf8));
    }

    #[test]
    fn test_skip_nested_list() {
        let p = protocol();
        let mut buf = BytesMut::new();
        p.write_list_begin(&mut buf, WireType::List, 2).unwrap();
        p.write_list_begin(&mut buf, WireType::I32, 2).unwrap();
        p.write_i32(&mut buf, 1).unwrap();
        p.write_i32(&mut buf, 2).unwrap();
        p.write_list_begin(&mut buf, WireType::String, 1).unwrap();
        p.write_string(&mut buf, "x").unwrap();
        p.write_i32(&mut buf, 99).unwrap();

        let mut src = &buf[..];
        p.skip(&mut src, WireType::List).unwrap();
        assert_eq!(p.read_i32(&mut src).unwrap(), 99);
    }

    #[test]
    fn test_skip_depth_limit() {
        let p = protocol();
        let mut buf = BytesMut::new();
        for _ in 0..=MAX_SKIP_DEPTH {
            p.write_list_begin(&mut buf, WireType::List, 1).unwrap();
        }

        let mut src = &buf[..];
        assert_eq!(
            p.skip(&mut src, WireType::List),
            Err(ProtocolError::DepthLimitExceeded(MAX_SKIP_DEPTH))
        );
    }
}
