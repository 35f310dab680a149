//! Message envelope
//!
//! A message header names a call and carries its kind and sequence id.
//! Strict writers prefix it with a version word; readers accept both forms
//! unless strict reading is enabled.

use bytes::{Buf, BufMut};

use super::codec::{checked_length, ensure};
use super::{BinaryProtocol, ProtocolError, ProtocolResult};

/// Version word carried in the high half of a strict header
pub const VERSION_1: u32 = 0x8001_0000;

/// Mask selecting the version bits of the leading header word
pub const VERSION_MASK: u32 = 0xffff_0000;

/// Kind of message carried by an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

impl MessageKind {
    pub fn from_u8(code: u8) -> ProtocolResult<Self> {
        match code {
            1 => Ok(MessageKind::Call),
            2 => Ok(MessageKind::Reply),
            3 => Ok(MessageKind::Exception),
            4 => Ok(MessageKind::Oneway),
            other => Err(ProtocolError::UnknownMessageKind(other)),
        }
    }
}

/// Envelope preceding a message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Method name
    pub name: String,
    pub kind: MessageKind,
    /// Sequence id echoed back in replies
    pub seq_id: i32,
}

impl MessageHeader {
    pub fn new(name: impl Into<String>, kind: MessageKind, seq_id: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            seq_id,
        }
    }
}

impl BinaryProtocol {
    pub fn write_message_begin<B: BufMut>(
        &self,
        buf: &mut B,
        header: &MessageHeader,
    ) -> ProtocolResult<()> {
        if self.config().strict_write {
            let word = VERSION_1 | u32::from(header.kind as u8);
            buf.put_u32(word);
            self.write_string(buf, &header.name)?;
        } else {
            self.write_string(buf, &header.name)?;
            buf.put_u8(header.kind as u8);
        }
        self.write_i32(buf, header.seq_id)
    }

    pub fn write_message_end<B: BufMut>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }

    pub fn read_message_begin<B: Buf>(&self, buf: &mut B) -> ProtocolResult<MessageHeader> {
        ensure(buf, 4)?;
        let word = buf.get_i32();

        let (name, kind) = if word < 0 {
            let word = word as u32;
            let version = word & VERSION_MASK;
            if version != VERSION_1 {
                return Err(ProtocolError::BadVersion(version));
            }
            let kind = MessageKind::from_u8((word & 0xff) as u8)?;
            (self.read_string(buf)?, kind)
        } else {
            if self.config().strict_read {
                return Err(ProtocolError::BadVersion(word as u32));
            }
            // Unversioned header: the leading word is the name length
            let len = checked_length(word, self.config().max_string_len)?;
            ensure(buf, len)?;
            let mut bytes = vec![0u8; len];
            buf.copy_to_slice(&mut bytes);
            let name = String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
            ensure(buf, 1)?;
            (name, MessageKind::from_u8(buf.get_u8())?)
        };

        let seq_id = self.read_i32(buf)?;
        Ok(MessageHeader { name, kind, seq_id })
    }

    pub fn read_message_end<B: Buf>(&self, _buf: &mut B) -> ProtocolResult<()> {
        Ok(())
    }
}
