//! Wire type tags
//!
//! One-byte codes written ahead of every field and list so the stream
//! describes its own types. Codes match the Thrift binary protocol.

use std::fmt;

/// Type code carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Field-list terminator, never a field's type
    Stop = 0x00,
    I32 = 0x08,
    String = 0x0B,
    /// Container prefix; the element type follows as another tag
    List = 0x0F,
}

impl WireType {
    /// Map a tag byte back to its type, `None` for codes this protocol does not define
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(WireType::Stop),
            0x08 => Some(WireType::I32),
            0x0B => Some(WireType::String),
            0x0F => Some(WireType::List),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Stop => "stop",
            WireType::I32 => "i32",
            WireType::String => "string",
            WireType::List => "list",
        };
        f.write_str(name)
    }
}
