//! Protocol module - Thrift-compatible binary wire format
//!
//! All multi-byte integers are big-endian:
//! - Field header: 1 byte type tag, 2 bytes field id
//! - Field stop: 1 byte (`0x00`)
//! - String: 4 bytes length, then raw UTF-8 bytes
//! - I32: 4 bytes two's-complement
//! - List header: 1 byte element type tag, 4 bytes count
//!
//! Struct begin/end, field end and list end are implicit (zero bytes).

mod codec;
mod message;
mod wire;

pub use codec::*;
pub use message::*;
pub use wire::*;

use serde::{Deserialize, Serialize};

/// Default ceiling for a string length prefix (16 MiB)
pub const DEFAULT_MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Default ceiling for a list element count
pub const DEFAULT_MAX_LIST_LEN: usize = 1024 * 1024;

/// Codec configuration, fixed when a [`BinaryProtocol`] is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Write versioned message headers
    #[serde(default = "default_true")]
    pub strict_write: bool,
    /// Reject message headers that carry no version
    #[serde(default)]
    pub strict_read: bool,
    /// Longest string accepted on read
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,
    /// Largest list accepted on read
    #[serde(default = "default_max_list_len")]
    pub max_list_len: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_string_len() -> usize {
    DEFAULT_MAX_STRING_LEN
}

fn default_max_list_len() -> usize {
    DEFAULT_MAX_LIST_LEN
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            strict_write: default_true(),
            strict_read: false,
            max_string_len: default_max_string_len(),
            max_list_len: default_max_list_len(),
        }
    }
}

impl ProtocolConfig {
    pub fn new(strict_write: bool, strict_read: bool) -> Self {
        Self {
            strict_write,
            strict_read,
            ..Default::default()
        }
    }
}
