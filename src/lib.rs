//! structwire - compact binary struct serialization
//!
//! Two ways to put a struct on the wire, producing identical bytes:
//!
//! - [`reflect`]: generic encoding driven by a [`StructDescriptor`] table and
//!   field access by id through the [`Reflect`] trait
//! - [`sample`]: hand-sequenced protocol calls for one known shape
//!
//! Both sit on the Thrift-compatible [`BinaryProtocol`] in [`protocol`].
//!
//! ```
//! use bytes::BytesMut;
//! use structwire::protocol::BinaryProtocol;
//! use structwire::reflect::{decode_generic, encode_generic};
//! use structwire::sample::{encode_explicit, SampleStruct};
//!
//! let protocol = BinaryProtocol::default();
//! let value = SampleStruct::benchmark_value();
//!
//! let mut generic = BytesMut::new();
//! encode_generic(&protocol, &value, SampleStruct::descriptor(), &mut generic).unwrap();
//! let mut explicit = BytesMut::new();
//! encode_explicit(&protocol, &value, &mut explicit).unwrap();
//! assert_eq!(generic, explicit);
//!
//! let mut src = &generic[..];
//! let decoded: SampleStruct =
//!     decode_generic(&protocol, SampleStruct::descriptor(), &mut src).unwrap();
//! assert_eq!(decoded, value);
//! ```

pub mod config;
pub mod protocol;
pub mod reflect;
pub mod sample;

pub use protocol::{BinaryProtocol, ProtocolConfig, ProtocolError, ProtocolResult, WireType};
pub use reflect::{FieldDescriptor, Reflect, StructDescriptor};
