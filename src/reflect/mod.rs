//! Descriptor-driven struct encoding
//!
//! A struct shape opts in by implementing [`Reflect`] and publishing a
//! [`StructDescriptor`]. The generic encoder then walks the descriptor table
//! on every call, asking the value for each field by id.

mod descriptor;
mod generic;

pub use descriptor::*;
pub use generic::*;

use crate::protocol::ProtocolResult;

/// Field access by id
///
/// Implemented once per struct shape; the descriptor table is static data
/// kept alongside the implementation.
pub trait Reflect {
    /// Borrow the field with the given id, `None` if the value has no data for it
    fn get_field(&self, field_id: i16) -> Option<FieldRef<'_>>;

    /// Store a decoded value into the field with the given id
    fn set_field(&mut self, field_id: i16, value: FieldValue) -> ProtocolResult<()>;
}
