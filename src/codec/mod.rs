//! # Codec Module
//!
//! The codec is the byte-level service the dispatch core relies on but does not
//! own. It is reached through the [`DataCodec`] trait so an embedding server can
//! plug in protobuf, JSON, or any other wire format.
//!
//! Values travel through the core as [`serde_json::Value`]. Typed handlers
//! convert from and to that representation with `serde`, so the codec never
//! needs to know about handler types; it only needs the declared [`ValueType`].
//!
//! [`JsonDataCodec`] is provided for tests and for servers that speak JSON.
//!
//! ## Wrappers
//!
//! List-shaped and text parameters use small wrapper messages on the wire:
//!
//! - [`ByteValueList`] - ordered list of individually encoded elements
//! - [`StringValue`] / [`StringValueList`] - text fast path

mod core;
mod wrapper;

pub use core::{DataCodec, JsonDataCodec, ValueKind, ValueType};
pub(crate) use wrapper::{decode_wrapper, to_value};
pub use wrapper::{ByteValueList, StringValue, StringValueList};
