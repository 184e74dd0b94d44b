//! # Parser Module
//!
//! Parsers sit between the opaque [`crate::codec::DataCodec`] and handler code.
//! The codec knows how to turn bytes into a value of a declared type; a parser
//! knows the *shape* of a handler parameter (scalar or list, text fast path,
//! application-specific layouts) and applies the absent-payload policy:
//!
//! - an absent list payload is an empty list, never `null`
//! - an absent scalar payload is built by the registered default-value supplier,
//!   or else decoded as the codec's zero value
//!
//! ## Resolution
//!
//! [`MethodParsers::resolve`] binds a [`ParamShape`] to its parser once, when an
//! action is registered. The resulting [`ParamParser`] is stored on the action
//! and used as-is for every request; nothing is looked up per call.
//!
//! ```rust
//! use cmdrouter::codec::ValueType;
//! use cmdrouter::parser::{MethodParsers, ParamShape};
//! use serde_json::json;
//!
//! let parsers = MethodParsers::default();
//! let ids = parsers.resolve(ParamShape::list(ValueType::long()));
//! assert_eq!(ids.parse_param(None, &parsers.context()).unwrap(), json!([]));
//! ```

mod core;
mod default;
mod registry;
mod string;

pub use core::{
    DefaultValueSupplier, DefaultValues, MethodParser, ParamParser, ParamShape, ParseContext,
};
pub use default::DefaultMethodParser;
pub use registry::MethodParsers;
pub use string::StringValueMethodParser;
