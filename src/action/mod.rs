//! # Action Module
//!
//! The route table consulted by the dispatcher. Each route maps a
//! [`crate::cmd::CmdMerge`] to an [`ActionCommand`]: the action entry point plus
//! the parameter and result parsers resolved when it was registered.
//!
//! Actions come in two forms:
//!
//! - [`ActionMethod`]: untyped, works on parser output (`serde_json::Value`)
//! - [`Action`]: typed via serde, adapted with [`TypedAction`] or built from a
//!   closure with [`action_fn`]
//!
//! ```rust
//! use cmdrouter::action::{action_fn, ActionDescriptor, ActionRegistry};
//! use cmdrouter::codec::ValueType;
//! use cmdrouter::parser::{MethodParsers, ParamShape};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), cmdrouter::error::ConfigError> {
//! let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
//! registry.register_action(
//!     1,
//!     1,
//!     ActionDescriptor::new("sum")
//!         .with_param(ParamShape::list(ValueType::long()))
//!         .with_result(ParamShape::scalar(ValueType::long())),
//!     action_fn(|_flow, values: Vec<i64>| Ok(values.iter().sum::<i64>())),
//! )?;
//! assert_eq!(registry.len(), 1);
//! # Ok(())
//! # }
//! ```

mod core;
mod registry;

pub use core::{action_fn, Action, ActionError, ActionMethod, FnAction, TypedAction};
pub use registry::{ActionCommand, ActionDescriptor, ActionRegistry};
