//! # Dispatcher Module
//!
//! The dispatcher turns one inbound [`RequestMessage`] into exactly one
//! [`ResponseMessage`]. It is the only component that talks to the access
//! gate, the route table and the affinity executors.
//!
//! ## Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant A as AccessAuthentication
//!     participant R as ActionRegistry
//!     participant E as Executor (key & N-1)
//!
//!     T->>D: dispatch(request, reply)
//!     D->>A: check(session, cmd_merge)
//!     alt rejected or unverified
//!         D-->>T: AuthorizationDenied
//!     end
//!     D->>R: get(cmd_merge)
//!     alt no action
//!         D-->>T: RouteNotFound
//!     end
//!     D->>E: queue job
//!     E->>E: parse param, invoke, parse result, encode
//!     E-->>T: reply(response)
//! ```
//!
//! ## Error Handling
//!
//! Every per-request failure becomes a [`crate::error::DispatchError`] on the
//! response. Action panics are caught on the executor, reported with
//! [`crate::error::HANDLER_ERROR_CODE`], and the executor carries on with the
//! next request for the same player.
//!
//! ## Example
//!
//! ```rust
//! use cmdrouter::access::{AccessAuthentication, AccessRules, ActorSession};
//! use cmdrouter::action::{action_fn, ActionDescriptor, ActionRegistry};
//! use cmdrouter::affinity::AffinityConfig;
//! use cmdrouter::codec::ValueType;
//! use cmdrouter::dispatcher::{Dispatcher, RequestMessage};
//! use cmdrouter::parser::{MethodParsers, ParamShape};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), cmdrouter::error::ConfigError> {
//! let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
//! let hello = registry.register_action(
//!     1,
//!     1,
//!     ActionDescriptor::new("hello")
//!         .with_param(ParamShape::scalar(ValueType::string()))
//!         .with_result(ParamShape::scalar(ValueType::string())),
//!     action_fn(|_flow, name: String| Ok(format!("hello {name}"))),
//! )?;
//!
//! let access = AccessAuthentication::new(AccessRules::new().ignore(1, 1)?);
//! let dispatcher = Dispatcher::new(
//!     Arc::new(registry),
//!     Arc::new(access),
//!     AffinityConfig::default(),
//!     None,
//! )?;
//!
//! let request = RequestMessage::new(hello)
//!     .with_session(ActorSession::anonymous())
//!     .with_data(br#"{"value":"ann"}"#.to_vec());
//! let response = dispatcher.call(request);
//! assert_eq!(response.data(), Some(&br#"{"value":"hello ann"}"#[..]));
//! # Ok(())
//! # }
//! ```

mod core;
mod flow;
mod message;

pub use core::{DispatchJob, Dispatcher, ReplyFn};
pub use flow::FlowContext;
pub use message::{RequestMessage, ResponseMessage};
