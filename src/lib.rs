//! # cmdrouter
//!
//! **cmdrouter** is the request-dispatch core of a game-logic server. It takes
//! binary requests from a transport, checks access, pins each player's traffic
//! to one executor, converts payloads into handler parameters and results back
//! into payloads, and answers every request with either a result or a
//! structured error.
//!
//! ## Overview
//!
//! The transport hands over a [`dispatcher::RequestMessage`] carrying a route
//! (`cmd`, `sub_cmd` merged into a [`cmd::CmdMerge`]), the caller's
//! [`access::ActorSession`], an optional channel id and an optional payload.
//! The [`dispatcher::Dispatcher`] answers it through a callback.
//!
//! ## Architecture
//!
//! - **[`cmd`]** - Route identifier: `(cmd, sub_cmd)` merged into one key
//! - **[`codec`]** - Codec seam (`DataCodec`) and wire wrappers for lists and text
//! - **[`parser`]** - Parameter/result parsers, resolved once per action
//! - **[`access`]** - Reject list, ignore list and authentication predicate
//! - **[`affinity`]** - Power-of-two executor pool keyed by player
//! - **[`action`]** - Route table of actions with their resolved parsers
//! - **[`dispatcher`]** - Orchestrates the above per request
//! - **[`broker`]** - Handles to the cluster messaging layer for action code
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ```mermaid
//! flowchart LR
//!     T[Transport] -->|RequestMessage| D[Dispatcher]
//!     D --> A{AccessAuthentication}
//!     A -->|denied| T
//!     A -->|allowed| R[ActionRegistry]
//!     R -->|not found| T
//!     R -->|ActionCommand| AR[AffinityRouter]
//!     AR -->|key & N-1| E1[Executor 1]
//!     AR --> E2[Executor 2]
//!     AR --> EN[Executor N]
//!     E1 -->|parse param / invoke / parse result| T
//! ```
//!
//! ## Ordering
//!
//! Requests of one player (same `actor_id`) always run on the same executor,
//! in the order they were dispatched. Action code can keep per-player state
//! without locks as long as only that player's requests touch it.
//!
//! ## Configuration
//!
//! All configuration is programmatic: parsers and default values on
//! [`parser::MethodParsers`], routes on [`action::ActionRegistry`], access rules
//! on [`access::AccessRules`], pool sizing on [`affinity::AffinityConfig`].
//! `AffinityConfig::from_env` and `logging::LogConfig::from_env` read the
//! `CMDR_*` environment variables.
//!
//! ## Errors
//!
//! Registration problems are [`error::ConfigError`]s and should abort startup.
//! Per-request problems are [`error::DispatchError`]s delivered on the
//! response; executors never die from a failing or panicking action.

pub mod access;
pub mod action;
pub mod affinity;
pub mod broker;
pub mod cmd;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod parser;

pub use access::{AccessAuthentication, AccessRules, ActorSession};
pub use action::{action_fn, Action, ActionDescriptor, ActionError, ActionRegistry};
pub use affinity::{AffinityConfig, AffinityRouter, ExecutorMode};
pub use broker::{BrokerClient, BrokerHandle};
pub use cmd::CmdMerge;
pub use codec::{DataCodec, JsonDataCodec, ValueType};
pub use dispatcher::{Dispatcher, FlowContext, RequestMessage, ResponseMessage};
pub use error::{CodecError, ConfigError, DispatchError};
pub use ids::RequestId;
pub use parser::{MethodParser, MethodParsers, ParamShape};
