//! Error types shared by the dispatch core.
//!
//! Two families exist and they never mix:
//!
//! - [`ConfigError`] is raised while the process is being assembled (route
//!   merging, parser registration, action registration, executor startup).
//!   Callers are expected to abort startup on it.
//! - [`DispatchError`] is produced per request and always travels back to the
//!   transport inside a [`crate::dispatcher::ResponseMessage`]. It never takes
//!   an executor down.

use crate::cmd::CmdMerge;
use std::fmt;

/// Code reported for handler failures that carry no business code.
pub const HANDLER_ERROR_CODE: i32 = -1000;
/// Code reported when a payload cannot be decoded into the declared shape.
pub const DECODE_ERROR_CODE: i32 = -1001;
/// Code reported when no action is registered for a route.
pub const ROUTE_NOT_FOUND_CODE: i32 = -1002;
/// Code reported when the access gate denies a request.
pub const AUTHORIZATION_DENIED_CODE: i32 = -1003;
/// Code reported when the selected executor no longer accepts work.
pub const EXECUTOR_UNAVAILABLE_CODE: i32 = -1004;
/// Code reported when a handler result cannot be encoded.
pub const ENCODE_ERROR_CODE: i32 = -1005;

/// Whether `code` cannot be used as a business code.
///
/// `0` means success and `-1005..=-1000` are the dispatcher's own codes.
#[must_use]
pub const fn is_reserved_code(code: i32) -> bool {
    code == 0 || (code >= ENCODE_ERROR_CODE && code <= HANDLER_ERROR_CODE)
}

/// Startup / registration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `cmd` or `sub_cmd` does not fit its reserved bit width
    CmdOutOfRange {
        /// Primary cmd as given
        cmd: i32,
        /// Secondary cmd as given
        sub_cmd: i32,
    },
    /// Two actions were registered for the same route
    DuplicateRoute {
        /// The contested route
        cmd_merge: CmdMerge,
    },
    /// Two custom parsers were registered for the same declared type
    DuplicateParser {
        /// Declared type name
        type_name: String,
    },
    /// An executor could not be started
    ExecutorSpawn {
        /// Zero-based executor index
        index: usize,
        /// Underlying spawn failure
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::CmdOutOfRange { cmd, sub_cmd } => write!(
                f,
                "route ({cmd}, {sub_cmd}) is out of range: cmd must be within 0..={} and sub_cmd within 0..={}",
                crate::cmd::MAX_CMD,
                crate::cmd::MAX_SUB_CMD
            ),
            ConfigError::DuplicateRoute { cmd_merge } => {
                write!(f, "an action is already registered for route {cmd_merge}")
            }
            ConfigError::DuplicateParser { type_name } => {
                write!(f, "a custom parser is already registered for type '{type_name}'")
            }
            ConfigError::ExecutorSpawn { index, message } => {
                write!(f, "failed to start executor {index}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure raised by a [`crate::codec::DataCodec`] or a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    message: String,
}

impl CodecError {
    /// Create a codec error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CodecError {}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Per-request failure returned to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No action is registered for the route
    RouteNotFound {
        /// Requested route
        cmd_merge: CmdMerge,
    },
    /// The access gate refused the request
    AuthorizationDenied {
        /// Requested route
        cmd_merge: CmdMerge,
        /// `true` when the route is on the reject list, `false` when the
        /// authentication predicate failed
        rejected: bool,
    },
    /// The payload could not be decoded into the declared parameter shape
    Decode {
        /// Requested route
        cmd_merge: CmdMerge,
        /// Decoder message
        message: String,
    },
    /// The handler result could not be encoded
    Encode {
        /// Requested route
        cmd_merge: CmdMerge,
        /// Encoder message
        message: String,
    },
    /// The handler returned an error or panicked
    Handler {
        /// Requested route
        cmd_merge: CmdMerge,
        /// Business code, or [`HANDLER_ERROR_CODE`]
        code: i32,
        /// Error message
        message: String,
    },
    /// The selected executor has shut down
    ExecutorUnavailable {
        /// Requested route
        cmd_merge: CmdMerge,
        /// Executor index
        executor: usize,
    },
}

impl DispatchError {
    /// Numeric code reported to the caller.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::RouteNotFound { .. } => ROUTE_NOT_FOUND_CODE,
            DispatchError::AuthorizationDenied { .. } => AUTHORIZATION_DENIED_CODE,
            DispatchError::Decode { .. } => DECODE_ERROR_CODE,
            DispatchError::Encode { .. } => ENCODE_ERROR_CODE,
            DispatchError::Handler { code, .. } if !is_reserved_code(*code) => *code,
            DispatchError::Handler { .. } => HANDLER_ERROR_CODE,
            DispatchError::ExecutorUnavailable { .. } => EXECUTOR_UNAVAILABLE_CODE,
        }
    }

    /// Route the failure belongs to.
    #[must_use]
    pub fn cmd_merge(&self) -> CmdMerge {
        match self {
            DispatchError::RouteNotFound { cmd_merge }
            | DispatchError::AuthorizationDenied { cmd_merge, .. }
            | DispatchError::Decode { cmd_merge, .. }
            | DispatchError::Encode { cmd_merge, .. }
            | DispatchError::Handler { cmd_merge, .. }
            | DispatchError::ExecutorUnavailable { cmd_merge, .. } => *cmd_merge,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::RouteNotFound { cmd_merge } => {
                write!(f, "no action registered for route {cmd_merge}")
            }
            DispatchError::AuthorizationDenied {
                cmd_merge,
                rejected: true,
            } => write!(f, "route {cmd_merge} cannot be accessed externally"),
            DispatchError::AuthorizationDenied {
                cmd_merge,
                rejected: false,
            } => write!(f, "route {cmd_merge} requires a verified identity"),
            DispatchError::Decode { cmd_merge, message } => {
                write!(f, "failed to decode parameter for route {cmd_merge}: {message}")
            }
            DispatchError::Encode { cmd_merge, message } => {
                write!(f, "failed to encode result for route {cmd_merge}: {message}")
            }
            DispatchError::Handler {
                cmd_merge,
                code,
                message,
            } => write!(f, "action {cmd_merge} failed with code {code}: {message}"),
            DispatchError::ExecutorUnavailable {
                cmd_merge,
                executor,
            } => write!(
                f,
                "executor {executor} is not accepting work for route {cmd_merge}"
            ),
        }
    }
}

impl std::error::Error for DispatchError {}
