//! # Access Module
//!
//! Pre-dispatch access gate evaluated for every inbound request, before an
//! executor is selected.
//!
//! ## Evaluation order
//!
//! 1. Route on the reject list: denied, identity is not looked at
//! 2. Route on the ignore list: allowed, identity is not looked at
//! 3. Otherwise the authentication predicate decides
//!
//! The default predicate allows verified sessions, or everyone when
//! [`AccessRules::verify_identity`] is turned off. Servers with richer
//! session models supply their own with
//! [`AccessAuthentication::with_predicate`].
//!
//! ```rust
//! use cmdrouter::access::{AccessAuthentication, AccessRules, ActorSession};
//! use cmdrouter::cmd::CmdMerge;
//!
//! # fn main() -> Result<(), cmdrouter::error::ConfigError> {
//! let gate = AccessAuthentication::new(AccessRules::new().ignore(100, 1)?);
//! let login = CmdMerge::merge(100, 1)?;
//! assert!(gate.check(&ActorSession::anonymous(), login).is_allowed());
//! # Ok(())
//! # }
//! ```

mod gate;
mod rules;

pub use gate::{AccessAuthentication, AccessDecision, AccessPredicate, ActorSession};
pub use rules::AccessRules;
