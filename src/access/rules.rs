use crate::cmd::{check_cmd, CmdMerge};
use crate::error::ConfigError;
use std::collections::HashSet;

/// Ignore and reject lists consulted before the authentication predicate.
///
/// Rules can name a single route (`cmd`, `sub_cmd`) or a whole primary `cmd`.
/// Built with the by-value methods below and published through
/// [`super::AccessAuthentication`].
///
/// ```rust
/// use cmdrouter::access::AccessRules;
/// use cmdrouter::cmd::CmdMerge;
///
/// # fn main() -> Result<(), cmdrouter::error::ConfigError> {
/// let rules = AccessRules::new()
///     .ignore(1, 1)?          // login
///     .ignore_cmd(2)?         // every route of the lobby module
///     .reject_cmd(99)?;       // internal module, never reachable by players
///
/// assert!(rules.is_ignored(CmdMerge::merge(2, 17)?));
/// assert!(rules.is_rejected(CmdMerge::merge(99, 0)?));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRules {
    verify_identity: bool,
    ignore_cmd_merges: HashSet<CmdMerge>,
    ignore_cmds: HashSet<i32>,
    reject_cmd_merges: HashSet<CmdMerge>,
    reject_cmds: HashSet<i32>,
}

impl Default for AccessRules {
    fn default() -> Self {
        Self {
            verify_identity: true,
            ignore_cmd_merges: HashSet::new(),
            ignore_cmds: HashSet::new(),
            reject_cmd_merges: HashSet::new(),
            reject_cmds: HashSet::new(),
        }
    }
}

impl AccessRules {
    /// Empty rule set that requires a verified identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether routes outside the ignore list require a verified identity
    /// (only consulted by the default predicate).
    #[must_use]
    pub fn verify_identity(mut self, verify_identity: bool) -> Self {
        self.verify_identity = verify_identity;
        self
    }

    /// Let `(cmd, sub_cmd)` through without authentication.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CmdOutOfRange`] for an unmergeable route.
    pub fn ignore(self, cmd: i32, sub_cmd: i32) -> Result<Self, ConfigError> {
        Ok(self.ignore_cmd_merge(CmdMerge::merge(cmd, sub_cmd)?))
    }

    /// Let an already merged route through without authentication.
    #[must_use]
    pub fn ignore_cmd_merge(mut self, cmd_merge: CmdMerge) -> Self {
        self.ignore_cmd_merges.insert(cmd_merge);
        self
    }

    /// Let every route under primary `cmd` through without authentication.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CmdOutOfRange`] for an invalid primary cmd.
    pub fn ignore_cmd(mut self, cmd: i32) -> Result<Self, ConfigError> {
        self.ignore_cmds.insert(check_cmd(cmd)?);
        Ok(self)
    }

    /// Deny `(cmd, sub_cmd)` to every external caller.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CmdOutOfRange`] for an unmergeable route.
    pub fn reject(self, cmd: i32, sub_cmd: i32) -> Result<Self, ConfigError> {
        Ok(self.reject_cmd_merge(CmdMerge::merge(cmd, sub_cmd)?))
    }

    /// Deny an already merged route to every external caller.
    #[must_use]
    pub fn reject_cmd_merge(mut self, cmd_merge: CmdMerge) -> Self {
        self.reject_cmd_merges.insert(cmd_merge);
        self
    }

    /// Deny every route under primary `cmd` to every external caller.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CmdOutOfRange`] for an invalid primary cmd.
    pub fn reject_cmd(mut self, cmd: i32) -> Result<Self, ConfigError> {
        self.reject_cmds.insert(check_cmd(cmd)?);
        Ok(self)
    }

    /// Whether the default predicate demands a verified identity.
    #[must_use]
    pub fn requires_verified_identity(&self) -> bool {
        self.verify_identity
    }

    /// Whether `cmd_merge` bypasses authentication.
    #[must_use]
    pub fn is_ignored(&self, cmd_merge: CmdMerge) -> bool {
        self.ignore_cmd_merges.contains(&cmd_merge) || self.ignore_cmds.contains(&cmd_merge.cmd())
    }

    /// Whether `cmd_merge` is always denied.
    #[must_use]
    pub fn is_rejected(&self, cmd_merge: CmdMerge) -> bool {
        self.reject_cmd_merges.contains(&cmd_merge) || self.reject_cmds.contains(&cmd_merge.cmd())
    }
}
