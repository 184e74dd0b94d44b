//! # Cmd Module
//!
//! Every handler is addressed by a two-level route: a primary `cmd` (the module,
//! e.g. "hall" or "battle") and a secondary `sub_cmd` (the action inside it).
//! Lookup tables never key on the pair; they key on the merged [`CmdMerge`] so
//! each lookup hashes a single integer.
//!
//! ## Layout
//!
//! ```text
//!  31 30            16 15              0
//! +--+---------------+-----------------+
//! | 0|      cmd      |     sub_cmd     |
//! +--+---------------+-----------------+
//! ```
//!
//! `cmd` is limited to 15 bits so the merged value stays a non-negative `i32`.
//! Under that constraint the merge is injective and order preserving: comparing
//! two merged keys gives the same answer as comparing the `(cmd, sub_cmd)` pairs
//! lexicographically.
//!
//! ```rust
//! use cmdrouter::cmd::CmdMerge;
//!
//! let login = CmdMerge::merge(100, 1).unwrap();
//! assert_eq!(login.value(), (100 << 16) | 1);
//! assert_eq!((login.cmd(), login.sub_cmd()), (100, 1));
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Largest primary cmd that can be merged.
pub const MAX_CMD: i32 = 0x7FFF;
/// Largest secondary cmd that can be merged.
pub const MAX_SUB_CMD: i32 = 0xFFFF;

const SUB_CMD_BITS: u32 = 16;

/// A merged `(cmd, sub_cmd)` route key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CmdMerge(i32);

impl CmdMerge {
    /// Merge a primary and secondary cmd into one key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CmdOutOfRange`] when either half does not fit its
    /// reserved bit width. Values are never truncated.
    pub fn merge(cmd: i32, sub_cmd: i32) -> Result<Self, ConfigError> {
        if !(0..=MAX_CMD).contains(&cmd) || !(0..=MAX_SUB_CMD).contains(&sub_cmd) {
            return Err(ConfigError::CmdOutOfRange { cmd, sub_cmd });
        }
        Ok(Self((cmd << SUB_CMD_BITS) | sub_cmd))
    }

    /// Interpret a raw key received from the transport.
    ///
    /// Any non-negative `i32` decomposes into a valid pair; negative values are
    /// not routable and yield `None`.
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        (raw >= 0).then_some(Self(raw))
    }

    /// The merged key.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Primary cmd.
    #[inline]
    #[must_use]
    pub const fn cmd(self) -> i32 {
        self.0 >> SUB_CMD_BITS
    }

    /// Secondary cmd.
    #[inline]
    #[must_use]
    pub const fn sub_cmd(self) -> i32 {
        self.0 & MAX_SUB_CMD
    }
}

impl Display for CmdMerge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.cmd(), self.sub_cmd())
    }
}

impl From<CmdMerge> for i32 {
    fn from(value: CmdMerge) -> Self {
        value.0
    }
}

/// Validate a primary cmd on its own, for rules that cover a whole module.
pub(crate) fn check_cmd(cmd: i32) -> Result<i32, ConfigError> {
    if (0..=MAX_CMD).contains(&cmd) {
        Ok(cmd)
    } else {
        Err(ConfigError::CmdOutOfRange { cmd, sub_cmd: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_split() {
        let merged = CmdMerge::merge(100, 1).unwrap();
        assert_eq!(merged.value(), 6_553_601);
        assert_eq!(merged.cmd(), 100);
        assert_eq!(merged.sub_cmd(), 1);
        assert_eq!(merged.to_string(), "100-1");
    }

    #[test]
    fn test_merge_bounds() {
        assert!(CmdMerge::merge(0, 0).is_ok());
        let max = CmdMerge::merge(MAX_CMD, MAX_SUB_CMD).unwrap();
        assert_eq!(max.value(), i32::MAX);
        assert_eq!(max.cmd(), MAX_CMD);
        assert_eq!(max.sub_cmd(), MAX_SUB_CMD);
    }

    #[test]
    fn test_merge_rejects_out_of_range() {
        assert_eq!(
            CmdMerge::merge(MAX_CMD + 1, 0),
            Err(ConfigError::CmdOutOfRange {
                cmd: MAX_CMD + 1,
                sub_cmd: 0
            })
        );
        assert!(CmdMerge::merge(1, MAX_SUB_CMD + 1).is_err());
        assert!(CmdMerge::merge(-1, 0).is_err());
        assert!(CmdMerge::merge(0, -1).is_err());
    }

    #[test]
    fn test_merge_is_injective_and_ordered() {
        let mut previous: Option<CmdMerge> = None;
        for cmd in [0, 1, 2, 100, 1000, MAX_CMD] {
            for sub_cmd in [0, 1, 2, 255, 256, 4096, MAX_SUB_CMD] {
                let merged = CmdMerge::merge(cmd, sub_cmd).unwrap();
                assert_eq!((merged.cmd(), merged.sub_cmd()), (cmd, sub_cmd));
                if let Some(prev) = previous {
                    assert!(prev < merged, "{prev} should sort before {merged}");
                }
                previous = Some(merged);
            }
        }
    }

    #[test]
    fn test_from_raw() {
        let merged = CmdMerge::merge(3, 7).unwrap();
        assert_eq!(CmdMerge::from_raw(merged.value()), Some(merged));
        assert_eq!(CmdMerge::from_raw(-5), None);
    }

    #[test]
    fn test_check_cmd() {
        assert_eq!(check_cmd(MAX_CMD), Ok(MAX_CMD));
        assert!(check_cmd(MAX_CMD + 1).is_err());
    }
}
