use super::rules::AccessRules;
use crate::cmd::CmdMerge;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Identity and authentication state of the caller, as established by the
/// upstream session component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActorSession {
    /// Player id, `0` when the caller is not identified
    pub actor_id: i64,
    /// Whether the session completed login
    pub verified: bool,
}

impl ActorSession {
    /// Build a session.
    #[must_use]
    pub fn new(actor_id: i64, verified: bool) -> Self {
        Self { actor_id, verified }
    }

    /// An unidentified, unverified caller.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A logged-in player.
    #[must_use]
    pub fn verified(actor_id: i64) -> Self {
        Self::new(actor_id, true)
    }
}

/// Authentication predicate evaluated for routes that are neither rejected
/// nor ignored.
pub type AccessPredicate = Arc<dyn Fn(&ActorSession, CmdMerge) -> bool + Send + Sync>;

/// Outcome of the access check for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Route is on the reject list
    Rejected,
    /// Route is on the ignore list
    Ignored,
    /// The predicate accepted the caller
    Passed,
    /// The predicate refused the caller
    Unverified,
}

impl AccessDecision {
    /// Whether the request may proceed.
    #[inline]
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, AccessDecision::Ignored | AccessDecision::Passed)
    }
}

/// Pre-dispatch access gate.
///
/// Reads take a lock-free snapshot of the current [`AccessRules`]. Updates copy
/// the current rules, apply the change, and publish the copy atomically, so a
/// reader always sees either the old or the new rule set in full. Updates are
/// meant for startup or controlled reconfiguration; concurrent writers should be
/// serialized by the caller.
pub struct AccessAuthentication {
    rules: ArcSwap<AccessRules>,
    epoch: AtomicU64,
    predicate: Option<AccessPredicate>,
}

impl AccessAuthentication {
    /// Gate using `rules` and the default predicate.
    #[must_use]
    pub fn new(rules: AccessRules) -> Self {
        Self {
            rules: ArcSwap::new(Arc::new(rules)),
            epoch: AtomicU64::new(0),
            predicate: None,
        }
    }

    /// Replace the default predicate.
    ///
    /// The default predicate lets a caller through when the rules do not
    /// require a verified identity or the session is verified.
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ActorSession, CmdMerge) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Current rule snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AccessRules> {
        self.rules.load_full()
    }

    /// Number of rule updates published so far.
    #[must_use]
    pub fn rules_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Publish a new rule set.
    pub fn replace(&self, rules: AccessRules) {
        self.rules.store(Arc::new(rules));
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        info!(epoch = epoch, "Access rules replaced");
    }

    /// Copy the current rules, apply `change`, and publish the result.
    ///
    /// # Errors
    ///
    /// Returns the error from `change`; the published rules are left untouched.
    pub fn update<F, E>(&self, change: F) -> Result<(), E>
    where
        F: FnOnce(AccessRules) -> Result<AccessRules, E>,
    {
        let next = change(AccessRules::clone(&self.rules.load()))?;
        self.replace(next);
        Ok(())
    }

    /// Whether `cmd_merge` is always denied.
    #[must_use]
    pub fn reject(&self, cmd_merge: CmdMerge) -> bool {
        self.rules.load().is_rejected(cmd_merge)
    }

    /// Whether `session` may access `cmd_merge`, ignoring the reject list.
    #[must_use]
    pub fn pass(&self, session: &ActorSession, cmd_merge: CmdMerge) -> bool {
        let rules = self.rules.load();
        rules.is_ignored(cmd_merge) || self.predicate_passes(&rules, session, cmd_merge)
    }

    /// Full check: reject list, then ignore list, then the predicate.
    #[must_use]
    pub fn check(&self, session: &ActorSession, cmd_merge: CmdMerge) -> AccessDecision {
        let rules = self.rules.load();
        let decision = if rules.is_rejected(cmd_merge) {
            AccessDecision::Rejected
        } else if rules.is_ignored(cmd_merge) {
            AccessDecision::Ignored
        } else if self.predicate_passes(&rules, session, cmd_merge) {
            AccessDecision::Passed
        } else {
            AccessDecision::Unverified
        };

        debug!(
            cmd_merge = %cmd_merge,
            actor_id = session.actor_id,
            verified = session.verified,
            decision = ?decision,
            "Access check"
        );
        decision
    }

    fn predicate_passes(
        &self,
        rules: &AccessRules,
        session: &ActorSession,
        cmd_merge: CmdMerge,
    ) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(session, cmd_merge),
            None => !rules.requires_verified_identity() || session.verified,
        }
    }
}

impl Default for AccessAuthentication {
    fn default() -> Self {
        Self::new(AccessRules::default())
    }
}

impl fmt::Debug for AccessAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessAuthentication")
            .field("rules", &self.rules.load())
            .field("epoch", &self.rules_epoch())
            .field("custom_predicate", &self.predicate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn route(cmd: i32, sub_cmd: i32) -> CmdMerge {
        CmdMerge::merge(cmd, sub_cmd).unwrap()
    }

    #[test]
    fn test_default_predicate_requires_login() {
        let gate = AccessAuthentication::default();
        assert_eq!(
            gate.check(&ActorSession::anonymous(), route(1, 1)),
            AccessDecision::Unverified
        );
        assert_eq!(
            gate.check(&ActorSession::verified(7), route(1, 1)),
            AccessDecision::Passed
        );
    }

    #[test]
    fn test_verify_identity_off_lets_everyone_through() {
        let gate = AccessAuthentication::new(AccessRules::new().verify_identity(false));
        assert!(gate
            .check(&ActorSession::anonymous(), route(1, 1))
            .is_allowed());
    }

    #[test]
    fn test_reject_wins_over_ignore() {
        let rules = AccessRules::new()
            .ignore(4, 4)
            .unwrap()
            .reject(4, 4)
            .unwrap();
        let gate = AccessAuthentication::new(rules);
        assert_eq!(
            gate.check(&ActorSession::verified(1), route(4, 4)),
            AccessDecision::Rejected
        );
        assert!(gate.reject(route(4, 4)));
        assert!(gate.pass(&ActorSession::anonymous(), route(4, 4)));
    }

    #[test]
    fn test_custom_predicate_replaces_default() {
        let gate = AccessAuthentication::default()
            .with_predicate(|session, cmd_merge| session.actor_id > 0 && cmd_merge.cmd() < 10);
        assert!(gate.check(&ActorSession::new(5, false), route(3, 0)).is_allowed());
        assert!(!gate.check(&ActorSession::verified(5), route(30, 0)).is_allowed());
    }

    #[test]
    fn test_update_is_copy_on_write() {
        let gate = AccessAuthentication::default();
        let before = gate.snapshot();

        gate.update(|rules| rules.ignore(100, 1)).unwrap();

        assert!(!before.is_ignored(route(100, 1)));
        assert!(gate.snapshot().is_ignored(route(100, 1)));
        assert_eq!(gate.rules_epoch(), 1);
    }

    #[test]
    fn test_failed_update_keeps_rules() {
        let gate = AccessAuthentication::default();
        let result: Result<(), ConfigError> = gate.update(|rules| rules.ignore(-1, 0));
        assert!(result.is_err());
        assert_eq!(*gate.snapshot(), AccessRules::default());
        assert_eq!(gate.rules_epoch(), 0);
    }
}
