use super::message::RequestMessage;
use crate::access::ActorSession;
use crate::broker::BrokerHandle;
use crate::cmd::CmdMerge;
use crate::ids::RequestId;

/// Per-request context handed to action code.
///
/// Carries the caller identity, the executor the action runs on and the
/// broker handle for outbound calls.
#[derive(Debug, Clone)]
pub struct FlowContext {
    request_id: RequestId,
    cmd_merge: CmdMerge,
    session: ActorSession,
    channel_id: Option<String>,
    executor_index: Option<usize>,
    broker: Option<BrokerHandle>,
}

impl FlowContext {
    /// Context for an anonymous caller outside any executor.
    ///
    /// The dispatcher builds its own; this is for invoking actions directly,
    /// e.g. in tests.
    #[must_use]
    pub fn new(cmd_merge: CmdMerge) -> Self {
        Self {
            request_id: RequestId::new(),
            cmd_merge,
            session: ActorSession::anonymous(),
            channel_id: None,
            executor_index: None,
            broker: None,
        }
    }

    pub(crate) fn for_request(
        request: &RequestMessage,
        executor_index: usize,
        broker: Option<BrokerHandle>,
    ) -> Self {
        Self {
            request_id: request.request_id,
            cmd_merge: request.cmd_merge,
            session: request.session,
            channel_id: request.channel_id.clone(),
            executor_index: Some(executor_index),
            broker,
        }
    }

    /// Set the caller identity.
    #[must_use]
    pub fn with_session(mut self, session: ActorSession) -> Self {
        self.session = session;
        self
    }

    /// Set the broker handle.
    #[must_use]
    pub fn with_broker(mut self, broker: BrokerHandle) -> Self {
        self.broker = Some(broker);
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn cmd_merge(&self) -> CmdMerge {
        self.cmd_merge
    }

    #[must_use]
    pub fn session(&self) -> &ActorSession {
        &self.session
    }

    /// Player id, `0` for anonymous callers.
    #[must_use]
    pub fn actor_id(&self) -> i64 {
        self.session.actor_id
    }

    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    /// Executor running the action; `None` outside the dispatcher.
    #[must_use]
    pub fn executor_index(&self) -> Option<usize> {
        self.executor_index
    }

    /// Broker handle, when the dispatcher was given one.
    #[must_use]
    pub fn broker(&self) -> Option<&BrokerHandle> {
        self.broker.as_ref()
    }
}
