use crate::access::ActorSession;
use crate::affinity::affinity_key;
use crate::cmd::CmdMerge;
use crate::error::DispatchError;
use crate::ids::RequestId;

/// One inbound request, as handed over by the transport.
///
/// Consumed by [`super::Dispatcher::dispatch`]; not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMessage {
    /// Correlation id used in logs and echoed on the response
    pub request_id: RequestId,
    /// Target route
    pub cmd_merge: CmdMerge,
    /// Caller identity, anonymous by default
    pub session: ActorSession,
    /// Transport connection id, when the request came over a player connection
    pub channel_id: Option<String>,
    /// Encoded parameter, `None` when the caller sent no payload
    pub data: Option<Vec<u8>>,
}

impl RequestMessage {
    /// Anonymous request without payload.
    #[must_use]
    pub fn new(cmd_merge: CmdMerge) -> Self {
        Self {
            request_id: RequestId::new(),
            cmd_merge,
            session: ActorSession::anonymous(),
            channel_id: None,
            data: None,
        }
    }

    /// Set the correlation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Set the caller identity.
    #[must_use]
    pub fn with_session(mut self, session: ActorSession) -> Self {
        self.session = session;
        self
    }

    /// Set the transport connection id.
    #[must_use]
    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Set the encoded parameter.
    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    /// Key used to pick the executor for this request.
    #[inline]
    #[must_use]
    pub fn affinity_key(&self) -> i64 {
        affinity_key(
            self.session.actor_id,
            self.channel_id.as_deref(),
            self.cmd_merge,
        )
    }
}

/// Outcome of one request: the encoded result or a structured error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    /// Correlation id copied from the request
    pub request_id: RequestId,
    /// Route copied from the request
    pub cmd_merge: CmdMerge,
    /// Encoded result (`None` for void actions) or the failure
    pub result: Result<Option<Vec<u8>>, DispatchError>,
}

impl ResponseMessage {
    /// Successful response.
    #[must_use]
    pub fn success(request_id: RequestId, cmd_merge: CmdMerge, data: Option<Vec<u8>>) -> Self {
        Self {
            request_id,
            cmd_merge,
            result: Ok(data),
        }
    }

    /// Failed response.
    #[must_use]
    pub fn failure(request_id: RequestId, cmd_merge: CmdMerge, error: DispatchError) -> Self {
        Self {
            request_id,
            cmd_merge,
            result: Err(error),
        }
    }

    /// Whether the action ran and its result was encoded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// `0` on success, else the error code.
    #[must_use]
    pub fn error_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(e) => e.code(),
        }
    }

    /// Encoded result bytes, if any.
    #[must_use]
    pub fn data(&self) -> Option<&[u8]> {
        match &self.result {
            Ok(data) => data.as_deref(),
            Err(_) => None,
        }
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&DispatchError> {
        self.result.as_ref().err()
    }
}
