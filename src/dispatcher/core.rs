//! Dispatcher core: access check, route lookup, executor hand-off and the
//! per-request pipeline that runs on the executor.

use super::flow::FlowContext;
use super::message::{RequestMessage, ResponseMessage};
use crate::access::{AccessAuthentication, AccessDecision};
use crate::action::{ActionCommand, ActionError, ActionRegistry};
use crate::affinity::{panic_message, AffinityConfig, AffinityRouter, ExecutorMetrics};
use crate::broker::BrokerHandle;
use crate::cmd::CmdMerge;
use crate::error::{is_reserved_code, ConfigError, DispatchError, HANDLER_ERROR_CODE};
use crate::parser::MethodParsers;
use may::sync::mpsc;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Callback receiving the response for one request
pub type ReplyFn = Box<dyn FnOnce(ResponseMessage) + Send>;

/// A request bound to its action, queued on an executor.
pub struct DispatchJob {
    request: RequestMessage,
    command: Arc<ActionCommand>,
    reply: ReplyFn,
}

impl fmt::Debug for DispatchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchJob")
            .field("request_id", &self.request.request_id)
            .field("cmd_merge", &self.request.cmd_merge)
            .field("action", &self.command.name())
            .finish_non_exhaustive()
    }
}

/// Request dispatcher.
///
/// Owns the executors. Every request goes through:
///
/// 1. the access gate (denials are answered immediately)
/// 2. the route table (unknown routes are answered immediately)
/// 3. the affinity router, which queues the request on its executor
/// 4. on the executor: parameter parsing, the action, result parsing, encoding
///
/// Every request produces exactly one response through its reply callback.
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    access: Arc<AccessAuthentication>,
    router: AffinityRouter<DispatchJob>,
}

impl Dispatcher {
    /// Start the executors and build the dispatcher.
    ///
    /// `broker` is passed to every action through its [`FlowContext`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ExecutorSpawn`] if the executors cannot be started.
    pub fn new(
        registry: Arc<ActionRegistry>,
        access: Arc<AccessAuthentication>,
        config: AffinityConfig,
        broker: Option<BrokerHandle>,
    ) -> Result<Self, ConfigError> {
        let parsers = Arc::clone(registry.parsers());
        let router = AffinityRouter::new(config, move |executor, job: DispatchJob| {
            run_job(executor, job, &parsers, broker.as_ref());
        })?;

        info!(
            routes = registry.len(),
            executors = router.len(),
            "Dispatcher started"
        );

        Ok(Self {
            registry,
            access,
            router,
        })
    }

    /// Dispatch `request`; `reply` is called exactly once with its response.
    ///
    /// Denied and unknown routes are answered on the calling thread. Everything
    /// else is answered on the executor selected for the request.
    pub fn dispatch<F>(&self, request: RequestMessage, reply: F)
    where
        F: FnOnce(ResponseMessage) + Send + 'static,
    {
        let request_id = request.request_id;
        let cmd_merge = request.cmd_merge;

        let rejected = match self.access.check(&request.session, cmd_merge) {
            AccessDecision::Ignored | AccessDecision::Passed => None,
            AccessDecision::Rejected => Some(true),
            AccessDecision::Unverified => Some(false),
        };
        if let Some(rejected) = rejected {
            warn!(
                request_id = %request_id,
                cmd_merge = %cmd_merge,
                actor_id = request.session.actor_id,
                rejected = rejected,
                "Access denied"
            );
            reply(ResponseMessage::failure(
                request_id,
                cmd_merge,
                DispatchError::AuthorizationDenied {
                    cmd_merge,
                    rejected,
                },
            ));
            return;
        }

        let Some(command) = self.registry.get(cmd_merge) else {
            warn!(request_id = %request_id, cmd_merge = %cmd_merge, "Route not found");
            reply(ResponseMessage::failure(
                request_id,
                cmd_merge,
                DispatchError::RouteNotFound { cmd_merge },
            ));
            return;
        };

        let key = request.affinity_key();
        let job = DispatchJob {
            request,
            command: Arc::clone(command),
            reply: Box::new(reply),
        };

        match self.router.execute(key, job) {
            Ok(executor) => {
                debug!(
                    request_id = %request_id,
                    cmd_merge = %cmd_merge,
                    affinity_key = key,
                    executor = executor,
                    "Request queued"
                );
            }
            Err(closed) => {
                error!(
                    request_id = %request_id,
                    cmd_merge = %cmd_merge,
                    executor = closed.index,
                    "Executor unavailable"
                );
                let job = closed.job;
                (job.reply)(ResponseMessage::failure(
                    request_id,
                    cmd_merge,
                    DispatchError::ExecutorUnavailable {
                        cmd_merge,
                        executor: closed.index,
                    },
                ));
            }
        }
    }

    /// Dispatch `request` and wait for its response.
    ///
    /// Blocks the calling thread or coroutine. Must not be called from an
    /// action for a request that maps to the same executor, since that
    /// executor would wait on itself.
    pub fn call(&self, request: RequestMessage) -> ResponseMessage {
        let request_id = request.request_id;
        let cmd_merge = request.cmd_merge;
        let executor = self.select_executor(&request);

        let (tx, rx) = mpsc::channel();
        self.dispatch(request, move |response| {
            if tx.send(response).is_err() {
                debug!(request_id = %request_id, "Caller stopped waiting for response");
            }
        });

        rx.recv().unwrap_or_else(|_| {
            ResponseMessage::failure(
                request_id,
                cmd_merge,
                DispatchError::ExecutorUnavailable {
                    cmd_merge,
                    executor,
                },
            )
        })
    }

    /// Executor that `request` would run on.
    #[must_use]
    pub fn select_executor(&self, request: &RequestMessage) -> usize {
        self.router.select(request.affinity_key())
    }

    /// Number of executors.
    #[must_use]
    pub fn executor_count(&self) -> usize {
        self.router.len()
    }

    /// Counters for executor `index`.
    #[must_use]
    pub fn executor_metrics(&self, index: usize) -> Option<&Arc<ExecutorMetrics>> {
        self.router.metrics(index)
    }

    /// The route table.
    #[must_use]
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// The access gate. Rules can be updated through it while running.
    #[must_use]
    pub fn access(&self) -> &Arc<AccessAuthentication> {
        &self.access
    }

    /// Stop accepting requests. Queued requests are still answered.
    pub fn shutdown(&mut self) {
        self.router.shutdown();
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("access", &self.access)
            .field("router", &self.router)
            .finish()
    }
}

fn run_job(
    executor: usize,
    job: DispatchJob,
    parsers: &MethodParsers,
    broker: Option<&BrokerHandle>,
) {
    let DispatchJob {
        request,
        command,
        reply,
    } = job;
    let request_id = request.request_id;
    let cmd_merge = request.cmd_merge;
    let flow = FlowContext::for_request(&request, executor, broker.cloned());
    let started = Instant::now();

    let result = catch_unwind(AssertUnwindSafe(|| {
        invoke(&command, &flow, request.data.as_deref(), parsers)
    }))
    .unwrap_or_else(|panic| {
        let message = panic_message(panic.as_ref());
        error!(
            request_id = %request_id,
            cmd_merge = %cmd_merge,
            action = %command.name(),
            executor = executor,
            panic_message = %message,
            "Action panicked"
        );
        Err(DispatchError::Handler {
            cmd_merge,
            code: HANDLER_ERROR_CODE,
            message: format!("action panicked: {message}"),
        })
    });

    let elapsed_us = started.elapsed().as_micros() as u64;
    match &result {
        Ok(data) => debug!(
            request_id = %request_id,
            cmd_merge = %cmd_merge,
            action = %command.name(),
            executor = executor,
            response_bytes = data.as_ref().map_or(0, Vec::len),
            elapsed_us = elapsed_us,
            "Request completed"
        ),
        Err(e) => error!(
            request_id = %request_id,
            cmd_merge = %cmd_merge,
            action = %command.name(),
            executor = executor,
            error_code = e.code(),
            error = %e,
            elapsed_us = elapsed_us,
            "Request failed"
        ),
    }

    reply(ResponseMessage {
        request_id,
        cmd_merge,
        result,
    });
}

fn invoke(
    command: &ActionCommand,
    flow: &FlowContext,
    data: Option<&[u8]>,
    parsers: &MethodParsers,
) -> Result<Option<Vec<u8>>, DispatchError> {
    let cmd_merge = command.cmd_merge();
    let cx = parsers.context();

    let param = match command.param_parser() {
        Some(parser) => Some(parser.parse_param(data, &cx).map_err(|e| {
            DispatchError::Decode {
                cmd_merge,
                message: e.to_string(),
            }
        })?),
        None => None,
    };

    let value = command
        .method()
        .invoke(flow, param)
        .map_err(|e| action_failure(cmd_merge, e))?;

    let (Some(parser), Some(value)) = (command.result_parser(), value) else {
        return Ok(None);
    };

    let encode_error = |e: crate::error::CodecError| DispatchError::Encode {
        cmd_merge,
        message: e.to_string(),
    };
    let wire = parser.parse_result(value, &cx).map_err(encode_error)?;
    let bytes = cx.codec.encode(&wire).map_err(encode_error)?;
    Ok(Some(bytes))
}

fn action_failure(cmd_merge: CmdMerge, error: ActionError) -> DispatchError {
    match error {
        ActionError::BadParam(message) => DispatchError::Decode { cmd_merge, message },
        ActionError::Business { code, message } if is_reserved_code(code) => {
            warn!(
                cmd_merge = %cmd_merge,
                business_code = code,
                "Business code is reserved, reporting handler error"
            );
            DispatchError::Handler {
                cmd_merge,
                code: HANDLER_ERROR_CODE,
                message,
            }
        }
        ActionError::Business { code, message } => DispatchError::Handler {
            cmd_merge,
            code,
            message,
        },
        ActionError::Internal(e) => DispatchError::Handler {
            cmd_merge,
            code: HANDLER_ERROR_CODE,
            message: format!("{e:#}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessRules, ActorSession};
    use crate::action::{action_fn, ActionDescriptor};
    use crate::affinity::ExecutorMode;
    use crate::codec::ValueType;
    use crate::error::{AUTHORIZATION_DENIED_CODE, DECODE_ERROR_CODE, ROUTE_NOT_FOUND_CODE};
    use crate::parser::ParamShape;
    use serde_json::{json, Value};

    fn config() -> AffinityConfig {
        AffinityConfig::new(2, "Dispatch", false, 0x10000, ExecutorMode::Thread)
    }

    fn route(cmd: i32, sub_cmd: i32) -> CmdMerge {
        CmdMerge::merge(cmd, sub_cmd).unwrap()
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
        registry
            .register_action(
                1,
                1,
                ActionDescriptor::new("double")
                    .with_param(ParamShape::scalar(ValueType::int()))
                    .with_result(ParamShape::scalar(ValueType::int())),
                action_fn(|_flow, n: i32| Ok(n * 2)),
            )
            .unwrap();
        registry
            .register_action(
                1,
                2,
                ActionDescriptor::new("fail"),
                action_fn(|_flow, (): ()| -> Result<(), ActionError> {
                    Err(ActionError::business(42, "not today"))
                }),
            )
            .unwrap();
        registry
            .register_action(
                1,
                3,
                ActionDescriptor::new("explode"),
                action_fn(|_flow, (): ()| -> Result<(), ActionError> { panic!("kaboom") }),
            )
            .unwrap();
        registry
            .register(
                1,
                4,
                ActionDescriptor::new("whoami")
                    .with_result(ParamShape::scalar(ValueType::long())),
                |flow: &FlowContext, _param: Option<Value>| -> Result<Option<Value>, ActionError> {
                    Ok(Some(json!(flow.actor_id())))
                },
            )
            .unwrap();

        let access = AccessAuthentication::new(AccessRules::new().verify_identity(false));
        Dispatcher::new(Arc::new(registry), Arc::new(access), config(), None).unwrap()
    }

    #[test]
    fn test_call_round_trip() {
        let dispatcher = dispatcher();
        let response = dispatcher.call(RequestMessage::new(route(1, 1)).with_data(b"21".to_vec()));
        assert_eq!(response.data(), Some(&b"42"[..]));
    }

    #[test]
    fn test_absent_scalar_param_uses_zero_value() {
        let dispatcher = dispatcher();
        let response = dispatcher.call(RequestMessage::new(route(1, 1)));
        assert_eq!(response.data(), Some(&b"0"[..]));
    }

    #[test]
    fn test_decode_error() {
        let dispatcher = dispatcher();
        let response =
            dispatcher.call(RequestMessage::new(route(1, 1)).with_data(b"\"x\"".to_vec()));
        assert_eq!(response.error_code(), DECODE_ERROR_CODE);
    }

    #[test]
    fn test_business_error_keeps_code() {
        let dispatcher = dispatcher();
        let response = dispatcher.call(RequestMessage::new(route(1, 2)));
        assert_eq!(
            response.error(),
            Some(&DispatchError::Handler {
                cmd_merge: route(1, 2),
                code: 42,
                message: "not today".to_string()
            })
        );
    }

    #[test]
    fn test_panic_is_reported_and_executor_survives() {
        let dispatcher = dispatcher();
        let session = ActorSession::verified(8);

        let response =
            dispatcher.call(RequestMessage::new(route(1, 3)).with_session(session));
        assert_eq!(response.error_code(), HANDLER_ERROR_CODE);

        let response = dispatcher.call(RequestMessage::new(route(1, 4)).with_session(session));
        assert_eq!(response.data(), Some(&b"8"[..]));
    }

    #[test]
    fn test_unknown_route() {
        let dispatcher = dispatcher();
        let response = dispatcher.call(RequestMessage::new(route(9, 9)));
        assert_eq!(response.error_code(), ROUTE_NOT_FOUND_CODE);
    }

    #[test]
    fn test_denied_before_route_lookup() {
        let dispatcher = dispatcher();
        dispatcher
            .access()
            .update(|rules| rules.reject_cmd(9))
            .unwrap();
        let response = dispatcher.call(RequestMessage::new(route(9, 9)));
        assert_eq!(response.error_code(), AUTHORIZATION_DENIED_CODE);
    }

    #[test]
    fn test_shutdown_reports_executor_unavailable() {
        let mut dispatcher = dispatcher();
        dispatcher.shutdown();
        let response = dispatcher.call(RequestMessage::new(route(1, 1)));
        assert!(matches!(
            response.error(),
            Some(DispatchError::ExecutorUnavailable { .. })
        ));
    }
}
