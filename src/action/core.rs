use crate::dispatcher::FlowContext;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Error returned by action code.
#[derive(Debug)]
pub enum ActionError {
    /// The parameter could not be converted to what the action expects
    BadParam(String),
    /// Expected business failure with an application error code
    Business {
        /// Application error code reported to the caller
        code: i32,
        /// Message reported to the caller
        message: String,
    },
    /// Unexpected failure
    Internal(anyhow::Error),
}

impl ActionError {
    /// Business failure with an application error code.
    ///
    /// `0` and the dispatcher's own codes (see
    /// [`crate::error::is_reserved_code`]) are reported to the caller as
    /// [`crate::error::HANDLER_ERROR_CODE`].
    pub fn business(code: i32, message: impl Into<String>) -> Self {
        ActionError::Business {
            code,
            message: message.into(),
        }
    }

    /// Parameter conversion failure.
    pub fn bad_param(message: impl Into<String>) -> Self {
        ActionError::BadParam(message.into())
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::BadParam(message) => write!(f, "bad parameter: {message}"),
            ActionError::Business { code, message } => {
                write!(f, "business error {code}: {message}")
            }
            ActionError::Internal(e) => write!(f, "internal error: {e:#}"),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::Internal(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(e: anyhow::Error) -> Self {
        ActionError::Internal(e)
    }
}

/// Untyped action entry point.
///
/// `param` is the value produced by the parameter parser, or `None` when the
/// action declares no data parameter. Return `Ok(None)` for no result.
pub trait ActionMethod: Send + Sync {
    /// Run the action for one request
    fn invoke(&self, flow: &FlowContext, param: Option<Value>)
        -> Result<Option<Value>, ActionError>;
}

impl<F> ActionMethod for F
where
    F: Fn(&FlowContext, Option<Value>) -> Result<Option<Value>, ActionError> + Send + Sync,
{
    fn invoke(
        &self,
        flow: &FlowContext,
        param: Option<Value>,
    ) -> Result<Option<Value>, ActionError> {
        self(flow, param)
    }
}

/// Trait implemented by typed actions.
///
/// The parsed parameter is deserialized into [`Action::Param`] and the returned
/// value is serialized back before the result parser runs. A missing parameter
/// deserializes from `null`, so `()` and `Option<T>` work for void routes.
pub trait Action: Send + Sync + 'static {
    /// The typed parameter
    type Param: DeserializeOwned;
    /// The typed result
    type Result: Serialize;

    /// Handle one request
    fn handle(&self, flow: &FlowContext, param: Self::Param) -> Result<Self::Result, ActionError>;
}

/// [`ActionMethod`] adapter for an [`Action`].
pub struct TypedAction<A>(pub A);

impl<A: Action> ActionMethod for TypedAction<A> {
    fn invoke(
        &self,
        flow: &FlowContext,
        param: Option<Value>,
    ) -> Result<Option<Value>, ActionError> {
        let param: A::Param = serde_json::from_value(param.unwrap_or(Value::Null))
            .map_err(|e| ActionError::BadParam(e.to_string()))?;

        let result = self.0.handle(flow, param)?;

        let value = serde_json::to_value(result)
            .map_err(|e| ActionError::Internal(anyhow::Error::new(e).context("serialize result")))?;
        Ok(Some(value))
    }
}

/// Typed action built from a closure, see [`action_fn`].
pub struct FnAction<P, R, F> {
    f: F,
    _marker: PhantomData<fn(P) -> R>,
}

impl<P, R, F> Action for FnAction<P, R, F>
where
    P: DeserializeOwned + 'static,
    R: Serialize + 'static,
    F: Fn(&FlowContext, P) -> Result<R, ActionError> + Send + Sync + 'static,
{
    type Param = P;
    type Result = R;

    fn handle(&self, flow: &FlowContext, param: P) -> Result<R, ActionError> {
        (self.f)(flow, param)
    }
}

/// Wrap a closure as a typed [`Action`].
///
/// ```rust
/// use cmdrouter::action::action_fn;
///
/// let add = action_fn(|_flow, (a, b): (i64, i64)| Ok(a + b));
/// # let _ = &add;
/// ```
pub fn action_fn<P, R, F>(f: F) -> FnAction<P, R, F>
where
    P: DeserializeOwned + 'static,
    R: Serialize + 'static,
    F: Fn(&FlowContext, P) -> Result<R, ActionError> + Send + Sync + 'static,
{
    FnAction {
        f,
        _marker: PhantomData,
    }
}
