use super::core::{Action, ActionMethod, TypedAction};
use crate::cmd::CmdMerge;
use crate::error::ConfigError;
use crate::parser::{MethodParsers, ParamParser, ParamShape};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Declared shape of an action: its name, data parameter and result.
///
/// Absent shapes mean the action takes no data parameter or returns nothing.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    name: String,
    param: Option<ParamShape>,
    result: Option<ParamShape>,
}

impl ActionDescriptor {
    /// Descriptor for a void action.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: None,
            result: None,
        }
    }

    /// Declare the data parameter.
    #[must_use]
    pub fn with_param(mut self, shape: ParamShape) -> Self {
        self.param = Some(shape);
        self
    }

    /// Declare the result.
    #[must_use]
    pub fn with_result(mut self, shape: ParamShape) -> Self {
        self.result = Some(shape);
        self
    }
}

/// A registered route: the action plus its resolved parsers.
pub struct ActionCommand {
    cmd_merge: CmdMerge,
    name: Arc<str>,
    param: Option<ParamParser>,
    result: Option<ParamParser>,
    method: Arc<dyn ActionMethod>,
}

impl ActionCommand {
    /// Route key
    pub fn cmd_merge(&self) -> CmdMerge {
        self.cmd_merge
    }

    /// Action name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parser for the data parameter, if the action takes one
    pub fn param_parser(&self) -> Option<&ParamParser> {
        self.param.as_ref()
    }

    /// Parser for the result, if the action returns one
    pub fn result_parser(&self) -> Option<&ParamParser> {
        self.result.as_ref()
    }

    /// The action entry point
    pub fn method(&self) -> &Arc<dyn ActionMethod> {
        &self.method
    }
}

impl fmt::Debug for ActionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCommand")
            .field("cmd_merge", &self.cmd_merge)
            .field("name", &self.name)
            .field("param", &self.param)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Route table from [`CmdMerge`] to [`ActionCommand`].
///
/// Built during startup; parsers are resolved against the shared
/// [`MethodParsers`] as each action is registered. Wrap in an `Arc` and hand to
/// the dispatcher once complete.
pub struct ActionRegistry {
    parsers: Arc<MethodParsers>,
    commands: HashMap<CmdMerge, Arc<ActionCommand>>,
}

impl ActionRegistry {
    /// Empty registry resolving parsers from `parsers`.
    pub fn new(parsers: Arc<MethodParsers>) -> Self {
        Self {
            parsers,
            commands: HashMap::new(),
        }
    }

    /// Register an untyped action for `(cmd, sub_cmd)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CmdOutOfRange`] for an unmergeable route and
    /// [`ConfigError::DuplicateRoute`] if the route is already registered.
    pub fn register<M>(
        &mut self,
        cmd: i32,
        sub_cmd: i32,
        descriptor: ActionDescriptor,
        method: M,
    ) -> Result<CmdMerge, ConfigError>
    where
        M: ActionMethod + 'static,
    {
        let cmd_merge = CmdMerge::merge(cmd, sub_cmd)?;
        if self.commands.contains_key(&cmd_merge) {
            return Err(ConfigError::DuplicateRoute { cmd_merge });
        }

        let param = descriptor.param.map(|shape| self.parsers.resolve(shape));
        let result = descriptor.result.map(|shape| self.parsers.resolve(shape));

        info!(
            cmd_merge = %cmd_merge,
            action = %descriptor.name,
            param_type = param.as_ref().map(|p| p.shape().value_type().name()),
            result_type = result.as_ref().map(|p| p.shape().value_type().name()),
            "Action registered"
        );

        let command = ActionCommand {
            cmd_merge,
            name: Arc::from(descriptor.name),
            param,
            result,
            method: Arc::new(method),
        };
        self.commands.insert(cmd_merge, Arc::new(command));
        Ok(cmd_merge)
    }

    /// Register a typed [`Action`] for `(cmd, sub_cmd)`.
    ///
    /// # Errors
    ///
    /// Same as [`ActionRegistry::register`].
    pub fn register_action<A: Action>(
        &mut self,
        cmd: i32,
        sub_cmd: i32,
        descriptor: ActionDescriptor,
        action: A,
    ) -> Result<CmdMerge, ConfigError> {
        self.register(cmd, sub_cmd, descriptor, TypedAction(action))
    }

    /// Action registered for `cmd_merge`.
    #[inline]
    #[must_use]
    pub fn get(&self, cmd_merge: CmdMerge) -> Option<&Arc<ActionCommand>> {
        self.commands.get(&cmd_merge)
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered routes in ascending order.
    #[must_use]
    pub fn cmd_merges(&self) -> Vec<CmdMerge> {
        let mut routes: Vec<CmdMerge> = self.commands.keys().copied().collect();
        routes.sort_unstable();
        routes
    }

    /// Parsers and codec used by the registered actions.
    #[must_use]
    pub fn parsers(&self) -> &Arc<MethodParsers> {
        &self.parsers
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("parsers", &self.parsers)
            .field("routes", &self.cmd_merges())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{action_fn, ActionError};
    use crate::codec::ValueType;
    use crate::dispatcher::FlowContext;
    use serde_json::Value;

    fn echo(_flow: &FlowContext, param: Option<Value>) -> Result<Option<Value>, ActionError> {
        Ok(param)
    }

    #[test]
    fn test_register_resolves_parsers() {
        let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
        let cmd_merge = registry
            .register(
                1,
                2,
                ActionDescriptor::new("echo")
                    .with_param(ParamShape::list(ValueType::int()))
                    .with_result(ParamShape::scalar(ValueType::string())),
                echo,
            )
            .unwrap();

        let command = registry.get(cmd_merge).unwrap();
        assert_eq!(command.name(), "echo");
        assert_eq!(
            command.param_parser().unwrap().target_type().name(),
            "ByteValueList"
        );
        assert_eq!(
            command.result_parser().unwrap().target_type().name(),
            "StringValue"
        );
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
        registry
            .register(3, 1, ActionDescriptor::new("first"), echo)
            .unwrap();
        let err = registry
            .register(3, 1, ActionDescriptor::new("second"), echo)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateRoute {
                cmd_merge: CmdMerge::merge(3, 1).unwrap()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_out_of_range_route_is_rejected() {
        let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
        assert!(registry
            .register(0x8000, 0, ActionDescriptor::new("bad"), echo)
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_typed_action() {
        let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
        registry
            .register_action(
                2,
                1,
                ActionDescriptor::new("ping"),
                action_fn(|_flow, (): ()| Ok("pong")),
            )
            .unwrap();
        registry
            .register(1, 9, ActionDescriptor::new("echo"), echo)
            .unwrap();

        let routes = registry.cmd_merges();
        assert_eq!(
            routes,
            vec![CmdMerge::merge(1, 9).unwrap(), CmdMerge::merge(2, 1).unwrap()]
        );
        assert!(registry
            .get(CmdMerge::merge(2, 1).unwrap())
            .unwrap()
            .param_parser()
            .is_none());
    }
}
