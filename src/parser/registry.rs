use super::core::{DefaultValueSupplier, DefaultValues, MethodParser, ParamParser, ParamShape, ParseContext};
use super::default::DefaultMethodParser;
use super::string::StringValueMethodParser;
use crate::codec::{DataCodec, JsonDataCodec, ValueType};
use crate::error::ConfigError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parser registry and codec binding.
///
/// Populated during startup, then shared read-only (usually behind an `Arc`)
/// by the action registry and the dispatcher. Resolution order for a declared
/// type is: application parsers, framework parsers, [`DefaultMethodParser`].
/// Lookups match the whole [`ValueType`] (name and kind).
pub struct MethodParsers {
    codec: Arc<dyn DataCodec>,
    custom: HashMap<ValueType, Arc<dyn MethodParser>>,
    builtin: HashMap<ValueType, Arc<dyn MethodParser>>,
    fallback: Arc<dyn MethodParser>,
    defaults: DefaultValues,
}

impl MethodParsers {
    /// Create a registry bound to `codec` with the framework parsers installed.
    #[must_use]
    pub fn new(codec: Arc<dyn DataCodec>) -> Self {
        let mut builtin: HashMap<ValueType, Arc<dyn MethodParser>> = HashMap::new();
        builtin.insert(ValueType::string(), Arc::new(StringValueMethodParser));

        info!(codec = codec.codec_name(), "Method parsers created");

        Self {
            codec,
            custom: HashMap::new(),
            builtin,
            fallback: Arc::new(DefaultMethodParser),
            defaults: DefaultValues::default(),
        }
    }

    /// Register an application parser for `value_type`.
    ///
    /// An application parser may shadow a framework parser for the same type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateParser`] if an application parser is
    /// already registered for the type.
    pub fn register_parser(
        &mut self,
        value_type: &ValueType,
        parser: Arc<dyn MethodParser>,
    ) -> Result<(), ConfigError> {
        let type_name = value_type.name();
        if self.custom.contains_key(value_type) {
            return Err(ConfigError::DuplicateParser {
                type_name: type_name.to_string(),
            });
        }

        if self.builtin.contains_key(value_type) {
            warn!(
                type_name = %type_name,
                custom = parser.is_custom(),
                "Parser shadows framework parser"
            );
        }

        info!(type_name = %type_name, custom = parser.is_custom(), "Parser registered");
        self.custom.insert(value_type.clone(), parser);
        Ok(())
    }

    /// Register the supplier used when a scalar `value_type` payload is absent.
    pub fn register_default_value<F>(&mut self, value_type: &ValueType, supplier: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let supplier: DefaultValueSupplier = Arc::new(supplier);
        if self.defaults.register(value_type, supplier) {
            warn!(type_name = %value_type.name(), "Replaced default value supplier");
        }
    }

    /// Bind `shape` to the parser that handles its declared type.
    ///
    /// Called once per parameter/result when an action is registered; the
    /// returned [`ParamParser`] is cached on the action.
    #[must_use]
    pub fn resolve(&self, shape: ParamShape) -> ParamParser {
        let value_type = shape.value_type();
        let parser = self
            .custom
            .get(value_type)
            .or_else(|| self.builtin.get(value_type))
            .unwrap_or(&self.fallback);

        let resolved = ParamParser::new(shape, Arc::clone(parser));
        debug!(
            type_name = %resolved.shape().value_type().name(),
            list = resolved.shape().is_list(),
            target_type = %resolved.target_type().name(),
            custom = resolved.is_custom(),
            "Parser resolved"
        );
        resolved
    }

    /// Codec used for payloads and results.
    #[must_use]
    pub fn codec(&self) -> &Arc<dyn DataCodec> {
        &self.codec
    }

    /// Registered default-value suppliers.
    #[must_use]
    pub fn defaults(&self) -> &DefaultValues {
        &self.defaults
    }

    /// Borrow the services parsers need while converting.
    #[must_use]
    pub fn context(&self) -> ParseContext<'_> {
        ParseContext {
            codec: self.codec.as_ref(),
            defaults: &self.defaults,
        }
    }
}

impl Default for MethodParsers {
    fn default() -> Self {
        Self::new(Arc::new(JsonDataCodec))
    }
}

impl fmt::Debug for MethodParsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodParsers")
            .field("codec", &self.codec.codec_name())
            .field("custom", &self.custom.keys().map(ValueType::name).collect::<Vec<_>>())
            .field("builtin", &self.builtin.keys().map(ValueType::name).collect::<Vec<_>>())
            .field("defaults", &self.defaults)
            .finish()
    }
}
