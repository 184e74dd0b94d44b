use crate::codec::{DataCodec, ValueType};
use crate::error::CodecError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shape of one handler parameter or return value.
///
/// Supplied by the action registry when a handler is registered and read by
/// parsers on every call. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamShape {
    value_type: ValueType,
    list: bool,
    default_constructible: bool,
}

impl ParamShape {
    /// A single value of `value_type`.
    #[must_use]
    pub fn scalar(value_type: ValueType) -> Self {
        Self {
            value_type,
            list: false,
            default_constructible: true,
        }
    }

    /// An ordered list whose elements are `value_type`.
    #[must_use]
    pub fn list(value_type: ValueType) -> Self {
        Self {
            value_type,
            list: true,
            default_constructible: true,
        }
    }

    /// Mark the type as having no no-argument constructor: an absent payload
    /// skips the default-value supplier and goes straight to the codec.
    #[must_use]
    pub fn without_default(mut self) -> Self {
        self.default_constructible = false;
        self
    }

    /// Declared element type (the element type for lists).
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Whether the value is a list of [`Self::value_type`].
    #[inline]
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.list
    }

    /// Whether an absent payload may be filled by a default-value supplier.
    #[inline]
    #[must_use]
    pub fn is_default_constructible(&self) -> bool {
        self.default_constructible
    }
}

/// Creates the value used for an absent scalar payload.
pub type DefaultValueSupplier = Arc<dyn Fn() -> Value + Send + Sync>;

/// Per-type suppliers consulted when a scalar payload is absent.
///
/// Keyed by the whole [`ValueType`], so a custom type named like a builtin
/// does not share its supplier.
#[derive(Clone, Default)]
pub struct DefaultValues {
    suppliers: HashMap<ValueType, DefaultValueSupplier>,
}

impl DefaultValues {
    /// Register (or replace) the supplier for `value_type`.
    ///
    /// Returns `true` when an earlier supplier was replaced.
    pub fn register(&mut self, value_type: &ValueType, supplier: DefaultValueSupplier) -> bool {
        self.suppliers
            .insert(value_type.clone(), supplier)
            .is_some()
    }

    /// Build a value with the supplier registered for `value_type`, if any.
    #[must_use]
    pub fn new_value(&self, value_type: &ValueType) -> Option<Value> {
        self.suppliers.get(value_type).map(|supplier| supplier())
    }

    /// Number of registered suppliers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    /// Whether no supplier is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }
}

impl fmt::Debug for DefaultValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.suppliers.keys().map(ValueType::name))
            .finish()
    }
}

/// Services a parser may use while converting a payload.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    /// Codec for element and wrapper conversion
    pub codec: &'a dyn DataCodec,
    /// Suppliers for absent scalar payloads
    pub defaults: &'a DefaultValues,
}

/// Converts between wire payloads and handler values for one parameter shape.
///
/// Implement this for application types that need special wire handling and
/// register it with [`super::MethodParsers::register_parser`].
pub trait MethodParser: Send + Sync {
    /// The wire type the codec decodes into for `shape` (e.g. a list wrapper
    /// rather than the element type).
    fn target_type(&self, shape: &ParamShape) -> ValueType;

    /// Decode an inbound payload into the value passed to the handler.
    ///
    /// An absent payload must never be an error on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if present bytes do not decode into `shape`.
    fn parse_param(
        &self,
        data: Option<&[u8]>,
        shape: &ParamShape,
        cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError>;

    /// Convert a handler return value into the value the codec encodes.
    ///
    /// # Errors
    ///
    /// Returns an error if `result` does not match `shape`.
    fn parse_result(
        &self,
        shape: &ParamShape,
        result: Value,
        cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError>;

    /// `false` for parsers shipped with the framework.
    fn is_custom(&self) -> bool {
        true
    }
}

/// A [`ParamShape`] bound to the parser resolved for it at registration time.
#[derive(Clone)]
pub struct ParamParser {
    shape: ParamShape,
    target: ValueType,
    parser: Arc<dyn MethodParser>,
}

impl ParamParser {
    pub(crate) fn new(shape: ParamShape, parser: Arc<dyn MethodParser>) -> Self {
        let target = parser.target_type(&shape);
        Self {
            shape,
            target,
            parser,
        }
    }

    /// The declared shape.
    #[must_use]
    pub fn shape(&self) -> &ParamShape {
        &self.shape
    }

    /// Wire type computed once by the resolved parser.
    #[must_use]
    pub fn target_type(&self) -> &ValueType {
        &self.target
    }

    /// Whether the resolved parser was registered by the application.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.parser.is_custom()
    }

    /// Decode an inbound payload with the resolved parser.
    ///
    /// # Errors
    ///
    /// See [`MethodParser::parse_param`].
    pub fn parse_param(
        &self,
        data: Option<&[u8]>,
        cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError> {
        self.parser.parse_param(data, &self.shape, cx)
    }

    /// Convert a handler result with the resolved parser.
    ///
    /// # Errors
    ///
    /// See [`MethodParser::parse_result`].
    pub fn parse_result(&self, result: Value, cx: &ParseContext<'_>) -> Result<Value, CodecError> {
        self.parser.parse_result(&self.shape, result, cx)
    }
}

impl fmt::Debug for ParamParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamParser")
            .field("shape", &self.shape)
            .field("target", &self.target)
            .field("custom", &self.parser.is_custom())
            .finish()
    }
}
