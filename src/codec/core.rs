use crate::error::CodecError;
use serde_json::Value;
use std::sync::Arc;

/// Broad category of a declared value type.
///
/// The codec uses the kind to produce zero values and to reject payloads whose
/// decoded shape does not match the declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 64-bit float
    Double,
    /// UTF-8 text
    String,
    /// Opaque byte sequence
    Bytes,
    /// Application-defined message type
    Custom,
}

/// Declared type of a handler parameter, handler result, or wire wrapper.
///
/// Built once by the action registry; never derived from runtime type
/// introspection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    name: Arc<str>,
    kind: ValueKind,
}

impl ValueType {
    fn builtin(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
        }
    }

    /// `bool`
    #[must_use]
    pub fn bool() -> Self {
        Self::builtin("bool", ValueKind::Bool)
    }

    /// 32-bit integer
    #[must_use]
    pub fn int() -> Self {
        Self::builtin("int", ValueKind::Int)
    }

    /// 64-bit integer
    #[must_use]
    pub fn long() -> Self {
        Self::builtin("long", ValueKind::Long)
    }

    /// 64-bit float
    #[must_use]
    pub fn double() -> Self {
        Self::builtin("double", ValueKind::Double)
    }

    /// Text
    #[must_use]
    pub fn string() -> Self {
        Self::builtin("String", ValueKind::String)
    }

    /// Raw bytes
    #[must_use]
    pub fn bytes() -> Self {
        Self::builtin("bytes", ValueKind::Bytes)
    }

    /// An application message type identified by name.
    pub fn custom(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Custom,
        }
    }

    /// Type name, as declared.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type category.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Zero value used when a payload is absent.
    #[must_use]
    pub fn zero_value(&self) -> Value {
        match self.kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int | ValueKind::Long => Value::from(0),
            ValueKind::Double => Value::from(0.0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Bytes => Value::Array(Vec::new()),
            ValueKind::Custom => Value::Object(serde_json::Map::new()),
        }
    }

    /// Whether `value` has the shape this type declares.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            ValueKind::Bool => value.is_boolean(),
            ValueKind::Int => value
                .as_i64()
                .is_some_and(|v| i32::try_from(v).is_ok()),
            ValueKind::Long => value.is_i64(),
            ValueKind::Double => value.is_number(),
            ValueKind::String => value.is_string(),
            ValueKind::Bytes => value
                .as_array()
                .is_some_and(|items| items.iter().all(|b| b.as_u64().is_some_and(|b| b <= 0xFF))),
            ValueKind::Custom => true,
        }
    }
}

/// Byte-level codec between wire payloads and values.
///
/// The dispatch core treats the codec as an opaque service: it only asks it to
/// encode a value, or to decode bytes as a declared [`ValueType`]. Failures must
/// surface as [`CodecError`], never as silently corrupted values.
pub trait DataCodec: Send + Sync {
    /// Short codec name for diagnostics.
    fn codec_name(&self) -> &str;

    /// Encode a value into wire bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented on the wire.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// Decode wire bytes as `target`.
    ///
    /// `None` asks for the zero value of `target`; this must not fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are malformed or do not match `target`.
    fn decode(&self, data: Option<&[u8]>, target: &ValueType) -> Result<Value, CodecError>;
}

/// JSON implementation of [`DataCodec`] backed by `serde_json`.
///
/// An empty buffer decodes to the zero value, the same way protobuf-style codecs
/// treat a message with no fields set.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDataCodec;

impl DataCodec for JsonDataCodec {
    fn codec_name(&self) -> &str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, data: Option<&[u8]>, target: &ValueType) -> Result<Value, CodecError> {
        let data = match data {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(target.zero_value()),
        };

        let value: Value = serde_json::from_slice(data)?;
        if !target.accepts(&value) {
            return Err(CodecError::new(format!(
                "expected {}, found {}",
                target.name(),
                describe(&value)
            )));
        }
        Ok(value)
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
