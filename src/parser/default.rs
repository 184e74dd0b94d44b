use super::core::{MethodParser, ParamShape, ParseContext};
use crate::codec::{decode_wrapper, to_value, ByteValueList, ValueType};
use crate::error::CodecError;
use serde_json::Value;

/// Codec pass-through parser used when nothing more specific is registered.
///
/// Lists travel as a [`ByteValueList`] of individually encoded elements;
/// scalars are handed to the codec untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMethodParser;

impl MethodParser for DefaultMethodParser {
    fn target_type(&self, shape: &ParamShape) -> ValueType {
        if shape.is_list() {
            ByteValueList::value_type()
        } else {
            shape.value_type().clone()
        }
    }

    fn parse_param(
        &self,
        data: Option<&[u8]>,
        shape: &ParamShape,
        cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError> {
        if shape.is_list() {
            let Some(data) = data else {
                return Ok(Value::Array(Vec::new()));
            };
            let list: ByteValueList = decode_wrapper(cx.codec, data, &ByteValueList::value_type())?;
            return Ok(Value::Array(
                list.decode_values(cx.codec, shape.value_type())?,
            ));
        }

        if data.is_none() && shape.is_default_constructible() {
            if let Some(value) = cx.defaults.new_value(shape.value_type()) {
                return Ok(value);
            }
        }

        cx.codec.decode(data, shape.value_type())
    }

    fn parse_result(
        &self,
        shape: &ParamShape,
        result: Value,
        cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError> {
        if !shape.is_list() {
            return Ok(result);
        }

        let items = match result {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(CodecError::new(format!(
                    "list result expected for {}, got {other}",
                    shape.value_type().name()
                )))
            }
        };
        to_value(&ByteValueList::from_values(cx.codec, &items)?)
    }

    fn is_custom(&self) -> bool {
        false
    }
}
