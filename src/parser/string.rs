use super::core::{MethodParser, ParamShape, ParseContext};
use crate::codec::{decode_wrapper, to_value, StringValue, StringValueList, ValueType};
use crate::error::CodecError;
use serde_json::Value;

/// Fast path for text parameters and results.
///
/// Text is carried in [`StringValue`] / [`StringValueList`] wrappers instead of
/// a list of separately encoded elements. Results of any type are coerced to
/// their textual form. A null scalar result becomes the empty string and a
/// null list result becomes an empty list; a list result that is neither an
/// array nor null is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValueMethodParser;

impl MethodParser for StringValueMethodParser {
    fn target_type(&self, shape: &ParamShape) -> ValueType {
        if shape.is_list() {
            StringValueList::value_type()
        } else {
            StringValue::value_type()
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
            let list: StringValueList =
                decode_wrapper(cx.codec, data, &StringValueList::value_type())?;
            return Ok(Value::Array(
                list.values.into_iter().map(Value::String).collect(),
            ));
        }

        let Some(data) = data else {
            if shape.is_default_constructible() {
                if let Some(value) = cx.defaults.new_value(shape.value_type()) {
                    return Ok(value);
                }
            }
            return Ok(Value::String(String::new()));
        };

        let text: StringValue = decode_wrapper(cx.codec, data, &StringValue::value_type())?;
        Ok(Value::String(text.value))
    }

    fn parse_result(
        &self,
        shape: &ParamShape,
        result: Value,
        _cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError> {
        if shape.is_list() {
            let values = match result {
                Value::Array(items) => items.into_iter().map(stringify).collect(),
                Value::Null => Vec::new(),
                other => {
                    return Err(CodecError::new(format!(
                        "list result expected for {}, got {other}",
                        shape.value_type().name()
                    )))
                }
            };
            return to_value(&StringValueList { values });
        }

        to_value(&StringValue {
            value: stringify(result),
        })
    }

    fn is_custom(&self) -> bool {
        false
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
