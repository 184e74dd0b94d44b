//! Wire wrappers used when a parameter or result is not sent as a bare value.

use super::core::{DataCodec, ValueType};
use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered list of individually encoded payloads.
///
/// Carries list-shaped parameters and results. Each element is encoded on its
/// own, so the element type stays opaque to the wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteValueList {
    /// Encoded elements in wire order
    #[serde(default)]
    pub values: Vec<Vec<u8>>,
}

impl ByteValueList {
    /// Declared wire type of the wrapper.
    #[must_use]
    pub fn value_type() -> ValueType {
        ValueType::custom("ByteValueList")
    }

    /// Encode each item with `codec` and collect them in order.
    ///
    /// # Errors
    ///
    /// Returns the first element encoding failure.
    pub fn from_values<'a>(
        codec: &dyn DataCodec,
        items: impl IntoIterator<Item = &'a Value>,
    ) -> Result<Self, CodecError> {
        let values = items
            .into_iter()
            .map(|item| codec.encode(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }

    /// Build the full wire payload for a list of values.
    ///
    /// # Errors
    ///
    /// Returns an error if an element or the wrapper cannot be encoded.
    pub fn encode_values<'a>(
        codec: &dyn DataCodec,
        items: impl IntoIterator<Item = &'a Value>,
    ) -> Result<Vec<u8>, CodecError> {
        let list = Self::from_values(codec, items)?;
        codec.encode(&to_value(&list)?)
    }

    /// Decode each element as `element` and return them in wire order.
    ///
    /// # Errors
    ///
    /// Returns the first element decoding failure.
    pub fn decode_values(
        &self,
        codec: &dyn DataCodec,
        element: &ValueType,
    ) -> Result<Vec<Value>, CodecError> {
        self.values
            .iter()
            .map(|bytes| codec.decode(Some(bytes), element))
            .collect()
    }
}

/// Single text value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringValue {
    /// The text
    #[serde(default)]
    pub value: String,
}

impl StringValue {
    /// Declared wire type of the wrapper.
    #[must_use]
    pub fn value_type() -> ValueType {
        ValueType::custom("StringValue")
    }
}

/// List of text values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringValueList {
    /// The texts in wire order
    #[serde(default)]
    pub values: Vec<String>,
}

impl StringValueList {
    /// Declared wire type of the wrapper.
    #[must_use]
    pub fn value_type() -> ValueType {
        ValueType::custom("StringValueList")
    }
}

/// Decode a wire wrapper through the codec.
pub(crate) fn decode_wrapper<T: DeserializeOwned>(
    codec: &dyn DataCodec,
    data: &[u8],
    target: &ValueType,
) -> Result<T, CodecError> {
    let value = codec.decode(Some(data), target)?;
    Ok(serde_json::from_value(value)?)
}

/// Convert a wrapper into the value handed to the codec.
pub(crate) fn to_value<T: Serialize>(wrapper: &T) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(wrapper)?)
}
