#![allow(clippy::unwrap_used, clippy::expect_used)]

use cmdrouter::codec::{ByteValueList, JsonDataCodec, StringValueList, ValueType};
use cmdrouter::error::{CodecError, ConfigError};
use cmdrouter::parser::{MethodParser, MethodParsers, ParamShape, ParseContext};
use serde_json::{json, Value};
use std::sync::Arc;

fn parsers() -> MethodParsers {
    MethodParsers::new(Arc::new(JsonDataCodec))
}

#[test]
fn test_list_param_keeps_order() {
    let parsers = parsers();
    let parser = parsers.resolve(ParamShape::list(ValueType::long()));
    let items = [json!(3), json!(1), json!(2)];
    let wire = ByteValueList::encode_values(&JsonDataCodec, &items).unwrap();

    let value = parser.parse_param(Some(&wire), &parsers.context()).unwrap();
    assert_eq!(value, json!([3, 1, 2]));
}

#[test]
fn test_empty_list_param_is_empty_not_absent() {
    let parsers = parsers();
    let parser = parsers.resolve(ParamShape::list(ValueType::custom("Hero")));
    let wire = ByteValueList::encode_values(&JsonDataCodec, &[] as &[Value]).unwrap();

    assert_eq!(parser.parse_param(Some(&wire), &parsers.context()).unwrap(), json!([]));
    assert_eq!(parser.parse_param(None, &parsers.context()).unwrap(), json!([]));
}

#[test]
fn test_list_result_decodes_back_to_elements() {
    let parsers = parsers();
    let parser = parsers.resolve(ParamShape::list(ValueType::custom("Hero")));
    let heroes = json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]);
    let cx = parsers.context();

    let wire = cx.codec.encode(&parser.parse_result(heroes.clone(), &cx).unwrap()).unwrap();
    let decoded = parser.parse_param(Some(&wire), &cx).unwrap();
    assert_eq!(decoded, heroes);
}

#[test]
fn test_string_list_uses_string_wrapper() {
    let parsers = parsers();
    let parser = parsers.resolve(ParamShape::list(ValueType::string()));
    assert_eq!(parser.target_type(), &StringValueList::value_type());

    let cx = parsers.context();
    let wire = cx
        .codec
        .encode(&parser.parse_result(json!(["x", 7, null]), &cx).unwrap())
        .unwrap();
    assert_eq!(wire, br#"{"values":["x","7",""]}"#.to_vec());
}

#[test]
fn test_absent_scalar_policies() {
    let mut parsers = parsers();
    parsers.register_default_value(&ValueType::custom("Bag"), || json!({"slots": 8}));

    let with_supplier = parsers.resolve(ParamShape::scalar(ValueType::custom("Bag")));
    let no_default = parsers.resolve(ParamShape::scalar(ValueType::custom("Bag")).without_default());
    let plain = parsers.resolve(ParamShape::scalar(ValueType::int()));
    let text = parsers.resolve(ParamShape::scalar(ValueType::string()));
    let cx = parsers.context();

    assert_eq!(with_supplier.parse_param(None, &cx).unwrap(), json!({"slots": 8}));
    assert_eq!(no_default.parse_param(None, &cx).unwrap(), json!({}));
    assert_eq!(plain.parse_param(None, &cx).unwrap(), json!(0));
    assert_eq!(text.parse_param(None, &cx).unwrap(), json!(""));
}

struct CsvParser;

impl MethodParser for CsvParser {
    fn target_type(&self, _shape: &ParamShape) -> ValueType {
        ValueType::bytes()
    }

    fn parse_param(
        &self,
        data: Option<&[u8]>,
        _shape: &ParamShape,
        _cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(data.unwrap_or_default())
            .map_err(|e| CodecError::new(e.to_string()))?;
        Ok(Value::Array(
            text.split(',')
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ))
    }

    fn parse_result(
        &self,
        _shape: &ParamShape,
        result: Value,
        _cx: &ParseContext<'_>,
    ) -> Result<Value, CodecError> {
        Ok(result)
    }
}

#[test]
fn test_custom_parser_takes_precedence() {
    let mut parsers = parsers();
    let csv = ValueType::custom("Csv");
    parsers.register_parser(&csv, Arc::new(CsvParser)).unwrap();

    let parser = parsers.resolve(ParamShape::scalar(csv.clone()));
    assert!(parser.is_custom());
    assert_eq!(parser.target_type(), &ValueType::bytes());
    assert_eq!(
        parser.parse_param(Some(b"a,b"), &parsers.context()).unwrap(),
        json!(["a", "b"])
    );

    assert_eq!(
        parsers.register_parser(&csv, Arc::new(CsvParser)),
        Err(ConfigError::DuplicateParser {
            type_name: "Csv".to_string()
        })
    );
}

#[test]
fn test_custom_parser_can_shadow_string_parser() {
    let mut parsers = parsers();
    assert!(!parsers.resolve(ParamShape::scalar(ValueType::string())).is_custom());

    parsers
        .register_parser(&ValueType::string(), Arc::new(CsvParser))
        .unwrap();
    assert!(parsers.resolve(ParamShape::scalar(ValueType::string())).is_custom());
}

#[test]
fn test_malformed_payload_is_codec_error() {
    let parsers = parsers();
    let parser = parsers.resolve(ParamShape::scalar(ValueType::int()));
    assert!(parser.parse_param(Some(b"{nope"), &parsers.context()).is_err());
    assert!(parser.parse_param(Some(b"\"text\""), &parsers.context()).is_err());
}

#[test]
fn test_custom_types_named_like_builtins_use_their_own_rules() {
    let mut parsers = parsers();
    parsers.register_default_value(&ValueType::custom("int"), || json!({"rank": 1}));

    let plain = parsers.resolve(ParamShape::scalar(ValueType::int()));
    let ranked = parsers.resolve(ParamShape::scalar(ValueType::custom("int")));
    let quest = parsers.resolve(ParamShape::scalar(ValueType::custom("String")));
    let cx = parsers.context();

    assert_eq!(plain.parse_param(None, &cx).unwrap(), json!(0));
    assert_eq!(ranked.parse_param(None, &cx).unwrap(), json!({"rank": 1}));

    assert!(!quest.is_custom());
    assert_eq!(quest.target_type(), &ValueType::custom("String"));
    assert_eq!(
        quest.parse_param(Some(br#"{"id":7}"#), &cx).unwrap(),
        json!({"id": 7})
    );
}
