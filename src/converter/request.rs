//! Conversion request extraction
//!
//! Validates client input into a typed request. Presence is checked first,
//! then the value, then (in the registry) the conversion type.

use serde_json::Value;

use super::error::ConvertError;
use super::registry::parse_value;

/// A validated conversion input: a type identifier and a finite number
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub conversion_type: String,
    pub value: f64,
}

impl ConversionRequest {
    /// Extract `{conversion_type, value}` from a JSON body
    ///
    /// `conversion_type` may be a string or an integer; `value` may be a
    /// number or a numeric string. Anything that is not an object is
    /// treated as an empty body.
    pub fn from_json(body: &Value) -> Result<Self, ConvertError> {
        let conversion_type = present(body.get("conversion_type"))
            .ok_or(ConvertError::MissingField("conversion_type"))?;
        let value = present(body.get("value")).ok_or(ConvertError::MissingField("value"))?;

        let value = match value {
            Value::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ConvertError::InvalidValue(n.to_string()))?,
            Value::String(s) => parse_value(s)?,
            other => return Err(ConvertError::InvalidValue(other.to_string())),
        };

        let conversion_type = match conversion_type {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) if n.is_u64() || n.is_i64() => n.to_string(),
            other => return Err(ConvertError::UnknownConversionType(other.to_string())),
        };

        Ok(Self {
            conversion_type,
            value,
        })
    }

    /// Extract a request from textual fields, e.g. a submitted form
    ///
    /// `fields` names the two inputs in error messages.
    pub fn from_text(
        conversion_type: Option<&str>,
        value: Option<&str>,
        fields: (&'static str, &'static str),
    ) -> Result<Self, ConvertError> {
        let conversion_type = conversion_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConvertError::MissingField(fields.0))?;
        let value = value
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConvertError::MissingField(fields.1))?;

        Ok(Self {
            conversion_type: conversion_type.to_string(),
            value: parse_value(value)?,
        })
    }
}

/// A field counts as absent when missing or `null`
fn present(field: Option<&Value>) -> Option<&Value> {
    field.filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_accepts_strings_and_numbers() {
        let req = ConversionRequest::from_json(&json!({"conversion_type": "1", "value": 1000})).unwrap();
        assert_eq!(req.conversion_type, "1");
        assert_eq!(req.value, 1000.0);

        let req = ConversionRequest::from_json(&json!({"conversion_type": 5, "value": "2.5"})).unwrap();
        assert_eq!(req.conversion_type, "5");
        assert_eq!(req.value, 2.5);
    }

    #[test]
    fn test_from_json_missing_fields() {
        assert_eq!(
            ConversionRequest::from_json(&json!({})),
            Err(ConvertError::MissingField("conversion_type"))
        );
        assert_eq!(
            ConversionRequest::from_json(&json!({"conversion_type": "1", "value": null})),
            Err(ConvertError::MissingField("value"))
        );
        assert_eq!(
            ConversionRequest::from_json(&json!([1, 2])),
            Err(ConvertError::MissingField("conversion_type"))
        );
    }

    #[test]
    fn test_from_json_invalid_value() {
        assert_eq!(
            ConversionRequest::from_json(&json!({"conversion_type": "1", "value": "invalid"})),
            Err(ConvertError::InvalidValue("invalid".to_string()))
        );
        assert!(matches!(
            ConversionRequest::from_json(&json!({"conversion_type": "1", "value": true})),
            Err(ConvertError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_from_json_odd_type_identifier() {
        assert!(matches!(
            ConversionRequest::from_json(&json!({"conversion_type": 1.5, "value": 1})),
            Err(ConvertError::UnknownConversionType(_))
        ));
    }

    #[test]
    fn test_from_text() {
        let fields = ("selectTemp", "valorRef");
        let req = ConversionRequest::from_text(Some("1"), Some(" 1000 "), fields).unwrap();
        assert_eq!(req.value, 1000.0);
        assert_eq!(
            ConversionRequest::from_text(None, Some("1"), fields),
            Err(ConvertError::MissingField("selectTemp"))
        );
        assert_eq!(
            ConversionRequest::from_text(Some("1"), Some("  "), fields),
            Err(ConvertError::MissingField("valorRef"))
        );
        assert_eq!(
            ConversionRequest::from_text(Some("1"), Some("abc"), fields),
            Err(ConvertError::InvalidValue("abc".to_string()))
        );
    }
}
