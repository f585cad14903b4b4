//! Conversion registry
//!
//! Fixed table mapping a conversion-type identifier to the function that
//! performs it and the unit of its result. Built once at startup and shared
//! read-only through the application state.

use serde::Serialize;

use super::error::ConvertError;

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.34;
const FEET_PER_METER: f64 = 3.28084;

/// A single registered conversion
#[derive(Debug, Clone, Copy)]
pub struct Conversion {
    /// Identifier submitted by clients (`selectTemp` / `conversion_type`)
    pub id: &'static str,
    /// Human readable description shown in the form
    pub label: &'static str,
    /// Unit label of the converted value
    pub unit: &'static str,
    apply: fn(f64) -> f64,
}

impl Conversion {
    /// Apply the conversion function to `value`
    pub fn apply(&self, value: f64) -> f64 {
        (self.apply)(value)
    }
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub result: f64,
    pub unit: &'static str,
}

/// Immutable lookup table of supported conversions, in display order
#[derive(Debug, Clone)]
pub struct ConversionRegistry {
    entries: Vec<Conversion>,
}

impl ConversionRegistry {
    /// Build the registry with the supported distance conversions
    pub fn standard() -> Self {
        Self {
            entries: vec![
                Conversion {
                    id: "1",
                    label: "Metros para Quilômetros",
                    unit: "quilômetros",
                    apply: |v| v / METERS_PER_KILOMETER,
                },
                Conversion {
                    id: "2",
                    label: "Quilômetros para Metros",
                    unit: "metros",
                    apply: |v| v * METERS_PER_KILOMETER,
                },
                Conversion {
                    id: "3",
                    label: "Metros para Milhas",
                    unit: "milhas",
                    apply: |v| v / METERS_PER_MILE,
                },
                Conversion {
                    id: "4",
                    label: "Milhas para Metros",
                    unit: "metros",
                    apply: |v| v * METERS_PER_MILE,
                },
                Conversion {
                    id: "5",
                    label: "Metros para Pés",
                    unit: "pés",
                    apply: |v| v * FEET_PER_METER,
                },
                Conversion {
                    id: "6",
                    label: "Pés para Metros",
                    unit: "metros",
                    apply: |v| v / FEET_PER_METER,
                },
            ],
        }
    }

    /// Look up a conversion by identifier (surrounding whitespace ignored)
    pub fn get(&self, type_id: &str) -> Option<&Conversion> {
        let type_id = type_id.trim();
        self.entries.iter().find(|c| c.id == type_id)
    }

    /// Iterate registered conversions in display order
    pub fn iter(&self) -> impl Iterator<Item = &Conversion> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Convert `value` with the conversion registered under `type_id`
    pub fn convert(&self, type_id: &str, value: f64) -> Result<ConversionResult, ConvertError> {
        if !value.is_finite() {
            return Err(ConvertError::InvalidValue(value.to_string()));
        }
        let conversion = self
            .get(type_id)
            .ok_or_else(|| ConvertError::UnknownConversionType(type_id.trim().to_string()))?;

        let result = conversion.apply(value);
        if !result.is_finite() {
            return Err(ConvertError::ResultOutOfRange(format!("{value:?}")));
        }

        Ok(ConversionResult {
            result,
            unit: conversion.unit,
        })
    }
}

/// Parse a user supplied value into a finite number
pub fn parse_value(raw: &str) -> Result<f64, ConvertError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConvertError::MissingField("value"));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ConvertError::InvalidValue(trimmed.to_string())),
    }
}
