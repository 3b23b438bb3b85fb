//! Schema-based validation and normalization of config fragments.

use std::collections::HashMap;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Number, Value};

use crate::config::types::{FieldSpec, FieldType, Schema};
use crate::error::{Error, Result};

const BUILTIN_SCHEMAS: &str = include_str!("schemas.yaml");

/// Validator holding named schemas.
///
/// `validate` checks a mapping against a schema (optionally extending a
/// base schema), fills defaults and returns the normalized mapping.
#[derive(Debug, Clone)]
pub struct ConfigValidator {
    schemas: HashMap<String, Schema>,
}

impl ConfigValidator {
    /// Creates a validator with no schemas.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Creates a validator preloaded with the built-in schemas.
    pub fn builtin() -> Result<Self> {
        let mut validator = Self::new();
        validator.load_schemas(BUILTIN_SCHEMAS)?;
        Ok(validator)
    }

    /// Loads every schema in a YAML document. Returns how many were loaded.
    /// Schemas with an existing name replace the earlier one.
    pub fn load_schemas(&mut self, yaml: &str) -> Result<usize> {
        let parsed: HashMap<String, Schema> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::ConfigParse("schemas".to_string(), e.to_string()))?;
        let count = parsed.len();
        for (name, schema) in parsed {
            self.register_schema(name, schema);
        }
        Ok(count)
    }

    /// Registers (or replaces) a single schema.
    pub fn register_schema(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Validates `data` against `schema`, extended by `base` when given.
    pub fn validate(&self, schema: &str, data: &Value, base: Option<&str>) -> Result<Mapping> {
        let fields = self.resolve(schema, base)?;

        let empty = Mapping::new();
        let input = match data {
            Value::Mapping(m) => m,
            Value::Null => &empty,
            other => {
                return Err(Error::ConfigValidation(
                    schema.to_string(),
                    format!("Expected a mapping of settings, got {}", describe(other)),
                ))
            }
        };

        for key in input.keys() {
            let known = key.as_str().map_or(false, |k| fields.contains_key(k));
            if !known {
                return Err(Error::ConfigValidation(
                    schema.to_string(),
                    format!("Unknown setting {}", render(key)),
                ));
            }
        }

        let mut out = Mapping::new();
        for (name, spec) in &fields {
            let path = format!("{}:{}", schema, name);
            let supplied = input.get(name.as_str()).filter(|v| !v.is_null());
            let value = match (supplied, &spec.default) {
                (Some(v), _) => convert(&path, spec, v)?,
                (None, Some(default)) => convert(&path, spec, default)?,
                (None, None) if spec.required => {
                    return Err(Error::ConfigValidation(
                        path,
                        "Required setting missing".to_string(),
                    ))
                }
                (None, None) => continue,
            };
            out.insert(Value::String(name.clone()), value);
        }

        Ok(out)
    }

    /// Validates and deserializes into a typed value.
    pub fn validate_into<T: DeserializeOwned>(
        &self,
        schema: &str,
        data: &Value,
        base: Option<&str>,
    ) -> Result<T> {
        let normalized = self.validate(schema, data, base)?;
        serde_yaml::from_value(Value::Mapping(normalized))
            .map_err(|e| Error::ConfigValidation(schema.to_string(), e.to_string()))
    }

    fn resolve(&self, schema: &str, base: Option<&str>) -> Result<Schema> {
        let lookup = |name: &str| {
            self.schemas.get(name).ok_or_else(|| {
                Error::ConfigValidation(name.to_string(), "No such config schema".to_string())
            })
        };

        let mut fields = match base {
            Some(base) => lookup(base)?.clone(),
            None => Schema::new(),
        };
        for (name, spec) in lookup(schema)? {
            fields.insert(name.clone(), spec.clone());
        }
        Ok(fields)
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn convert(path: &str, spec: &FieldSpec, value: &Value) -> Result<Value> {
    let converted = match spec.field_type {
        FieldType::List => convert_list(path, spec.item.unwrap_or(FieldType::Any), value)?,
        other => convert_scalar(path, other, value)?,
    };

    if let (Some(options), Value::String(s)) = (&spec.options, &converted) {
        if !options.iter().any(|o| o == s) {
            return Err(Error::ConfigValidation(
                path.to_string(),
                format!("'{}' is not one of {:?}", s, options),
            ));
        }
    }

    Ok(converted)
}

fn convert_list(path: &str, item: FieldType, value: &Value) -> Result<Value> {
    let items: Vec<Value> = match value {
        Value::Sequence(seq) => seq.clone(),
        // "a, b, c" shorthand for string lists
        Value::String(s) if item == FieldType::Str => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .filter(|v| v.as_str().map_or(false, |s| !s.is_empty()))
            .collect(),
        other => vec![other.clone()],
    };

    items
        .iter()
        .map(|v| convert_scalar(path, item, v))
        .collect::<Result<Vec<_>>>()
        .map(Value::Sequence)
}

fn convert_scalar(path: &str, field_type: FieldType, value: &Value) -> Result<Value> {
    let mismatch = || {
        Error::ConfigValidation(
            path.to_string(),
            format!(
                "Expected {}, got {}",
                format!("{:?}", field_type).to_lowercase(),
                describe(value)
            ),
        )
    };

    match field_type {
        FieldType::Any => Ok(value.clone()),
        FieldType::Str => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(mismatch()),
        },
        FieldType::Float => value
            .as_f64()
            .map(|f| Value::Number(Number::from(f)))
            .ok_or_else(mismatch),
        FieldType::Int => value
            .as_i64()
            .map(|i| Value::Number(Number::from(i)))
            .ok_or_else(mismatch),
        FieldType::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        FieldType::List => convert_list(path, FieldType::Any, value),
        FieldType::Dict => match value {
            Value::Mapping(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        FieldType::Time => {
            let seconds = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => parse_time(s),
                _ => None,
            };
            seconds
                .map(|f| Value::Number(Number::from(f)))
                .ok_or_else(mismatch)
        }
        FieldType::Color => parse_color(value)
            .map(|rgba| {
                Value::Sequence(
                    rgba.iter()
                        .map(|c| Value::Number(Number::from(*c as f64)))
                        .collect(),
                )
            })
            .ok_or_else(mismatch),
    }
}

/// Parses a time string into seconds. Bare numbers are seconds.
pub fn parse_time(s: &str) -> Option<f64> {
    let re = Regex::new(r"^\s*([0-9]*\.?[0-9]+)\s*(ms|s)?\s*$").ok()?;
    let caps = re.captures(s)?;
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    match caps.get(2).map(|m| m.as_str()) {
        Some("ms") => Some(amount / 1000.0),
        _ => Some(amount),
    }
}

/// Parses a color into normalized RGBA channels in `[0, 1]`.
pub fn parse_color(value: &Value) -> Option<[f32; 4]> {
    match value {
        Value::String(s) => {
            let hex = s.trim().trim_start_matches('#');
            if hex.len() != 6 && hex.len() != 8 {
                return None;
            }
            let mut rgba = [1.0f32; 4];
            for (i, channel) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
                let byte = u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok()?;
                *channel = byte as f32 / 255.0;
            }
            Some(rgba)
        }
        Value::Sequence(seq) if seq.len() == 3 || seq.len() == 4 => {
            let mut rgba = [1.0f32; 4];
            for (channel, v) in rgba.iter_mut().zip(seq) {
                let raw = v.as_f64()?;
                // 0-255 ints, or already-normalized floats
                *channel = (if raw > 1.0 { raw / 255.0 } else { raw }) as f32;
            }
            Some(rgba)
        }
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "nothing".to_string(),
        Value::Bool(b) => format!("bool {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string '{}'", s),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(t) => format!("tagged value {}", t.tag),
    }
}

fn render(key: &Value) -> String {
    match key {
        Value::String(s) => format!("'{}'", s),
        other => describe(other),
    }
}
