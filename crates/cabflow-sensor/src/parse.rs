//! Request payload parsers.
//!
//! A request file must decode to a mapping; anything else (arrays, scalars,
//! empty documents) is rejected so the poller can name the offending file.

use serde_json::Value;

use cabflow_core::config::normalize_extension;
use cabflow_core::error::{Error, Result};
use cabflow_core::trigger::Payload;

/// Turns raw file bytes into a structured payload.
///
/// Errors are plain strings; the poller wraps them with the file name.
pub trait RequestParser {
    fn parse(&self, bytes: &[u8]) -> std::result::Result<Payload, String>;
}

impl<T: RequestParser + ?Sized> RequestParser for Box<T> {
    fn parse(&self, bytes: &[u8]) -> std::result::Result<Payload, String> {
        (**self).parse(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl RequestParser for JsonParser {
    fn parse(&self, bytes: &[u8]) -> std::result::Result<Payload, String> {
        let v: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        into_mapping(v)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl RequestParser for YamlParser {
    fn parse(&self, bytes: &[u8]) -> std::result::Result<Payload, String> {
        let v: Value = serde_yaml::from_slice(bytes).map_err(|e| e.to_string())?;
        into_mapping(v)
    }
}

fn into_mapping(v: Value) -> std::result::Result<Payload, String> {
    match v {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "expected a mapping at the top level, found {}",
            kind(&other)
        )),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

/// Pick the parser for a watched extension.
pub fn parser_for_extension(extension: &str) -> Result<Box<dyn RequestParser>> {
    match normalize_extension(extension).as_str() {
        "json" => Ok(Box::new(JsonParser)),
        "yaml" | "yml" => Ok(Box::new(YamlParser)),
        other => Err(Error::Config(format!(
            "no request parser for extension '{other}'"
        ))),
    }
}
