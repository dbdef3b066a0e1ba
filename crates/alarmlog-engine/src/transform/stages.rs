use std::sync::Arc;

use alarmlog_core::Geolocator;
use async_trait::async_trait;
use serde_json::Value;

use super::{LogLine, Transformer};
use crate::html::encode_html;

/// Preferred key carrying the client address.
pub const PRIMARY_IP_KEY: &str = "forwarded-for-ip";
/// Fallback key carrying the client address.
pub const SECONDARY_IP_KEY: &str = "ip";

const GEOLOCATION_KEY: &str = "geolocation";

/// Parses text as JSON, keeping the raw text when it is not valid JSON.
pub struct JsonDecode;

#[async_trait]
impl Transformer for JsonDecode {
    fn name(&self) -> &'static str {
        "json-decode"
    }

    async fn apply(&self, line: LogLine) -> LogLine {
        match line {
            LogLine::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => LogLine::Structured(value),
                Err(_) => LogLine::Text(text),
            },
            structured => structured,
        }
    }
}

/// Adds a `geolocation` field to objects that carry a client address.
pub struct Geolocate {
    geolocator: Arc<dyn Geolocator>,
}

impl Geolocate {
    pub fn new(geolocator: Arc<dyn Geolocator>) -> Self {
        Self { geolocator }
    }
}

#[async_trait]
impl Transformer for Geolocate {
    fn name(&self) -> &'static str {
        "geolocate"
    }

    async fn apply(&self, line: LogLine) -> LogLine {
        let mut fields = match line {
            LogLine::Structured(Value::Object(fields)) => fields,
            other => return other,
        };
        if !fields.contains_key(PRIMARY_IP_KEY) && !fields.contains_key(SECONDARY_IP_KEY) {
            return LogLine::Structured(Value::Object(fields));
        }

        let address = fields
            .get(PRIMARY_IP_KEY)
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty())
            .or_else(|| fields.get(SECONDARY_IP_KEY).and_then(Value::as_str));

        let location = address
            .and_then(|a| self.geolocator.lookup(a))
            .unwrap_or(Value::Null);
        fields.insert(GEOLOCATION_KEY.to_string(), location);
        LogLine::Structured(Value::Object(fields))
    }
}

/// Renders structured values as two-space indented JSON.
pub struct PrettyPrint;

#[async_trait]
impl Transformer for PrettyPrint {
    fn name(&self) -> &'static str {
        "pretty-print"
    }

    async fn apply(&self, line: LogLine) -> LogLine {
        match line {
            LogLine::Structured(value @ (Value::Object(_) | Value::Array(_))) => {
                match serde_json::to_string_pretty(&value) {
                    Ok(text) => LogLine::Text(text),
                    Err(_) => LogLine::Structured(value),
                }
            }
            LogLine::Structured(Value::String(text)) => LogLine::Text(text),
            LogLine::Structured(scalar) => LogLine::Text(scalar.to_string()),
            text => text,
        }
    }
}

/// Escapes the textual form for embedding in HTML.
pub struct HtmlEncode;

#[async_trait]
impl Transformer for HtmlEncode {
    fn name(&self) -> &'static str {
        "html-encode"
    }

    async fn apply(&self, line: LogLine) -> LogLine {
        LogLine::Text(encode_html(&line.into_text()))
    }
}
