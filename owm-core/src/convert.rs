//! Per-path value conversions applied during projection.

use chrono::DateTime;
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc};

pub type Converter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Mapping from path text to a conversion function.
///
/// Paths without an entry pass through unchanged. Keys are compared with
/// the path text exactly as written in the selection.
#[derive(Clone, Default)]
pub struct Converters {
    by_path: HashMap<String, Converter>,
}

impl Converters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, path: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.insert(path, f);
        self
    }

    pub fn insert<F>(&mut self, path: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.by_path.insert(path.into(), Arc::new(f));
    }

    pub fn apply(&self, path: &str, value: Value) -> Value {
        match self.by_path.get(path) {
            Some(f) => f(value),
            None => value,
        }
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self.by_path.keys().collect();
        paths.sort();
        f.debug_struct("Converters").field("paths", &paths).finish()
    }
}

fn map_f64(value: Value, f: impl Fn(f64) -> f64) -> Value {
    match value.as_f64().map(f).and_then(serde_json::Number::from_f64) {
        Some(n) => Value::Number(n),
        None => value,
    }
}

pub fn kelvin_to_celsius(value: Value) -> Value {
    map_f64(value, |k| k - 273.15)
}

pub fn kelvin_to_fahrenheit(value: Value) -> Value {
    map_f64(value, |k| (k - 273.15) * 9.0 / 5.0 + 32.0)
}

/// Unix seconds (as sent in `dt` fields) to an RFC 3339 UTC string.
pub fn unix_to_datetime(value: Value) -> Value {
    match value.as_i64().and_then(|ts| DateTime::from_timestamp(ts, 0)) {
        Some(dt) => Value::String(dt.to_rfc3339()),
        None => value,
    }
}

pub fn round_to(decimals: u32) -> impl Fn(Value) -> Value + Send + Sync + 'static {
    let factor = 10f64.powi(decimals as i32);
    move |value| map_f64(value, |x| (x * factor).round() / factor)
}
