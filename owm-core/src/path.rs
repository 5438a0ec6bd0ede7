//! Path-like access into decoded JSON trees.
//!
//! A path is a `/`-separated list of segments. A segment is either a mapping
//! key (`main`, `temp`) or a sequence index written as `[N]`:
//!
//! ```rust
//! use owm_core::path::resolve;
//! use serde_json::json;
//!
//! let data = json!({"main": {"temp": 280.32}, "weather": [{"icon": "01d"}]});
//! assert_eq!(resolve(&data, "main/temp").unwrap(), &json!(280.32));
//! assert_eq!(resolve(&data, "weather/[0]/icon").unwrap(), &json!("01d"));
//! ```
//!
//! There is no escaping: keys containing `/`, `[` or `]` cannot be addressed.
//! Index digits too large for `usize` saturate, so they always fail with
//! [`PathError::IndexOutOfRange`] at resolve time.

use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::trace;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Errors raised while parsing or resolving a path.
///
/// Every variant except `Empty` names the full path and the segment at which
/// resolution stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("invalid key segment '{segment}' in path '{path}'")]
    MalformedKey { path: String, segment: String },

    #[error(
        "invalid index segment '{segment}' in path '{path}': expected [<non-negative integer>]"
    )]
    MalformedIndex { path: String, segment: String },

    #[error("key '{segment}' not found (path '{path}')")]
    MissingKey { path: String, segment: String },

    #[error(
        "index {index} out of range for sequence of length {len} at '{segment}' (path '{path}')"
    )]
    IndexOutOfRange {
        path: String,
        segment: String,
        index: usize,
        len: usize,
    },

    #[error("expected {expected} at '{segment}' but found {found} (path '{path}')")]
    TypeMismatch {
        path: String,
        segment: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// One unit of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn parse(raw: &str, path: &str) -> Result<Self, PathError> {
        if raw.starts_with('[') {
            let digits = raw
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()));

            return digits
                .map(|d| Segment::Index(d.parse().unwrap_or(usize::MAX)))
                .ok_or_else(|| PathError::MalformedIndex {
                    path: path.to_string(),
                    segment: raw.to_string(),
                });
        }

        if raw.is_empty() || raw.contains(['[', ']']) {
            return Err(PathError::MalformedKey {
                path: path.to_string(),
                segment: raw.to_string(),
            });
        }

        Ok(Segment::Key(raw.to_string()))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A parsed, validated path.
///
/// The original text is kept so that error messages and derived mapping keys
/// match what was written in the view file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    raw: String,
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = raw
            .split(SEPARATOR)
            .map(|segment| Segment::parse(segment, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Raw text of the final segment, e.g. `temp` for `main/temp`.
    pub fn last_segment(&self) -> &str {
        self.raw.rsplit(SEPARATOR).next().unwrap_or(&self.raw)
    }

    /// Walk `value` segment by segment.
    pub fn resolve<'a>(&self, value: &'a Value) -> Result<&'a Value, PathError> {
        let mut cursor = value;

        for segment in &self.segments {
            cursor = self.step(cursor, segment)?;
        }

        trace!(path = %self.raw, "resolved");
        Ok(cursor)
    }

    fn step<'a>(&self, cursor: &'a Value, segment: &Segment) -> Result<&'a Value, PathError> {
        match (segment, cursor) {
            (Segment::Key(key), Value::Object(map)) => {
                map.get(key).ok_or_else(|| PathError::MissingKey {
                    path: self.raw.clone(),
                    segment: key.clone(),
                })
            }
            (Segment::Index(index), Value::Array(items)) => {
                items.get(*index).ok_or_else(|| PathError::IndexOutOfRange {
                    path: self.raw.clone(),
                    segment: segment.to_string(),
                    index: *index,
                    len: items.len(),
                })
            }
            (Segment::Key(_), other) => Err(self.mismatch(segment, "object", other)),
            (Segment::Index(_), other) => Err(self.mismatch(segment, "array", other)),
        }
    }

    fn mismatch(&self, segment: &Segment, expected: &'static str, found: &Value) -> PathError {
        PathError::TypeMismatch {
            path: self.raw.clone(),
            segment: segment.to_string(),
            expected,
            found: kind(found),
        }
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// Parse a list of path strings, failing on the first invalid one.
pub fn parse_all<S: AsRef<str>>(paths: &[S]) -> Result<Vec<Path>, PathError> {
    paths.iter().map(|p| Path::parse(p.as_ref())).collect()
}

/// Resolve a single path string against `value`.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    Path::parse(path)?.resolve(value)
}

/// Resolve several paths, in order. The first failure aborts the call.
pub fn resolve_many<'a, S: AsRef<str>>(
    value: &'a Value,
    paths: &[S],
) -> Result<Vec<&'a Value>, PathError> {
    paths.iter().map(|p| resolve(value, p.as_ref())).collect()
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "main": {"temp": 280.32, "humidity": 81},
            "wind": {"speed": 4.1},
            "name": "Kassel",
            "weather": [{"id": 800, "icon": "01d"}, {"id": 701, "icon": "50d"}]
        })
    }

    #[test]
    fn single_segment_matches_direct_access() {
        let data = sample();
        assert_eq!(resolve(&data, "name").unwrap(), &data["name"]);
        assert_eq!(resolve(&data, "main").unwrap(), &data["main"]);

        let list = json!([10, 20, 30]);
        assert_eq!(resolve(&list, "[2]").unwrap(), &list[2]);
    }

    #[test]
    fn multi_segment_equals_iterated_access() {
        let data = sample();
        let direct = resolve(&data, "weather/[1]/icon").unwrap();
        let weather = resolve(&data, "weather").unwrap();
        let stepped = resolve(resolve(weather, "[1]").unwrap(), "icon").unwrap();
        assert_eq!(direct, stepped);
        assert_eq!(direct, &json!("50d"));
    }

    #[test]
    fn resolve_many_keeps_order() {
        let data = sample();
        let values = resolve_many(&data, &["name", "main/temp", "wind/speed"]).unwrap();
        assert_eq!(values, vec![&json!("Kassel"), &json!(280.32), &json!(4.1)]);
    }

    #[test]
    fn resolve_many_fails_as_a_whole() {
        let data = sample();
        let err = resolve_many(&data, &["name", "main/pressure"]).unwrap_err();
        assert_eq!(
            err,
            PathError::MissingKey {
                path: "main/pressure".into(),
                segment: "pressure".into(),
            }
        );
    }

    #[test]
    fn index_into_empty_sequence_fails() {
        let err = resolve(&json!([]), "[0]").unwrap_err();
        assert!(matches!(err, PathError::IndexOutOfRange { index: 0, len: 0, .. }));
    }

    #[test]
    fn key_into_scalar_fails() {
        let data = sample();
        let err = resolve(&data, "name/first").unwrap_err();
        assert_eq!(
            err,
            PathError::TypeMismatch {
                path: "name/first".into(),
                segment: "first".into(),
                expected: "object",
                found: "string",
            }
        );
    }

    #[test]
    fn index_into_object_fails() {
        let err = resolve(&sample(), "main/[0]").unwrap_err();
        assert!(matches!(
            err,
            PathError::TypeMismatch { expected: "array", found: "object", .. }
        ));
    }

    #[test]
    fn oversized_index_is_out_of_range() {
        let path = Path::parse("[99999999999999999999]").unwrap();
        assert_eq!(path.segments(), &[Segment::Index(usize::MAX)]);

        let err = path.resolve(&json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            PathError::IndexOutOfRange { index: usize::MAX, len: 2, .. }
        ));
    }

    #[test]
    fn malformed_index_segments_are_rejected() {
        for bad in ["[x]", "[-1]", "[ 1]", "[1", "[]", "[1]x"] {
            let err = Path::parse(bad).unwrap_err();
            assert!(matches!(err, PathError::MalformedIndex { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert_eq!(Path::parse(""), Err(PathError::Empty));
        assert!(matches!(Path::parse("main//temp"), Err(PathError::MalformedKey { .. })));
        assert!(matches!(Path::parse("a]b"), Err(PathError::MalformedKey { .. })));
    }

    #[test]
    fn dot_is_an_ordinary_key_character() {
        let data = json!({"main.temp": 1, "main": {"temp": 2}});
        assert_eq!(resolve(&data, "main.temp").unwrap(), &json!(1));
    }

    #[test]
    fn display_round_trips_and_last_segment() {
        let path: Path = "weather/[0]/icon".parse().unwrap();
        assert_eq!(path.to_string(), "weather/[0]/icon");
        assert_eq!(path.last_segment(), "icon");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("weather".into()),
                Segment::Index(0),
                Segment::Key("icon".into())
            ]
        );

        let index_only: Path = "[3]".parse().unwrap();
        assert_eq!(index_only.last_segment(), "[3]");
    }
}
