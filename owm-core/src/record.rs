use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    convert::Converters,
    path::{Path, PathError, parse_all},
};

pub const ICON_URL_BASE: &str = "http://openweathermap.org/img/w/";

/// How output mapping keys are derived from selected paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// The whole path text, e.g. `main/temp`.
    FullPath,
    /// Only the last segment, e.g. `temp`.
    #[default]
    LastSegment,
}

impl KeyStyle {
    pub fn key_for<'p>(&self, path: &'p Path) -> &'p str {
        match self {
            KeyStyle::FullPath => path.as_str(),
            KeyStyle::LastSegment => path.last_segment(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("paths '{first}' and '{second}' both map to output key '{key}'")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },
}

/// Derive the output keys for `paths`, rejecting collisions up front.
pub(crate) fn output_keys(paths: &[Path], style: KeyStyle) -> Result<Vec<String>, ProjectionError> {
    let mut keys: Vec<String> = Vec::with_capacity(paths.len());

    for (i, path) in paths.iter().enumerate() {
        let key = style.key_for(path);
        if let Some(j) = keys.iter().position(|k| k == key) {
            return Err(ProjectionError::DuplicateKey {
                key: key.to_string(),
                first: paths[j].to_string(),
                second: paths[i].to_string(),
            });
        }
        keys.push(key.to_string());
    }

    Ok(keys)
}

/// One decoded response (or one entry of a response list) with path access.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    value: Value,
}

impl Record {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn get_one(&self, path: &str) -> Result<&Value, PathError> {
        Path::parse(path)?.resolve(&self.value)
    }

    pub fn get_many<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<Value>, PathError> {
        self.get_many_with(paths, &Converters::default())
    }

    pub fn get_many_with<S: AsRef<str>>(
        &self,
        paths: &[S],
        converters: &Converters,
    ) -> Result<Vec<Value>, PathError> {
        self.row(&parse_all(paths)?, converters)
    }

    /// Same as `get_many_with`, but returns a mapping keyed per `style`.
    pub fn get_map<S: AsRef<str>>(
        &self,
        paths: &[S],
        style: KeyStyle,
        converters: &Converters,
    ) -> Result<Map<String, Value>, ProjectionError> {
        let paths = parse_all(paths)?;
        let keys = output_keys(&paths, style)?;
        let row = self.row(&paths, converters)?;
        Ok(keys.into_iter().zip(row).collect())
    }

    pub(crate) fn row(
        &self,
        paths: &[Path],
        converters: &Converters,
    ) -> Result<Vec<Value>, PathError> {
        paths
            .iter()
            .map(|path| -> Result<Value, PathError> {
                let value = path.resolve(&self.value)?.clone();
                Ok(converters.apply(path.as_str(), value))
            })
            .collect()
    }

    /// Icon URL for the first `weather` entry.
    pub fn icon_url(&self) -> Result<String, PathError> {
        let icon = self.get_one("weather/[0]/icon")?;
        let name = match icon {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(icon_url(&name))
    }
}

pub fn icon_url(icon: &str) -> String {
    format!("{ICON_URL_BASE}{icon}.png")
}
