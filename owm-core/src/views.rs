use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path as FsPath};

use crate::{
    endpoint::Units,
    path::{Path, parse_all},
};

const TEMPERATURES: &[&str] = &[
    "main/temp",
    "main/temp_min",
    "main/temp_max",
    "main/feels_like",
    "last/main/temp",
    "temp/day",
    "temp/min",
    "temp/max",
    "temp/night",
];

/// Named lists of paths to extract, e.g. `"minimal": ["main/temp", "wind/speed"]`.
///
/// Example JSON:
/// {
///   "default": ["name", "main/temp"],
///   "forecast": ["dt_txt", "main/temp"]
/// }
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Views {
    views: BTreeMap<String, Vec<String>>,
}

impl Views {
    /// Views available without any config file.
    pub fn builtin() -> Self {
        let minimal = ["main/temp", "main/humidity", "wind/speed"];
        let default = ["name"].into_iter().chain(minimal);
        let forecast = ["dt_txt"]
            .into_iter()
            .chain(minimal)
            .chain(["weather/[0]/description"]);

        let stations = ["station/name", "distance", "last/main/temp"];

        let mut views = BTreeMap::new();
        views.insert("default".to_string(), default.map(String::from).collect());
        views.insert("minimal".to_string(), minimal.map(String::from).to_vec());
        views.insert("forecast".to_string(), forecast.map(String::from).collect());
        views.insert("stations".to_string(), stations.map(String::from).to_vec());

        Self { views }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to parse views JSON")
    }

    pub fn load(path: &FsPath) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read views file: {}", path.display()))?;

        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid views file: {}", path.display()))
    }

    /// Builtin views overlaid with the ones from `path`, if given.
    pub fn load_or_builtin(path: Option<&FsPath>) -> Result<Self> {
        let mut views = Self::builtin();
        if let Some(path) = path {
            views.merge(Self::load(path)?);
        }
        Ok(views)
    }

    /// Entries of `other` replace same-named entries of `self`.
    pub fn merge(&mut self, other: Views) {
        self.views.extend(other.views);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn raw(&self, name: &str) -> Option<&[String]> {
        self.views.get(name).map(Vec::as_slice)
    }

    /// Parsed paths of view `name`.
    pub fn get(&self, name: &str) -> Result<Vec<Path>> {
        let raw = self.raw(name).ok_or_else(|| {
            anyhow!(
                "Unknown view '{name}'. Available views: {}.",
                self.names().collect::<Vec<_>>().join(", ")
            )
        })?;

        parse_all(raw).with_context(|| format!("View '{name}' contains an invalid path"))
    }
}

/// Display unit of a well-known path under `units`, e.g. `°C` for
/// `main/temp` with metric units. Unknown paths have no unit.
pub fn unit_label(path: &str, units: Units) -> Option<&'static str> {
    if TEMPERATURES.contains(&path) {
        return Some(match units {
            Units::Standard => "K",
            Units::Metric => "°C",
            Units::Imperial => "°F",
        });
    }

    let label = match path {
        "main/humidity" | "clouds/all" | "humidity" | "clouds" => "%",
        "main/pressure" | "main/sea_level" | "main/grnd_level" | "pressure" => "hPa",
        "wind/speed" | "wind/gust" | "speed" => match units {
            Units::Imperial => "mph",
            Units::Standard | Units::Metric => "m/s",
        },
        "wind/deg" | "deg" => "°",
        "distance" => "km",
        _ => return None,
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_views() {
        let views = Views::builtin();
        assert_eq!(
            views.raw("default").unwrap(),
            &["name", "main/temp", "main/humidity", "wind/speed"]
        );
        assert_eq!(views.raw("minimal").unwrap().len(), 3);
        assert_eq!(views.raw("forecast").unwrap().last().unwrap(), "weather/[0]/description");
    }

    #[test]
    fn parses_json_mapping() {
        let views = Views::from_json_str(r#"{"short": ["name", "main/temp"]}"#).unwrap();
        let paths = views.get("short").unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[1].last_segment(), "temp");
    }

    #[test]
    fn unknown_view_lists_available_names() {
        let err = Views::builtin().get("nope").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown view 'nope'"));
        assert!(msg.contains("default, forecast, minimal, stations"));
    }

    #[test]
    fn invalid_path_in_view_is_reported() {
        let views = Views::from_json_str(r#"{"bad": ["list/[one]"]}"#).unwrap();
        let err = views.get("bad").unwrap_err();
        assert!(err.to_string().contains("View 'bad' contains an invalid path"));
    }

    #[test]
    fn unit_labels_follow_unit_system() {
        assert_eq!(unit_label("main/temp", Units::Standard), Some("K"));
        assert_eq!(unit_label("main/temp", Units::Metric), Some("°C"));
        assert_eq!(unit_label("temp/day", Units::Imperial), Some("°F"));
        assert_eq!(unit_label("wind/speed", Units::Imperial), Some("mph"));
        assert_eq!(unit_label("wind/speed", Units::Metric), Some("m/s"));
        assert_eq!(unit_label("main/humidity", Units::Imperial), Some("%"));
        assert_eq!(unit_label("name", Units::Metric), None);
    }

    #[test]
    fn merge_overrides_builtin() {
        let mut views = Views::builtin();
        views.merge(Views::from_json_str(r#"{"default": ["name"]}"#).unwrap());
        assert_eq!(views.raw("default").unwrap(), &["name"]);
        assert!(views.raw("minimal").is_some());
    }
}
