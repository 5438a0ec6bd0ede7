//! Descriptions of the OpenWeatherMap endpoints and their query parameters.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};
use thiserror::Error;

/// How a decoded response is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// One record, e.g. current weather for one city.
    Single,
    /// Metadata plus a `list` field of entries.
    Split,
    /// A bare JSON array of entries.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    /// Path below the API base url.
    pub path: &'static str,
    pub shape: ResponseShape,
    /// Query parameters that must be present, besides the API key.
    pub required: &'static [&'static str],
}

impl Endpoint {
    pub const CURRENT: Endpoint = Endpoint {
        name: "current",
        path: "weather",
        shape: ResponseShape::Single,
        required: &[],
    };

    pub const GROUP: Endpoint = Endpoint {
        name: "group",
        path: "group",
        shape: ResponseShape::Split,
        required: &["id"],
    };

    pub const FORECAST: Endpoint = Endpoint {
        name: "forecast",
        path: "forecast",
        shape: ResponseShape::Split,
        required: &[],
    };

    pub const FORECAST_DAILY: Endpoint = Endpoint {
        name: "forecast-daily",
        path: "forecast/daily",
        shape: ResponseShape::Split,
        required: &[],
    };

    pub const FIND: Endpoint = Endpoint {
        name: "find",
        path: "find",
        shape: ResponseShape::Split,
        required: &[],
    };

    pub const BOX_CITY: Endpoint = Endpoint {
        name: "box-city",
        path: "box/city",
        shape: ResponseShape::Split,
        required: &["bbox"],
    };

    pub const STATION: Endpoint = Endpoint {
        name: "station",
        path: "station",
        shape: ResponseShape::Single,
        required: &["id"],
    };

    pub const STATION_FIND: Endpoint = Endpoint {
        name: "station-find",
        path: "station/find",
        shape: ResponseShape::List,
        required: &["lat", "lon"],
    };
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin, metres per second.
    #[default]
    Standard,
    /// Celsius, metres per second.
    Metric,
    /// Fahrenheit, miles per hour.
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Standard, Units::Metric, Units::Imperial]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: standard, metric, imperial."
            )),
        }
    }
}

/// Where to ask for weather.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// City name, optionally with country code: `Kassel,DE`.
    Name(String),
    /// City id from the city list.
    Id(u64),
    Ids(Vec<u64>),
    Coord { lat: f64, lon: f64 },
}

impl Location {
    /// Interpret free text from the command line.
    ///
    /// `2892518` is an id, `2892518,2514256` a list of ids, `51.32,9.5`
    /// a coordinate; anything else is a city name. Two whole numbers that
    /// fit a latitude and longitude (`51,9`) are read as a coordinate.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();

        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        if let [lat, lon] = parts.as_slice() {
            let whole = all_digits(*lat) && all_digits(*lon);
            if let (Ok(lat), Ok(lon)) = (lat.parse::<f64>(), lon.parse::<f64>()) {
                if !whole || (lat <= 90.0 && lon <= 180.0) {
                    return Location::Coord { lat, lon };
                }
            }
        }

        if parts.iter().all(|p| all_digits(*p)) {
            let ids: Vec<u64> = parts.iter().filter_map(|p| p.parse().ok()).collect();
            if ids.len() == parts.len() {
                return match ids.as_slice() {
                    [id] => Location::Id(*id),
                    _ => Location::Ids(ids),
                };
            }
        }

        Location::Name(text.to_string())
    }

    fn params(&self) -> Vec<(String, String)> {
        match self {
            Location::Name(name) => vec![("q".into(), name.clone())],
            Location::Id(id) => vec![("id".into(), id.to_string())],
            Location::Ids(ids) => vec![(
                "id".into(),
                ids.iter().map(u64::to_string).collect::<Vec<_>>().join(","),
            )],
            Location::Coord { lat, lon } => {
                vec![("lat".into(), lat.to_string()), ("lon".into(), lon.to_string())]
            }
        }
    }
}

impl From<&str> for Location {
    fn from(text: &str) -> Self {
        Location::Name(text.to_string())
    }
}

impl From<u64> for Location {
    fn from(id: u64) -> Self {
        Location::Id(id)
    }
}

impl From<(f64, f64)> for Location {
    fn from((lat, lon): (f64, f64)) -> Self {
        Location::Coord { lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("endpoint '{endpoint}' requires query parameter '{param}'")]
    MissingParam {
        endpoint: &'static str,
        param: &'static str,
    },
}

/// Ordered query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    location: Option<Location>,
    units: Option<Units>,
    lang: Option<String>,
    extra: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(mut self, location: impl Into<Location>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = Some(units);
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.push((key.into(), value.to_string()));
        self
    }

    /// Defaults for settings the caller did not set on this query.
    pub(crate) fn or_defaults(mut self, units: Units, lang: &str) -> Self {
        self.units.get_or_insert(units);
        if self.lang.is_none() {
            self.lang = Some(lang.to_string());
        }
        self
    }

    /// Final parameter list for `endpoint`, with the API key appended last.
    pub fn build(
        &self,
        endpoint: &Endpoint,
        api_key: Option<&str>,
    ) -> Result<Vec<(String, String)>, QueryError> {
        let mut params = self.location.as_ref().map(Location::params).unwrap_or_default();

        if let Some(units) = self.units {
            params.push(("units".into(), units.as_str().into()));
        }
        if let Some(lang) = &self.lang {
            params.push(("lang".into(), lang.clone()));
        }
        params.extend(self.extra.iter().cloned());

        for &param in endpoint.required {
            if !params.iter().any(|(k, _)| k == param) {
                return Err(QueryError::MissingParam {
                    endpoint: endpoint.name,
                    param,
                });
            }
        }

        if let Some(key) = api_key {
            params.push(("appid".into(), key.to_string()));
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
        assert!(Units::try_from("kelvin").unwrap_err().to_string().contains("Unknown units"));
    }

    #[test]
    fn location_parse() {
        assert_eq!(Location::parse("Kassel,DE"), Location::Name("Kassel,DE".into()));
        assert_eq!(Location::parse("2892518"), Location::Id(2892518));
        assert_eq!(Location::parse("2892518, 2514256"), Location::Ids(vec![2892518, 2514256]));
        assert_eq!(Location::parse("51.32,9.5"), Location::from((51.32, 9.5)));
        assert_eq!(Location::parse("New York,US"), Location::Name("New York,US".into()));
    }

    #[test]
    fn whole_number_pairs_in_range_are_coordinates() {
        assert_eq!(Location::parse("51,9"), Location::from((51.0, 9.0)));
        assert_eq!(Location::parse("90, 180"), Location::from((90.0, 180.0)));
        assert_eq!(Location::parse("91,9"), Location::Ids(vec![91, 9]));
        assert_eq!(Location::parse("1,2,3"), Location::Ids(vec![1, 2, 3]));
        assert_eq!(Location::parse("-33,151"), Location::from((-33.0, 151.0)));
    }

    #[test]
    fn build_orders_params() {
        let params = Query::new()
            .location("Kassel,DE")
            .units(Units::Metric)
            .lang("de")
            .param("cnt", 3)
            .build(&Endpoint::FORECAST, Some("KEY"))
            .unwrap();

        assert_eq!(
            pairs(&params),
            vec![
                ("q", "Kassel,DE"),
                ("units", "metric"),
                ("lang", "de"),
                ("cnt", "3"),
                ("appid", "KEY")
            ]
        );
    }

    #[test]
    fn build_joins_ids_and_splits_coords() {
        let params = Query::new()
            .location(Location::Ids(vec![1, 2, 3]))
            .build(&Endpoint::GROUP, None)
            .unwrap();
        assert_eq!(pairs(&params), vec![("id", "1,2,3")]);

        let params = Query::new()
            .location((51.32, 9.5))
            .build(&Endpoint::STATION_FIND, None)
            .unwrap();
        assert_eq!(pairs(&params), vec![("lat", "51.32"), ("lon", "9.5")]);
    }

    #[test]
    fn build_checks_required_params() {
        let err = Query::new().location("Kassel").build(&Endpoint::GROUP, None).unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingParam {
                endpoint: "group",
                param: "id"
            }
        );
    }

    #[test]
    fn defaults_do_not_override_explicit_settings() {
        let query = Query::new().units(Units::Imperial).or_defaults(Units::Metric, "en");
        let params = query.build(&Endpoint::CURRENT, None).unwrap();
        assert_eq!(pairs(&params), vec![("units", "imperial"), ("lang", "en")]);
    }
}
