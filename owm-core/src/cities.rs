//! The OpenWeatherMap city list: ids and coordinates of supported cities.
//!
//! The list is a tab-separated text file whose first row holds the column
//! names (`id`, `nm`, `lat`, `lon`, `countryCode`).

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::{fs, path::Path};

pub const CITY_LIST_URL: &str = "http://openweathermap.org/help/city_list.txt";

const NAME_COLUMN: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CityList {
    keys: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CityList {
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let split = |line: &str| line.split('\t').map(str::to_string).collect::<Vec<_>>();

        let keys = lines.next().map(split).unwrap_or_default();
        let rows = lines.map(split).collect();

        Self { keys, rows }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read city list: {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())
            .with_context(|| format!("Failed to write city list: {}", path.display()))
    }

    pub fn to_text(&self) -> String {
        std::iter::once(&self.keys)
            .chain(&self.rows)
            .map(|row| row.join("\t") + "\n")
            .collect()
    }

    /// Column names.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cities whose name contains `query`.
    ///
    /// `query` is either a name (`New York`) or a name with country code
    /// (`New York,US`); the country code is matched case-insensitively
    /// against the last column.
    pub fn search(&self, query: &str) -> Vec<&[String]> {
        let (name, country) = match query.split_once(',') {
            Some((name, country)) => (name.trim(), country.trim().to_uppercase()),
            None => (query.trim(), String::new()),
        };

        self.rows
            .iter()
            .filter(|row| row.get(NAME_COLUMN).is_some_and(|n| n.contains(name)))
            .filter(|row| row.last().is_some_and(|c| c.contains(country.as_str())))
            .map(Vec::as_slice)
            .collect()
    }

    /// Same as `search`, with each row keyed by the column names.
    pub fn search_maps(&self, query: &str) -> Vec<Map<String, Value>> {
        self.search(query)
            .into_iter()
            .map(|row| {
                self.keys
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().map(Value::String))
                    .collect()
            })
            .collect()
    }
}
