use owm_core::{
    Collection, Converters, KeyStyle, Path, Record, Response, Units, views::unit_label,
};
use serde_json::Value;

/// Output format for selected rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Table,
    Json,
}

/// Renders selected values; `units` only labels table headers.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    pub format: Format,
    pub units: Units,
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn line(row: &[Value]) -> String {
    row.iter().map(cell).collect::<Vec<_>>().join("\t")
}

impl Printer {
    fn header(&self, paths: &[Path]) -> String {
        paths
            .iter()
            .map(|path| match unit_label(path.as_str(), self.units) {
                Some(unit) => format!("{} ({unit})", path.last_segment()),
                None => path.last_segment().to_string(),
            })
            .collect::<Vec<_>>()
            .join("\t")
    }

    pub fn record(&self, record: &Record, paths: &[Path]) -> anyhow::Result<()> {
        match self.format {
            Format::Table => {
                let row = record.get_many(paths)?;
                println!("{}", self.header(paths));
                println!("{}", line(&row));
            }
            Format::Json => {
                let map = record.get_map(paths, KeyStyle::LastSegment, &Converters::new())?;
                println!("{}", serde_json::to_string_pretty(&map)?);
            }
        }
        Ok(())
    }

    pub fn collection(&self, list: &Collection, paths: &[Path]) -> anyhow::Result<()> {
        match self.format {
            Format::Table => {
                let rows = list.select(paths)?;
                println!("{}", self.header(paths));
                for row in rows {
                    println!("{}", line(&row));
                }
            }
            Format::Json => {
                let maps =
                    list.select_as_mappings(paths, KeyStyle::LastSegment, &Converters::new())?;
                println!("{}", serde_json::to_string_pretty(&maps)?);
            }
        }
        Ok(())
    }

    /// List entries when the response has any, otherwise its single record.
    pub fn response(&self, response: &Response, paths: &[Path]) -> anyhow::Result<()> {
        match (response.list(), response.record()) {
            (Some(list), _) => self.collection(list, paths),
            (None, Some(record)) => self.record(record, paths),
            (None, None) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use owm_core::path::parse_all;
    use serde_json::json;

    #[test]
    fn cells_render_strings_bare() {
        assert_eq!(cell(&json!("Kassel")), "Kassel");
        assert_eq!(cell(&json!(280.32)), "280.32");
        assert_eq!(cell(&json!(null)), "-");
        assert_eq!(line(&[json!("a"), json!(1)]), "a\t1");
    }

    #[test]
    fn header_uses_last_segments_and_units() {
        let paths = parse_all(&["name", "main/temp", "wind/speed", "weather/[0]/icon"]).unwrap();
        let printer = Printer {
            format: Format::Table,
            units: Units::Metric,
        };
        assert_eq!(printer.header(&paths), "name\ttemp (°C)\tspeed (m/s)\ticon");

        let imperial = Printer {
            units: Units::Imperial,
            ..printer
        };
        assert_eq!(imperial.header(&paths), "name\ttemp (°F)\tspeed (mph)\ticon");
    }

    #[test]
    fn response_reports_missing_paths() {
        let printer = Printer {
            format: Format::Json,
            units: Units::Standard,
        };
        let paths = parse_all(&["main/temp"]).unwrap();

        let single = Response::Single(Record::new(json!({"main": {"temp": 280.0}})));
        assert!(printer.response(&single, &paths).is_ok());

        let list = Response::List(Collection::new(vec![json!({"name": "EDVK"})]));
        assert!(printer.response(&list, &paths).is_err());
    }
}
