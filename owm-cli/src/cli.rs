use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select, Text};
use owm_core::{
    CityList, Client, Endpoint, Location, Path, Query, Response, Settings, Units, Views,
    path::parse_all, settings::API_KEY_ENV,
};
use std::path::PathBuf;
use tracing::info;

use crate::output::{Format, Printer};

const LOCATION_HELP: &str = "City name (`Kassel,DE`), city id, comma-separated ids, or \
    `lat,lon`. Two whole numbers within coordinate range (`51,9`) are a coordinate.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "owm", version, about = "OpenWeatherMap CLI")]
pub struct Cli {
    /// More log output (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print selected values as JSON instead of a table.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Which paths to extract from each record.
#[derive(Debug, Args)]
pub struct Selection {
    /// Named view from the views file (or a builtin one).
    #[arg(long)]
    view: Option<String>,

    /// Path to extract, e.g. `main/temp`; repeatable, overrides --view.
    #[arg(long = "path", short = 'p')]
    paths: Vec<String>,
}

impl Selection {
    fn resolve(&self, views: &Views, fallback_view: &str) -> anyhow::Result<Vec<Path>> {
        if !self.paths.is_empty() {
            return Ok(parse_all(&self.paths)?);
        }
        views.get(self.view.as_deref().unwrap_or(fallback_view))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store API key, units and language.
    Configure {
        #[arg(long)]
        api_key: Option<String>,

        /// standard, metric or imperial.
        #[arg(long)]
        units: Option<String>,

        #[arg(long)]
        lang: Option<String>,

        /// JSON file mapping view names to path lists.
        #[arg(long)]
        views: Option<PathBuf>,
    },

    /// Current weather for a city name, id or `lat,lon`.
    Current {
        #[arg(help = LOCATION_HELP)]
        location: String,

        #[command(flatten)]
        selection: Selection,
    },

    /// Forecast for a city name, id or `lat,lon`.
    Forecast {
        #[arg(help = LOCATION_HELP)]
        location: String,

        /// Daily instead of 3-hourly forecast.
        #[arg(long)]
        daily: bool,

        /// Number of days for --daily.
        #[arg(long)]
        days: Option<u32>,

        #[command(flatten)]
        selection: Selection,
    },

    /// Current weather for several city ids at once.
    Group {
        #[arg(required = true)]
        ids: Vec<u64>,

        #[command(flatten)]
        selection: Selection,
    },

    /// Search cities by name or around `lat,lon`.
    Find {
        #[arg(help = LOCATION_HELP)]
        location: String,

        #[arg(long)]
        count: Option<u32>,

        #[command(flatten)]
        selection: Selection,
    },

    /// Weather stations near a coordinate.
    #[command(allow_negative_numbers = true)]
    Stations {
        lat: f64,
        lon: f64,

        #[arg(long, default_value_t = 10)]
        count: u32,

        #[command(flatten)]
        selection: Selection,
    },

    /// Look up city ids in the city list.
    Cities {
        /// Name, or name with country code: `New York,US`.
        query: String,

        /// Local copy of the city list instead of downloading it.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Save the downloaded list to this file.
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List available views.
    Views,
}

/// Everything a fetching command needs, loaded once per invocation.
struct Session {
    settings: Settings,
    views: Views,
    client: Client,
}

impl Session {
    fn load() -> anyhow::Result<Self> {
        let settings = Settings::load()?;
        let views = Views::load_or_builtin(settings.views_file.as_deref())?;
        let client = Client::from_settings(&settings);
        Ok(Self {
            settings,
            views,
            client,
        })
    }

    /// Like `load`, but fails early when no API key is available.
    fn authenticated() -> anyhow::Result<Self> {
        let session = Self::load()?;
        session.settings.require_api_key()?;
        Ok(session)
    }

    /// Request `endpoint` and print the selected paths of the response.
    async fn show(
        &self,
        endpoint: &Endpoint,
        query: Query,
        selection: &Selection,
        fallback_view: &str,
        format: Format,
    ) -> anyhow::Result<()> {
        let paths = selection.resolve(&self.views, fallback_view)?;
        let response = self.client.request(endpoint, query).await?;

        if let Response::Split { meta, .. } = &response {
            if let Some(title) = city_title(meta.as_value()) {
                println!("# {title}");
            }
        }

        let printer = Printer {
            format,
            units: self.settings.units,
        };
        printer.response(&response, &paths)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let format = if self.json { Format::Json } else { Format::Table };

        match self.command {
            Command::Configure {
                api_key,
                units,
                lang,
                views,
            } => {
                configure(api_key, units, lang, views)?;
            }
            Command::Current {
                location,
                selection,
            } => {
                let query = Query::new().location(Location::parse(&location));
                Session::authenticated()?
                    .show(&Endpoint::CURRENT, query, &selection, "default", format)
                    .await?;
            }
            Command::Forecast {
                location,
                daily,
                days,
                selection,
            } => {
                let query = Query::new().location(Location::parse(&location));
                let (endpoint, query) = match (daily, days) {
                    (true, Some(days)) => (&Endpoint::FORECAST_DAILY, query.param("cnt", days)),
                    (true, None) => (&Endpoint::FORECAST_DAILY, query),
                    (false, _) => (&Endpoint::FORECAST, query),
                };
                Session::authenticated()?
                    .show(endpoint, query, &selection, "forecast", format)
                    .await?;
            }
            Command::Group { ids, selection } => {
                let query = Query::new().location(Location::Ids(ids));
                Session::authenticated()?
                    .show(&Endpoint::GROUP, query, &selection, "default", format)
                    .await?;
            }
            Command::Find {
                location,
                count,
                selection,
            } => {
                let mut query = Query::new().location(Location::parse(&location));
                if let Some(count) = count {
                    query = query.param("cnt", count);
                }
                Session::authenticated()?
                    .show(&Endpoint::FIND, query, &selection, "default", format)
                    .await?;
            }
            Command::Stations {
                lat,
                lon,
                count,
                selection,
            } => {
                let query = Query::new().location((lat, lon)).param("cnt", count);
                Session::authenticated()?
                    .show(&Endpoint::STATION_FIND, query, &selection, "stations", format)
                    .await?;
            }
            Command::Cities { query, file, save } => {
                let cities = match file {
                    Some(path) => CityList::load(&path)?,
                    None => Session::load()?
                        .client
                        .city_list()
                        .await
                        .context("Failed to download city list")?,
                };
                if let Some(path) = save {
                    cities.save(&path)?;
                    info!(path = %path.display(), "saved city list");
                }

                let matches = cities.search(&query);
                if matches.is_empty() {
                    return Err(anyhow!("No city matches '{query}'."));
                }
                match format {
                    Format::Json => {
                        println!("{}", serde_json::to_string_pretty(&cities.search_maps(&query))?)
                    }
                    Format::Table => {
                        println!("{}", cities.keys().join("\t"));
                        for row in matches {
                            println!("{}", row.join("\t"));
                        }
                    }
                }
            }
            Command::Views => {
                let session = Session::load()?;
                for name in session.views.names() {
                    let paths = session.views.raw(name).unwrap_or_default();
                    println!("{name}: {}", paths.join(", "));
                }
            }
        }

        Ok(())
    }
}

/// `Kassel, DE` from the `city` object of forecast metadata.
fn city_title(meta: &serde_json::Value) -> Option<String> {
    let city = meta.get("city")?;
    let name = city.get("name")?.as_str()?;
    match city.get("country").and_then(|c| c.as_str()) {
        Some(country) => Some(format!("{name}, {country}")),
        None => Some(name.to_string()),
    }
}

fn configure(
    api_key: Option<String>,
    units: Option<String>,
    lang: Option<String>,
    views: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut settings = Settings::load()?;
    let interactive = api_key.is_none() && units.is_none() && lang.is_none() && views.is_none();

    match api_key {
        Some(key) => settings.set_api_key(key),
        None if interactive || settings.api_key.is_none() => {
            let key = Password::new("OpenWeatherMap API key:")
                .without_confirmation()
                .with_help_message(&format!(
                    "Stored in the config file; {API_KEY_ENV} overrides it"
                ))
                .prompt()
                .context("Failed to read API key")?;
            settings.set_api_key(key.trim().to_string());
        }
        None => {}
    }

    if let Some(units) = units {
        settings.units = Units::try_from(units.as_str())?;
    } else if interactive {
        let current = Units::all().iter().position(|u| *u == settings.units).unwrap_or(0);
        settings.units = Select::new("Units:", Units::all().to_vec())
            .with_starting_cursor(current)
            .prompt()
            .context("Failed to read units")?;
    }

    if let Some(lang) = lang {
        settings.lang = lang;
    } else if interactive {
        settings.lang = Text::new("Language:")
            .with_default(&settings.lang)
            .prompt()
            .context("Failed to read language")?;
    }

    if let Some(path) = views {
        Views::load(&path)?;
        settings.views_file = Some(path);
    }

    settings.save()?;
    println!("Saved configuration to {}", Settings::config_file_path()?.display());

    Ok(())
}
