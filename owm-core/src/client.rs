//! Request pipeline: build query, fetch, decode, shape.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    cities::{CITY_LIST_URL, CityList},
    endpoint::{Endpoint, Location, Query, QueryError, ResponseShape, Units},
    projection::{Collection, ShapeError},
    record::Record,
    settings::{DEFAULT_LANG, Settings},
    split::{LIST_FIELD, split_owned},
};

pub const BASE_URL: &str = "http://api.openweathermap.org/data/2.5";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

#[derive(Debug, Error)]
#[error("response is not valid JSON")]
pub struct DecodeError(#[from] pub serde_json::Error);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Query(#[from] QueryError),

    /// The API answered, but with an error document (`cod` other than 200).
    #[error("OpenWeatherMap returned error {code}: {message}")]
    Api { code: String, message: String },

    #[error("unexpected '{endpoint}' response")]
    Shape {
        endpoint: &'static str,
        #[source]
        source: ShapeError,
    },
}

/// Raw HTTP access used by [`Client`].
#[async_trait]
pub trait Fetch: Send + Sync + Debug {
    async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<Vec<u8>, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http: HttpClient,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>, TransportError> {
        let request_error = |source| TransportError::Request {
            url: url.to_string(),
            source,
        };

        let res = self.http.get(url).query(query).send().await.map_err(request_error)?;

        let status = res.status();
        let body = res.bytes().await.map_err(request_error)?;

        if !status.is_success() {
            warn!(url, %status, "request failed");
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_body(&String::from_utf8_lossy(&body)),
            });
        }

        Ok(body.to_vec())
    }
}

pub fn decode(raw: &[u8]) -> Result<Value, DecodeError> {
    Ok(serde_json::from_slice(raw)?)
}

/// A decoded response, shaped according to its endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Single(Record),
    Split { meta: Record, list: Collection },
    List(Collection),
}

impl Response {
    fn shape(endpoint: &Endpoint, value: Value) -> Result<Self, ShapeError> {
        match endpoint.shape {
            ResponseShape::Single => Ok(Response::Single(Record::new(value))),
            ResponseShape::Split => {
                let (meta, list) = split_owned(value, LIST_FIELD)?;
                Ok(Response::Split { meta, list })
            }
            ResponseShape::List => Ok(Response::List(Collection::try_from(value)?)),
        }
    }

    /// The record of a single-shaped response, or the metadata of a split one.
    pub fn record(&self) -> Option<&Record> {
        match self {
            Response::Single(record) => Some(record),
            Response::Split { meta, .. } => Some(meta),
            Response::List(_) => None,
        }
    }

    pub fn list(&self) -> Option<&Collection> {
        match self {
            Response::Single(_) => None,
            Response::Split { list, .. } | Response::List(list) => Some(list),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client<F = HttpFetcher> {
    base_url: String,
    api_key: Option<String>,
    units: Units,
    lang: String,
    fetcher: F,
}

impl Client<HttpFetcher> {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_key,
            units: Units::default(),
            lang: DEFAULT_LANG.to_string(),
            fetcher: HttpFetcher::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_key())
            .with_units(settings.units)
            .with_lang(settings.lang.clone())
    }
}

impl<F: Fetch> Client<F> {
    pub fn with_fetcher<G: Fetch>(self, fetcher: G) -> Client<G> {
        Client {
            base_url: self.base_url,
            api_key: self.api_key,
            units: self.units,
            lang: self.lang,
            fetcher,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.path)
    }

    /// Fetch and decode without shaping.
    pub async fn fetch_value(
        &self,
        endpoint: &Endpoint,
        query: Query,
    ) -> Result<Value, ClientError> {
        let params = query
            .or_defaults(self.units, &self.lang)
            .build(endpoint, self.api_key.as_deref())?;
        let url = self.url_for(endpoint);

        debug!(%endpoint, url = %url, "fetching");
        let raw = self.fetcher.fetch(&url, &params).await?;
        let value = decode(&raw)?;

        if let Some((code, message)) = api_error(&value) {
            return Err(ClientError::Api { code, message });
        }

        Ok(value)
    }

    pub async fn request(
        &self,
        endpoint: &Endpoint,
        query: Query,
    ) -> Result<Response, ClientError> {
        let value = self.fetch_value(endpoint, query).await?;

        Response::shape(endpoint, value).map_err(|source| shape_error(endpoint, source))
    }

    pub async fn current(&self, location: impl Into<Location>) -> Result<Record, ClientError> {
        let value = self.fetch_value(&Endpoint::CURRENT, Query::new().location(location)).await?;
        Ok(Record::new(value))
    }

    pub async fn current_group(&self, ids: &[u64]) -> Result<(Record, Collection), ClientError> {
        let query = Query::new().location(Location::Ids(ids.to_vec()));
        self.request_split(&Endpoint::GROUP, query).await
    }

    /// 3-hourly forecast.
    pub async fn forecast(
        &self,
        location: impl Into<Location>,
    ) -> Result<(Record, Collection), ClientError> {
        self.request_split(&Endpoint::FORECAST, Query::new().location(location)).await
    }

    pub async fn forecast_daily(
        &self,
        location: impl Into<Location>,
        days: Option<u32>,
    ) -> Result<(Record, Collection), ClientError> {
        let mut query = Query::new().location(location);
        if let Some(days) = days {
            query = query.param("cnt", days);
        }
        self.request_split(&Endpoint::FORECAST_DAILY, query).await
    }

    /// Search cities by name, or around a coordinate.
    pub async fn find(
        &self,
        location: impl Into<Location>,
        count: Option<u32>,
    ) -> Result<(Record, Collection), ClientError> {
        let mut query = Query::new().location(location);
        if let Some(count) = count {
            query = query.param("cnt", count);
        }
        self.request_split(&Endpoint::FIND, query).await
    }

    /// Cities within a bounding box: `lon-left,lat-bottom,lon-right,lat-top,zoom`.
    pub async fn box_city(&self, bbox: &str) -> Result<(Record, Collection), ClientError> {
        self.request_split(&Endpoint::BOX_CITY, Query::new().param("bbox", bbox)).await
    }

    pub async fn station(&self, id: u64) -> Result<Record, ClientError> {
        let value = self.fetch_value(&Endpoint::STATION, Query::new().location(id)).await?;
        Ok(Record::new(value))
    }

    /// Weather stations closest to a coordinate.
    pub async fn stations(
        &self,
        lat: f64,
        lon: f64,
        count: u32,
    ) -> Result<Collection, ClientError> {
        let endpoint = &Endpoint::STATION_FIND;
        let query = Query::new().location((lat, lon)).param("cnt", count);
        let value = self.fetch_value(endpoint, query).await?;

        Collection::try_from(value).map_err(|source| shape_error(endpoint, source))
    }

    pub async fn city_list(&self) -> Result<CityList, ClientError> {
        debug!(url = CITY_LIST_URL, "fetching city list");
        let raw = self.fetcher.fetch(CITY_LIST_URL, &[]).await?;
        Ok(CityList::parse(&String::from_utf8_lossy(&raw)))
    }

    async fn request_split(
        &self,
        endpoint: &Endpoint,
        query: Query,
    ) -> Result<(Record, Collection), ClientError> {
        let value = self.fetch_value(endpoint, query).await?;

        split_owned(value, LIST_FIELD).map_err(|source| shape_error(endpoint, source))
    }
}

fn shape_error(endpoint: &Endpoint, source: ShapeError) -> ClientError {
    ClientError::Shape {
        endpoint: endpoint.name,
        source,
    }
}

/// `cod`/`message` pair of an error document, if `value` is one.
fn api_error(value: &Value) -> Option<(String, String)> {
    let code = match value.get("cod")? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if code == "200" {
        return None;
    }

    let message = value.get("message").map(|m| match m {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })?;

    Some((code, message))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
