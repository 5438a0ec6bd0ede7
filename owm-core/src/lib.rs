//! Core library for the `owm` CLI.
//!
//! This crate defines:
//! - Path access into decoded responses (`main/temp`, `weather/[0]/icon`)
//! - Records and projected collections that turn responses into tables
//! - Endpoint descriptions and the fetch/decode/shape pipeline
//! - Views, settings and the city list
//!
//! It is used by `owm-cli`, but can also be reused by other binaries or services.

pub mod cities;
pub mod client;
pub mod convert;
pub mod endpoint;
pub mod path;
pub mod projection;
pub mod record;
pub mod settings;
pub mod split;
pub mod views;

pub use cities::CityList;
pub use client::{Client, ClientError, DecodeError, Fetch, HttpFetcher, Response, TransportError};
pub use convert::Converters;
pub use endpoint::{Endpoint, Location, Query, Units};
pub use path::{Path, PathError, resolve, resolve_many};
pub use projection::{Collection, Row, ShapeError};
pub use record::{KeyStyle, ProjectionError, Record};
pub use settings::Settings;
pub use split::split;
pub use views::Views;
