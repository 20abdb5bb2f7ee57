#![forbid(unsafe_code)]

//! Download ERA5 reanalysis data from the Copernicus Climate Data Store.
//!
//! A run is described by a [`RunConfig`]: the dataset, variables, years,
//! months and hours, an optional area, and the granularity at which separate
//! files are requested (per year, per month or per day). The driver expands it
//! into one request per output file and retrieves them one after the other.
//!
//! **Quick start**
//! ```no_run
//! use era5_download::{CdsClient, ClientOptions, NominatimClient, NominatimOptions, RunFile, run};
//!
//! let file = RunFile::from_json(r#"{
//!     "dataset": "reanalysis-era5-land",
//!     "output_dir": "era5_out",
//!     "variables": ["runoff"],
//!     "years": [2018, 2019],
//!     "hours": [0, 12],
//!     "area": "Germany",
//!     "loop_months": true
//! }"#)?;
//!
//! let geocoder = NominatimClient::new(NominatimOptions::default())?;
//! let config = file.resolve(&geocoder)?;
//!
//! // Credentials from CDSAPI_URL/CDSAPI_KEY or ~/.cdsapirc
//! let client = CdsClient::new(ClientOptions::default())?;
//! let summary = run(&config, &client)?;
//! println!("{} files", summary.files.len());
//! # Ok::<(), era5_download::Error>(())
//! ```
//!
//! **Building requests directly**
//! ```
//! use era5_download::{form_hours, form_months, FieldValue, OutputFormat, RequestPayload};
//!
//! let months = form_months(&FieldValue::from("ALL"))?;
//! let hours = form_hours(&FieldValue::from(vec![0i64, 6, 12, 18]))?;
//! let payload = RequestPayload::new("2m_temperature", "2020", months)
//!     .time(&hours)
//!     .format(OutputFormat::Grib);
//! assert_eq!(payload.time.count(), 4);
//! # Ok::<(), era5_download::Error>(())
//! ```
//!
//! Notes:
//! - Data downloaded from the CDS is subject to the Copernicus licence and the
//!   dataset's terms of use, which must be accepted on the CDS website first.
//! - Place names are geocoded with OpenStreetMap Nominatim; respect its usage
//!   policy (one lookup per run is made).

mod area;
mod calendar;
mod cds;
mod config;
mod countries;
mod dataset;
mod driver;
mod error;
mod format;
mod logging;
mod request;

pub use crate::area::{
    Area, BoundingBox, ENTIRE_REGION, Geocoder, NominatimClient, NominatimOptions, PlaceKind,
    bounding_box_from_response, place_bounding_box, resolve_area,
};
pub use crate::calendar::DayCountTable;
pub use crate::cds::{CdsClient, ClientOptions, Credentials, DEFAULT_API_URL};
pub use crate::config::{DayCounts, RunConfig, RunFile, Variables};
pub use crate::countries::is_country;
pub use crate::dataset::{
    DatasetDescriptor, Granularity, ProductSelection, classify, parse_dataset_url,
    prompt_product_selection, select_product_types,
};
pub use crate::driver::{LoopMode, PlannedRequest, RunSummary, plan, run};
pub use crate::error::{Error, Result};
pub use crate::format::{ALL, FieldValue, form_hours, form_months, form_years};
pub use crate::logging::{default_log_path, init_logging};
pub use crate::request::{DEFAULT_TIME, OutputFormat, RequestPayload, Retrieve, Selection, output_path, submit};
