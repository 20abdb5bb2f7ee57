//! Run configuration: the JSON run file and the resolved, immutable [`RunConfig`].
//!
//! A run file looks like:
//!
//! ```json
//! {
//!   "dataset": "https://cds.climate.copernicus.eu/cdsapp#!/dataset/reanalysis-era5-land?tab=form",
//!   "output_dir": "era5_out",
//!   "variables": ["10m_u_component_of_wind", "runoff"],
//!   "years": [2018, 2019],
//!   "months": "ALL",
//!   "hours": "ALL",
//!   "format": "netcdf",
//!   "area": "Germany",
//!   "loop_variables": true,
//!   "loop_days": true
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::area::{Area, BoundingBox, Geocoder, resolve_area};
use crate::calendar::DayCountTable;
use crate::dataset::{DatasetDescriptor, ProductSelection, select_product_types};
use crate::driver::LoopMode;
use crate::error::{Error, Result};
use crate::format::{ALL, FieldValue, form_hours, form_months, form_years};
use crate::request::OutputFormat;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Variables {
    One(String),
    Many(Vec<String>),
}

impl Variables {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Variables::One(v) => vec![v],
            Variables::Many(vs) => vs,
        }
    }
}

/// Run file as written by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    /// Dataset identifier or CDS dataset page URL.
    pub dataset: String,
    pub output_dir: PathBuf,
    pub variables: Variables,
    pub years: FieldValue,
    #[serde(default = "all_months")]
    pub months: FieldValue,
    #[serde(default)]
    pub hours: Option<FieldValue>,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub area: Area,
    /// Look non-country place names up as states instead of cities.
    #[serde(default)]
    pub state_override: bool,
    /// One pass (and one subdirectory) per variable.
    #[serde(default)]
    pub loop_variables: bool,
    #[serde(default)]
    pub loop_months: bool,
    #[serde(default)]
    pub loop_days: bool,
    /// Monthly datasets only: "ALL", indices, or explicit product type names.
    #[serde(default)]
    pub product_types: Option<ProductSelection>,
    #[serde(default)]
    pub day_counts: Option<DayCountTable>,
    #[serde(default)]
    pub leap_aware_days: bool,
}

fn all_months() -> FieldValue {
    FieldValue::Str(ALL.to_string())
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(reader))?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn dataset_descriptor(&self) -> Result<DatasetDescriptor> {
        DatasetDescriptor::from_url(&self.dataset)
    }

    /// Validate and normalize everything, geocoding the area last.
    ///
    /// Loop-mode problems are reported before any lookup is made.
    pub fn resolve(self, geocoder: &dyn Geocoder) -> Result<RunConfig> {
        let dataset = self.dataset_descriptor()?;
        let loop_mode = LoopMode::from_flags(self.loop_months, self.loop_days)?;
        loop_mode.check(dataset.granularity())?;

        let day_counts = match (self.leap_aware_days, self.day_counts) {
            (true, Some(_)) => {
                return Err(Error::Configuration(
                    "day_counts and leap_aware_days cannot both be set".into(),
                ));
            }
            (true, None) => DayCounts::LeapAware,
            (false, table) => {
                let table = table.unwrap_or_default();
                table.validate()?;
                DayCounts::Table(table)
            }
        };

        let variables = self.variables.into_vec();
        if variables.is_empty() || variables.iter().any(|v| v.trim().is_empty()) {
            return Err(Error::Configuration("variables must be non-empty names".into()));
        }
        // Variable names become directory and file names under output_dir.
        if let Some(v) = variables
            .iter()
            .find(|v| v.contains(['/', '\\']) || v.as_str() == "." || v.as_str() == "..")
        {
            return Err(Error::Configuration(format!("invalid variable name {v:?}")));
        }

        let years = form_years(&self.years)?;
        let months = form_months(&self.months)?;
        let hours = match &self.hours {
            Some(h) => form_hours(h)?,
            None => Vec::new(),
        };
        let product_types = select_product_types(&dataset, self.product_types.as_ref())?;
        if !product_types.is_empty() {
            info!("Product types: {product_types:?}");
        }

        let area = resolve_area(&self.area, self.state_override, geocoder)?;

        Ok(RunConfig {
            dataset,
            output_dir: self.output_dir,
            variables,
            loop_variables: self.loop_variables,
            years,
            months,
            hours,
            format: self.format,
            product_types,
            area,
            loop_mode,
            day_counts,
        })
    }
}

/// Where per-month day counts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCounts {
    Table(DayCountTable),
    /// Real calendar month lengths for each requested year.
    LeapAware,
}

impl DayCounts {
    pub fn for_year(&self, year: &str) -> Result<DayCountTable> {
        match self {
            DayCounts::Table(t) => Ok(*t),
            DayCounts::LeapAware => {
                let y: i32 = year
                    .trim()
                    .parse()
                    .map_err(|_| Error::TypeMismatch(format!("year is not numeric: {year:?}")))?;
                DayCountTable::leap_aware(y)
            }
        }
    }
}

impl Default for DayCounts {
    fn default() -> Self {
        DayCounts::Table(DayCountTable::NON_LEAP)
    }
}

/// Fully normalized run parameters handed to [`crate::driver::run`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dataset: DatasetDescriptor,
    pub output_dir: PathBuf,
    pub variables: Vec<String>,
    pub loop_variables: bool,
    pub years: Vec<String>,
    pub months: Vec<String>,
    /// `"HH:00"` strings; empty means the default `00:00`.
    pub hours: Vec<String>,
    pub format: OutputFormat,
    /// Empty for hourly datasets.
    pub product_types: Vec<String>,
    pub area: Option<BoundingBox>,
    pub loop_mode: LoopMode,
    pub day_counts: DayCounts,
}
