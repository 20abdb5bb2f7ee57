use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::area::BoundingBox;
use crate::error::Result;

/// Output file format of a retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Netcdf,
    Grib,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Netcdf => ".nc",
            OutputFormat::Grib => ".grib",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Netcdf => "netcdf",
            OutputFormat::Grib => "grib",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request keyword holding either one value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Selection {
    One(String),
    Many(Vec<String>),
}

impl Selection {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Selection::One(s) => vec![s.as_str()],
            Selection::Many(xs) => xs.iter().map(String::as_str).collect(),
        }
    }

    /// Number of values sent for this keyword.
    pub fn count(&self) -> usize {
        match self {
            Selection::One(_) => 1,
            Selection::Many(xs) => xs.len(),
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::One(value.to_string())
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Selection::One(value)
    }
}

impl From<Vec<String>> for Selection {
    fn from(value: Vec<String>) -> Self {
        Selection::Many(value)
    }
}

impl From<&[String]> for Selection {
    fn from(value: &[String]) -> Self {
        Selection::Many(value.to_vec())
    }
}

/// Body of one archive retrieve. Optional keywords are left out when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<Vec<String>>,
    pub variable: Selection,
    pub year: Selection,
    pub month: Selection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<Selection>,
    pub time: Selection,
    pub format: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<BoundingBox>,
}

impl RequestPayload {
    pub fn new(variable: impl Into<Selection>, year: impl Into<Selection>, month: impl Into<Selection>) -> Self {
        Self {
            product_type: None,
            variable: variable.into(),
            year: year.into(),
            month: month.into(),
            day: None,
            time: Selection::One(DEFAULT_TIME.to_string()),
            format: OutputFormat::Netcdf,
            area: None,
        }
    }

    /// Empty product-type lists are dropped.
    pub fn product_types(mut self, types: &[String]) -> Self {
        self.product_type = (!types.is_empty()).then(|| types.to_vec());
        self
    }

    pub fn day(mut self, day: impl Into<Selection>) -> Self {
        self.day = Some(day.into());
        self
    }

    /// Empty hour lists fall back to [`DEFAULT_TIME`].
    pub fn time(mut self, hours: &[String]) -> Self {
        self.time = match hours {
            [] => Selection::One(DEFAULT_TIME.to_string()),
            hs => Selection::Many(hs.to_vec()),
        };
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn area(mut self, area: Option<BoundingBox>) -> Self {
        self.area = area;
        self
    }
}

/// Time sent when no hours were selected.
pub const DEFAULT_TIME: &str = "00:00";

/// The archive's fetch-and-save operation.
pub trait Retrieve {
    fn retrieve(&self, dataset: &str, request: &RequestPayload, target: &Path) -> Result<()>;
}

/// `base` with the format's extension appended (`era5_2018` -> `era5_2018.nc`).
pub fn output_path(base: &Path, format: OutputFormat) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format.extension());
    PathBuf::from(name)
}

/// Retrieve one payload into `base` + extension and return the written path.
pub fn submit(
    client: &dyn Retrieve,
    dataset: &str,
    request: &RequestPayload,
    base: &Path,
) -> Result<PathBuf> {
    let target = output_path(base, request.format);
    client.retrieve(dataset, request, &target)?;
    info!("{dataset} should be saved @ {}", target.display());
    Ok(target)
}
