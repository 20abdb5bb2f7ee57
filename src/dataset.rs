//! Dataset identification and monthly product-type selection.

use std::io::{BufRead, Write};

use serde::Deserialize;

use crate::error::{Error, Result};

/// ERA5-Land hourly data is published without "hourly" in its identifier.
pub const ERA5_LAND_HOURLY: &str = "reanalysis-era5-land";

const AVERAGED_REANALYSIS: [&str; 2] = [
    "monthly_averaged_reanalysis",
    "monthly_averaged_reanalysis_by_hour_of_day",
];

const AVERAGED_ENSEMBLE: [&str; 2] = [
    "monthly_averaged_ensemble_members",
    "monthly_averaged_ensemble_members_by_hour_of_day",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Monthly,
    Hourly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    identifier: String,
    granularity: Granularity,
}

impl DatasetDescriptor {
    /// Classify a dataset from its identifier or its CDS page URL.
    pub fn from_url(url: &str) -> Result<Self> {
        let identifier = parse_dataset_url(url);
        let granularity = classify(&identifier)?;
        Ok(Self {
            identifier,
            granularity,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn is_monthly(&self) -> bool {
        self.granularity == Granularity::Monthly
    }

    /// Product types offered for this dataset, in selection-index order.
    ///
    /// Hourly datasets have none. Monthly datasets outside the land and
    /// pressure/single-levels families are not recognized and need their
    /// product types given explicitly.
    pub fn candidate_product_types(&self) -> Result<Vec<&'static str>> {
        if self.granularity == Granularity::Hourly {
            return Ok(Vec::new());
        }
        if self.identifier.contains("land") {
            Ok(AVERAGED_REANALYSIS.to_vec())
        } else if self.identifier.contains("levels") {
            Ok(AVERAGED_REANALYSIS.iter().chain(AVERAGED_ENSEMBLE.iter()).copied().collect())
        } else {
            Err(Error::Classification(format!(
                "unrecognized monthly dataset {}, product types must be given explicitly",
                self.identifier
            )))
        }
    }
}

/// Dataset name from a CDS dataset page URL: last path segment, query dropped.
pub fn parse_dataset_url(url: &str) -> String {
    let base = url.trim().rsplit('/').next().unwrap_or_default();
    base.split('?').next().unwrap_or_default().to_string()
}

pub fn classify(identifier: &str) -> Result<Granularity> {
    if identifier.contains("monthly") {
        Ok(Granularity::Monthly)
    } else if identifier.contains("hourly") || identifier == ERA5_LAND_HOURLY {
        Ok(Granularity::Hourly)
    } else {
        Err(Error::Classification(format!("cannot recognize dataset {identifier}")))
    }
}

/// Which of the candidate product types to request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawProductSelection")]
pub enum ProductSelection {
    All,
    Indices(Vec<usize>),
    /// Explicit names, bypassing the candidate table.
    Names(Vec<String>),
}

impl ProductSelection {
    /// `"ALL"` or comma separated indices without spaces, e.g. `"0,1"`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == crate::format::ALL {
            return Ok(ProductSelection::All);
        }
        let indices = s
            .split(',')
            .map(|i| {
                i.trim().parse::<usize>().map_err(|_| {
                    Error::Configuration(format!("invalid product type index {i:?} in {s:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ProductSelection::Indices(indices))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductSelection {
    Text(String),
    Indices(Vec<usize>),
    Names(Vec<String>),
}

impl TryFrom<RawProductSelection> for ProductSelection {
    type Error = Error;

    fn try_from(raw: RawProductSelection) -> Result<Self> {
        match raw {
            RawProductSelection::Text(s) => ProductSelection::parse(&s),
            RawProductSelection::Indices(i) => Ok(ProductSelection::Indices(i)),
            RawProductSelection::Names(n) => Ok(ProductSelection::Names(n)),
        }
    }
}

/// Product types to put in the request for `dataset`.
///
/// Always empty for hourly datasets. For monthly datasets `selection` is
/// required and is applied to [`DatasetDescriptor::candidate_product_types`].
pub fn select_product_types(
    dataset: &DatasetDescriptor,
    selection: Option<&ProductSelection>,
) -> Result<Vec<String>> {
    if !dataset.is_monthly() {
        return Ok(Vec::new());
    }

    let selection = selection.ok_or_else(|| {
        Error::Configuration(format!(
            "monthly dataset {} needs a product type selection",
            dataset.identifier()
        ))
    })?;

    if let ProductSelection::Names(names) = selection {
        if names.is_empty() {
            return Err(Error::Configuration("product type list is empty".into()));
        }
        return Ok(names.clone());
    }

    let candidates = dataset.candidate_product_types()?;
    let chosen = match selection {
        ProductSelection::Indices(indices) => {
            if indices.is_empty() {
                return Err(Error::Configuration("product type selection is empty".into()));
            }
            indices
                .iter()
                .map(|&i| {
                    candidates.get(i).map(|s| s.to_string()).ok_or_else(|| {
                        Error::Configuration(format!(
                            "product type index {i} out of range (0..{})",
                            candidates.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?
        }
        _ => candidates.iter().map(|s| s.to_string()).collect(),
    };
    Ok(chosen)
}

/// Print the candidates to `out` and read one selection line from `input`.
pub fn prompt_product_selection(
    dataset: &DatasetDescriptor,
    mut input: impl BufRead,
    mut out: impl Write,
) -> Result<ProductSelection> {
    let candidates = dataset.candidate_product_types()?;
    writeln!(out, "Possible product types:")?;
    for (i, c) in candidates.iter().enumerate() {
        writeln!(out, "  {i}: {c}")?;
    }
    write!(
        out,
        "Input ALL for all listed product types, or their indexes separated by commas (e.g. 0,1): "
    )?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    ProductSelection::parse(&line)
}
