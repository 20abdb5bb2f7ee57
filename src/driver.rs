//! Expands a [`RunConfig`] into one request per output file and runs them in order.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::RunConfig;
use crate::dataset::Granularity;
use crate::error::{Error, Result};
use crate::request::{RequestPayload, Retrieve, Selection, submit};

/// Granularity at which separate output files are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// One file per year.
    Coarse,
    /// One file per year and month.
    Months,
    /// One file per year, month and day. Hourly datasets only.
    Days,
}

impl LoopMode {
    pub fn from_flags(loop_months: bool, loop_days: bool) -> Result<Self> {
        match (loop_months, loop_days) {
            (false, false) => Ok(LoopMode::Coarse),
            (true, false) => Ok(LoopMode::Months),
            (false, true) => Ok(LoopMode::Days),
            (true, true) => Err(Error::Configuration(
                "loop_days and loop_months cannot both be set".into(),
            )),
        }
    }

    pub fn check(self, granularity: Granularity) -> Result<()> {
        if self == LoopMode::Days && granularity == Granularity::Monthly {
            return Err(Error::Configuration(
                "day looping is only available for hourly datasets".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopMode::Coarse => "per year",
            LoopMode::Months => "per month",
            LoopMode::Days => "per day",
        })
    }
}

const BY_HOUR_OF_DAY: &str = "_by_hour_of_day";

/// One retrieve of a run: the payload and the output path without extension.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRequest {
    pub payload: RequestPayload,
    pub base: PathBuf,
}

impl PlannedRequest {
    fn label(&self) -> String {
        let mut parts = self.payload.year.values();
        if let Selection::One(m) = &self.payload.month {
            parts.push(m);
        }
        if let Some(Selection::One(d)) = &self.payload.day {
            parts.push(d);
        }
        parts.join(" - ")
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub files: Vec<PathBuf>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

/// Every request of the run, in the order they are issued.
///
/// Nothing is built when the loop mode does not fit the dataset, and output
/// paths are checked to be unique across the whole run.
pub fn plan(config: &RunConfig) -> Result<Vec<PlannedRequest>> {
    config.loop_mode.check(config.dataset.granularity())?;
    if config.variables.is_empty() {
        return Err(Error::Configuration("no variables selected".into()));
    }

    let dataset = config.dataset.identifier();
    let hourly = !config.dataset.is_monthly();

    // A variable requested on its own gets its own subdirectory and file stem.
    let single = |v: &String| {
        (
            Selection::One(v.clone()),
            config.output_dir.join(v),
            format!("{dataset}_{v}"),
        )
    };
    let groups: Vec<(Selection, PathBuf, String)> = match config.variables.as_slice() {
        [one] => vec![single(one)],
        many if config.loop_variables => many.iter().map(single).collect(),
        many => vec![(
            Selection::Many(many.to_vec()),
            config.output_dir.clone(),
            dataset.to_string(),
        )],
    };

    // Monthly means are stamped at 00:00; hours only select something for the
    // by-hour-of-day products.
    let hours: &[String] = if hourly
        || config
            .product_types
            .iter()
            .any(|p| p.ends_with(BY_HOUR_OF_DAY))
    {
        &config.hours
    } else {
        &[]
    };

    let template = |variable: &Selection, year: &str, month: Selection| {
        RequestPayload::new(variable.clone(), year, month)
            .product_types(&config.product_types)
            .time(hours)
            .format(config.format)
            .area(config.area)
    };

    let mut out = Vec::new();
    for (variable, dir, stem) in &groups {
        for year in &config.years {
            let days = config.day_counts.for_year(year)?;
            match config.loop_mode {
                LoopMode::Coarse => {
                    let mut payload = template(variable, year.as_str(), config.months.clone().into());
                    if hourly {
                        payload = payload.day(days.day_codes("01")?);
                    }
                    out.push(PlannedRequest {
                        payload,
                        base: dir.join(format!("{stem}_{year}")),
                    });
                }
                LoopMode::Months => {
                    for month in &config.months {
                        let mut payload = template(variable, year.as_str(), month.as_str().into());
                        if hourly {
                            payload = payload.day(days.day_codes(month)?);
                        }
                        out.push(PlannedRequest {
                            payload,
                            base: dir.join(format!("{stem}_{year}_{month}")),
                        });
                    }
                }
                LoopMode::Days => {
                    for month in &config.months {
                        for day in days.day_codes(month)? {
                            let base = dir.join(format!("{stem}_{year}_{month}_{day}"));
                            out.push(PlannedRequest {
                                payload: template(variable, year.as_str(), month.as_str().into()).day(day),
                                base,
                            });
                        }
                    }
                }
            }
        }
    }

    let mut seen = BTreeSet::new();
    if let Some(dup) = out.iter().find(|p| !seen.insert(&p.base)) {
        return Err(Error::Configuration(format!(
            "output {} would be written twice; check for repeated years, months or variables",
            dup.base.display()
        )));
    }

    Ok(out)
}

/// Create the output directories, then retrieve every planned request in order.
///
/// The first failing retrieve stops the run.
pub fn run(config: &RunConfig, client: &dyn Retrieve) -> Result<RunSummary> {
    let started = Utc::now();
    let planned = plan(config)?;

    info!("Dataset: {}", config.dataset.identifier());
    info!("Variables: {:?}", config.variables);
    info!("Years: {:?}", config.years);
    info!("Months: {:?}", config.months);
    match &config.area {
        Some(b) => info!("Area: {b}"),
        None => info!("Area: entire available region"),
    }
    info!("Output format: {}", config.format);
    info!("Requests: {} ({})", planned.len(), config.loop_mode);

    let dirs: BTreeSet<PathBuf> = planned
        .iter()
        .filter_map(|p| p.base.parent().map(|d| d.to_path_buf()))
        .collect();
    for dir in dirs {
        fs::create_dir_all(&dir)?;
    }

    let mut files = Vec::with_capacity(planned.len());
    for p in &planned {
        info!("Making API request for {}", p.label());
        files.push(submit(client, config.dataset.identifier(), &p.payload, &p.base)?);
    }

    info!("Done");
    Ok(RunSummary {
        files,
        started,
        finished: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;

    use super::*;
    use crate::area::BoundingBox;
    use crate::calendar::DayCountTable;
    use crate::config::DayCounts;
    use crate::dataset::DatasetDescriptor;
    use crate::request::{DEFAULT_TIME, OutputFormat};

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn config(dataset: &str, mode: LoopMode) -> RunConfig {
        let dataset = DatasetDescriptor::from_url(dataset).unwrap();
        RunConfig {
            product_types: if dataset.is_monthly() {
                strings(&["monthly_averaged_reanalysis"])
            } else {
                Vec::new()
            },
            dataset,
            output_dir: PathBuf::from("out"),
            variables: strings(&["runoff"]),
            loop_variables: false,
            years: strings(&["2018", "2019"]),
            months: (1..=12).map(|m| format!("{m:02}")).collect(),
            hours: (0..24).map(|h| format!("{h:02}:00")).collect(),
            format: OutputFormat::Netcdf,
            area: None,
            loop_mode: mode,
            day_counts: DayCounts::Table(DayCountTable::NON_LEAP),
        }
    }

    #[derive(Default)]
    struct Recorder {
        targets: RefCell<Vec<PathBuf>>,
        fail_after: Option<usize>,
    }

    impl Retrieve for Recorder {
        fn retrieve(&self, _: &str, _: &RequestPayload, target: &Path) -> Result<()> {
            let mut targets = self.targets.borrow_mut();
            if self.fail_after == Some(targets.len()) {
                return Err(Error::ExternalService("request rejected".into()));
            }
            targets.push(target.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn loop_flags_are_exclusive() {
        assert_eq!(LoopMode::from_flags(false, false).unwrap(), LoopMode::Coarse);
        assert_eq!(LoopMode::from_flags(true, false).unwrap(), LoopMode::Months);
        assert_eq!(LoopMode::from_flags(false, true).unwrap(), LoopMode::Days);
        assert!(matches!(LoopMode::from_flags(true, true), Err(Error::Configuration(_))));
    }

    #[test]
    fn coarse_hourly_is_one_request_per_year() {
        let planned = plan(&config("reanalysis-era5-land", LoopMode::Coarse)).unwrap();
        assert_eq!(planned.len(), 2);
        for (p, year) in planned.iter().zip(["2018", "2019"]) {
            assert_eq!(p.payload.year, Selection::One(year.to_string()));
            assert_eq!(p.payload.month.count(), 12);
            assert_eq!(p.payload.time.count(), 24);
            assert_eq!(p.payload.day.as_ref().map(Selection::count), Some(31));
            assert_eq!(p.payload.product_type, None);
            assert_eq!(
                p.base,
                PathBuf::from(format!("out/runoff/reanalysis-era5-land_runoff_{year}"))
            );
        }
    }

    #[test]
    fn month_looping_uses_fixed_day_table() {
        let mut cfg = config("reanalysis-era5-land", LoopMode::Months);
        cfg.years = strings(&["2020"]);
        cfg.months = strings(&["01", "02"]);
        let planned = plan(&cfg).unwrap();
        assert_eq!(planned.len(), 2);
        assert!(planned[0].base.to_string_lossy().ends_with("_2020_01"));
        assert!(planned[1].base.to_string_lossy().ends_with("_2020_02"));
        assert_eq!(planned[0].payload.day.as_ref().map(Selection::count), Some(31));
        // 2020 is a leap year but the default table has no 29th.
        assert_eq!(planned[1].payload.day.as_ref().map(Selection::count), Some(28));
    }

    #[test]
    fn leap_aware_days_are_opt_in() {
        let mut cfg = config("reanalysis-era5-land", LoopMode::Months);
        cfg.years = strings(&["2020"]);
        cfg.months = strings(&["02"]);
        cfg.day_counts = DayCounts::LeapAware;
        let planned = plan(&cfg).unwrap();
        assert_eq!(planned[0].payload.day.as_ref().map(Selection::count), Some(29));
    }

    #[test]
    fn day_looping_names_every_day() {
        let mut cfg = config("reanalysis-era5-single-levels-hourly", LoopMode::Days);
        cfg.years = strings(&["2019"]);
        cfg.months = strings(&["02"]);
        let planned = plan(&cfg).unwrap();
        assert_eq!(planned.len(), 28);
        assert_eq!(planned[0].payload.day, Some(Selection::One("01".into())));
        assert!(planned[27].base.to_string_lossy().ends_with("_2019_02_28"));
    }

    #[test]
    fn day_looping_rejects_monthly_datasets() {
        let cfg = config("reanalysis-era5-land-monthly-means", LoopMode::Days);
        assert!(matches!(plan(&cfg), Err(Error::Configuration(_))));
        let rec = Recorder::default();
        assert!(run(&cfg, &rec).is_err());
        assert!(rec.targets.borrow().is_empty());
    }

    #[test]
    fn monthly_requests_have_products_and_no_days() {
        let planned = plan(&config("reanalysis-era5-land-monthly-means", LoopMode::Months)).unwrap();
        assert_eq!(planned.len(), 24);
        for p in &planned {
            assert_eq!(p.payload.day, None);
            assert_eq!(p.payload.product_type, Some(strings(&["monthly_averaged_reanalysis"])));
            assert_eq!(p.payload.time, Selection::One(DEFAULT_TIME.to_string()));
        }
    }

    #[test]
    fn monthly_hours_only_apply_to_by_hour_products() {
        let mut cfg = config("reanalysis-era5-single-levels-monthly-means", LoopMode::Coarse);
        cfg.years = strings(&["2018"]);
        cfg.product_types = strings(&["monthly_averaged_reanalysis_by_hour_of_day"]);
        let planned = plan(&cfg).unwrap();
        assert_eq!(planned[0].payload.time.count(), 24);
        assert_eq!(planned[0].payload.day, None);
    }

    #[test]
    fn single_variable_is_named_without_looping() {
        let mut cfg = config("reanalysis-era5-land", LoopMode::Months);
        cfg.years = strings(&["2018"]);
        cfg.months = strings(&["03"]);
        let planned = plan(&cfg).unwrap();
        assert_eq!(planned[0].base, PathBuf::from("out/runoff/reanalysis-era5-land_runoff_2018_03"));
        assert_eq!(planned[0].payload.variable, Selection::One("runoff".into()));
    }

    #[test]
    fn looped_variables_get_their_own_names_and_dirs() {
        let mut cfg = config("reanalysis-era5-land", LoopMode::Coarse);
        cfg.variables = strings(&["runoff", "2m_temperature"]);
        cfg.loop_variables = true;
        cfg.years = strings(&["2018"]);
        let planned = plan(&cfg).unwrap();
        assert_eq!(
            planned.iter().map(|p| p.base.clone()).collect::<Vec<_>>(),
            vec![
                PathBuf::from("out/runoff/reanalysis-era5-land_runoff_2018"),
                PathBuf::from("out/2m_temperature/reanalysis-era5-land_2m_temperature_2018"),
            ]
        );
        assert_eq!(planned[1].payload.variable, Selection::One("2m_temperature".into()));
    }

    #[test]
    fn grouped_variables_share_one_request() {
        let mut cfg = config("reanalysis-era5-land", LoopMode::Coarse);
        cfg.variables = strings(&["runoff", "2m_temperature"]);
        cfg.years = strings(&["2018"]);
        cfg.area = Some(BoundingBox::from([55.0, 5.0, 47.0, 15.0]));
        let planned = plan(&cfg).unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].payload.variable.count(), 2);
        assert!(planned[0].payload.area.is_some());
    }

    #[test]
    fn repeated_years_are_rejected() {
        let mut cfg = config("reanalysis-era5-land", LoopMode::Coarse);
        cfg.years = strings(&["2018", "2018"]);
        assert!(matches!(plan(&cfg), Err(Error::Configuration(_))));
    }

    #[test]
    fn run_creates_dirs_and_retrieves_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config("reanalysis-era5-land", LoopMode::Coarse);
        cfg.output_dir = tmp.path().join("nested").join("out");
        cfg.variables = strings(&["runoff", "2m_temperature"]);
        cfg.loop_variables = true;

        let rec = Recorder::default();
        let summary = run(&cfg, &rec).unwrap();
        assert_eq!(summary.files.len(), 4);
        assert_eq!(*rec.targets.borrow(), summary.files);
        assert!(summary.files[0].ends_with("runoff/reanalysis-era5-land_runoff_2018.nc"));
        assert!(cfg.output_dir.join("runoff").is_dir());
        assert!(cfg.output_dir.join("2m_temperature").is_dir());
    }

    #[test]
    fn failing_retrieve_halts_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config("reanalysis-era5-land", LoopMode::Coarse);
        cfg.output_dir = tmp.path().to_path_buf();
        let rec = Recorder {
            fail_after: Some(1),
            ..Recorder::default()
        };
        assert!(matches!(run(&cfg, &rec), Err(Error::ExternalService(_))));
        assert_eq!(rec.targets.borrow().len(), 1);
    }
}
