//! The derived salary table
//!
//! A [`DerivedTable`] is the loaded dataset with its numeric columns normalized
//! and four display-label columns appended. It is built once and only ever lent
//! out as `&DataFrame`, so nothing downstream can mutate it.

use std::path::Path;

use polars::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::filter::SalaryRange;
use crate::labels;

/// Column names used by the pipeline
pub mod columns {
    /// Year the salary was paid
    pub const WORK_YEAR: &str = "work_year";
    /// Experience level code (EN/MI/SE/EX)
    pub const EXPERIENCE_LEVEL: &str = "experience_level";
    /// Employment type code (FT/PT/CT/FL)
    pub const EMPLOYMENT_TYPE: &str = "employment_type";
    /// Job title
    pub const JOB_TITLE: &str = "job_title";
    /// Salary converted to USD
    pub const SALARY: &str = "salary_in_usd";
    /// Share of remote work (0/50/100)
    pub const REMOTE_RATIO: &str = "remote_ratio";
    /// Company location code
    pub const COMPANY_LOCATION: &str = "company_location";
    /// Company size (S/M/L)
    pub const COMPANY_SIZE: &str = "company_size";

    /// Derived experience label
    pub const EXP_LEVEL_NAME: &str = "exp_level_name";
    /// Derived remote arrangement label
    pub const REMOTE_TYPE: &str = "remote_type";
    /// Derived country name
    pub const COUNTRY: &str = "country";
    /// Derived employment type label
    pub const EMPLOYMENT_TYPE_NAME: &str = "employment_type_name";

    /// Columns every input file must provide
    pub const REQUIRED: [&str; 8] = [
        WORK_YEAR,
        EXPERIENCE_LEVEL,
        EMPLOYMENT_TYPE,
        JOB_TITLE,
        SALARY,
        REMOTE_RATIO,
        COMPANY_LOCATION,
        COMPANY_SIZE,
    ];
}

use columns::*;

/// Number of rows per column whose code had no label mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnmappedCounts {
    /// Unknown experience level codes
    pub experience_level: usize,
    /// Remote ratios other than 0/50/100
    pub remote_ratio: usize,
    /// Locations outside the country allowlist
    pub company_location: usize,
    /// Unknown employment type codes
    pub employment_type: usize,
}

impl UnmappedCounts {
    /// Total number of mapping misses
    #[must_use]
    pub fn total(&self) -> usize {
        self.experience_level + self.remote_ratio + self.company_location + self.employment_type
    }
}

/// Loaded salary data plus derived label columns
#[derive(Debug, Clone)]
pub struct DerivedTable {
    frame: DataFrame,
    salary_bounds: SalaryRange,
    unmapped: UnmappedCounts,
}

impl DerivedTable {
    /// Derive a table from an in-memory `DataFrame`
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        Self::derive(frame, Path::new("<memory>"))
    }

    pub(crate) fn derive(frame: DataFrame, source: &Path) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| frame.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            return Err(Error::data_unavailable(
                source,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }

        let (frame, unmapped) =
            derive_columns(frame).map_err(|e| Error::data_unavailable(source, e.to_string()))?;

        let salary_bounds = salary_bounds(&frame)
            .map_err(|e| Error::data_unavailable(source, e.to_string()))?;

        if unmapped.total() > 0 {
            log::warn!(
                "{} code(s) without a display label in {} (experience: {}, remote: {}, location: {}, employment: {})",
                unmapped.total(),
                source.display(),
                unmapped.experience_level,
                unmapped.remote_ratio,
                unmapped.company_location,
                unmapped.employment_type
            );
        }

        Ok(Self {
            frame,
            salary_bounds,
            unmapped,
        })
    }

    /// The derived frame
    #[must_use]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows
    #[must_use]
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Observed `[min, max]` of `salary_in_usd` over the whole table
    #[must_use]
    pub fn salary_bounds(&self) -> SalaryRange {
        self.salary_bounds
    }

    /// Mapping misses found while deriving labels
    #[must_use]
    pub fn unmapped(&self) -> UnmappedCounts {
        self.unmapped
    }

    /// All rows as typed records
    pub fn records(&self) -> Result<Vec<SalaryRecord>> {
        records(&self.frame)
    }
}

impl PartialEq for DerivedTable {
    fn eq(&self, other: &Self) -> bool {
        self.salary_bounds == other.salary_bounds
            && self.unmapped == other.unmapped
            && self.frame.equals_missing(&other.frame)
    }
}

fn derive_columns(mut frame: DataFrame) -> PolarsResult<(DataFrame, UnmappedCounts)> {
    let year = frame.column(WORK_YEAR)?.strict_cast(&DataType::Int32)?;
    frame.with_column(year)?;
    let salary = frame.column(SALARY)?.strict_cast(&DataType::Float64)?;
    frame.with_column(salary)?;

    let mut unmapped = UnmappedCounts::default();

    let (experience, misses) =
        label_column(&frame, EXPERIENCE_LEVEL, EXP_LEVEL_NAME, labels::experience_level)?;
    unmapped.experience_level = misses;

    let (remote, misses) = remote_column(&frame)?;
    unmapped.remote_ratio = misses;

    let (country, misses) = label_column(&frame, COMPANY_LOCATION, COUNTRY, labels::country)?;
    unmapped.company_location = misses;

    let (employment, misses) = label_column(
        &frame,
        EMPLOYMENT_TYPE,
        EMPLOYMENT_TYPE_NAME,
        labels::employment_type,
    )?;
    unmapped.employment_type = misses;

    frame.with_column(experience)?;
    frame.with_column(remote)?;
    frame.with_column(country)?;
    frame.with_column(employment)?;

    Ok((frame, unmapped))
}

fn label_column(
    frame: &DataFrame,
    source: &str,
    target: &str,
    map: fn(&str) -> Option<&'static str>,
) -> PolarsResult<(Series, usize)> {
    let codes = frame.column(source)?.cast(&DataType::String)?;
    let mut misses = 0;
    let names: StringChunked = codes
        .str()?
        .into_iter()
        .map(|code| {
            let label = code.and_then(map);
            if code.is_some() && label.is_none() {
                misses += 1;
            }
            label
        })
        .collect();
    Ok((names.with_name(target.into()).into_series(), misses))
}

// Non-numeric ratios become null in the cast and count as misses; empty cells do not.
fn remote_column(frame: &DataFrame) -> PolarsResult<(Series, usize)> {
    let raw = frame.column(REMOTE_RATIO)?;
    let present = raw.is_not_null();
    let ratios = raw.cast(&DataType::Int64)?;
    let mut misses = 0;
    let names: StringChunked = ratios
        .i64()?
        .into_iter()
        .zip(&present)
        .map(|(ratio, present)| {
            let label = ratio.and_then(labels::remote_type);
            if present == Some(true) && label.is_none() {
                misses += 1;
            }
            label
        })
        .collect();
    Ok((names.with_name(REMOTE_TYPE.into()).into_series(), misses))
}

fn salary_bounds(frame: &DataFrame) -> PolarsResult<SalaryRange> {
    let salaries = frame.column(SALARY)?.f64()?;
    let min = salaries.min().unwrap_or(0.0);
    let max = salaries.max().unwrap_or(0.0);
    Ok(SalaryRange::unchecked(min, max))
}

/// One row of the derived table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryRecord {
    /// Year the salary was paid
    pub work_year: Option<i32>,
    /// Experience level code
    pub experience_level: Option<String>,
    /// Employment type code
    pub employment_type: Option<String>,
    /// Job title
    pub job_title: Option<String>,
    /// Salary in USD
    pub salary_in_usd: Option<f64>,
    /// Remote ratio
    pub remote_ratio: Option<i64>,
    /// Company location code
    pub company_location: Option<String>,
    /// Company size
    pub company_size: Option<String>,
    /// Experience label
    pub exp_level_name: Option<String>,
    /// Remote arrangement label
    pub remote_type: Option<String>,
    /// Country name
    pub country: Option<String>,
    /// Employment type label
    pub employment_type_name: Option<String>,
}

pub(crate) fn records(frame: &DataFrame) -> Result<Vec<SalaryRecord>> {
    let years = frame.column(WORK_YEAR)?.cast(&DataType::Int32)?;
    let years = years.i32()?;
    let salaries = frame.column(SALARY)?.cast(&DataType::Float64)?;
    let salaries = salaries.f64()?;
    let ratios = frame.column(REMOTE_RATIO)?.cast(&DataType::Int64)?;
    let ratios = ratios.i64()?;

    let experience = strings(frame, EXPERIENCE_LEVEL)?;
    let employment = strings(frame, EMPLOYMENT_TYPE)?;
    let titles = strings(frame, JOB_TITLE)?;
    let locations = strings(frame, COMPANY_LOCATION)?;
    let sizes = strings(frame, COMPANY_SIZE)?;
    let exp_names = strings(frame, EXP_LEVEL_NAME)?;
    let remote_types = strings(frame, REMOTE_TYPE)?;
    let countries = strings(frame, COUNTRY)?;
    let employment_names = strings(frame, EMPLOYMENT_TYPE_NAME)?;

    Ok((0..frame.height())
        .map(|i| SalaryRecord {
            work_year: years.get(i),
            experience_level: experience[i].clone(),
            employment_type: employment[i].clone(),
            job_title: titles[i].clone(),
            salary_in_usd: salaries.get(i),
            remote_ratio: ratios.get(i),
            company_location: locations[i].clone(),
            company_size: sizes[i].clone(),
            exp_level_name: exp_names[i].clone(),
            remote_type: remote_types[i].clone(),
            country: countries[i].clone(),
            employment_type_name: employment_names[i].clone(),
        })
        .collect())
}

fn strings(frame: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = frame.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_owned))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df! {
            WORK_YEAR => [2022i64, 2022, 2023, 2023],
            EXPERIENCE_LEVEL => ["EN", "SE", "EN", "XX"],
            EMPLOYMENT_TYPE => ["FT", "FT", "CT", "FT"],
            JOB_TITLE => ["Data Analyst", "ML Engineer", "Data Analyst", "Researcher"],
            SALARY => [50_000i64, 150_000, 60_000, 90_000],
            REMOTE_RATIO => [0i64, 100, 50, 25],
            COMPANY_LOCATION => ["US", "US", "DE", "ZZ"],
            COMPANY_SIZE => ["M", "L", "S", "M"]
        }
        .unwrap()
    }

    #[test]
    fn test_derive_adds_label_columns() {
        let table = DerivedTable::from_frame(sample_frame()).unwrap();
        let frame = table.frame();

        assert_eq!(frame.height(), 4);
        for name in [EXP_LEVEL_NAME, REMOTE_TYPE, COUNTRY, EMPLOYMENT_TYPE_NAME] {
            assert!(frame.column(name).is_ok(), "missing {name}");
        }

        let exp = frame.column(EXP_LEVEL_NAME).unwrap().str().unwrap();
        assert_eq!(exp.get(0), Some("Entry-level"));
        assert_eq!(exp.get(1), Some("Senior-level"));
        assert_eq!(exp.get(3), None);

        let remote = frame.column(REMOTE_TYPE).unwrap().str().unwrap();
        assert_eq!(remote.get(1), Some("Fully Remote"));
        assert_eq!(remote.get(2), Some("Partially Remote"));
        assert_eq!(remote.get(3), None);

        let country = frame.column(COUNTRY).unwrap().str().unwrap();
        assert_eq!(country.get(2), Some("Germany"));
        assert_eq!(country.get(3), None);

        let employment = frame.column(EMPLOYMENT_TYPE_NAME).unwrap().str().unwrap();
        assert_eq!(employment.get(2), Some("Contract"));
    }

    #[test]
    fn test_original_columns_untouched() {
        let table = DerivedTable::from_frame(sample_frame()).unwrap();
        let codes = table.frame().column(EXPERIENCE_LEVEL).unwrap().str().unwrap();
        assert_eq!(codes.get(3), Some("XX"));
        let locations = table.frame().column(COMPANY_LOCATION).unwrap().str().unwrap();
        assert_eq!(locations.get(3), Some("ZZ"));
    }

    #[test]
    fn test_numeric_normalization() {
        let table = DerivedTable::from_frame(sample_frame()).unwrap();
        assert_eq!(
            table.frame().column(WORK_YEAR).unwrap().dtype(),
            &DataType::Int32
        );
        assert_eq!(
            table.frame().column(SALARY).unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_salary_bounds_and_unmapped() {
        let table = DerivedTable::from_frame(sample_frame()).unwrap();
        let bounds = table.salary_bounds();
        assert_eq!(bounds.min(), 50_000.0);
        assert_eq!(bounds.max(), 150_000.0);

        let unmapped = table.unmapped();
        assert_eq!(unmapped.experience_level, 1);
        assert_eq!(unmapped.remote_ratio, 1);
        assert_eq!(unmapped.company_location, 1);
        assert_eq!(unmapped.employment_type, 0);
        assert_eq!(unmapped.total(), 3);
    }

    #[test]
    fn test_empty_remote_ratio_is_not_unmapped() {
        let frame = df! {
            WORK_YEAR => [2023i64, 2023, 2023],
            EXPERIENCE_LEVEL => ["EN", "MI", "SE"],
            EMPLOYMENT_TYPE => ["FT", "FT", "FT"],
            JOB_TITLE => ["A", "B", "C"],
            SALARY => [50_000i64, 60_000, 70_000],
            REMOTE_RATIO => [Some(0i64), None, Some(75)],
            COMPANY_LOCATION => ["US", "US", "US"],
            COMPANY_SIZE => ["M", "M", "M"]
        }
        .unwrap();
        let table = DerivedTable::from_frame(frame).unwrap();

        assert_eq!(table.unmapped().remote_ratio, 1);
        let remote = table.frame().column(REMOTE_TYPE).unwrap();
        assert_eq!(remote.null_count(), 2);
        assert_eq!(remote.str().unwrap().get(0), Some("No Remote"));
    }

    #[test]
    fn test_missing_column_is_data_unavailable() {
        let frame = sample_frame().drop(COMPANY_SIZE).unwrap();
        let err = DerivedTable::from_frame(frame).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("company_size"));
    }

    #[test]
    fn test_unparseable_year_is_data_unavailable() {
        let mut frame = sample_frame();
        frame
            .with_column(Series::new(
                WORK_YEAR.into(),
                ["2022", "twenty", "2023", "2023"],
            ))
            .unwrap();
        let err = DerivedTable::from_frame(frame).unwrap_err();
        assert!(matches!(err, Error::DataUnavailable { .. }));
    }

    #[test]
    fn test_records() {
        let table = DerivedTable::from_frame(sample_frame()).unwrap();
        let records = table.records().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].work_year, Some(2022));
        assert_eq!(records[0].salary_in_usd, Some(50_000.0));
        assert_eq!(records[0].country.as_deref(), Some("United States"));
        assert_eq!(records[3].country, None);
        assert_eq!(records[3].company_location.as_deref(), Some("ZZ"));
    }
}
