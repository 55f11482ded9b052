//! Values offered by each filter selector
//!
//! Options are derived from the table itself: sorted, de-duplicated, absent
//! labels left out. "All" is implicit and never listed.

use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::filter::SalaryRange;
use crate::table::columns::*;
use crate::table::DerivedTable;

/// Choices available to the filter controls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Work years, ascending
    pub years: Vec<i32>,
    /// Experience labels
    pub experience_levels: Vec<String>,
    /// Employment type labels
    pub employment_types: Vec<String>,
    /// Company size codes
    pub company_sizes: Vec<String>,
    /// Country names
    pub countries: Vec<String>,
    /// Range of the salary slider
    pub salary_bounds: SalaryRange,
}

impl FilterOptions {
    /// Collect the options offered by `table`
    pub fn from_table(table: &DerivedTable) -> Result<Self> {
        let frame = table.frame();
        let years = unique_sorted(frame, WORK_YEAR, &DataType::Int32)?;
        let years = years.i32()?.into_iter().flatten().collect();

        Ok(Self {
            years,
            experience_levels: unique_labels(frame, EXP_LEVEL_NAME)?,
            employment_types: unique_labels(frame, EMPLOYMENT_TYPE_NAME)?,
            company_sizes: unique_labels(frame, COMPANY_SIZE)?,
            countries: unique_labels(frame, COUNTRY)?,
            salary_bounds: table.salary_bounds(),
        })
    }
}

fn unique_sorted(frame: &DataFrame, name: &str, dtype: &DataType) -> PolarsResult<Series> {
    let column = frame.column(name)?.cast(dtype)?;
    column
        .as_materialized_series()
        .drop_nulls()
        .unique()?
        .sort(SortOptions::default())
}

fn unique_labels(frame: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let labels = unique_sorted(frame, name, &DataType::String)?;
    Ok(labels.str()?.into_iter().flatten().map(str::to_owned).collect())
}
