//! Aggregation operations over salary frames
//!
//! Every function here is pure and defined on empty input: scalar statistics
//! fall back to `0.0`, grouped results to an empty `Vec`. Rows whose grouping
//! label is absent are dropped before grouping, so they never form a bucket of
//! their own.
//!
//! Standard deviation is the sample statistic (`ddof = 1`); it is `0.0` when
//! fewer than two salaries are present.

use std::cmp::Ordering;

use itertools::{Itertools, MinMaxResult};
use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::labels;
use crate::table::columns::*;
use crate::table::DerivedTable;

/// Number of groups kept by the ranking charts
pub const DEFAULT_TOP_N: usize = 10;

/// Number of bins in the salary distribution
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

const MEAN_SALARY: &str = "mean_salary";
const MEDIAN_SALARY: &str = "median_salary";
const STD_SALARY: &str = "std_salary";
const GROUP_SIZE: &str = "group_size";
const MIN_SALARY: &str = "min_salary";
const Q1_SALARY: &str = "q1_salary";
const Q3_SALARY: &str = "q3_salary";
const MAX_SALARY: &str = "max_salary";

/// Scalar statistics computed over `salary_in_usd`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    /// Arithmetic mean
    Mean,
    /// Median
    Median,
    /// Sample standard deviation
    StdDev,
}

impl Statistic {
    /// Convert to Polars expression
    #[must_use]
    pub fn to_polars_expr(self) -> Expr {
        let salary = col(SALARY);
        match self {
            Statistic::Mean => salary.mean(),
            Statistic::Median => salary.median(),
            Statistic::StdDev => salary.std(1),
        }
        .alias(self.output_column_name())
    }

    /// Get the output column name for this statistic
    #[must_use]
    pub fn output_column_name(self) -> &'static str {
        match self {
            Statistic::Mean => MEAN_SALARY,
            Statistic::Median => MEDIAN_SALARY,
            Statistic::StdDev => STD_SALARY,
        }
    }
}

/// Headline numbers for a set of salaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    /// Mean salary
    pub mean: f64,
    /// Median salary
    pub median: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Number of records
    pub count: usize,
}

/// Mean salary of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    /// Group label
    pub key: String,
    /// Mean salary within the group
    pub mean_salary: f64,
    /// Number of records in the group
    pub count: usize,
}

/// Median salary of one work year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearMedian {
    /// Work year
    pub year: i32,
    /// Median salary paid that year
    pub median_salary: f64,
}

/// One bar of the salary distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    /// Lower edge, inclusive
    pub lower: f64,
    /// Upper edge; exclusive except for the last bin
    pub upper: f64,
    /// Number of salaries in the bin
    pub count: usize,
}

/// Box-plot statistics of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalarySpread {
    /// Group label
    pub label: String,
    /// Number of salaries
    pub count: usize,
    /// Smallest salary
    pub min: f64,
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Largest salary
    pub max: f64,
}

/// Categorical columns the rankings can group by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupField {
    /// `job_title`
    JobTitle,
    /// Derived country name
    Country,
    /// Derived remote arrangement
    RemoteType,
    /// Derived experience label
    ExperienceLevel,
}

impl GroupField {
    /// Column holding the group key
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            GroupField::JobTitle => JOB_TITLE,
            GroupField::Country => COUNTRY,
            GroupField::RemoteType => REMOTE_TYPE,
            GroupField::ExperienceLevel => EXP_LEVEL_NAME,
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Mean, median, standard deviation and count of `salary_in_usd`
pub fn kpi_summary(frame: &DataFrame) -> Result<KpiSummary> {
    if frame.height() == 0 {
        return Ok(KpiSummary::default());
    }

    let stats = [Statistic::Mean, Statistic::Median, Statistic::StdDev];
    let summary = frame
        .clone()
        .lazy()
        .select(stats.map(Statistic::to_polars_expr))
        .collect()?;

    let value = |stat: Statistic| -> Result<f64> {
        let column = summary
            .column(stat.output_column_name())?
            .cast(&DataType::Float64)?;
        Ok(finite_or_zero(column.f64()?.get(0)))
    };

    Ok(KpiSummary {
        mean: value(Statistic::Mean)?,
        median: value(Statistic::Median)?,
        std_dev: value(Statistic::StdDev)?,
        count: frame.height(),
    })
}

fn group_means(frame: &DataFrame, field: GroupField, by_mean: bool) -> Result<Vec<GroupMean>> {
    if frame.height() == 0 {
        return Ok(Vec::new());
    }

    let key = field.column();
    let order = if by_mean {
        SortMultipleOptions::default().with_order_descending_multi([true, false])
    } else {
        SortMultipleOptions::default().with_order_descending_multi([false, false])
    };
    let sort_by = if by_mean { [MEAN_SALARY, key] } else { [key, MEAN_SALARY] };

    let grouped = frame
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([
            Statistic::Mean.to_polars_expr(),
            len().alias(GROUP_SIZE),
        ])
        .sort(sort_by, order)
        .collect()?;

    let keys = grouped.column(key)?.cast(&DataType::String)?;
    let means = grouped.column(MEAN_SALARY)?.cast(&DataType::Float64)?;
    let sizes = grouped.column(GROUP_SIZE)?.cast(&DataType::UInt64)?;

    Ok(keys
        .str()?
        .into_iter()
        .zip(means.f64()?)
        .zip(sizes.u64()?)
        .filter_map(|((key, mean), size)| {
            key.map(|key| GroupMean {
                key: key.to_string(),
                mean_salary: finite_or_zero(mean),
                count: usize::try_from(size.unwrap_or(0)).unwrap_or(usize::MAX),
            })
        })
        .collect())
}

/// The `n` groups with the highest mean salary
///
/// Sorted by mean descending; equal means are ordered by key ascending.
pub fn top_n_by(frame: &DataFrame, field: GroupField, n: usize) -> Result<Vec<GroupMean>> {
    let mut ranking = group_means(frame, field, true)?;
    ranking.truncate(n);
    Ok(ranking)
}

/// Mean salary per remote arrangement, ordered by label
pub fn mean_by_remote(frame: &DataFrame) -> Result<Vec<GroupMean>> {
    group_means(frame, GroupField::RemoteType, false)
}

/// Median salary per work year over the whole table, oldest year first
///
/// Takes the table rather than a filtered frame: the trend always shows the
/// full dataset regardless of the current selection.
pub fn annual_trend(table: &DerivedTable) -> Result<Vec<YearMedian>> {
    let frame = table.frame();
    if frame.height() == 0 {
        return Ok(Vec::new());
    }

    let trend = frame
        .clone()
        .lazy()
        .filter(col(WORK_YEAR).is_not_null())
        .group_by([col(WORK_YEAR)])
        .agg([Statistic::Median.to_polars_expr()])
        .sort([WORK_YEAR], SortMultipleOptions::default())
        .collect()?;

    let years = trend.column(WORK_YEAR)?.cast(&DataType::Int32)?;
    let medians = trend.column(MEDIAN_SALARY)?.cast(&DataType::Float64)?;

    Ok(years
        .i32()?
        .into_iter()
        .zip(medians.f64()?)
        .filter_map(|(year, median)| {
            year.map(|year| YearMedian {
                year,
                median_salary: finite_or_zero(median),
            })
        })
        .collect())
}

fn salary_values(frame: &DataFrame) -> Result<Vec<f64>> {
    let salaries = frame.column(SALARY)?.cast(&DataType::Float64)?;
    Ok(salaries.f64()?.into_iter().flatten().collect())
}

/// Equal-width salary distribution between the smallest and largest salary
///
/// The last bin includes its upper edge. When every salary is the same a
/// single bin holds them all.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn salary_histogram(frame: &DataFrame, bins: usize) -> Result<Vec<HistogramBin>> {
    let salaries = salary_values(frame)?;
    let (min, max) = match salaries.iter().copied().minmax() {
        MinMaxResult::NoElements => return Ok(Vec::new()),
        MinMaxResult::OneElement(value) => (value, value),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    if bins == 0 {
        return Ok(Vec::new());
    }

    if min == max {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: salaries.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for salary in &salaries {
        let index = (((salary - min) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect())
}

/// Box-plot statistics per experience level, most junior first
///
/// Quartiles use linear interpolation between closest ranks.
pub fn experience_spread(frame: &DataFrame) -> Result<Vec<SalarySpread>> {
    if frame.height() == 0 {
        return Ok(Vec::new());
    }

    let salary = || col(SALARY).cast(DataType::Float64);
    let spread = frame
        .clone()
        .lazy()
        .filter(col(EXP_LEVEL_NAME).is_not_null().and(col(SALARY).is_not_null()))
        .group_by([col(EXP_LEVEL_NAME)])
        .agg([
            len().alias(GROUP_SIZE),
            salary().min().alias(MIN_SALARY),
            salary()
                .quantile(lit(0.25), QuantileMethod::Linear)
                .alias(Q1_SALARY),
            salary().median().alias(MEDIAN_SALARY),
            salary()
                .quantile(lit(0.75), QuantileMethod::Linear)
                .alias(Q3_SALARY),
            salary().max().alias(MAX_SALARY),
        ])
        .collect()?;

    let levels = spread.column(EXP_LEVEL_NAME)?.cast(&DataType::String)?;
    let sizes = spread.column(GROUP_SIZE)?.cast(&DataType::UInt64)?;
    let stat = |name: &str| -> Result<Vec<f64>> {
        let column = spread.column(name)?.cast(&DataType::Float64)?;
        Ok(column.f64()?.into_iter().map(finite_or_zero).collect())
    };
    let (mins, q1s, medians, q3s, maxes) = (
        stat(MIN_SALARY)?,
        stat(Q1_SALARY)?,
        stat(MEDIAN_SALARY)?,
        stat(Q3_SALARY)?,
        stat(MAX_SALARY)?,
    );

    let mut spreads: Vec<SalarySpread> = levels
        .str()?
        .into_iter()
        .zip(sizes.u64()?)
        .enumerate()
        .filter_map(|(i, (label, size))| {
            label.map(|label| SalarySpread {
                label: label.to_string(),
                count: usize::try_from(size.unwrap_or(0)).unwrap_or(usize::MAX),
                min: mins[i],
                q1: q1s[i],
                median: medians[i],
                q3: q3s[i],
                max: maxes[i],
            })
        })
        .collect();

    spreads.sort_by(|a, b| {
        match (
            labels::seniority_rank(&a.label),
            labels::seniority_rank(&b.label),
        ) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.label.cmp(&b.label),
        }
    });
    Ok(spreads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply, FilterSelection};
    use pretty_assertions::assert_eq;

    fn create_test_table() -> DerivedTable {
        let frame = df! {
            WORK_YEAR => [2022i64, 2022, 2023, 2023, 2024],
            EXPERIENCE_LEVEL => ["EN", "SE", "EN", "MI", "SE"],
            EMPLOYMENT_TYPE => ["FT", "FT", "CT", "FT", "FT"],
            JOB_TITLE => ["Data Analyst", "ML Engineer", "Data Analyst", "Data Scientist", "Architect"],
            SALARY => [100_000i64, 120_000, 140_000, 90_000, 200_000],
            REMOTE_RATIO => [0i64, 100, 50, 0, 75],
            COMPANY_LOCATION => ["US", "US", "DE", "ZZ", "GB"],
            COMPANY_SIZE => ["M", "L", "S", "M", "L"]
        }
        .unwrap();
        DerivedTable::from_frame(frame).unwrap()
    }

    fn empty_frame(table: &DerivedTable) -> DataFrame {
        table.frame().clear()
    }

    #[test]
    fn test_kpi_summary() {
        let table = create_test_table();
        let kpis = kpi_summary(table.frame()).unwrap();
        assert_eq!(kpis.count, 5);
        assert_eq!(kpis.mean, 130_000.0);
        assert_eq!(kpis.median, 120_000.0);
        // sample std of [100k, 120k, 140k, 90k, 200k]
        let expected = (7_600_000_000.0f64 / 4.0).sqrt();
        assert!((kpis.std_dev - expected).abs() < 1e-6);
    }

    #[test]
    fn test_kpi_summary_empty() {
        let table = create_test_table();
        let kpis = kpi_summary(&empty_frame(&table)).unwrap();
        assert_eq!(kpis, KpiSummary::default());
        assert_eq!(kpis.mean, 0.0);
        assert_eq!(kpis.count, 0);
    }

    #[test]
    fn test_kpi_single_row_std_is_zero() {
        let table = create_test_table();
        let view = apply(&table, &FilterSelection::all().with_country("Germany")).unwrap();
        let kpis = kpi_summary(view.frame()).unwrap();
        assert_eq!(kpis.count, 1);
        assert_eq!(kpis.mean, 140_000.0);
        assert_eq!(kpis.std_dev, 0.0);
    }

    #[test]
    fn test_top_n_by_job_title() {
        let table = create_test_table();
        let top = top_n_by(table.frame(), GroupField::JobTitle, 10).unwrap();
        let keys: Vec<&str> = top.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["Architect", "Data Analyst", "ML Engineer", "Data Scientist"]
        );
        assert_eq!(top[1].mean_salary, 120_000.0);
        assert_eq!(top[1].count, 2);
    }

    #[test]
    fn test_top_n_tie_break_and_truncation() {
        // Data Analyst and ML Engineer both average 120k
        let table = create_test_table();
        let top = top_n_by(table.frame(), GroupField::JobTitle, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key, "Architect");
        assert_eq!(top[1].key, "Data Analyst");

        let next = top_n_by(table.frame(), GroupField::JobTitle, 3).unwrap();
        assert_eq!(next[2].key, "ML Engineer");
    }

    #[test]
    fn test_top_n_by_country_excludes_absent() {
        let table = create_test_table();
        let top = top_n_by(table.frame(), GroupField::Country, 10).unwrap();
        let keys: Vec<&str> = top.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["United Kingdom", "Germany", "United States"]);
        assert_eq!(top.iter().map(|g| g.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_group_results_empty_input() {
        let table = create_test_table();
        let empty = empty_frame(&table);
        assert!(top_n_by(&empty, GroupField::JobTitle, 10).unwrap().is_empty());
        assert!(top_n_by(&empty, GroupField::Country, 10).unwrap().is_empty());
        assert!(mean_by_remote(&empty).unwrap().is_empty());
        assert!(salary_histogram(&empty, 30).unwrap().is_empty());
        assert!(experience_spread(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_mean_by_remote() {
        let table = create_test_table();
        let remote = mean_by_remote(table.frame()).unwrap();
        assert_eq!(
            remote,
            vec![
                GroupMean {
                    key: "Fully Remote".to_string(),
                    mean_salary: 120_000.0,
                    count: 1
                },
                GroupMean {
                    key: "No Remote".to_string(),
                    mean_salary: 95_000.0,
                    count: 2
                },
                GroupMean {
                    key: "Partially Remote".to_string(),
                    mean_salary: 140_000.0,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_annual_trend() {
        let frame = df! {
            WORK_YEAR => [2023i64, 2022, 2022],
            EXPERIENCE_LEVEL => ["EN", "EN", "SE"],
            EMPLOYMENT_TYPE => ["FT", "FT", "FT"],
            JOB_TITLE => ["A", "B", "C"],
            SALARY => [140_000i64, 100_000, 120_000],
            REMOTE_RATIO => [0i64, 0, 0],
            COMPANY_LOCATION => ["US", "US", "US"],
            COMPANY_SIZE => ["M", "M", "M"]
        }
        .unwrap();
        let table = DerivedTable::from_frame(frame).unwrap();
        assert_eq!(
            annual_trend(&table).unwrap(),
            vec![
                YearMedian {
                    year: 2022,
                    median_salary: 110_000.0
                },
                YearMedian {
                    year: 2023,
                    median_salary: 140_000.0
                },
            ]
        );
    }

    #[test]
    fn test_salary_histogram() {
        let table = create_test_table();
        let bins = salary_histogram(table.frame(), 11).unwrap();
        assert_eq!(bins.len(), 11);
        assert_eq!(bins[0].lower, 90_000.0);
        assert_eq!(bins[10].upper, 200_000.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        // the maximum lands in the closed last bin
        assert_eq!(bins[10].count, 1);
        assert_eq!(bins[0].count, 1);
    }

    #[test]
    fn test_salary_histogram_single_value() {
        let table = create_test_table();
        let view = apply(&table, &FilterSelection::all().with_country("Germany")).unwrap();
        let bins = salary_histogram(view.frame(), 30).unwrap();
        assert_eq!(
            bins,
            vec![HistogramBin {
                lower: 140_000.0,
                upper: 140_000.0,
                count: 1
            }]
        );
    }

    #[test]
    fn test_experience_spread() {
        let table = create_test_table();
        let spread = experience_spread(table.frame()).unwrap();
        let labels: Vec<&str> = spread.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Entry-level", "Mid-level", "Senior-level"]);

        let entry = &spread[0];
        assert_eq!(entry.count, 2);
        assert_eq!(entry.min, 100_000.0);
        assert_eq!(entry.q1, 110_000.0);
        assert_eq!(entry.median, 120_000.0);
        assert_eq!(entry.q3, 130_000.0);
        assert_eq!(entry.max, 140_000.0);
    }

    #[test]
    fn test_experience_spread_interpolates_quartiles() {
        let frame = df! {
            WORK_YEAR => [2023i64, 2023, 2023, 2023, 2023],
            EXPERIENCE_LEVEL => ["EX", "EX", "EX", "EX", "??"],
            EMPLOYMENT_TYPE => ["FT", "FT", "FT", "FT", "FT"],
            JOB_TITLE => ["CTO", "CTO", "CTO", "CTO", "Intern"],
            SALARY => [4_000i64, 1_000, 3_000, 2_000, 500],
            REMOTE_RATIO => [0i64, 0, 0, 0, 0],
            COMPANY_LOCATION => ["US", "US", "US", "US", "US"],
            COMPANY_SIZE => ["L", "L", "L", "L", "S"]
        }
        .unwrap();
        let table = DerivedTable::from_frame(frame).unwrap();

        let spread = experience_spread(table.frame()).unwrap();
        assert_eq!(
            spread,
            vec![SalarySpread {
                label: "Executive-level".to_string(),
                count: 4,
                min: 1_000.0,
                q1: 1_750.0,
                median: 2_500.0,
                q3: 3_250.0,
                max: 4_000.0,
            }]
        );
    }
}
