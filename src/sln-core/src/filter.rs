//! Filter engine
//!
//! A [`FilterSelection`] is turned into an explicit list of typed
//! [`Predicate`]s which are ANDed together. Each categorical field is either
//! unconstrained (`None`) or pinned to exactly one display value; the salary
//! range always applies and defaults to the table's observed bounds.

use std::fmt;

use polars::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::table::columns::*;
use crate::table::{records, DerivedTable, SalaryRecord};

/// Inclusive salary interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalaryRange {
    min: f64,
    max: f64,
}

impl SalaryRange {
    /// Create a range, rejecting `min > max` and NaN bounds
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(Error::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub(crate) fn unchecked(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Lower bound
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Whether `value` lies inside the range
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Overlap of this range with `bounds`, if any
    #[must_use]
    pub fn intersect(&self, bounds: SalaryRange) -> Option<SalaryRange> {
        let min = self.min.max(bounds.min);
        let max = self.max.min(bounds.max);
        (min <= max).then_some(SalaryRange { min, max })
    }
}

impl fmt::Display for SalaryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Categorical fields that can be pinned to a display value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LabelField {
    /// Experience label (`Entry-level`, ...)
    ExperienceLevel,
    /// Employment type label (`Full-Time`, ...)
    EmploymentType,
    /// Company size code (`S`, `M`, `L`)
    CompanySize,
    /// Country name
    Country,
}

impl LabelField {
    /// Column the field is matched against
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            LabelField::ExperienceLevel => EXP_LEVEL_NAME,
            LabelField::EmploymentType => EMPLOYMENT_TYPE_NAME,
            LabelField::CompanySize => COMPANY_SIZE,
            LabelField::Country => COUNTRY,
        }
    }
}

/// One filter constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `work_year` equals the year
    Year(i32),
    /// The field's display value equals `value` exactly
    Equals {
        /// Field to match
        field: LabelField,
        /// Display value to keep
        value: String,
    },
    /// `salary_in_usd` lies within the range, bounds included
    SalaryBetween(SalaryRange),
}

impl Predicate {
    /// Convert to a Polars expression
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        match self {
            Predicate::Year(year) => col(WORK_YEAR).eq(lit(*year)),
            Predicate::Equals { field, value } => col(field.column()).eq(lit(value.clone())),
            Predicate::SalaryBetween(range) => col(SALARY)
                .gt_eq(lit(range.min()))
                .and(col(SALARY).lt_eq(lit(range.max()))),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Year(year) => write!(f, "{WORK_YEAR} == {year}"),
            Predicate::Equals { field, value } => write!(f, "{} == {value:?}", field.column()),
            Predicate::SalaryBetween(range) => write!(f, "{SALARY} in {range}"),
        }
    }
}

/// Current filter choices; `None` means "all"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSelection {
    /// Work year
    pub work_year: Option<i32>,
    /// Experience label
    pub experience_level: Option<String>,
    /// Employment type label
    pub employment_type: Option<String>,
    /// Company size code
    pub company_size: Option<String>,
    /// Country name
    pub country: Option<String>,
    /// Salary range; the full observed range when unset
    pub salary_range: Option<SalaryRange>,
}

impl FilterSelection {
    /// Selection with no constraints
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Pin the work year
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.work_year = Some(year);
        self
    }

    /// Pin the experience label
    #[must_use]
    pub fn with_experience_level(mut self, label: impl Into<String>) -> Self {
        self.experience_level = Some(label.into());
        self
    }

    /// Pin the employment type label
    #[must_use]
    pub fn with_employment_type(mut self, label: impl Into<String>) -> Self {
        self.employment_type = Some(label.into());
        self
    }

    /// Pin the company size
    #[must_use]
    pub fn with_company_size(mut self, size: impl Into<String>) -> Self {
        self.company_size = Some(size.into());
        self
    }

    /// Pin the country name
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Constrain the salary range
    pub fn with_salary_range(mut self, min: f64, max: f64) -> Result<Self> {
        self.salary_range = Some(SalaryRange::new(min, max)?);
        Ok(self)
    }

    /// Number of pinned categorical fields
    #[must_use]
    pub fn pinned_count(&self) -> usize {
        usize::from(self.work_year.is_some())
            + self
                .labels()
                .iter()
                .filter(|(_, value)| value.is_some())
                .count()
    }

    fn labels(&self) -> [(LabelField, Option<&String>); 4] {
        [
            (LabelField::ExperienceLevel, self.experience_level.as_ref()),
            (LabelField::EmploymentType, self.employment_type.as_ref()),
            (LabelField::CompanySize, self.company_size.as_ref()),
            (LabelField::Country, self.country.as_ref()),
        ]
    }

    /// Salary range actually applied against a table with `bounds`
    ///
    /// A requested range is clamped to the bounds. A range entirely outside them
    /// is kept as requested; it matches no rows.
    #[must_use]
    pub fn effective_salary_range(&self, bounds: SalaryRange) -> SalaryRange {
        match self.salary_range {
            Some(range) => range.intersect(bounds).unwrap_or(range),
            None => bounds,
        }
    }

    /// Predicates for this selection, categorical ones first
    #[must_use]
    pub fn predicates(&self, bounds: SalaryRange) -> Vec<Predicate> {
        let mut predicates: Vec<Predicate> = self.work_year.map(Predicate::Year).into_iter().collect();
        predicates.extend(self.labels().into_iter().filter_map(|(field, value)| {
            value.map(|value| Predicate::Equals {
                field,
                value: value.clone(),
            })
        }));
        predicates.push(Predicate::SalaryBetween(
            self.effective_salary_range(bounds),
        ));
        predicates
    }
}

/// Rows of a [`DerivedTable`] that satisfy a selection
#[derive(Debug, Clone)]
pub struct FilteredView {
    frame: DataFrame,
    predicates: Vec<Predicate>,
}

impl FilteredView {
    /// The filtered rows
    #[must_use]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows kept
    #[must_use]
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether no row matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Predicates that produced this view
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// The filtered rows as typed records
    pub fn records(&self) -> Result<Vec<SalaryRecord>> {
        records(&self.frame)
    }
}

/// Apply `selection` to `table`
///
/// Predicates are applied one after another; once an intermediate result is
/// empty the remaining ones are skipped.
pub fn apply(table: &DerivedTable, selection: &FilterSelection) -> Result<FilteredView> {
    let predicates = selection.predicates(table.salary_bounds());
    let mut frame = table.frame().clone();

    for predicate in &predicates {
        if frame.height() == 0 {
            log::debug!("Filtered view already empty, skipping {predicate}");
            continue;
        }
        frame = frame.lazy().filter(predicate.to_expr()).collect()?;
        log::debug!("{predicate}: {} row(s) left", frame.height());
    }

    Ok(FilteredView { frame, predicates })
}
