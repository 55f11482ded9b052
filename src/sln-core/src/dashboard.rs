//! Dashboard views
//!
//! A [`Dashboard`] binds a shared, read-only [`DerivedTable`] to view settings
//! and recomputes every panel from scratch for each [`FilterSelection`]. A
//! [`Session`] tracks the selection of one user and keeps the previous view when
//! a change is rejected.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aggregate::{
    annual_trend, experience_spread, kpi_summary, mean_by_remote, salary_histogram, top_n_by,
    GroupField, GroupMean, HistogramBin, KpiSummary, SalarySpread, YearMedian,
    DEFAULT_HISTOGRAM_BINS, DEFAULT_TOP_N,
};
use crate::error::{Error, Result};
use crate::filter::{apply, FilterSelection, FilteredView, SalaryRange};
use crate::options::FilterOptions;
use crate::table::DerivedTable;

/// Sizing of the ranked and binned panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Entries kept in the top-N rankings
    pub top_n: usize,
    /// Bins in the salary distribution
    pub histogram_bins: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl ViewSettings {
    /// Reject settings that would make panels meaningless
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::config("top_n must be at least 1"));
        }
        if self.histogram_bins == 0 {
            return Err(Error::config("histogram_bins must be at least 1"));
        }
        Ok(())
    }
}

/// Everything the presentation layer needs for one selection
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Selection the view was computed for
    pub selection: FilterSelection,
    /// Salary range actually applied
    pub salary_range: SalaryRange,
    /// Headline statistics of the filtered rows
    pub kpis: KpiSummary,
    /// Best-paid job titles
    pub top_job_titles: Vec<GroupMean>,
    /// Best-paying countries
    pub top_countries: Vec<GroupMean>,
    /// Mean salary per remote arrangement
    pub remote_means: Vec<GroupMean>,
    /// Median salary per year over the full dataset
    pub annual_trend: Vec<YearMedian>,
    /// Salary distribution of the filtered rows
    pub salary_histogram: Vec<HistogramBin>,
    /// Salary spread per experience level
    pub experience_spread: Vec<SalarySpread>,
    /// The filtered rows
    #[serde(skip)]
    pub filtered: FilteredView,
}

/// Shared dataset plus view settings
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: Arc<DerivedTable>,
    settings: ViewSettings,
    options: FilterOptions,
    trend: Vec<YearMedian>,
}

impl Dashboard {
    /// Prepare a dashboard over `table`
    ///
    /// Filter options and the annual trend do not depend on the selection, so
    /// they are computed once here.
    pub fn new(table: Arc<DerivedTable>, settings: ViewSettings) -> Result<Self> {
        settings.validate()?;
        let options = FilterOptions::from_table(&table)?;
        let trend = annual_trend(&table)?;
        Ok(Self {
            table,
            settings,
            options,
            trend,
        })
    }

    /// The underlying table
    #[must_use]
    pub fn table(&self) -> &DerivedTable {
        &self.table
    }

    /// View settings
    #[must_use]
    pub fn settings(&self) -> ViewSettings {
        self.settings
    }

    /// Choices offered by the filter controls
    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Median salary per year over the full dataset
    #[must_use]
    pub fn annual_trend(&self) -> &[YearMedian] {
        &self.trend
    }

    /// Compute every panel for `selection`
    pub fn view(&self, selection: &FilterSelection) -> Result<DashboardView> {
        let filtered = apply(&self.table, selection)?;
        let frame = filtered.frame();
        log::debug!(
            "Selection kept {} of {} row(s)",
            filtered.height(),
            self.table.height()
        );

        Ok(DashboardView {
            selection: selection.clone(),
            salary_range: selection.effective_salary_range(self.table.salary_bounds()),
            kpis: kpi_summary(frame)?,
            top_job_titles: top_n_by(frame, GroupField::JobTitle, self.settings.top_n)?,
            top_countries: top_n_by(frame, GroupField::Country, self.settings.top_n)?,
            remote_means: mean_by_remote(frame)?,
            annual_trend: self.trend.clone(),
            salary_histogram: salary_histogram(frame, self.settings.histogram_bins)?,
            experience_spread: experience_spread(frame)?,
            filtered,
        })
    }
}

/// One user's interaction state over a dashboard
#[derive(Debug)]
pub struct Session<'a> {
    dashboard: &'a Dashboard,
    view: DashboardView,
}

impl<'a> Session<'a> {
    /// Start with no constraints
    pub fn start(dashboard: &'a Dashboard) -> Result<Self> {
        let view = dashboard.view(&FilterSelection::all())?;
        Ok(Self { dashboard, view })
    }

    /// Current selection
    #[must_use]
    pub fn selection(&self) -> &FilterSelection {
        &self.view.selection
    }

    /// Current view
    #[must_use]
    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    /// Switch to `selection`; on error the current view is left untouched
    pub fn select(&mut self, selection: FilterSelection) -> Result<&DashboardView> {
        self.view = self.dashboard.view(&selection)?;
        Ok(&self.view)
    }

    /// Change only the salary range; `min > max` is rejected
    pub fn select_salary_range(&mut self, min: f64, max: f64) -> Result<&DashboardView> {
        let selection = match self.selection().clone().with_salary_range(min, max) {
            Ok(selection) => selection,
            Err(e) => {
                log::warn!("Rejected salary range [{min}, {max}]: {e}");
                return Err(e);
            }
        };
        self.select(selection)
    }

    /// Drop every constraint
    pub fn reset(&mut self) -> Result<&DashboardView> {
        self.select(FilterSelection::all())
    }
}
