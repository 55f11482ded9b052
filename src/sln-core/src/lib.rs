//! sln-core: Core pipeline for salarylens
//!
//! This crate loads a technology-industry salary dataset, derives display
//! labels from its raw codes, filters it with user selections and computes the
//! aggregates behind each dashboard panel. It is built on `Polars`
//! `DataFrames`; rendering is left to the caller.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sln_core::{Dashboard, DatasetCache, FilterSelection, ReadOptions, ViewSettings};
//!
//! let cache = DatasetCache::new("salaries.csv", ReadOptions::default());
//! let dashboard = Dashboard::new(cache.get()?, ViewSettings::default())?;
//!
//! let selection = FilterSelection::all()
//!     .with_experience_level("Senior-level")
//!     .with_country("Germany");
//! let view = dashboard.view(&selection)?;
//! println!("{} records, mean {}", view.kpis.count, view.kpis.mean);
//! # Ok::<(), sln_core::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`loader`] - CSV loading and the load-once [`DatasetCache`]
//! - [`labels`] - code-to-label lookups
//! - [`table`] - the immutable [`DerivedTable`]
//! - [`filter`] - typed predicates and the [`FilteredView`]
//! - [`aggregate`] - KPIs, rankings, trend, distribution
//! - [`options`] - values offered by each filter control
//! - [`dashboard`] - per-selection views and sessions
//! - [`error`] - error handling and result types

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::float_cmp
)]

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod labels;
pub mod loader;
pub mod options;
pub mod table;

pub use aggregate::{
    annual_trend, experience_spread, kpi_summary, mean_by_remote, salary_histogram, top_n_by,
    GroupField, GroupMean, HistogramBin, KpiSummary, SalarySpread, YearMedian,
};
pub use dashboard::{Dashboard, DashboardView, Session, ViewSettings};
pub use error::{Error, Result};
pub use filter::{apply, FilterSelection, FilteredView, LabelField, Predicate, SalaryRange};
pub use loader::{load, DatasetCache, ReadOptions, DEFAULT_DATA_PATH};
pub use options::FilterOptions;
pub use table::{DerivedTable, SalaryRecord, UnmappedCounts};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
