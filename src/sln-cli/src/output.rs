//! Output formatting for the sln CLI
//!
//! Renders a [`DashboardView`] or [`FilterOptions`] either as plain-text panels
//! or as a single JSON document.

use std::io::Write;

use anyhow::{Context, Result};
use num_format::{Locale, ToFormattedString};
use polars::prelude::*;
use serde::Serialize;
use sln_core::{DashboardView, FilterOptions, GroupMean, SalaryRecord};

use crate::config::{Config, OutputFormat};

const BAR_WIDTH: usize = 40;

/// Report writer for dashboard views
#[derive(Debug, Clone)]
pub struct OutputWriter {
    format: OutputFormat,
    row_limit: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    view: &'a DashboardView,
    rows: Vec<SalaryRecord>,
}

impl OutputWriter {
    /// Create a writer using the display settings of `config`
    pub fn new(config: &Config) -> Self {
        Self {
            format: config.display.format,
            row_limit: config.display.row_limit,
        }
    }

    /// Write every panel of `view`, followed by up to `row_limit` filtered rows
    pub fn write_view<W: Write>(&self, out: &mut W, view: &DashboardView) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let rows = view
                    .filtered
                    .records()?
                    .into_iter()
                    .take(self.row_limit)
                    .collect();
                let report = JsonReport { view, rows };
                serde_json::to_writer_pretty(&mut *out, &report)
                    .context("Failed to serialize dashboard view")?;
                writeln!(out)?;
            }
            OutputFormat::Text => self.write_text(out, view)?,
        }
        Ok(())
    }

    /// Write the values accepted by each filter
    pub fn write_options<W: Write>(&self, out: &mut W, options: &FilterOptions) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, options)
                    .context("Failed to serialize filter options")?;
                writeln!(out)?;
            }
            OutputFormat::Text => {
                let years: Vec<String> = options.years.iter().map(ToString::to_string).collect();
                writeln!(out, "Work years:        {}", years.join(", "))?;
                writeln!(out, "Experience levels: {}", options.experience_levels.join(", "))?;
                writeln!(out, "Employment types:  {}", options.employment_types.join(", "))?;
                writeln!(out, "Company sizes:     {}", options.company_sizes.join(", "))?;
                writeln!(out, "Countries:         {}", options.countries.join(", "))?;
                writeln!(
                    out,
                    "Salary range:      {} - {}",
                    usd(options.salary_bounds.min()),
                    usd(options.salary_bounds.max())
                )?;
            }
        }
        Ok(())
    }

    fn write_text<W: Write>(&self, out: &mut W, view: &DashboardView) -> Result<()> {
        let kpis = &view.kpis;
        writeln!(out, "Records:        {}", kpis.count.to_formatted_string(&Locale::en))?;
        writeln!(out, "Mean salary:    {}", usd(kpis.mean))?;
        writeln!(out, "Median salary:  {}", usd(kpis.median))?;
        writeln!(out, "Std deviation:  {}", usd(kpis.std_dev))?;
        writeln!(
            out,
            "Salary range:   {} - {}",
            usd(view.salary_range.min()),
            usd(view.salary_range.max())
        )?;
        for predicate in view.filtered.predicates() {
            writeln!(out, "  where {predicate}")?;
        }

        write_ranking(out, "Top job titles by mean salary", &view.top_job_titles)?;
        write_ranking(out, "Top countries by mean salary", &view.top_countries)?;
        write_ranking(out, "Mean salary by remote arrangement", &view.remote_means)?;

        writeln!(out, "\nMedian salary by year (all records)")?;
        for point in &view.annual_trend {
            writeln!(out, "  {}  {}", point.year, usd(point.median_salary))?;
        }

        writeln!(out, "\nSalary distribution")?;
        let peak = view
            .salary_histogram
            .iter()
            .map(|bin| bin.count)
            .max()
            .unwrap_or(0);
        for bin in &view.salary_histogram {
            let width = if peak == 0 { 0 } else { bin.count * BAR_WIDTH / peak };
            writeln!(
                out,
                "  {:>10} - {:<10} {:<width$} {}",
                usd(bin.lower),
                usd(bin.upper),
                "#".repeat(width),
                bin.count,
                width = BAR_WIDTH
            )?;
        }

        writeln!(out, "\nSalary spread by experience level")?;
        for spread in &view.experience_spread {
            writeln!(
                out,
                "  {:<16} n={:<6} min {}  q1 {}  median {}  q3 {}  max {}",
                spread.label,
                spread.count,
                usd(spread.min),
                usd(spread.q1),
                usd(spread.median),
                usd(spread.q3),
                usd(spread.max)
            )?;
        }

        if self.row_limit > 0 && !view.filtered.is_empty() {
            writeln!(
                out,
                "\nRecords (first {} of {})",
                self.row_limit.min(view.filtered.height()),
                view.filtered.height()
            )?;
            let mut head = view.filtered.frame().head(Some(self.row_limit));
            CsvWriter::new(&mut *out)
                .include_header(true)
                .finish(&mut head)
                .context("Failed to write records")?;
        }
        Ok(())
    }
}

fn write_ranking<W: Write>(out: &mut W, title: &str, groups: &[GroupMean]) -> Result<()> {
    writeln!(out, "\n{title}")?;
    for (rank, group) in groups.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<32} {:>12}  (n={})",
            rank + 1,
            group.key,
            usd(group.mean_salary),
            group.count
        )?;
    }
    Ok(())
}

fn usd(value: f64) -> String {
    let rounded = value.round() as i64;
    format!("${}", rounded.to_formatted_string(&Locale::en))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sln_core::table::columns::*;
    use sln_core::{Dashboard, DerivedTable, FilterSelection, ViewSettings};
    use std::sync::Arc;

    fn create_test_dashboard() -> Dashboard {
        let frame = df! {
            WORK_YEAR => [2022i64, 2022, 2023],
            EXPERIENCE_LEVEL => ["EN", "SE", "EN"],
            EMPLOYMENT_TYPE => ["FT", "FT", "FT"],
            JOB_TITLE => ["Data Analyst", "ML Engineer", "Data Analyst"],
            SALARY => [50_000i64, 150_000, 60_000],
            REMOTE_RATIO => [0i64, 100, 50],
            COMPANY_LOCATION => ["US", "US", "DE"],
            COMPANY_SIZE => ["M", "L", "S"]
        }
        .unwrap();
        let table = Arc::new(DerivedTable::from_frame(frame).unwrap());
        Dashboard::new(table, ViewSettings::default()).unwrap()
    }

    fn writer(format: OutputFormat, row_limit: usize) -> OutputWriter {
        let mut config = Config::default();
        config.display.format = format;
        config.display.row_limit = row_limit;
        OutputWriter::new(&config)
    }

    #[test]
    fn test_usd() {
        assert_eq!(usd(0.0), "$0");
        assert_eq!(usd(1_234_567.4), "$1,234,567");
        assert_eq!(usd(99.5), "$100");
    }

    #[test]
    fn test_text_report() {
        let dashboard = create_test_dashboard();
        let view = dashboard
            .view(&FilterSelection::all().with_experience_level("Entry-level"))
            .unwrap();

        let mut out = Vec::new();
        writer(OutputFormat::Text, 1).write_view(&mut out, &view).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Records:        2"));
        assert!(text.contains("Mean salary:    $55,000"));
        assert!(text.contains("where exp_level_name == \"Entry-level\""));
        assert!(text.contains("Data Analyst"));
        assert!(!text.contains("ML Engineer"));
        assert!(text.contains("Records (first 1 of 2)"));
        assert!(text.contains("salary_in_usd"));
    }

    #[test]
    fn test_text_report_without_rows() {
        let dashboard = create_test_dashboard();
        let view = dashboard.view(&FilterSelection::all()).unwrap();

        let mut out = Vec::new();
        writer(OutputFormat::Text, 0).write_view(&mut out, &view).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Records (first"));
    }

    #[test]
    fn test_json_report() {
        let dashboard = create_test_dashboard();
        let view = dashboard.view(&FilterSelection::all()).unwrap();

        let mut out = Vec::new();
        writer(OutputFormat::Json, 2).write_view(&mut out, &view).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["kpis"]["count"], 3);
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert_eq!(json["top_job_titles"][0]["key"], "ML Engineer");
        assert_eq!(json["annual_trend"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_options_output() {
        let dashboard = create_test_dashboard();

        let mut out = Vec::new();
        writer(OutputFormat::Text, 0)
            .write_options(&mut out, dashboard.options())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Countries:         Germany, United States"));
        assert!(text.contains("Salary range:      $50,000 - $150,000"));

        let mut out = Vec::new();
        writer(OutputFormat::Json, 0)
            .write_options(&mut out, dashboard.options())
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["years"], serde_json::json!([2022, 2023]));
    }
}
