//! Terminal rendering of dashboard views.
//!
//! Temperatures are shown with two decimals and a degree sign, counts with
//! thousands separators and dates as `YYYY-MM-DD`. Undefined statistics are
//! shown as an em dash placeholder.

use crate::aggregate::LocationDistribution;
use crate::constants::HISTOGRAM_BAR_WIDTH;
use crate::dashboard::{StatisticsView, StoreStatus, UploadPreview};
use crate::ingest::ColumnInfo;
use crate::models::{ColumnSlot, DailyStatistics, DateRange, Dataset, Location, LocationFilter, TemperatureStats};
use crate::normalize::{NormalizeReport, TimestampLayout};
use colored::*;

/// Placeholder for undefined values
pub const UNDEFINED: &str = "\u{2014}";

pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}°", v),
        None => UNDEFINED.to_string(),
    }
}

/// `1234567` as `1,234,567`
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_range(range: &DateRange) -> String {
    match (range.start, range.end) {
        (Some(start), Some(end)) => format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
        _ => "all dates".to_string(),
    }
}

/// Left-aligned text table with a header rule
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();

    let mut out = String::new();
    out.push_str(&padded_line(headers, &widths));
    out.push('\n');
    out.push_str(&padded_line(&rule, &widths));
    for row in rows {
        out.push('\n');
        out.push_str(&padded_line(row, &widths));
    }
    out
}

fn padded_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Histogram bar scaled against the largest bin
pub fn bar(count: usize, max: usize, width: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let filled = ((count as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(filled.max(1))
}

fn heading(title: &str) {
    println!();
    println!("{}", title.bright_green().bold());
    println!("{}", "━".repeat(title.chars().count()).bright_black());
}

pub fn print_status(status: &StoreStatus, target: &str) {
    println!("{} {}", "Database:".bright_white(), target.bright_cyan());
    if status.table_exists {
        println!(
            "{} {} rows in temperature_logs",
            "Data already exists:".bright_green(),
            format_count(status.rows)
        );
    } else {
        println!("{}", "No data uploaded yet. Please upload a file.".yellow());
    }
}

pub fn column_info_table(columns: &[ColumnInfo]) -> String {
    let rows: Vec<Vec<String>> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| vec![i.to_string(), c.name.clone(), format_count(c.non_null), c.dtype.clone()])
        .collect();
    table(&["#", "Column", "Non-Null Count", "Dtype"], &rows)
}

pub fn readings_table(dataset: &Dataset, limit: usize) -> String {
    let columns = dataset.columns();
    let headers = columns.names();
    let slots = columns.slots();

    let rows: Vec<Vec<String>> = dataset
        .iter()
        .take(limit)
        .map(|r| {
            slots
                .iter()
                .map(|&slot| match slot {
                    ColumnSlot::Timestamp => r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ColumnSlot::Temperature => format_temperature(r.temperature),
                    ColumnSlot::Location => r.location.clone().unwrap_or_default(),
                    ColumnSlot::Extra(index) => {
                        r.extras.get(index).cloned().flatten().unwrap_or_default()
                    }
                })
                .collect()
        })
        .collect();
    table(&headers, &rows)
}

/// Human description of what normalization coerced
pub fn report_notes(report: &NormalizeReport) -> Vec<String> {
    let mut notes = Vec::new();
    if report.timestamp_layout == TimestampLayout::Permissive {
        notes.push("Timestamps did not match DD-MM-YYYY HH:MM; parsed with the general-purpose date parser".to_string());
    }
    if report.missing_temperatures > 0 {
        notes.push(format!(
            "{} rows have a missing or non-numeric temperature",
            format_count(report.missing_temperatures)
        ));
    }
    if report.unrecognised_locations > 0 {
        notes.push(format!(
            "{} rows have a location other than In/Out",
            format_count(report.unrecognised_locations)
        ));
    }
    if report.missing_locations > 0 {
        notes.push(format!(
            "{} rows have no location",
            format_count(report.missing_locations)
        ));
    }
    notes
}

pub fn print_upload_preview(preview: &UploadPreview, limit: usize) {
    heading("Raw data preview");
    println!("{}", preview.raw_head);

    heading("Data information");
    println!("{} rows, {} columns", format_count(preview.rows), preview.columns.len());
    println!("{}", column_info_table(&preview.columns));

    heading("Processed data preview");
    match &preview.normalized {
        Ok(normalized) => {
            println!("{}", readings_table(&normalized.head, limit));
            for note in report_notes(&normalized.report) {
                println!("{} {}", "note:".yellow().bold(), note);
            }
        }
        Err(e) => {
            println!("{} {}", "Upload would be rejected:".red().bold(), e);
        }
    }
}

pub fn print_series(dataset: &Dataset, filter: LocationFilter, range: &DateRange, limit: usize) {
    let scope = match filter.location() {
        Some(location) => location.display_name(),
        None => "All locations",
    };
    heading(&format!("Temperature over time: {}, {}", scope, format_range(range)));
    println!("{}", readings_table(dataset, limit));
    if dataset.len() > limit {
        println!(
            "{}",
            format!("... {} more rows", format_count(dataset.len() - limit)).bright_black()
        );
    }
}

pub fn print_distribution(groups: &[LocationDistribution]) {
    heading("Temperature distribution");
    for group in groups {
        println!();
        println!(
            "{} ({} records)",
            group.label.bright_cyan().bold(),
            format_count(group.records)
        );
        match group.summary {
            Some(s) => println!(
                "  min {}  q1 {}  median {}  q3 {}  max {}",
                format_temperature(Some(s.min)),
                format_temperature(Some(s.q1)),
                format_temperature(Some(s.median)),
                format_temperature(Some(s.q3)),
                format_temperature(Some(s.max))
            ),
            None => println!("  no temperature values"),
        }

        let max = group.bins.iter().map(|b| b.count).max().unwrap_or(0);
        for bin in group.bins.iter().filter(|b| b.count > 0) {
            println!(
                "  {:>9} – {:<9} {:>6} {}",
                format_temperature(Some(bin.lower)),
                format_temperature(Some(bin.upper)),
                format_count(bin.count),
                bar(bin.count, max, HISTOGRAM_BAR_WIDTH).cyan()
            );
        }
    }
}

fn stats_row(label: &str, stats: &TemperatureStats) -> Vec<String> {
    vec![
        label.to_string(),
        format_count(stats.records),
        format_temperature(stats.mean),
        format_temperature(stats.min),
        format_temperature(stats.max),
    ]
}

pub fn daily_table(daily: &[DailyStatistics]) -> String {
    let rows: Vec<Vec<String>> = daily
        .iter()
        .map(|d| {
            vec![
                d.date.format("%Y-%m-%d").to_string(),
                d.location.clone().unwrap_or_else(|| UNDEFINED.to_string()),
                format_count(d.records),
                format_temperature(d.mean),
                format_temperature(d.min),
                format_temperature(d.max),
            ]
        })
        .collect();
    table(&["Date", "Location", "Records", "Average", "Minimum", "Maximum"], &rows)
}

pub fn print_statistics(view: &StatisticsView, limit: Option<usize>) {
    let summary = &view.summary;
    heading("Overall statistics");
    println!("Total records:       {}", format_count(summary.total_records));
    println!("Average temperature: {}", format_temperature(summary.overall.mean));
    println!("Minimum temperature: {}", format_temperature(summary.overall.min));
    println!("Maximum temperature: {}", format_temperature(summary.overall.max));

    if let Some(split) = &summary.split {
        heading("Indoor vs outdoor");
        let rows: Vec<Vec<String>> = Location::ALL
            .iter()
            .map(|&location| stats_row(location.display_name(), split.get(location)))
            .collect();
        println!("{}", table(&["Location", "Records", "Average", "Minimum", "Maximum"], &rows));
    }

    heading("Daily statistics");
    let shown = limit.unwrap_or(view.daily.len()).min(view.daily.len());
    println!("{}", daily_table(&view.daily[..shown]));
    if shown < view.daily.len() {
        println!(
            "{}",
            format!("... {} more days", format_count(view.daily.len() - shown)).bright_black()
        );
    }
}
