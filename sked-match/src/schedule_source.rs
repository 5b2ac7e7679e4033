//! Schedule sheet reading
//!
//! Turns exported schedule cells into [`ScheduleRow`]s. A schedule sheet is
//! a list of two-cell rows: time in the first column, title in the second.
//! Day headers ("1 сентября 2025") may sit in either column and apply to the
//! rows below them.

use crate::index::{IndexBuilder, IndexStats, ScheduleIndex, ScheduleRow};
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use sked_common::{Error, Result};
use std::path::Path;
use tracing::{debug, info, warn};

const MONTHS_GENITIVE: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа", "сентября",
    "октября", "ноября", "декабря",
];

const SECONDS_PER_DAY: i64 = 24 * 3600;

static TEXT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{1,2})\s+([а-яё]+)\s+([0-9]{4})").unwrap());

static DOTTED_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2})\.([0-9]{1,2})\.([0-9]{4})$").unwrap());

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$").unwrap());

static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2})[:.]([0-9]{2})(?::([0-9]{2}))?$").unwrap());

/// Parse a day header cell
///
/// Accepts "1 сентября 2025" (optionally preceded by a weekday),
/// "01.09.2025" and "2025-09-01".
pub fn parse_header_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim().to_lowercase();
    if cell.is_empty() {
        return None;
    }

    if let Some(caps) = TEXT_DATE_RE.captures(&cell) {
        let month_name = caps[2].replace('ё', "е");
        if let Some(month) = MONTHS_GENITIVE.iter().position(|m| *m == month_name) {
            return ymd(&caps[3], month as u32 + 1, &caps[1]);
        }
    }

    if let Some(caps) = DOTTED_DATE_RE.captures(&cell) {
        let month = caps[2].parse().ok()?;
        return ymd(&caps[3], month, &caps[1]);
    }

    if let Some(caps) = ISO_DATE_RE.captures(&cell) {
        let month = caps[2].parse().ok()?;
        return ymd(&caps[1], month, &caps[3]);
    }

    None
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Parse a time-of-day cell
///
/// Accepts "H:MM", "HH:MM:SS", "H.MM" and spreadsheet day fractions in
/// (-1, 2), e.g. "0.375" for 09:00. Clock forms are tried first.
pub fn parse_time(cell: &str) -> Option<NaiveTime> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    if let Some(caps) = CLOCK_RE.captures(cell) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let second: u32 = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        return NaiveTime::from_hms_opt(hour, minute, second);
    }

    let fraction: f64 = cell.replace(',', ".").parse().ok()?;
    if fraction.is_finite() && fraction > -1.0 && fraction < 2.0 {
        let seconds =
            ((fraction * SECONDS_PER_DAY as f64).round() as i64).rem_euclid(SECONDS_PER_DAY);
        return NaiveTime::from_num_seconds_from_midnight_opt(seconds as u32, 0);
    }

    None
}

/// One two-cell row of a schedule sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based source line, for diagnostics
    pub line: usize,
    pub time_cell: String,
    pub title_cell: String,
}

impl SheetRow {
    pub fn new(line: usize, time_cell: impl Into<String>, title_cell: impl Into<String>) -> Self {
        Self {
            line,
            time_cell: time_cell.into(),
            title_cell: title_cell.into(),
        }
    }

    fn header_date(&self) -> Option<NaiveDate> {
        parse_header_date(&self.title_cell).or_else(|| parse_header_date(&self.time_cell))
    }
}

/// Split tab-separated sheet text into rows
///
/// Blank lines are skipped; a line with one cell becomes a row with an empty
/// title (a possible day header).
pub fn read_sheet_text(text: &str) -> Vec<SheetRow> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let mut cells = line.splitn(2, '\t');
            let time_cell = cells.next().unwrap_or_default().trim();
            let title_cell = cells.next().unwrap_or_default().trim();
            SheetRow::new(i + 1, time_cell, title_cell)
        })
        .collect()
}

/// Walk sheet rows, tracking the current day, and index every airing
///
/// Rows before the first day header are ignored. Rows with an empty title or
/// an unparseable time are dropped with a warning.
pub fn build_index_from_sheet<I>(rows: I) -> (ScheduleIndex, IndexStats)
where
    I: IntoIterator<Item = SheetRow>,
{
    let mut builder = IndexBuilder::new();
    let mut current_day: Option<NaiveDate> = None;

    for row in rows {
        if let Some(day) = row.header_date() {
            debug!(line = row.line, day = %day, "Day header");
            current_day = Some(day);
            continue;
        }

        let Some(day) = current_day else {
            debug!(line = row.line, "Row before first day header ignored");
            continue;
        };

        if row.title_cell.trim().is_empty() {
            warn!(
                line = row.line,
                time = %row.time_cell,
                "Schedule row without title, row dropped"
            );
            builder.record_dropped();
            continue;
        }

        match parse_time(&row.time_cell) {
            Some(time) => {
                builder.push(ScheduleRow::new(day, time, row.title_cell));
            }
            None => {
                warn!(
                    line = row.line,
                    time = %row.time_cell,
                    title = %row.title_cell,
                    "Unparseable schedule time, row dropped"
                );
                builder.record_dropped();
            }
        }
    }

    let (index, stats) = builder.finish_with_stats();
    info!(
        rows = stats.rows,
        indexed = stats.indexed,
        dropped = stats.dropped,
        duplicates = stats.duplicates,
        keys = index.len(),
        "Schedule index built"
    );
    (index, stats)
}

/// Read a tab-separated schedule file and index it
///
/// A sheet with rows but no day header at all is rejected: none of its rows
/// could be dated.
pub fn load_schedule_file(path: &Path) -> Result<(ScheduleIndex, IndexStats)> {
    let text = std::fs::read_to_string(path)?;
    let rows = read_sheet_text(&text);
    if let Some(first) = rows.first() {
        if !rows.iter().any(|row| row.header_date().is_some()) {
            return Err(Error::Parse {
                line: first.line,
                message: "no day header found in schedule sheet".to_string(),
            });
        }
    }
    Ok(build_index_from_sheet(rows))
}
