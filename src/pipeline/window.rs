use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::Album;

/// The calendar month preceding a reference date, as a closed range
/// `[first instant, last instant]`.
///
/// Built once per run from a single "today" so that a long harvest never
/// sees the window move underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindow {
    start: NaiveDateTime,
    // first instant of the following month, exclusive
    end_exclusive: NaiveDateTime,
}

impl ReleaseWindow {
    /// Window covering the calendar month before `today`. The first of a
    /// month still refers to the month before.
    ///
    /// # Example
    ///
    /// ```
    /// let window = ReleaseWindow::previous_month(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    /// assert_eq!(window.label(), "December 2024");
    /// ```
    pub fn previous_month(today: NaiveDate) -> Self {
        let first_of_this_month = today - Duration::days(i64::from(today.day0()));
        let last_of_previous = first_of_this_month - Duration::days(1);
        let first_of_previous = last_of_previous - Duration::days(i64::from(last_of_previous.day0()));

        Self {
            start: first_of_previous.and_time(NaiveTime::MIN),
            end_exclusive: first_of_this_month.and_time(NaiveTime::MIN),
        }
    }

    /// Midnight on the first day of the month.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Last whole second of the month, `23:59:59` on its last day.
    pub fn end(&self) -> NaiveDateTime {
        self.end_exclusive - Duration::seconds(1)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.end_exclusive
    }

    /// Whether `album` was released inside the window. Releases whose date
    /// cannot be read are treated as outside.
    pub fn contains_release(&self, album: &Album) -> bool {
        parse_release_date(&album.release_date, &album.release_date_precision)
            .is_some_and(|d| self.contains(d))
    }

    /// Human readable month label, e.g. `March 2025`.
    pub fn label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }
}

/// Parses a catalog release date and places it at the first instant of its
/// period.
///
/// # Arguments
///
/// * `raw` - The release date as delivered, e.g. `2025-03-17`, `2025-03` or `2025`
/// * `precision` - The catalog's `release_date_precision`: `day`, `month` or
///   `year`. Any other value falls back to reading the precision from the
///   shape of `raw`.
///
/// # Returns
///
/// The first instant of the release's day, month or year, or `None` when
/// `raw` does not match its declared precision.
pub fn parse_release_date(raw: &str, precision: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let precision = match precision {
        "day" | "month" | "year" => precision,
        _ => match raw.split('-').count() {
            1 => "year",
            2 => "month",
            _ => "day",
        },
    };

    let date = match precision {
        "year" => NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok()?,
        "month" => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()?,
        _ => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?,
    };
    Some(date.and_time(NaiveTime::MIN))
}
