//! Period selectors and the date windows they resolve to.
//!
//! Every analytics endpoint filters sales through a [`Window`] derived from
//! a single `period` parameter. Sale dates carry no time of day; for window
//! checks a sale sits at 00:00 UTC on its date, and both window boundaries
//! are inclusive.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Reporting period selected by the `period` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// Parse a `period` value. Only `"7"`, `"30"`, and `"365"` are
    /// recognized; anything else, including a missing value, is
    /// [`Period::Month`].
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("7") => Period::Week,
            Some("30") => Period::Month,
            Some("365") => Period::Year,
            _ => Period::Month,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Year => 365,
        }
    }
}

/// Source of "now" for window resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Wall-clock time in UTC, read on every request.
    #[default]
    System,
    /// A constant reference instant.
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => Utc::now().naive_utc(),
            Clock::Fixed(at) => *at,
        }
    }

    /// Resolve `period` against this clock.
    pub fn window(&self, period: Period) -> Window {
        Window::for_period(period, self.now())
    }
}

/// Inclusive `[start, end]` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    /// Build the window for `period` ending at `now`.
    ///
    /// Week and month subtract whole days. Year subtracts one from the year
    /// component, so it spans 366 days when a leap day falls inside. A
    /// 29 February `now` starts on 1 March of the previous year.
    pub fn for_period(period: Period, now: NaiveDateTime) -> Self {
        let start = match period {
            Period::Week | Period::Month => now - Duration::days(i64::from(period.days())),
            Period::Year => one_year_before(now),
        };
        Window { start, end: now }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let at = sale_instant(date);
        self.start <= at && at <= self.end
    }
}

/// The instant a sale date is compared at.
pub fn sale_instant(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn one_year_before(now: NaiveDateTime) -> NaiveDateTime {
    let year = now.year() - 1;
    match now.date().with_year(year) {
        Some(date) => date.and_time(now.time()),
        // 29 February with no counterpart rolls forward a day.
        None => NaiveDate::from_ymd_opt(year, 3, 1)
            .map(|date| date.and_time(now.time()))
            .unwrap_or(now - Duration::days(365)),
    }
}
