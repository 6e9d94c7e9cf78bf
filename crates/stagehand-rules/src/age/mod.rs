//! Calendar helpers: the clock the rules read "today" from and the age rule.

use time::{Date, Month, OffsetDateTime};

/// Source of the current date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> Date;
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(Date);

impl FixedClock {
    /// Creates a clock that always reports `today`.
    #[must_use]
    pub const fn new(today: Date) -> Self {
        Self(today)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

/// Age in whole years on `today` of someone born on `birthdate`.
///
/// The year difference is reduced by one when the birthday has not yet
/// come round. Someone born on 29 February has their birthday on 1 March in
/// common years. A birthdate after `today` yields a negative age.
///
/// ```
/// use stagehand_rules::age_on;
/// use time::macros::date;
///
/// assert_eq!(age_on(date!(1990 - 05 - 01), date!(2024 - 04 - 30)), 33);
/// assert_eq!(age_on(date!(1990 - 05 - 01), date!(2024 - 05 - 01)), 34);
/// ```
#[must_use]
pub fn age_on(birthdate: Date, today: Date) -> i64 {
    let years = i64::from(today.year()) - i64::from(birthdate.year());
    if birthdate > shift_to_year(today, birthdate.year()) {
        years - 1
    } else {
        years
    }
}

/// Moves `day` into `year`, clamping 29 February to the 28th.
fn shift_to_year(day: Date, year: i32) -> Date {
    day.replace_year(year).unwrap_or_else(|_| {
        Date::from_calendar_date(year, Month::February, 28).unwrap_or(day)
    })
}
