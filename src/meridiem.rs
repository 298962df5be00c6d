//! Day-boundary date repair for scraped day pages.
//!
//! The source site's day boundary does not line up with midnight for some
//! night-shift rows: a day page can start with evening rows that belong to
//! the previous calendar day, or end with post-midnight rows that belong to
//! the next one. The page labels all of them with its own date. This module
//! detects that mislabeling from the rows' AM/PM pattern and shifts the
//! affected dates, leaving the times untouched.

use chrono::{Days, Timelike};

use crate::record::Observation;

/// AM or PM half of a 12-hour clock day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn of(time: chrono::NaiveTime) -> Self {
        if time.hour() < 12 {
            Meridiem::Am
        } else {
            Meridiem::Pm
        }
    }
}

impl Observation {
    pub fn meridiem(&self) -> Meridiem {
        Meridiem::of(self.time)
    }
}

/// Collapses the rows' meridiems into their list of consecutive runs,
/// e.g. AM,AM,PM,PM,PM becomes [AM, PM].
pub fn meridiem_runs(rows: &[Observation]) -> Vec<Meridiem> {
    let mut runs: Vec<Meridiem> = Vec::new();
    for row in rows {
        let m = row.meridiem();
        if runs.last() != Some(&m) {
            runs.push(m);
        }
    }
    runs
}

/// A chronologically ordered day reads AM-then-PM; anything else means some
/// rows carry the wrong date.
pub fn is_well_formed(runs: &[Meridiem]) -> bool {
    matches!(
        runs,
        [] | [Meridiem::Am] | [Meridiem::Pm] | [Meridiem::Am, Meridiem::Pm]
    )
}

/// True when every calendar date carried by `rows` has a well-formed run
/// list. A freshly scraped page carries a single date, so this reduces to
/// checking the whole page; after a repair the shifted rows carry their own
/// dates and each group checks out on its own, which makes [`repair_dates`]
/// a no-op the second time around.
fn dates_consistent(rows: &[Observation]) -> bool {
    rows.chunk_by(|a, b| a.date == b.date)
        .all(|day| is_well_formed(&meridiem_runs(day)))
}

/// Repairs mislabeled dates on one scraped page, in place.
///
/// Trailing AM rows are post-midnight hours that belong to the next calendar
/// day; leading PM rows are evening hours that belong to the previous one.
/// Both directional scans stop at the first row of the other meridiem, so
/// they touch disjoint ends of the page. Returns whether anything changed.
///
/// Repair is page-local: a page that is entirely AM or entirely PM is left
/// alone even if it disagrees with its neighbors.
pub fn repair_dates(rows: &mut [Observation]) -> bool {
    if dates_consistent(rows) {
        return false;
    }
    for row in rows.iter_mut().rev() {
        if row.meridiem() != Meridiem::Am {
            break;
        }
        row.date = row.date + Days::new(1);
    }
    for row in rows.iter_mut() {
        if row.meridiem() != Meridiem::Pm {
            break;
        }
        row.date = row.date - Days::new(1);
    }
    true
}
