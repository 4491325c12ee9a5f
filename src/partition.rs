//! Calendar views over a task list: the weekly kanban board and the focus view

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::task::Task;

pub const DAYS_IN_WEEK: i64 = 7;

/// Monday of the week `date` belongs to
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// A week of tasks, as displayed on the kanban board
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBoard {
    pub week_start: NaiveDate,
    /// Unscheduled tasks, and tasks scheduled before this week (overdue)
    pub inbox: Vec<Task>,
    /// Exactly seven entries, Monday to Sunday, including empty days
    pub by_weekday: BTreeMap<NaiveDate, Vec<Task>>,
    /// Tasks scheduled after this week. The board does not display them, but they are kept for callers that want to.
    pub later: Vec<Task>,
}

impl WeekBoard {
    /// The seven days of the week, in order
    pub fn days(&self) -> Vec<NaiveDate> {
        (0..DAYS_IN_WEEK)
            .map(|offset| self.week_start + Duration::days(offset))
            .collect()
    }

    /// Tasks of a given day (empty for days outside this week)
    pub fn day(&self, date: NaiveDate) -> &[Task] {
        self.by_weekday.get(&date)
            .map(|tasks| tasks.as_slice())
            .unwrap_or(&[])
    }
}

/// Split tasks into the inbox and the days of the week `reference` belongs to.
///
/// Every task lands in exactly one of `inbox`, one weekday bucket, or `later`.
/// Within a bucket, tasks keep the order they were given in.
pub fn partition(tasks: &[Task], reference: NaiveDate) -> WeekBoard {
    let start = week_start(reference);
    let end = start + Duration::days(DAYS_IN_WEEK - 1);

    let mut board = WeekBoard {
        week_start: start,
        inbox: Vec::new(),
        by_weekday: BTreeMap::new(),
        later: Vec::new(),
    };
    for day in board.days() {
        board.by_weekday.insert(day, Vec::new());
    }

    for task in tasks {
        match task.date() {
            None => board.inbox.push(task.clone()),
            Some(date) if date < start => board.inbox.push(task.clone()),
            Some(date) if date > end => board.later.push(task.clone()),
            Some(date) => {
                if let Some(bucket) = board.by_weekday.get_mut(&date) {
                    bucket.push(task.clone());
                }
            },
        }
    }

    log::debug!("Week of {}: {} task(s) in the inbox, {} after this week", start, board.inbox.len(), board.later.len());
    board
}


/// Number of the Monday-based week `date` belongs to.
///
/// Week 1 is the week holding January 1st (this is not ISO 8601, whose week 1 holds the first Thursday).
/// The last days of December are in week 1 of the next year when that week holds the next January 1st.
pub fn week_number(date: NaiveDate) -> u32 {
    if let Some(next_new_year) = NaiveDate::from_ymd_opt(date.year() + 1, 1, 1) {
        if date >= week_start(next_new_year) {
            return 1;
        }
    }
    let new_year_offset = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|new_year| new_year.weekday().num_days_from_monday())
        .unwrap_or(0);
    (date.ordinal0() + new_year_offset) / DAYS_IN_WEEK as u32 + 1
}

/// Figures about a single day, displayed next to its tasks in the focus view
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSummary {
    pub date: NaiveDate,
    pub weekday: Weekday,
    /// Week number, see [`week_number`]
    pub week_number: u32,
    pub day_of_year: u32,
    pub days_in_year: u32,
    /// Share of the year that has passed (today included), in percent, with one decimal
    pub year_progress: f64,
}

impl FocusSummary {
    pub fn for_day(date: NaiveDate) -> Self {
        let day_of_year = date.ordinal();
        let days_in_year = NaiveDate::from_ymd_opt(date.year(), 12, 31)
            .map(|last_day| last_day.ordinal())
            .unwrap_or(365);
        let progress = day_of_year as f64 / days_in_year as f64 * 100.0;

        Self {
            date,
            weekday: date.weekday(),
            week_number: week_number(date),
            day_of_year,
            days_in_year,
            year_progress: (progress * 10.0).round() / 10.0,
        }
    }
}
