//! Some utility functions, to pretty-print the views in a terminal

use chrono::NaiveDate;

use crate::board::{SyncStatus, TaskBoard};
use crate::meeting::Meeting;
use crate::partition::{FocusSummary, WeekBoard};
use crate::task::Task;
use crate::traits::RemoteStore;

const NO_DATE: &str = "----------";

/// A debug utility that pretty-prints the kanban board of a week
pub fn print_week(week: &WeekBoard) {
    println!("INBOX / OVERDUE");
    if week.inbox.is_empty() {
        println!("    (empty)");
    }
    for task in &week.inbox {
        print_task(task);
    }

    for day in week.days() {
        println!("{}", day.format("%a %m/%d"));
        for task in week.day(day) {
            print_task(task);
        }
    }

    if week.later.is_empty() == false {
        println!("({} task(s) scheduled after this week)", week.later.len());
    }
}

/// Pretty-prints the tasks of a board, with their local sync status
pub fn print_board<S: RemoteStore>(board: &TaskBoard<S>) {
    for task in board.tasks() {
        let sync = match board.sync_status(task.id()) {
            Some(SyncStatus::Synced) | None => "=",
            Some(SyncStatus::LocallyModified) => "~",
            Some(SyncStatus::Confirmed) => "+",
            Some(SyncStatus::Failed(_)) => "!",
        };
        print!("{}", sync);
        print_task(task);
    }
}

pub fn print_task(task: &Task) {
    let completion = if task.state() == "Done" { "✓" } else { " " };
    let date = task.date().map(format_date).unwrap_or_else(|| NO_DATE.to_string());
    println!("    {} {} [{:<5} {}] {}\t{} ({})",
        completion, date, task.theme(), task.theme().color().to_hex_string(), task.name(), task.state(), task.id());
}

pub fn print_focus(summary: &FocusSummary, tasks: &[Task]) {
    println!("{} {:?}  week #{}  day {}/{} ({}% of the year)",
        format_date(summary.date), summary.weekday, summary.week_number,
        summary.day_of_year, summary.days_in_year, summary.year_progress);
    if tasks.is_empty() {
        println!("    No tasks for today.");
    }
    for task in tasks {
        print_task(task);
    }
}

pub fn print_meetings(meetings: &[Meeting]) {
    if meetings.is_empty() {
        println!("    No meeting notes found.");
    }
    for meeting in meetings {
        let date = meeting.date().map(format_date).unwrap_or_else(|| NO_DATE.to_string());
        println!("    {} {}\t{}\t{}\t[{}]", date, meeting.name(), meeting.state(), meeting.summary(), meeting.keywords().join(", "));
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
