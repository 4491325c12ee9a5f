//! Scenarios that drive a `TaskBoard` against an in-memory store, and check what the views display

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde_json::{json, Value};

use notion_board::board::SyncStatus;
use notion_board::config::Schema;
use notion_board::error::Error;
use notion_board::memory_store::MemoryStore;
use notion_board::mock_behaviour::MockBehaviour;
use notion_board::{NewTask, Task, TaskBoard, TaskPatch, Theme};


fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn raw_task(id: &str, name: &str, date: Option<&str>, state: &str, cats: &[&str]) -> Value {
    json!({
        "object": "page",
        "id": id,
        "url": format!("https://www.notion.so/{}", id),
        "properties": {
            "Name": { "type": "title", "title": [ { "plain_text": name } ] },
            "Date": { "type": "date", "date": date.map(|start| json!({ "start": start })) },
            "State": { "type": "status", "status": { "name": state } },
            "Cat": { "type": "multi_select", "multi_select": cats.iter().map(|c| json!({ "name": c })).collect::<Vec<_>>() },
        }
    })
}

fn mock(behaviour: MockBehaviour) -> Arc<Mutex<MockBehaviour>> {
    Arc::new(Mutex::new(behaviour))
}

async fn refreshed_board(pages: Vec<Value>) -> TaskBoard<MemoryStore> {
    let mut store = MemoryStore::new();
    for page in pages {
        store.insert_raw(page);
    }
    let mut board = TaskBoard::new(store, Schema::default());
    board.refresh().await.unwrap();
    board
}

fn ids<'a, I: Iterator<Item = &'a Task>>(tasks: I) -> Vec<String> {
    tasks.map(|t| t.id().to_string()).collect()
}


#[tokio::test]
async fn refresh_skips_malformed_and_closed_records() {
    init_logger();

    let board = refreshed_board(vec![
        raw_task("thursday", "Ship it", Some("2024-06-13"), "Doing", &["Work"]),
        json!({ "object": "page", "id": "no-properties" }),
        json!({ "object": "database", "id": "not-a-page", "properties": {} }),
        raw_task("done", "Old stuff", Some("2024-06-11"), "Done", &["Work"]),
        raw_task("undated", "Someday", None, "INBOX", &[]),
        raw_task("monday", "Plan", Some("2024-06-10T09:00:00.000+09:00"), "INBOX", &["Life"]),
    ]).await;

    assert_eq!(ids(board.tasks()), vec!["undated", "monday", "thursday"]);
    assert!(board.last_refresh().is_some());
    assert_eq!(board.needs_refresh(), false);
    assert_eq!(board.get("monday").unwrap().theme(), Theme::Green);
}

#[tokio::test]
async fn undated_work_task_lands_in_the_inbox() {
    init_logger();

    let board = refreshed_board(vec![
        raw_task("abc", "Write report", None, "INBOX", &["Work", "Urgent"]),
    ]).await;

    let week = board.week(ymd(2024, 6, 12));
    assert_eq!(week.week_start, ymd(2024, 6, 10));
    assert_eq!(ids(week.inbox.iter()), vec!["abc"]);
    for day in week.days() {
        assert!(week.day(day).is_empty());
    }

    let task = &week.inbox[0];
    assert_eq!(task.name(), "Write report");
    assert_eq!(task.state(), "INBOX");
    assert_eq!(task.date(), None);
    assert_eq!(task.cat(), "Work");
    assert_eq!(task.sub_cats(), &["Urgent".to_string()]);
    assert_eq!(task.theme(), Theme::Blue);
}

#[tokio::test]
async fn week_board_buckets() {
    init_logger();

    let board = refreshed_board(vec![
        raw_task("first", "First", Some("2024-06-10"), "INBOX", &[]),
        raw_task("overdue", "Overdue", Some("2024-06-07"), "Doing", &[]),
        raw_task("second", "Second", Some("2024-06-10"), "INBOX", &[]),
        raw_task("sunday", "Sunday", Some("2024-06-16"), "INBOX", &[]),
        raw_task("next-week", "Next week", Some("2024-06-17"), "INBOX", &[]),
    ]).await;

    let week = board.week(ymd(2024, 6, 10));
    assert_eq!(ids(week.inbox.iter()), vec!["overdue"]);
    assert_eq!(ids(week.day(ymd(2024, 6, 10)).iter()), vec!["first", "second"]);
    assert_eq!(ids(week.day(ymd(2024, 6, 16)).iter()), vec!["sunday"]);
    assert_eq!(ids(week.later.iter()), vec!["next-week"]);
    assert_eq!(week.by_weekday.len(), 7);
}

#[tokio::test]
async fn successful_update_reaches_the_store() {
    init_logger();

    let mut board = refreshed_board(vec![
        raw_task("abc", "Write report", Some("2024-06-10"), "INBOX", &["Work"]),
    ]).await;

    board.update_task("abc", &TaskPatch::state("Done")).await.unwrap();
    assert_eq!(board.get("abc").unwrap().state(), "Done");
    assert_eq!(board.sync_status("abc"), Some(&SyncStatus::Confirmed));

    let page = board.store().page("abc").unwrap();
    assert_eq!(page["properties"]["State"]["status"]["name"], "Done");
    // Untouched properties are still there
    assert_eq!(page["properties"]["Name"]["title"][0]["plain_text"], "Write report");

    // Done tasks are not active anymore
    board.refresh().await.unwrap();
    assert!(board.get("abc").is_none());
}

#[tokio::test]
async fn failed_update_is_kept_until_the_next_refresh() {
    init_logger();

    let mut board = refreshed_board(vec![
        raw_task("abc", "Write report", Some("2024-06-10"), "INBOX", &["Work"]),
    ]).await;
    let mut behaviour = MockBehaviour::new();
    behaviour.update_page_behaviour = (0, 1);
    board.store_mut().set_mock_behaviour(Some(mock(behaviour)));

    let result = board.update_task("abc", &TaskPatch::date(Some(ymd(2024, 6, 12)))).await;
    assert!(matches!(result, Err(Error::Store(_))));

    // The local change is not reverted
    assert_eq!(board.get("abc").unwrap().date(), Some(ymd(2024, 6, 12)));
    assert!(matches!(board.sync_status("abc"), Some(SyncStatus::Failed(_))));
    assert!(board.needs_refresh());

    // A refresh converges to what the store actually has
    board.refresh().await.unwrap();
    assert_eq!(board.get("abc").unwrap().date(), Some(ymd(2024, 6, 10)));
    assert_eq!(board.sync_status("abc"), Some(&SyncStatus::Synced));
    assert_eq!(board.needs_refresh(), false);
}

#[tokio::test]
async fn failed_delete_is_not_reinserted() {
    init_logger();

    let mut board = refreshed_board(vec![
        raw_task("abc", "Write report", None, "INBOX", &[]),
        raw_task("xyz", "Call Mom", None, "INBOX", &[]),
    ]).await;
    let mut behaviour = MockBehaviour::new();
    behaviour.archive_page_behaviour = (1, 1);
    board.store_mut().set_mock_behaviour(Some(mock(behaviour)));

    board.delete_task("abc").await.unwrap();
    assert!(board.store().page("abc").is_none());

    let result = board.delete_task("xyz").await;
    assert!(matches!(result, Err(Error::Store(_))));
    assert!(board.get("xyz").is_none());
    assert!(board.is_empty());

    // The store still has it, so it shows up again after a refresh
    board.refresh().await.unwrap();
    assert_eq!(ids(board.tasks()), vec!["xyz"]);
}

#[tokio::test]
async fn created_tasks_start_in_the_inbox() {
    init_logger();

    let mut board = refreshed_board(vec![
        raw_task("later", "Later", Some("2024-06-14"), "INBOX", &[]),
    ]).await;

    let created = board.create_task(&NewTask::new("  ", Some(ymd(2024, 6, 11)))).await.unwrap();
    assert_eq!(created.name(), "New Task");
    assert_eq!(created.state(), "INBOX");
    assert_eq!(created.date(), Some(ymd(2024, 6, 11)));
    assert!(created.url().starts_with("https://www.notion.so/"));

    // Cached, in date order
    assert_eq!(ids(board.tasks()), vec![created.id().to_string(), "later".to_string()]);
    assert!(board.store().page(created.id()).is_some());
}

#[tokio::test]
async fn failed_refresh_keeps_the_previous_cache() {
    init_logger();

    let mut board = refreshed_board(vec![
        raw_task("abc", "Write report", None, "INBOX", &[]),
    ]).await;
    let last_refresh = board.last_refresh();
    board.store_mut().insert_raw(raw_task("xyz", "Call Mom", None, "INBOX", &[]));
    board.store_mut().set_mock_behaviour(Some(mock(MockBehaviour::fail_now(1))));

    assert!(board.refresh().await.is_err());
    assert_eq!(ids(board.tasks()), vec!["abc"]);
    assert_eq!(board.last_refresh(), last_refresh);

    board.refresh().await.unwrap();
    assert_eq!(ids(board.tasks()), vec!["abc", "xyz"]);
}

#[tokio::test]
async fn refresh_follows_pagination() {
    init_logger();

    let pages: Vec<Value> = (0..230)
        .map(|i| raw_task(&format!("t{:03}", i), "Task", None, "INBOX", &[]))
        .collect();
    let board = refreshed_board(pages).await;
    assert_eq!(board.len(), 230);
}

#[tokio::test]
async fn focus_view_only_holds_the_tasks_of_the_day() {
    init_logger();

    let mut store = MemoryStore::new();
    store.insert_raw(raw_task("today", "Today", Some("2024-06-10"), "Doing", &[]));
    store.insert_raw(raw_task("today-done", "Done today", Some("2024-06-10"), "Done", &[]));
    store.insert_raw(raw_task("tomorrow", "Tomorrow", Some("2024-06-11"), "INBOX", &[]));
    store.insert_raw(raw_task("undated", "Someday", None, "INBOX", &[]));
    let mut board = TaskBoard::new(store, Schema::default());

    board.refresh_for(ymd(2024, 6, 10)).await.unwrap();
    assert_eq!(ids(board.tasks()), vec!["today"]);
}
