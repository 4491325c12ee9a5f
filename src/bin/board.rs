//! Displays the task database in a terminal
//!
//! Usage: `board [week|focus|meetings]` (defaults to `week`). \
//! Credentials are read from the `NOTION_API_KEY` and `NOTION_DATABASE_ID` environment variables.
//! You can also set the RUST_LOG environment variable to display more info about the requests.

use chrono::Local;

use notion_board::client::Client;
use notion_board::config::{Credentials, Schema};
use notion_board::partition::{partition, FocusSummary};
use notion_board::{fetch_meetings, TaskBoard};


#[tokio::main]
async fn main() {
    env_logger::init();

    let view = std::env::args().nth(1).unwrap_or_else(|| "week".to_string());
    let today = Local::now().date_naive();

    let client = match Credentials::from_env().and_then(Client::new) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Unable to create a client: {}", err);
            std::process::exit(1);
        }
    };
    let schema = Schema::default();

    match view.as_str() {
        "week" => {
            let mut board = TaskBoard::new(client, schema);
            if let Err(err) = board.refresh().await {
                log::error!("Unable to fetch tasks: {}", err);
                notion_board::utils::print_week(&partition(&[], today));
                return;
            }
            notion_board::utils::print_week(&board.week(today));
        },
        "focus" => {
            let mut board = TaskBoard::new(client, schema);
            if let Err(err) = board.refresh_for(today).await {
                log::error!("Unable to fetch today's tasks: {}", err);
            }
            let tasks: Vec<_> = board.tasks().cloned().collect();
            notion_board::utils::print_focus(&FocusSummary::for_day(today), &tasks);
        },
        "meetings" => {
            let meetings = match fetch_meetings(&client, &schema).await {
                Ok(meetings) => meetings,
                Err(err) => {
                    log::error!("Unable to fetch meetings: {}", err);
                    Vec::new()
                }
            };
            notion_board::utils::print_meetings(&meetings);
        },
        other => {
            log::error!("Unknown view {:?}. Expected one of week, focus, meetings", other);
            std::process::exit(2);
        },
    }
}
