use std::sync::Arc;

use anyhow::Context;
use chart_feed::account::AccountClient;
use chart_feed::config::FeedConfig;
use chart_feed::driver::{FeedDriver, FeedHandle};
use chart_feed::session::{ChartSnapshot, FeedStatus};
use chart_feed::source::HttpChartSource;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use types::account::{CreateAccountRequest, LoginRequest};
use types::ids::DatasetId;
use types::record::NormalizedPoint;

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    List,
    Select(String),
    Next(Option<u64>),
    Prev(Option<u64>),
    Refresh,
    Stats,
    Login { username: String, password: String },
    Signup { fname: String, lname: String, username: String, password: String },
    Quit,
}

impl CliCommand {
    fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["list"] => Some(CliCommand::List),
            ["select", name] => Some(CliCommand::Select(name.to_string())),
            ["next"] => Some(CliCommand::Next(None)),
            ["next", n] => n.parse().ok().map(|n| CliCommand::Next(Some(n))),
            ["prev"] => Some(CliCommand::Prev(None)),
            ["prev", n] => n.parse().ok().map(|n| CliCommand::Prev(Some(n))),
            ["refresh"] => Some(CliCommand::Refresh),
            ["stats"] => Some(CliCommand::Stats),
            ["login", username, password] => Some(CliCommand::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ["signup", fname, lname, username, password] => Some(CliCommand::Signup {
                fname: fname.to_string(),
                lname: lname.to_string(),
                username: username.to_string(),
                password: password.to_string(),
            }),
            ["quit"] | ["exit"] => Some(CliCommand::Quit),
            _ => None,
        }
    }
}

const HELP: &str = "commands: list | select <name> | next [n] | prev [n] | refresh | stats | \
                    login <user> <pass> | signup <first> <last> <user> <pass> | quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = FeedConfig::from_env();
    config.validate().context("invalid configuration")?;
    tracing::info!(base_url = %config.base_url, limit = config.page_limit, "Starting chart feed");

    let source = Arc::new(HttpChartSource::new(&config)?);
    let accounts = AccountClient::new(&config)?;
    let (catalog, feed, driver_task) = FeedDriver::start(source, &config)
        .await
        .context("failed to start feed driver")?;

    match catalog.error() {
        Some(err) => println!("unable to load datasets: {}", err),
        None => println!("datasets: {}", catalog.entries().len()),
    }

    let render_task = tokio::spawn(render(feed.clone()));

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(command) = CliCommand::parse(line) else {
            println!("{}", HELP);
            continue;
        };
        match command {
            CliCommand::List => {
                let active = feed.snapshot().dataset;
                for id in catalog.entries() {
                    let marker = if Some(id) == active.as_ref() { "*" } else { " " };
                    println!("{} {}", marker, id);
                }
            }
            CliCommand::Select(name) => match DatasetId::try_new(name) {
                Some(id) => feed.select(id).await?,
                None => println!("dataset name must not be empty"),
            },
            CliCommand::Next(step) => match step {
                Some(step) => feed.step_forward(step).await?,
                None => feed.next_window().await?,
            },
            CliCommand::Prev(step) => match step {
                Some(step) => feed.step_back(step).await?,
                None => feed.previous_window().await?,
            },
            CliCommand::Refresh => feed.refresh().await?,
            CliCommand::Stats => println!("{:?}", feed.stats().await?),
            CliCommand::Login { username, password } => {
                match accounts.login(&LoginRequest::new(username, password)).await {
                    Ok(()) => println!("logged in"),
                    Err(err) => println!("login failed: {}", err),
                }
            }
            CliCommand::Signup { fname, lname, username, password } => {
                let request = CreateAccountRequest::new(fname, lname, username, password);
                match accounts.create_account(&request).await {
                    Ok(()) => println!("account created"),
                    Err(err) => println!("account creation failed: {}", err),
                }
            }
            CliCommand::Quit => break,
        }
    }

    feed.shutdown().await.ok();
    driver_task.await.ok();
    render_task.abort();
    Ok(())
}

/// Terminal render sink: prints every published snapshot.
async fn render(feed: FeedHandle) {
    let mut snapshots = feed.subscribe();
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        print_snapshot(&snapshot);
    }
}

fn print_snapshot(snapshot: &ChartSnapshot) {
    let dataset = snapshot
        .dataset
        .as_ref()
        .map(DatasetId::as_str)
        .unwrap_or("-");
    let status = match &snapshot.status {
        FeedStatus::Idle => "idle".to_string(),
        FeedStatus::Loading => "loading".to_string(),
        FeedStatus::Ready => format!("{} points", snapshot.points.len()),
        FeedStatus::NoData => "no candlestick data found".to_string(),
        FeedStatus::Failed(reason) => format!("fetch failed: {}", reason),
    };
    println!(
        "[{}] offset {} limit {}: {}",
        dataset, snapshot.offset, snapshot.limit, status
    );

    if snapshot.status != FeedStatus::Ready {
        return;
    }
    for point in snapshot.points.iter() {
        let time = format_time(point);
        let marker = if point.is_bullish() { "+" } else { "-" };
        println!(
            "  {} {} o={:.4} h={:.4} l={:.4} c={:.4}",
            time, marker, point.open, point.high, point.low, point.close
        );
    }
}

/// UTC minute of a point; raw milliseconds when out of range.
fn format_time(point: &NormalizedPoint) -> String {
    point
        .datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| point.timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(CliCommand::parse("list"), Some(CliCommand::List));
        assert_eq!(
            CliCommand::parse("select AAPL"),
            Some(CliCommand::Select("AAPL".into()))
        );
        assert_eq!(CliCommand::parse("next"), Some(CliCommand::Next(None)));
        assert_eq!(CliCommand::parse("prev 14"), Some(CliCommand::Prev(Some(14))));
        assert_eq!(CliCommand::parse("quit"), Some(CliCommand::Quit));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(CliCommand::parse("next -3"), None);
        assert_eq!(CliCommand::parse("select"), None);
        assert_eq!(CliCommand::parse("login onlyuser"), None);
        assert_eq!(CliCommand::parse("dance"), None);
    }

    fn point_at(timestamp: i64) -> NormalizedPoint {
        NormalizedPoint {
            timestamp,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(&point_at(1_700_000_060_000)), "2023-11-14 22:14");
        assert_eq!(format_time(&point_at(i64::MAX)), i64::MAX.to_string());
    }
}
