use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use streamcal_client::{ApiClient, CalendarSync, ClientConfig, ClientEvent, EventBus, ViewKind};
use streamcal_core::YearMonth;

#[derive(Debug, Parser)]
#[command(name = "streamcal")]
#[command(about = "Stream calendar client", version)]
struct Args {
    #[arg(long, env = "STREAMCAL_API_URL", default_value = "http://localhost:3000")]
    api_url: String,
    #[arg(long, env = "STREAMCAL_SERVICE_TOKEN")]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch live and upcoming broadcasts.
    SyncLive {
        #[arg(long = "channel")]
        channels: Vec<String>,
    },
    /// Fetch completed broadcasts published in a date window.
    SyncPast {
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Print stored events for channels.
    Events {
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Walk a calendar through months, loading history incrementally.
    Navigate {
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,
        #[arg(long = "month", required = true)]
        months: Vec<YearMonth>,
        #[arg(long, default_value = "month")]
        view: ViewKind,
        /// Session date; defaults to today (UTC).
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Record that an owner opened the calendar.
    Seen {
        #[arg(long)]
        owner: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let args = Args::parse();
    let bus = EventBus::default();
    spawn_bus_logger(&bus);

    let config = ClientConfig {
        service_token: args.token,
        ..ClientConfig::new(args.api_url)
    };
    let client = Arc::new(ApiClient::new(config, bus.clone())?);

    match args.command {
        Command::SyncLive { channels } => {
            let summary = client.sync_live(&channels).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::SyncPast { channels, from, to } => {
            let summary = client.sync_past(&channels, from, to).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Events { channels, from, to } => {
            let window = from.zip(to);
            let events = client.list_events(&channels, window).await?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Command::Navigate {
            channels,
            months,
            view,
            today,
        } => {
            let pinned = today;
            let today = pinned.unwrap_or_else(|| Utc::now().date_naive());
            let mut sync = CalendarSync::new(client.clone(), bus, channels, today);
            if let Some(day) = pinned {
                sync = sync.with_clock(Arc::new(move || day));
            }

            // The initial render shows the current month.
            let current = YearMonth::of(today);
            sync.on_viewport_change(current.first_day(), current.last_day(), view)
                .await;

            for month in months {
                let outcome = sync
                    .on_viewport_change(month.first_day(), month.last_day(), view)
                    .await;
                info!(%month, ?outcome, "viewport changed");
            }
            sync.close();

            let cached: Vec<String> = sync
                .cached_months()
                .await
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("{}", serde_json::to_string_pretty(&cached)?);
        }
        Command::Seen { owner } => {
            client.touch_last_seen(&owner);
            let (succeeded, failed) = client.background().flush().await;
            if failed > 0 {
                anyhow::bail!("last-seen update failed");
            }
            info!(%owner, succeeded, "last seen recorded");
        }
    }

    Ok(())
}

fn spawn_bus_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                ClientEvent::Retry {
                    operation,
                    attempt,
                    max_retries,
                } => warn!(%operation, attempt, max_retries, "retry attempt"),
                ClientEvent::EventsChanged { months } => info!(?months, "calendar data changed"),
                ClientEvent::Error { operation, message } => {
                    warn!(%operation, %message, "background task failed")
                }
            }
        }
    });
}
