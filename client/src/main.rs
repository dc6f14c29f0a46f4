use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use client::render::{chart_dataset, render};
use client::{Applied, BackoffPolicy, ClientModel, FeedError, FeedEvent, FilterState, PriceFeedClient, Timeframe};
use common::logger::init_logger;
use market::Metal;
use market::protocol::ClientEvent;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[clap(name = "price-feed", version)]
struct Cli {
    /// Push endpoint of the price server
    #[clap(long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Show a single city (by id)
    #[clap(long)]
    city: Option<String>,

    /// Show only one metal (gold | silver)
    #[clap(long)]
    metal: Option<Metal>,

    /// Case-insensitive match on city name, id or state
    #[clap(long, default_value = "")]
    search: String,

    /// Chart range
    #[clap(long, value_enum, default_value_t = Timeframe::OneHour)]
    timeframe: Timeframe,

    #[clap(long, default_value_t = 5)]
    max_retries: u32,

    #[clap(long, default_value_t = 1_000)]
    base_delay_ms: u64,

    /// Ask the server for a fresh snapshot every N seconds
    #[clap(long)]
    refresh_secs: Option<u64>,
}

fn print_view(model: &ClientModel, timeframe: Timeframe) {
    let view = render(model);
    println!("\n{}", view.summary);
    for card in &view.cards {
        print!("{card}");
    }

    for metal in model.filter().metals() {
        let chart = chart_dataset(model.series(metal), metal, timeframe);
        if let (Some(first), Some(last)) = (chart.values.first(), chart.values.last()) {
            println!(
                "chart {metal} [{} pts]: {first:.0} -> {last:.0}",
                chart.values.len()
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("price-feed", false);

    let mut model = ClientModel::default();
    model.set_filter(FilterState {
        city_id: cli.city.clone(),
        metal: cli.metal,
        search_text: cli.search.clone(),
    });

    let policy = BackoffPolicy {
        base_delay: Duration::from_millis(cli.base_delay_ms),
        max_retries: cli.max_retries,
    };
    let feed = PriceFeedClient::new(cli.url.clone(), policy)
        .with_cities(cli.city.clone().into_iter().collect());

    let (event_tx, mut event_rx) = mpsc::channel::<FeedEvent>(64);
    let (cmd_tx, cmd_rx) = mpsc::channel::<ClientEvent>(8);

    let feed_task = tokio::spawn(async move { feed.run(event_tx, cmd_rx).await });

    if let Some(secs) = cli.refresh_secs {
        let every = Duration::from_secs(secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if cmd_tx.send(ClientEvent::RequestUpdate).await.is_err() {
                    break;
                }
            }
        });
    }

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(FeedEvent::Connected) => tracing::info!("connected"),
                Some(FeedEvent::Disconnected) => tracing::warn!("disconnected; reconnecting"),
                Some(FeedEvent::Server(event)) => match model.apply(event) {
                    Applied::Initial => print_view(&model, cli.timeframe),
                    Applied::Updated { alerts } => {
                        for alert in &alerts {
                            println!("! {alert}");
                        }
                        print_view(&model, cli.timeframe);
                    }
                    Applied::Stale => tracing::debug!("stale snapshot ignored"),
                },
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
        }
    }

    match feed_task.await.context("feed task panicked")? {
        Ok(()) => Ok(()),
        Err(FeedError::RetriesExhausted(n)) => {
            eprintln!("price feed unavailable after {n} attempts; restart to try again");
            Err(FeedError::RetriesExhausted(n).into())
        }
        Err(e) => Err(e.into()),
    }
}
