use bookbuilding_notify::config::Config;
use bookbuilding_notify::notify::{LogNotifier, Notifier, SlackNotifier};
use bookbuilding_notify::scrapers::base::PageSource;
use bookbuilding_notify::scrapers::file::FilePageSource;
use bookbuilding_notify::scrapers::tokyo_ipo::TokyoIpoScraper;
use bookbuilding_notify::store::{ArrowStore, MemoryStore, RecordStore};
use bookbuilding_notify::NotifyService;

use anyhow::Context;
use chrono::Utc;
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{error, info, warn};
use serde_json::json;
use std::io::BufRead;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let matches = App::new("bookbuilding-notify")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch the IPO schedule page and notify new listings and tomorrow's milestones")
        .subcommand(
            SubCommand::with_name("run")
                .about("Run once locally")
                .arg(
                    Arg::with_name("debug")
                        .long("debug")
                        .help("Print the extracted records as JSON")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("dry-run")
                        .long("dry-run")
                        .help("Use an in-memory store and only log notifications")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("page")
                        .short('p')
                        .long("page")
                        .value_name("FILE")
                        .help("Read the schedule page from a saved file instead of fetching it")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("listen")
                .about("Run once per JSON event read from stdin, one event per line"),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("List stored schedule records")
                .arg(
                    Arg::with_name("code")
                        .short('c')
                        .long("code")
                        .value_name("CODE")
                        .help("Only show records with this code")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("LIMIT")
                        .help("Limit the number of records to display")
                        .takes_value(true)
                        .default_value("20"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", sub)) => run_local(sub).await,
        Some(("listen", _)) => listen().await,
        Some(("show", sub)) => show(sub).await,
        _ => {
            info!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}

fn build_service(config: &Config, page: Option<&str>, dry_run: bool) -> anyhow::Result<NotifyService> {
    let source: Arc<dyn PageSource + Send + Sync> = match page {
        Some(path) => Arc::new(FilePageSource::new(path)),
        None => Arc::new(TokyoIpoScraper::new(config)?),
    };

    let (store, notifier): (Arc<dyn RecordStore + Send + Sync>, Arc<dyn Notifier + Send + Sync>) = if dry_run {
        (Arc::new(MemoryStore::new()), Arc::new(LogNotifier))
    } else {
        (
            Arc::new(ArrowStore::open_table(&config.data_dir, &config.store_region, &config.store_table)?),
            Arc::new(SlackNotifier::new(config)?),
        )
    };

    Ok(NotifyService::new(config, source, store, notifier)?)
}

async fn run_local(matches: &ArgMatches) -> anyhow::Result<()> {
    let dry_run = matches.is_present("dry-run");
    let config = if dry_run {
        Config::dry_run_from_env()
    } else {
        Config::from_env()
    }
    .context("failed to load configuration")?;

    let service = build_service(&config, matches.value_of("page"), dry_run)?;

    let result = async {
        let assembly = service.collect().await?;
        if matches.is_present("debug") {
            println!("{}", serde_json::to_string_pretty(&assembly.records)?);
        }
        service.evaluate(&assembly, Utc::now()).await
    }
    .await;

    let summary = result.map_err(|e| {
        error!("Run failed: {}", e);
        e
    })?;
    info!("Summary: {:?}", summary);
    Ok(())
}

async fn listen() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let service = build_service(&config, None, false)?;
    info!("Waiting for events on stdin");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(event) => {
                info!("Event received: {}", event);
                match service.run().await {
                    Ok(summary) => json!({ "ok": true, "summary": summary }),
                    Err(e) => {
                        error!("Run failed: {}", e);
                        json!({ "ok": false, "error": e.to_string() })
                    }
                }
            }
            Err(e) => {
                warn!("Ignoring malformed event: {}", e);
                json!({ "ok": false, "error": format!("malformed event: {}", e) })
            }
        };
        println!("{}", outcome);
    }

    Ok(())
}

fn parse_limit(value: Option<&str>) -> anyhow::Result<usize> {
    let value = value.unwrap_or("20");
    value
        .trim()
        .parse::<usize>()
        .with_context(|| format!("invalid --limit value {:?}, expected a non-negative integer", value))
}

async fn show(matches: &ArgMatches) -> anyhow::Result<()> {
    let limit = parse_limit(matches.value_of("limit"))?;
    let config = Config::store_from_env().context("failed to load configuration")?;
    let store = ArrowStore::open_table(&config.data_dir, &config.store_region, &config.store_table)?;

    let records = match matches.value_of("code") {
        Some(code) => store.find(code).await?,
        None => store.all().await?,
    };
    info!("Found {} records in {}", records.len(), store.path().display());

    for record in records.iter().take(limit) {
        info!("{} ({})", record.company_name, record.code);
        info!("{:-<60}", "");
        info!("  公開日   : {}", record.stock_release_date);
        info!("  仮条件   : {}", record.provisional_condition);
        info!("  公開価格 : {}", record.release_price);
        info!("  ＢＢ期間 : {}", record.book_building_date_range);
        info!("  主幹事   : {}", record.secretary);
    }
    if records.len() > limit {
        info!("... and {} more records", records.len() - limit);
    }

    Ok(())
}
